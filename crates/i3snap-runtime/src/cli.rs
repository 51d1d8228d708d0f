//! CLI definition using clap derive.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use i3snap_engine::RestoreTiming;

#[derive(Parser)]
#[command(
    name = "i3-snapshot",
    about = "Save and restore i3 workspace layouts together with their applications"
)]
pub struct Cli {
    /// i3 IPC socket (default: `i3 --get-socketpath`)
    #[arg(long, global = true, env = "I3SOCK")]
    pub socket_path: Option<PathBuf>,

    /// Snapshot directory (default: <config-dir>/i3-snapshot/saves)
    #[arg(long, global = true, env = "I3SNAP_SAVES_DIR")]
    pub saves_dir: Option<PathBuf>,

    /// Window class to never capture or swallow, on top of i3bar/i3status.
    /// Repeatable.
    #[arg(long = "exclude-class", global = true, value_name = "CLASS")]
    pub exclude_classes: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Save the current layout and its applications
    Save(SaveOpts),
    /// Recreate a saved layout and relaunch its applications
    Restore(RestoreOpts),
    /// Print the live i3 tree as JSON
    Tree,
    /// Print the command line a process was started with
    Pid(PidOpts),
    /// List saved snapshots
    List,
    /// Print version information
    Version,
}

#[derive(clap::Args)]
pub struct SaveOpts {
    pub name: String,

    /// Only save the focused workspace
    #[arg(long)]
    pub focused: bool,

    /// Replace an existing snapshot with the same name
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args)]
pub struct RestoreOpts {
    pub name: String,

    /// How long to wait for launched windows to appear
    #[arg(long, default_value = "10")]
    pub window_timeout_secs: u64,

    /// Pause after each workspace switch and layout apply
    #[arg(long, default_value = "200")]
    pub settle_ms: u64,

    /// Tree poll interval while waiting for windows
    #[arg(long, default_value = "200")]
    pub poll_interval_ms: u64,

    /// How long to wait for launches to start
    #[arg(long, default_value = "2000")]
    pub launch_grace_ms: u64,
}

impl RestoreOpts {
    pub fn timing(&self) -> RestoreTiming {
        RestoreTiming {
            switch_settle: Duration::from_millis(self.settle_ms),
            layout_settle: Duration::from_millis(self.settle_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            window_timeout: Duration::from_secs(self.window_timeout_secs),
            launch_grace: Duration::from_millis(self.launch_grace_ms),
            ..RestoreTiming::default()
        }
    }
}

#[derive(clap::Args)]
pub struct PidOpts {
    #[arg(allow_negative_numbers = true)]
    pub pid: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_restore_timing_matches_engine() {
        let cli = Cli::try_parse_from(["i3-snapshot", "restore", "work"]).expect("parse");
        let Command::Restore(opts) = cli.command else {
            panic!("expected restore");
        };
        assert_eq!(opts.timing(), RestoreTiming::default());
    }

    #[test]
    fn restore_timing_overrides() {
        let cli = Cli::try_parse_from([
            "i3-snapshot",
            "restore",
            "work",
            "--window-timeout-secs",
            "30",
            "--settle-ms",
            "50",
        ])
        .expect("parse");
        let Command::Restore(opts) = cli.command else {
            panic!("expected restore");
        };
        let timing = opts.timing();
        assert_eq!(timing.window_timeout, Duration::from_secs(30));
        assert_eq!(timing.switch_settle, Duration::from_millis(50));
        assert_eq!(timing.layout_settle, Duration::from_millis(50));
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "i3-snapshot",
            "save",
            "work",
            "--focused",
            "--exclude-class",
            "Polybar",
            "--exclude-class",
            "Dunst",
            "--saves-dir",
            "/tmp/saves",
        ])
        .expect("parse");
        assert_eq!(cli.exclude_classes, vec!["Polybar", "Dunst"]);
        assert_eq!(cli.saves_dir, Some(PathBuf::from("/tmp/saves")));
        let Command::Save(opts) = cli.command else {
            panic!("expected save");
        };
        assert!(opts.focused);
        assert!(!opts.force);
    }

    #[test]
    fn pid_accepts_negative_for_validation_downstream() {
        let cli = Cli::try_parse_from(["i3-snapshot", "pid", "-1"]).expect("parse");
        assert!(matches!(cli.command, Command::Pid(PidOpts { pid: -1 })));
    }
}
