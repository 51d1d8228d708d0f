//! Detached process launch for restored windows.

use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use i3snap_core::WindowRef;

/// Split a recorded command on spaces.
///
/// There is no quoting: an argument that itself contains a space is split
/// in two. Runs of spaces produce no empty arguments.
pub fn split_command_line(command: &str) -> Vec<String> {
    command
        .split(' ')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl LaunchSpec {
    /// `None` when the recorded command has no program.
    pub fn from_window(window: &WindowRef) -> Option<Self> {
        let mut argv = split_command_line(&window.command).into_iter();
        let program = argv.next()?;
        Some(Self {
            program,
            args: argv.collect(),
            cwd: (!window.cwd.is_empty()).then(|| PathBuf::from(&window.cwd)),
        })
    }
}

/// Starts processes without waiting for them to exit.
pub trait Launcher: Send + Sync {
    /// Returns the child's pid once the process has been spawned.
    fn launch(&self, spec: &LaunchSpec) -> std::io::Result<u32>;
}

impl<T: Launcher + ?Sized> Launcher for std::sync::Arc<T> {
    fn launch(&self, spec: &LaunchSpec) -> std::io::Result<u32> {
        (**self).launch(spec)
    }
}

/// Spawns real processes in their own process group with null stdio, so
/// they outlive `i3-snapshot` and ignore its terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(&self, spec: &LaunchSpec) -> std::io::Result<u32> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        // The handle is dropped without waiting; the child is detached.
        let child = cmd.spawn()?;
        Ok(child.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(command: &str, cwd: &str) -> WindowRef {
        WindowRef {
            node_id: 1,
            command: command.to_string(),
            cwd: cwd.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn split_on_spaces() {
        assert_eq!(split_command_line("xterm"), vec!["xterm"]);
        assert_eq!(
            split_command_line("xterm  -e   htop "),
            vec!["xterm", "-e", "htop"]
        );
        assert!(split_command_line("").is_empty());
        assert!(split_command_line("   ").is_empty());
    }

    #[test]
    fn split_ignores_quotes() {
        assert_eq!(
            split_command_line("mpv \"/home/u/My Movie.mkv\""),
            vec!["mpv", "\"/home/u/My", "Movie.mkv\""]
        );
    }

    #[test]
    fn spec_from_window() {
        let spec = LaunchSpec::from_window(&window("xterm -e vim", "/tmp")).expect("spec");
        assert_eq!(spec.program, "xterm");
        assert_eq!(spec.args, vec!["-e", "vim"]);
        assert_eq!(spec.cwd, Some(PathBuf::from("/tmp")));

        let spec = LaunchSpec::from_window(&window("xterm", "")).expect("spec");
        assert!(spec.args.is_empty());
        assert_eq!(spec.cwd, None);
    }

    #[test]
    fn blank_command_has_no_spec() {
        assert!(LaunchSpec::from_window(&window("", "/tmp")).is_none());
        assert!(LaunchSpec::from_window(&window("  ", "")).is_none());
    }

    #[test]
    fn process_launcher_spawns() {
        let dir = tempfile::tempdir().expect("tempdir");
        let spec = LaunchSpec {
            program: "true".into(),
            args: vec![],
            cwd: Some(dir.path().to_path_buf()),
        };
        let pid = ProcessLauncher.launch(&spec).expect("spawn true");
        assert!(pid > 0);
    }

    #[test]
    fn process_launcher_missing_program() {
        let spec = LaunchSpec {
            program: "i3-snapshot-no-such-program".into(),
            args: vec![],
            cwd: None,
        };
        assert!(ProcessLauncher.launch(&spec).is_err());
    }
}
