//! `i3-snapshot pid`: show what a restore would launch for a process.

use anyhow::Context as _;
use i3snap_sys::{ProcFs, ProcessInspector};

pub fn cmd_pid(pid: i64) -> anyhow::Result<()> {
    let procfs = ProcFs::default();
    let command = procfs
        .command_of(pid)
        .with_context(|| format!("cannot read command of pid {pid}"))?;
    println!("{command}");
    match procfs.working_directory_of(pid) {
        Ok(cwd) => tracing::debug!("pid {pid} cwd: {}", cwd.display()),
        Err(e) => tracing::debug!("pid {pid} cwd unknown: {e}"),
    }
    Ok(())
}
