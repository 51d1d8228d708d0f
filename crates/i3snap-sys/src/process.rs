//! Launch command and working directory recovery from the process table.

use std::path::{Path, PathBuf};

use crate::error::SysError;

/// Read-only view of the OS process table.
///
/// Both lookups are best-effort: callers treat any error as "unknown".
pub trait ProcessInspector: Send + Sync {
    /// Argument vector joined with single spaces.
    fn command_of(&self, pid: i64) -> Result<String, SysError>;

    fn working_directory_of(&self, pid: i64) -> Result<PathBuf, SysError>;
}

impl<T: ProcessInspector + ?Sized> ProcessInspector for &T {
    fn command_of(&self, pid: i64) -> Result<String, SysError> {
        (**self).command_of(pid)
    }

    fn working_directory_of(&self, pid: i64) -> Result<PathBuf, SysError> {
        (**self).working_directory_of(pid)
    }
}

/// `/proc`-backed inspector. The root is configurable for tests.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entry(&self, pid: i64, name: &str) -> Result<PathBuf, SysError> {
        if pid <= 0 {
            return Err(SysError::InvalidInput(format!("invalid pid: {pid}")));
        }
        Ok(self.root.join(pid.to_string()).join(name))
    }
}

impl ProcessInspector for ProcFs {
    fn command_of(&self, pid: i64) -> Result<String, SysError> {
        let path = self.entry(pid, "cmdline")?;
        let data = std::fs::read(&path).map_err(|e| not_found(&path, e))?;
        Ok(join_cmdline(&data))
    }

    fn working_directory_of(&self, pid: i64) -> Result<PathBuf, SysError> {
        let path = self.entry(pid, "cwd")?;
        std::fs::read_link(&path).map_err(|e| not_found(&path, e))
    }
}

fn not_found(path: &Path, e: std::io::Error) -> SysError {
    SysError::NotFound(format!("reading {}: {e}", path.display()))
}

/// `cmdline` is NUL-separated with a trailing NUL.
fn join_cmdline(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data);
    text.trim_end_matches('\0')
        .split('\0')
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_proc() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let pid_dir = dir.path().join("4242");
        std::fs::create_dir(&pid_dir).expect("mkdir");
        std::fs::write(pid_dir.join("cmdline"), b"emacs\0--daemon\0-q\0").expect("write");
        std::os::unix::fs::symlink("/home/user/src", pid_dir.join("cwd")).expect("symlink");
        dir
    }

    #[test]
    fn join_cmdline_strips_trailing_nul() {
        assert_eq!(join_cmdline(b"xterm\0-e\0htop\0"), "xterm -e htop");
        assert_eq!(join_cmdline(b"firefox\0"), "firefox");
        assert_eq!(join_cmdline(b"firefox"), "firefox");
        assert_eq!(join_cmdline(b""), "");
    }

    #[test]
    fn command_of_reads_cmdline() {
        let dir = fake_proc();
        let procfs = ProcFs::new(dir.path());
        assert_eq!(procfs.command_of(4242).expect("cmd"), "emacs --daemon -q");
    }

    #[test]
    fn working_directory_of_resolves_link() {
        let dir = fake_proc();
        let procfs = ProcFs::new(dir.path());
        assert_eq!(
            procfs.working_directory_of(4242).expect("cwd"),
            PathBuf::from("/home/user/src")
        );
    }

    #[test]
    fn missing_pid_is_not_found() {
        let dir = fake_proc();
        let procfs = ProcFs::new(dir.path());
        assert!(procfs.command_of(9999).expect_err("gone").is_not_found());
        assert!(
            procfs
                .working_directory_of(9999)
                .expect_err("gone")
                .is_not_found()
        );
    }

    #[test]
    fn nonpositive_pid_is_invalid_input() {
        let procfs = ProcFs::default();
        for pid in [0, -1] {
            assert!(matches!(
                procfs.command_of(pid),
                Err(SysError::InvalidInput(_))
            ));
            assert!(matches!(
                procfs.working_directory_of(pid),
                Err(SysError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn real_proc_nonexistent_pid() {
        // Above the kernel's pid_max ceiling (4194304), so never allocated.
        let err = ProcFs::default()
            .command_of(i64::from(i32::MAX))
            .expect_err("no such process");
        assert!(err.is_not_found());
    }
}
