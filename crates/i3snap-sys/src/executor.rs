//! TreeSource / CommandRunner traits and I3Client (sync IPC over the i3 socket).
//! Traits exist so capture and restore can run against an in-memory fake.

use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SysError;
use crate::protocol::{self, MessageType, VersionReply};
use crate::tree::TreeNode;

/// Read access to the window manager's layout tree.
pub trait TreeSource: Send + Sync {
    fn get_tree(&self) -> Result<TreeNode, SysError>;
}

/// Control access to the window manager.
pub trait CommandRunner: Send + Sync {
    fn run_command(&self, command: &str) -> Result<(), SysError>;
}

impl<T: TreeSource + ?Sized> TreeSource for &T {
    fn get_tree(&self) -> Result<TreeNode, SysError> {
        (**self).get_tree()
    }
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run_command(&self, command: &str) -> Result<(), SysError> {
        (**self).run_command(command)
    }
}

/// Quote a command argument for i3's parser.
pub fn quote_arg(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// i3 IPC client. Opens one connection per request.
pub struct I3Client {
    socket_path: PathBuf,
    timeout: Duration,
}

impl I3Client {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Resolve the socket (`explicit` > `$I3SOCK` > `i3 --get-socketpath`) and build a client.
    pub fn connect(explicit: Option<&Path>) -> Result<Self, SysError> {
        Ok(Self::new(resolve_socket_path(explicit)?))
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Raw GET_TREE reply, with every field i3 reports.
    pub fn get_tree_json(&self) -> Result<serde_json::Value, SysError> {
        let payload = self.request(MessageType::GetTree, b"")?;
        Ok(serde_json::from_slice(&payload)?)
    }

    pub fn get_version(&self) -> Result<VersionReply, SysError> {
        let payload = self.request(MessageType::GetVersion, b"")?;
        Ok(serde_json::from_slice(&payload)?)
    }

    fn request(&self, kind: MessageType, payload: &[u8]) -> Result<Vec<u8>, SysError> {
        let mut stream = UnixStream::connect(&self.socket_path).map_err(|e| {
            SysError::Unavailable(format!(
                "cannot connect to i3 at {}: {e}",
                self.socket_path.display()
            ))
        })?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        stream.write_all(&protocol::encode(kind, payload))?;
        let (reply_kind, reply) = protocol::read_frame(&mut stream)?;
        if reply_kind != kind.code() {
            return Err(SysError::Protocol(format!(
                "expected reply type {}, got {reply_kind}",
                kind.code()
            )));
        }
        Ok(reply)
    }
}

impl TreeSource for I3Client {
    fn get_tree(&self) -> Result<TreeNode, SysError> {
        let payload = self.request(MessageType::GetTree, b"")?;
        Ok(serde_json::from_slice(&payload)?)
    }
}

impl CommandRunner for I3Client {
    fn run_command(&self, command: &str) -> Result<(), SysError> {
        tracing::debug!("i3 command: {command}");
        let payload = self.request(MessageType::RunCommand, command.as_bytes())?;
        protocol::check_command_reply(command, &payload)
    }
}

fn resolve_socket_path(explicit: Option<&Path>) -> Result<PathBuf, SysError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os("I3SOCK").filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let output = std::process::Command::new("i3")
        .arg("--get-socketpath")
        .output()
        .map_err(|e| SysError::Unavailable(format!("cannot run `i3 --get-socketpath`: {e}")))?;
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() || path.is_empty() {
        return Err(SysError::Unavailable(
            "i3 socket path unknown (is i3 running? set I3SOCK)".to_string(),
        ));
    }
    Ok(PathBuf::from(path))
}
