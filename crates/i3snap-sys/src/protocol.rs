//! i3 IPC framing: `"i3-ipc"`, payload length (u32 LE), message type (u32 LE), payload.

use std::io::{ErrorKind, Read};

use serde::Deserialize;

use crate::error::SysError;

pub const MAGIC: &[u8; 6] = b"i3-ipc";
const HEADER_LEN: usize = MAGIC.len() + 8;
/// Upper bound on a reply payload; a GET_TREE of a busy session is well under this.
const MAX_PAYLOAD_LEN: u32 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    RunCommand,
    GetTree,
    GetVersion,
}

impl MessageType {
    pub fn code(self) -> u32 {
        match self {
            Self::RunCommand => 0,
            Self::GetTree => 4,
            Self::GetVersion => 7,
        }
    }
}

/// Frame one request.
pub fn encode(kind: MessageType, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(&kind.code().to_le_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Read one reply frame, returning its type code and payload.
pub fn read_frame(reader: &mut impl Read) -> Result<(u32, Vec<u8>), SysError> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).map_err(truncated("header"))?;

    if &header[..MAGIC.len()] != MAGIC {
        return Err(SysError::Protocol("bad magic in reply header".to_string()));
    }
    let len = u32::from_le_bytes([header[6], header[7], header[8], header[9]]);
    let kind = u32::from_le_bytes([header[10], header[11], header[12], header[13]]);
    if len > MAX_PAYLOAD_LEN {
        return Err(SysError::Protocol(format!(
            "reply payload of {len} bytes exceeds limit"
        )));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).map_err(truncated("payload"))?;
    Ok((kind, payload))
}

fn truncated(part: &'static str) -> impl Fn(std::io::Error) -> SysError {
    move |e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            SysError::Protocol(format!("connection closed mid-{part}"))
        } else {
            SysError::Io(e)
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommandOutcome {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Check a RUN_COMMAND reply; any failed sub-command rejects the whole command.
pub fn check_command_reply(command: &str, payload: &[u8]) -> Result<(), SysError> {
    let outcomes: Vec<CommandOutcome> = serde_json::from_slice(payload)?;
    let errors: Vec<String> = outcomes
        .into_iter()
        .filter(|o| !o.success)
        .map(|o| o.error.unwrap_or_else(|| "rejected".to_string()))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SysError::ControlFailed {
            command: command.to_string(),
            detail: errors.join("; "),
        })
    }
}

/// Subset of the GET_VERSION reply.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionReply {
    pub human_readable: String,
}
