//! Error types for the IO boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SysError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("command `{command}` failed: {detail}")]
    ControlFailed { command: String, detail: String },

    #[error("i3 ipc protocol error: {0}")]
    Protocol(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SysError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
