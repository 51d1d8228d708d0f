//! Window → owning process lookup through the EWMH `_NET_WM_PID` property.

use std::sync::OnceLock;

use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt as _};
use x11rb::rust_connection::RustConnection;

use crate::error::SysError;

pub const PID_PROPERTY: &str = "_NET_WM_PID";

/// Maps a window id to the pid that owns it.
pub trait OwnerResolver: Send + Sync {
    fn owner_pid(&self, surface_id: u64) -> Result<u32, SysError>;
}

impl<T: OwnerResolver + ?Sized> OwnerResolver for &T {
    fn owner_pid(&self, surface_id: u64) -> Result<u32, SysError> {
        (**self).owner_pid(surface_id)
    }
}

struct X11Session {
    conn: RustConnection,
    /// `x11rb::NONE` when no client ever set the property.
    pid_atom: Atom,
}

impl X11Session {
    fn open(display: Option<&str>) -> Result<Self, String> {
        let (conn, _screen) =
            x11rb::connect(display).map_err(|e| format!("cannot connect to X11: {e}"))?;
        let pid_atom = conn
            .intern_atom(true, PID_PROPERTY.as_bytes())
            .map_err(|e| format!("interning {PID_PROPERTY}: {e}"))?
            .reply()
            .map_err(|e| format!("interning {PID_PROPERTY}: {e}"))?
            .atom;
        Ok(Self { conn, pid_atom })
    }
}

/// X11-backed resolver. Connects lazily on first lookup and reuses the
/// connection for the rest of the capture.
#[derive(Default)]
pub struct X11OwnerResolver {
    display: Option<String>,
    session: OnceLock<Result<X11Session, String>>,
}

impl X11OwnerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target a specific display instead of `$DISPLAY`.
    #[must_use]
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    fn session(&self) -> Result<&X11Session, SysError> {
        self.session
            .get_or_init(|| X11Session::open(self.display.as_deref()))
            .as_ref()
            .map_err(|e| SysError::Unavailable(e.clone()))
    }
}

impl OwnerResolver for X11OwnerResolver {
    fn owner_pid(&self, surface_id: u64) -> Result<u32, SysError> {
        let window = checked_window(surface_id)?;
        let session = self.session()?;
        if session.pid_atom == x11rb::NONE {
            return Err(SysError::NotFound(format!("{PID_PROPERTY} atom not interned")));
        }

        let reply = session
            .conn
            .get_property(false, window, session.pid_atom, AtomEnum::CARDINAL, 0, 1)
            .map_err(|e| SysError::Unavailable(format!("X11 request failed: {e}")))?
            .reply()
            .map_err(|e| {
                SysError::NotFound(format!("reading {PID_PROPERTY} of window {window:#x}: {e}"))
            })?;
        decode_pid(&reply.value, window)
    }
}

fn checked_window(surface_id: u64) -> Result<u32, SysError> {
    if surface_id == 0 {
        return Err(SysError::InvalidInput("invalid window id: 0".to_string()));
    }
    u32::try_from(surface_id)
        .map_err(|_| SysError::InvalidInput(format!("window id {surface_id:#x} exceeds 32 bits")))
}

/// The property is a single 32-bit CARDINAL, little-endian on the wire.
fn decode_pid(value: &[u8], window: u32) -> Result<u32, SysError> {
    if value.is_empty() {
        return Err(SysError::NotFound(format!(
            "{PID_PROPERTY} empty for window {window:#x}"
        )));
    }
    let bytes: [u8; 4] = value
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| {
            SysError::NotFound(format!("{PID_PROPERTY} too short for window {window:#x}"))
        })?;
    match u32::from_le_bytes(bytes) {
        0 => Err(SysError::NotFound(format!(
            "{PID_PROPERTY} is 0 for window {window:#x}"
        ))),
        pid => Ok(pid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_little_endian() {
        assert_eq!(decode_pid(&[0x39, 0x30, 0, 0], 1).expect("pid"), 12345);
        assert_eq!(decode_pid(&[1, 0, 0, 0, 9, 9], 1).expect("pid"), 1);
    }

    #[test]
    fn decode_empty_or_short_is_not_found() {
        assert!(decode_pid(&[], 1).expect_err("empty").is_not_found());
        assert!(decode_pid(&[1, 2], 1).expect_err("short").is_not_found());
        assert!(decode_pid(&[0, 0, 0, 0], 1).expect_err("zero").is_not_found());
    }

    #[test]
    fn zero_surface_is_invalid_input() {
        let resolver = X11OwnerResolver::new();
        assert!(matches!(
            resolver.owner_pid(0),
            Err(SysError::InvalidInput(_))
        ));
    }

    #[test]
    fn oversized_surface_is_invalid_input() {
        assert!(matches!(
            checked_window(u64::from(u32::MAX) + 1),
            Err(SysError::InvalidInput(_))
        ));
        assert_eq!(checked_window(0x60_0006).expect("fits"), 0x60_0006);
    }

    #[test]
    fn unreachable_display_is_unavailable() {
        let resolver = X11OwnerResolver::new().with_display("unix:64999");
        let err = resolver.owner_pid(0x60_0006).expect_err("no display");
        assert!(matches!(err, SysError::Unavailable(_)));
        // The failed connection is cached, not retried per window.
        assert!(matches!(
            resolver.owner_pid(0x60_0007),
            Err(SysError::Unavailable(_))
        ));
    }
}
