//! i3snap-engine: capture, persistence and restore orchestration.
//!
//! Everything here talks to the window manager only through the
//! `TreeSource` / `CommandRunner` traits from `i3snap-sys`, so each phase
//! runs unchanged against an in-memory fake.

pub mod capture;
pub mod launch;
pub mod restore;
pub mod stage;
pub mod store;

pub use capture::{CaptureError, CaptureScope, Capturer};
pub use launch::{LaunchSpec, Launcher, ProcessLauncher, split_command_line};
pub use restore::{
    RestoreError, RestoreReport, RestoreTiming, Restorer, WorkspaceOutcome, WorkspaceReport,
};
pub use stage::{StageError, StagedLayout};
pub use store::{SnapshotStore, StoreError};
