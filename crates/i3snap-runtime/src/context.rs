//! Shared per-invocation settings resolved from global CLI options.

use std::path::PathBuf;

use anyhow::Context as _;
use i3snap_core::ExclusionRules;
use i3snap_engine::SnapshotStore;
use i3snap_sys::I3Client;

use crate::cli::Cli;

pub struct Context {
    socket_path: Option<PathBuf>,
    saves_dir: Option<PathBuf>,
    pub rules: ExclusionRules,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            socket_path: cli.socket_path.clone(),
            saves_dir: cli.saves_dir.clone(),
            rules: ExclusionRules::default().with_classes(cli.exclude_classes.iter().cloned()),
        }
    }

    pub fn i3_client(&self) -> anyhow::Result<I3Client> {
        I3Client::connect(self.socket_path.as_deref()).context("cannot locate the i3 IPC socket")
    }

    pub fn store(&self) -> anyhow::Result<SnapshotStore> {
        match &self.saves_dir {
            Some(dir) => Ok(SnapshotStore::new(dir)),
            None => Ok(SnapshotStore::open_default()?),
        }
    }
}
