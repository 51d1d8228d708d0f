//! On-disk snapshot store: one pretty-printed JSON file per snapshot name.
//!
//! Stored snapshots are never edited in place. A save writes a temp file in
//! the same directory and renames it over the target.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use i3snap_core::Snapshot;
use thiserror::Error;

const APP_DIR: &str = "i3-snapshot";
const SAVES_DIR: &str = "saves";
const EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid snapshot name {0:?}")]
    InvalidName(String),

    #[error("snapshot {0:?} already exists (use --force to replace it)")]
    AlreadyExists(String),

    #[error("snapshot {0:?} not found")]
    NotFound(String),

    #[error("snapshot {name:?} is corrupt: {detail}")]
    Corrupt { name: String, detail: String },

    #[error("snapshot {name:?} is inconsistent: {detail}")]
    Invalid { name: String, detail: String },

    #[error("no per-user config directory available")]
    NoConfigDir,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<config-dir>/i3-snapshot/saves`.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(SAVES_DIR))
    }

    pub fn open_default() -> Result<Self, StoreError> {
        Self::default_dir()
            .map(Self::new)
            .ok_or(StoreError::NoConfigDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{EXTENSION}")))
    }

    /// Persist `snapshot` under its own name. Fails with `AlreadyExists`
    /// unless `overwrite` is set.
    pub fn save(&self, snapshot: &Snapshot, overwrite: bool) -> Result<PathBuf, StoreError> {
        let path = self.path_of(&snapshot.name)?;
        snapshot.validate().map_err(|detail| StoreError::Invalid {
            name: snapshot.name.clone(),
            detail,
        })?;
        if !overwrite && path.exists() {
            return Err(StoreError::AlreadyExists(snapshot.name.clone()));
        }

        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".")
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut tmp, snapshot)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;

        if overwrite {
            tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        } else {
            // Another save may have won the race since the check above.
            tmp.persist_noclobber(&path).map_err(|e| {
                if e.error.kind() == ErrorKind::AlreadyExists {
                    StoreError::AlreadyExists(snapshot.name.clone())
                } else {
                    StoreError::Io(e.error)
                }
            })?;
        }
        tracing::info!("saved snapshot {:?} to {}", snapshot.name, path.display());
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<Snapshot, StoreError> {
        let path = self.path_of(name)?;
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()));
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let corrupt = |detail: String| StoreError::Corrupt {
            name: name.to_string(),
            detail,
        };
        let snapshot: Snapshot =
            serde_json::from_str(&text).map_err(|e| corrupt(e.to_string()))?;
        // Node back-references are only checked strictly on save.
        if let Err(detail) = snapshot.validate() {
            tracing::warn!("snapshot {name:?}: {detail}");
        }
        Ok(snapshot)
    }

    /// Stored snapshot names, sorted. A missing directory is an empty store.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use i3snap_core::{LayoutNode, NodeKind, WindowInfo, WindowRef, WorkspaceSnapshot};

    fn sample(name: &str) -> Snapshot {
        Snapshot {
            name: name.to_string(),
            created_at: Some(chrono::Utc::now()),
            workspaces: vec![WorkspaceSnapshot {
                name: "1".into(),
                root: LayoutNode {
                    id: 10,
                    kind: NodeKind::Workspace,
                    name: "1".into(),
                    nodes: vec![LayoutNode {
                        id: 11,
                        window: Some(WindowInfo {
                            id: 0x600006,
                            class: "XTerm".into(),
                            instance: "xterm".into(),
                            title: "vim".into(),
                        }),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
                windows: vec![WindowRef {
                    node_id: 11,
                    class: "XTerm".into(),
                    instance: "xterm".into(),
                    title: "vim".into(),
                    command: "xterm -e vim".into(),
                    cwd: "/home/user".into(),
                }],
            }],
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path().join("saves"));
        let path = store.save(&sample("work"), false).expect("save");
        assert_eq!(path, dir.path().join("saves").join("work.json"));

        let loaded = store.load("work").expect("load");
        assert_eq!(loaded, sample_with_time(&loaded));
    }

    /// `sample` with the loaded timestamp, since `Utc::now()` moves on.
    fn sample_with_time(loaded: &Snapshot) -> Snapshot {
        Snapshot {
            created_at: loaded.created_at,
            ..sample("work")
        }
    }

    #[test]
    fn save_refuses_existing_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path());
        store.save(&sample("work"), false).expect("first save");
        let err = store.save(&sample("work"), false).expect_err("exists");
        assert!(matches!(err, StoreError::AlreadyExists(ref n) if n == "work"));
    }

    #[test]
    fn overwrite_replaces_whole_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path());
        store.save(&sample("work"), false).expect("first save");

        let mut replacement = sample("work");
        replacement.workspaces.clear();
        store.save(&replacement, true).expect("overwrite");
        assert!(store.load("work").expect("load").workspaces.is_empty());
        assert_eq!(store.list().expect("list"), vec!["work"], "no temp files left");
    }

    #[test]
    fn invalid_names_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path());
        for name in ["", ".", "..", "a/b", "../up", "a\\b"] {
            assert!(
                matches!(store.load(name), Err(StoreError::InvalidName(_))),
                "{name:?}"
            );
        }
        assert!(matches!(
            store.save(&sample("x/y"), false),
            Err(StoreError::InvalidName(_))
        ));
    }

    #[test]
    fn missing_snapshot_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path());
        assert!(matches!(store.load("nope"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn undecodable_file_is_corrupt() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("bad.json"), "{not json").expect("write");
        let store = SnapshotStore::new(dir.path());
        assert!(matches!(store.load("bad"), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn inconsistent_file_loads_but_cannot_be_saved() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut snap = sample("dup");
        let extra = snap.workspaces[0].windows[0].clone();
        snap.workspaces[0].windows.push(extra);
        let json = serde_json::to_string(&snap).expect("encode");
        std::fs::write(dir.path().join("dup.json"), json).expect("write");

        let store = SnapshotStore::new(dir.path());
        let loaded = store.load("dup").expect("load");
        assert_eq!(loaded.workspaces[0].windows.len(), 2);
        assert!(matches!(
            store.save(&snap, true),
            Err(StoreError::Invalid { .. })
        ));
    }

    #[test]
    fn hand_written_document_loads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let json = r#"{
            "name": "t",
            "workspaces": [{
                "name": "1",
                "root": {
                    "id": 1,
                    "type": "workspace",
                    "name": "1",
                    "nodes": [{"id": 2, "type": "con"}]
                },
                "windows": [{"class": "term", "instance": "term", "command": "xterm"}]
            }, {
                "name": "2",
                "root": {"id": 3, "type": "workspace", "name": "2"},
                "windows": [{"node_id": 77, "class": "term", "command": "xterm"}]
            }]
        }"#;
        std::fs::write(dir.path().join("t.json"), json).expect("write");

        let store = SnapshotStore::new(dir.path());
        let loaded = store.load("t").expect("load");
        assert_eq!(loaded.workspaces.len(), 2);
        let first = &loaded.workspaces[0].windows[0];
        assert_eq!(first.node_id, 0);
        assert_eq!(first.command, "xterm");
        assert!(first.is_launchable());
        assert_eq!(loaded.workspaces[1].windows[0].node_id, 77);
    }

    #[test]
    fn list_sorted_json_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path());
        store.save(&sample("zeta"), false).expect("save");
        store.save(&sample("alpha"), false).expect("save");
        std::fs::write(dir.path().join("notes.txt"), "x").expect("write");
        assert_eq!(store.list().expect("list"), vec!["alpha", "zeta"]);
    }

    #[test]
    fn list_of_missing_dir_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path().join("never-created"));
        assert!(store.list().expect("list").is_empty());
    }
}
