//! Staging a projected layout as a file for `append_layout`.

use std::io::Write;
use std::path::Path;

use i3snap_core::WireLayoutNode;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("cannot write staged layout: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot encode layout: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A layout written to a temporary file. The file is removed when this
/// value is dropped, whether or not i3 accepted it.
#[derive(Debug)]
pub struct StagedLayout {
    file: NamedTempFile,
}

impl StagedLayout {
    /// Stage in the system temp directory.
    pub fn write(layout: &WireLayoutNode) -> Result<Self, StageError> {
        Self::write_in(&std::env::temp_dir(), layout)
    }

    pub fn write_in(dir: &Path, layout: &WireLayoutNode) -> Result<Self, StageError> {
        let mut file = tempfile::Builder::new()
            .prefix("i3-snapshot-layout-")
            .suffix(".json")
            .tempfile_in(dir)?;
        serde_json::to_writer_pretty(&mut file, layout)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use i3snap_core::{MatchCriteria, NodeKind};

    fn layout() -> WireLayoutNode {
        WireLayoutNode {
            kind: NodeKind::Con,
            nodes: vec![WireLayoutNode {
                id: Some(5),
                kind: NodeKind::Con,
                swallows: vec![MatchCriteria {
                    class: "term".into(),
                    instance: "term".into(),
                    title: String::new(),
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn staged_file_holds_layout_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let staged = StagedLayout::write_in(dir.path(), &layout()).expect("stage");

        let name = staged
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .expect("file name");
        assert!(name.starts_with("i3-snapshot-layout-"));
        assert!(name.ends_with(".json"));

        let text = std::fs::read_to_string(staged.path()).expect("read");
        let back: WireLayoutNode = serde_json::from_str(&text).expect("parse");
        assert_eq!(back, layout());
    }

    #[test]
    fn dropping_removes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let staged = StagedLayout::write_in(dir.path(), &layout()).expect("stage");
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn missing_dir_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = StagedLayout::write_in(&dir.path().join("absent"), &layout())
            .expect_err("no dir");
        assert!(matches!(err, StageError::Io(_)));
    }
}
