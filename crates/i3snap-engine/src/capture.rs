//! Snapshot capture: live i3 tree → [`Snapshot`].
//!
//! The capturer only needs read access to the window manager, so it is
//! generic over [`TreeSource`] alone and has no way to issue commands.

use chrono::Utc;
use i3snap_core::types::is_internal_workspace;
use i3snap_core::{ExclusionRules, LayoutNode, Snapshot, WindowInfo, WindowRef, WorkspaceSnapshot};
use i3snap_sys::{OwnerResolver, ProcessInspector, SysError, TreeNode, TreeSource};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureScope {
    /// Only the workspace holding the focused container.
    Focused,
    /// Every workspace except i3's internal ones.
    #[default]
    All,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot read the i3 tree: {0}")]
    Unavailable(#[source] SysError),

    #[error("{0}")]
    NotFound(String),
}

pub struct Capturer<T, O, P> {
    tree: T,
    owners: O,
    processes: P,
    rules: ExclusionRules,
}

impl<T, O, P> Capturer<T, O, P>
where
    T: TreeSource,
    O: OwnerResolver,
    P: ProcessInspector,
{
    pub fn new(tree: T, owners: O, processes: P) -> Self {
        Self {
            tree,
            owners,
            processes,
            rules: ExclusionRules::default(),
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: ExclusionRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn capture(&self, name: &str, scope: CaptureScope) -> Result<Snapshot, CaptureError> {
        let live = self.tree.get_tree().map_err(CaptureError::Unavailable)?;

        let targets = match scope {
            CaptureScope::Focused => {
                let ws = live.focused_workspace().ok_or_else(|| {
                    CaptureError::NotFound("no focused workspace".to_string())
                })?;
                if is_internal_workspace(&ws.name) {
                    return Err(CaptureError::NotFound(format!(
                        "focused workspace {:?} is internal to i3",
                        ws.name
                    )));
                }
                vec![ws]
            }
            CaptureScope::All => live.workspaces(),
        };
        if targets.is_empty() {
            return Err(CaptureError::NotFound("no workspaces to capture".to_string()));
        }

        let workspaces: Vec<WorkspaceSnapshot> =
            targets.into_iter().map(|ws| self.capture_workspace(ws)).collect();
        tracing::info!(
            "captured {} workspace(s), {} window(s)",
            workspaces.len(),
            workspaces.iter().map(|w| w.windows.len()).sum::<usize>()
        );

        Ok(Snapshot {
            name: name.to_string(),
            created_at: Some(Utc::now()),
            workspaces,
        })
    }

    fn capture_workspace(&self, workspace: &TreeNode) -> WorkspaceSnapshot {
        let mut windows = Vec::new();
        let root = self.convert_node(workspace, &mut windows);
        WorkspaceSnapshot {
            name: workspace.name.clone(),
            root,
            windows,
        }
    }

    /// Depth-first copy of `node`. Excluded windows keep their container
    /// but lose their metadata, and the walk continues below them.
    fn convert_node(&self, node: &TreeNode, windows: &mut Vec<WindowRef>) -> LayoutNode {
        let window = node
            .window_id()
            .filter(|_| !self.rules.excludes(node.class(), node.instance()))
            .map(|id| WindowInfo {
                id,
                class: node.class().to_string(),
                instance: node.instance().to_string(),
                title: node.title().to_string(),
            });
        if let Some(info) = &window {
            windows.push(self.window_ref(node.id, info));
        }

        LayoutNode {
            id: node.id,
            kind: node.kind,
            layout: node.layout,
            name: node.name.clone(),
            border: node.border,
            rect: node.rect,
            window,
            focused: node.focused,
            nodes: node
                .nodes
                .iter()
                .map(|c| self.convert_node(c, windows))
                .collect(),
            floating_nodes: node
                .floating_nodes
                .iter()
                .map(|c| self.convert_node(c, windows))
                .collect(),
        }
    }

    /// Resolve launch provenance. Any lookup failure leaves the field empty.
    fn window_ref(&self, node_id: u64, info: &WindowInfo) -> WindowRef {
        let mut record = WindowRef {
            node_id,
            class: info.class.clone(),
            instance: info.instance.clone(),
            title: info.title.clone(),
            ..Default::default()
        };

        let pid = match self.owners.owner_pid(info.id) {
            Ok(pid) => i64::from(pid),
            Err(e) => {
                tracing::debug!("no owner for window {:#x} ({}): {e}", info.id, info.class);
                return record;
            }
        };
        match self.processes.command_of(pid) {
            Ok(command) => record.command = command,
            Err(e) => tracing::debug!("no command for pid {pid}: {e}"),
        }
        match self.processes.working_directory_of(pid) {
            Ok(cwd) => record.cwd = cwd.to_string_lossy().into_owned(),
            Err(e) => tracing::debug!("no cwd for pid {pid}: {e}"),
        }
        record
    }
}
