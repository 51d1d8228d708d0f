//! Snapshot document model: captured layout tree plus launch records.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Workspaces named with this prefix belong to i3 itself (e.g. `__i3_scratch`)
/// and cannot be switched to.
pub const INTERNAL_WORKSPACE_PREFIX: &str = "__i3_";

/// Name i3 gives the tree root; never a real workspace.
pub const ROOT_WORKSPACE_NAME: &str = "root";

/// True for workspace names a restore must never switch to.
pub fn is_internal_workspace(name: &str) -> bool {
    name.starts_with(INTERNAL_WORKSPACE_PREFIX)
}

// ─── Node enums ───────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Output,
    #[default]
    Con,
    FloatingCon,
    Workspace,
    /// Bar area under an output. Only present in live trees, never inside a workspace.
    Dockarea,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Output => "output",
            Self::Con => "con",
            Self::FloatingCon => "floating_con",
            Self::Workspace => "workspace",
            Self::Dockarea => "dockarea",
        }
    }

    /// Kinds whose id/name must never reach `append_layout`: applying them
    /// would create or rename a workspace.
    pub fn is_structural(self) -> bool {
        matches!(self, Self::Root | Self::Output | Self::Workspace)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    SplitH,
    SplitV,
    Stacked,
    Tabbed,
    Dockarea,
    Output,
    #[default]
    None,
}

impl Layout {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Border {
    #[default]
    Normal,
    None,
    Pixel,
    Csd,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

// ─── Layout tree ──────────────────────────────────────────────────

/// Identifying metadata of the real window bound to a leaf.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    /// X11 window id.
    pub id: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instance: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
}

/// One container of a captured tree.
///
/// `window` is `Some` only on leaves that held a real, restorable window.
/// Child order is the split order and is preserved through save and restore.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutNode {
    /// i3 container id. Unique within one capture only.
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Layout::is_none")]
    pub layout: Layout,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub border: Border,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowInfo>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub focused: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<LayoutNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub floating_nodes: Vec<LayoutNode>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl LayoutNode {
    pub fn is_leaf(&self) -> bool {
        self.nodes.is_empty() && self.floating_nodes.is_empty()
    }

    /// Pre-order traversal: self, then tiling children, then floating children.
    pub fn iter(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

/// Depth-first iterator over a [`LayoutNode`] and all its descendants.
pub struct Descendants<'a> {
    stack: Vec<&'a LayoutNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a LayoutNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Reverse push keeps tiling-before-floating, left-to-right order on pop.
        self.stack.extend(node.floating_nodes.iter().rev());
        self.stack.extend(node.nodes.iter().rev());
        Some(node)
    }
}

// ─── Launch records ───────────────────────────────────────────────

/// A captured window's match criteria plus how to launch it again.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRef {
    /// Id of the [`LayoutNode`] this window occupied at capture time.
    /// Absent in hand-written documents; restore never reads it.
    #[serde(default)]
    pub node_id: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instance: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Space-joined argv. Empty when the owner process could not be resolved.
    #[serde(default)]
    pub command: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cwd: String,
}

impl WindowRef {
    /// Unlaunchable refs are ignored by launch, matching and cleanup.
    pub fn is_launchable(&self) -> bool {
        !self.command.is_empty()
    }

    /// Class/instance match; an empty expected field matches anything.
    /// Title is ignored since applications rewrite it after startup.
    pub fn matches(&self, class: &str, instance: &str) -> bool {
        (self.class.is_empty() || self.class == class)
            && (self.instance.is_empty() || self.instance == instance)
    }
}

// ─── Snapshot ─────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    pub name: String,
    pub root: LayoutNode,
    #[serde(default)]
    pub windows: Vec<WindowRef>,
}

impl WorkspaceSnapshot {
    /// Restore skips empty names, the tree root, and internal workspaces.
    pub fn is_restorable(&self) -> bool {
        !self.name.is_empty()
            && self.name != ROOT_WORKSPACE_NAME
            && !is_internal_workspace(&self.name)
    }

    pub fn launchable(&self) -> impl Iterator<Item = &WindowRef> {
        self.windows.iter().filter(|w| w.is_launchable())
    }

    /// Check the per-workspace invariants: every window points at a node of
    /// `root` that carries window metadata, and no two windows share a node.
    pub fn validate(&self) -> Result<(), String> {
        let window_nodes: HashSet<u64> = self
            .root
            .iter()
            .filter(|n| n.window.is_some())
            .map(|n| n.id)
            .collect();
        let mut seen = HashSet::new();
        for w in &self.windows {
            if !seen.insert(w.node_id) {
                return Err(format!(
                    "workspace {}: node {} referenced by more than one window",
                    self.name, w.node_id
                ));
            }
            if !window_nodes.contains(&w.node_id) {
                return Err(format!(
                    "workspace {}: window references node {} which holds no window",
                    self.name, w.node_id
                ));
            }
        }
        Ok(())
    }
}

/// The persisted unit. A focused-workspace capture holds one entry.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub workspaces: Vec<WorkspaceSnapshot>,
}

impl Snapshot {
    pub fn validate(&self) -> Result<(), String> {
        self.workspaces.iter().try_for_each(WorkspaceSnapshot::validate)
    }

    pub fn window_count(&self) -> usize {
        self.workspaces.iter().map(|ws| ws.windows.len()).sum()
    }
}
