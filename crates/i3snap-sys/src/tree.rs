//! Live GET_TREE node and traversal helpers.

use i3snap_core::types::{Border, Layout, NodeKind, Rect, is_internal_workspace};
use serde::{Deserialize, Deserializer};

/// `null` → `T::default()`; i3 reports unset strings as null.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct WindowProperties {
    #[serde(default, deserialize_with = "null_as_default")]
    pub class: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instance: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
}

/// One container of the live i3 tree. Unknown fields are ignored.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeNode {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub border: Border,
    #[serde(default)]
    pub rect: Rect,
    /// X11 window id; `None` for containers and unswallowed placeholders.
    #[serde(default)]
    pub window: Option<u64>,
    #[serde(default)]
    pub window_properties: Option<WindowProperties>,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub nodes: Vec<TreeNode>,
    #[serde(default)]
    pub floating_nodes: Vec<TreeNode>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.nodes.is_empty() && self.floating_nodes.is_empty()
    }

    /// Window id when this node holds a real window.
    pub fn window_id(&self) -> Option<u64> {
        self.window.filter(|&w| w != 0)
    }

    pub fn class(&self) -> &str {
        self.window_properties
            .as_ref()
            .map_or("", |p| p.class.as_str())
    }

    pub fn instance(&self) -> &str {
        self.window_properties
            .as_ref()
            .map_or("", |p| p.instance.as_str())
    }

    pub fn title(&self) -> &str {
        self.window_properties
            .as_ref()
            .map_or("", |p| p.title.as_str())
    }

    /// Tiling children, then floating children.
    pub fn children(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter().chain(self.floating_nodes.iter())
    }

    /// First workspace named `name`, depth-first.
    pub fn find_workspace(&self, name: &str) -> Option<&TreeNode> {
        if self.kind == NodeKind::Workspace && self.name == name {
            return Some(self);
        }
        self.children().find_map(|c| c.find_workspace(name))
    }

    /// The workspace containing the focused node. When the focused node is
    /// an empty workspace, that workspace itself.
    pub fn focused_workspace(&self) -> Option<&TreeNode> {
        fn walk<'a>(node: &'a TreeNode, current: Option<&'a TreeNode>) -> Option<Option<&'a TreeNode>> {
            let current = if node.kind == NodeKind::Workspace {
                Some(node)
            } else {
                current
            };
            if node.focused {
                return Some(current);
            }
            node.children().find_map(|c| walk(c, current))
        }
        walk(self, None).flatten()
    }

    /// All workspaces except i3's internal ones, in tree order.
    pub fn workspaces(&self) -> Vec<&TreeNode> {
        fn walk<'a>(node: &'a TreeNode, out: &mut Vec<&'a TreeNode>) {
            if node.kind == NodeKind::Workspace {
                if !is_internal_workspace(&node.name) {
                    out.push(node);
                }
                return;
            }
            for c in node.children() {
                walk(c, out);
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    /// Every node under (and including) `self` that holds a real window, pre-order.
    pub fn windows(&self) -> Vec<&TreeNode> {
        fn walk<'a>(node: &'a TreeNode, out: &mut Vec<&'a TreeNode>) {
            if node.window_id().is_some() {
                out.push(node);
            }
            for c in node.children() {
                walk(c, out);
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    /// Leaf `con` nodes holding no window, in discovery order.
    pub fn empty_leaves(&self) -> Vec<&TreeNode> {
        fn walk<'a>(node: &'a TreeNode, out: &mut Vec<&'a TreeNode>) {
            if node.kind == NodeKind::Con && node.is_leaf() && node.window_id().is_none() {
                out.push(node);
                return;
            }
            for c in node.children() {
                walk(c, out);
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }
}
