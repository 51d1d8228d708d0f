//! Projection of a captured tree into i3's `append_layout` format.
//!
//! The wire tree has the captured shape, but window metadata becomes
//! `swallows` criteria and structural nodes (root/output/workspace) lose
//! their id and name so i3 never creates or renames a workspace.

use serde::{Deserialize, Serialize};

use crate::exclusion::ExclusionRules;
use crate::types::{Border, Layout, LayoutNode, NodeKind, Rect};

/// Swallow criteria i3 matches new windows against.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCriteria {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instance: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
}

impl MatchCriteria {
    pub fn is_empty(&self) -> bool {
        self.class.is_empty() && self.instance.is_empty() && self.title.is_empty()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireLayoutNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Layout::is_none")]
    pub layout: Layout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub border: Border,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub swallows: Vec<MatchCriteria>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<WireLayoutNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub floating_nodes: Vec<WireLayoutNode>,
}

impl WireLayoutNode {
    /// Pre-order walk collecting every node's swallow criteria.
    pub fn all_swallows(&self) -> Vec<&MatchCriteria> {
        let mut out = Vec::new();
        collect_swallows(self, &mut out);
        out
    }
}

fn collect_swallows<'a>(node: &'a WireLayoutNode, out: &mut Vec<&'a MatchCriteria>) {
    out.extend(node.swallows.iter());
    for child in node.nodes.iter().chain(node.floating_nodes.iter()) {
        collect_swallows(child, out);
    }
}

/// Project one captured node and its subtree.
pub fn project(node: &LayoutNode, rules: &ExclusionRules) -> WireLayoutNode {
    let structural = node.kind.is_structural();

    let id = (!structural && node.id != 0).then_some(node.id);
    let name = (!structural && !node.name.is_empty()).then(|| node.name.clone());

    let swallows = node
        .window
        .as_ref()
        .filter(|w| !rules.excludes(&w.class, &w.instance))
        .map(|w| MatchCriteria {
            class: w.class.clone(),
            instance: w.instance.clone(),
            title: w.title.clone(),
        })
        .filter(|c| !c.is_empty())
        .into_iter()
        .collect();

    WireLayoutNode {
        id,
        kind: node.kind,
        layout: node.layout,
        name,
        border: node.border,
        rect: node.rect,
        swallows,
        nodes: node.nodes.iter().map(|n| project(n, rules)).collect(),
        floating_nodes: node.floating_nodes.iter().map(|n| project(n, rules)).collect(),
    }
}

/// Project a workspace's contents for `append_layout`.
///
/// The workspace node itself is replaced by a synthetic `con` holding its
/// layout, rect and children, so applying the result fills the focused
/// workspace instead of creating one. A root that is not a workspace
/// (hand-built documents) is projected unchanged.
pub fn project_children(root: &LayoutNode, rules: &ExclusionRules) -> WireLayoutNode {
    if root.kind != NodeKind::Workspace {
        return project(root, rules);
    }
    let synthetic = LayoutNode {
        kind: NodeKind::Con,
        layout: root.layout,
        rect: root.rect,
        nodes: root.nodes.clone(),
        floating_nodes: root.floating_nodes.clone(),
        ..Default::default()
    };
    project(&synthetic, rules)
}
