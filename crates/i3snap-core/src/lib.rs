//! i3snap-core: snapshot model and layout projection.
//! Pure data and transforms. No IO, no window-manager access.

pub mod exclusion;
pub mod projection;
pub mod types;

pub use exclusion::ExclusionRules;
pub use projection::{MatchCriteria, WireLayoutNode, project, project_children};
pub use types::{
    Border, INTERNAL_WORKSPACE_PREFIX, Layout, LayoutNode, NodeKind, ROOT_WORKSPACE_NAME, Rect,
    Snapshot, WindowInfo, WindowRef, WorkspaceSnapshot,
};
