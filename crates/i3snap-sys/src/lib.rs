//! i3snap-sys: window manager and OS IO boundary.
//! i3 IPC transport and live tree, process table inspection, and X11
//! window ownership lookup. No restore logic lives here.

pub mod error;
pub mod executor;
pub mod owner;
pub mod process;
pub mod protocol;
pub mod tree;

pub use error::SysError;
pub use executor::{CommandRunner, I3Client, TreeSource, quote_arg};
pub use owner::{OwnerResolver, X11OwnerResolver};
pub use process::{ProcFs, ProcessInspector};
pub use tree::{TreeNode, WindowProperties};
