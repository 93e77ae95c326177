//! Data models shared by the kernel and its adapters.

pub mod content;
pub mod file_tree;
pub mod ids;

pub use content::{Cid, Etag};
pub use file_tree::{
    should_ignore, FileMeta, FileTree, FileTreeError, FileTreeRow, LoadState, NodeId, NodeKind,
};
pub use ids::{EditorId, FileId, PaneId, PaneItemId, WorkspaceId};
