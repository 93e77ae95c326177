//! Persistent store contract: workspace, pane, file, and editor records.
//!
//! Every mutating call is a single write; implementations serialize writers.
//! Pane ordering policy (positions, next active tab) lives here, not in the
//! machines that call it.

use crate::kernel::language::ViewKind;
use crate::kernel::services::ports::codec::DocumentState;
use crate::models::{Cid, EditorId, FileId, PaneId, PaneItemId, WorkspaceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("failed to persist store to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store snapshot is malformed: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Opaque editor selection, owned by the editing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializedSelection(pub serde_json::Value);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceRecord {
    pub id: WorkspaceId,
    pub path: PathBuf,
    #[serde(default)]
    pub layout: serde_json::Value,
    pub active_pane_id: Option<PaneId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneRecord {
    pub id: PaneId,
    pub workspace_id: WorkspaceId,
    pub position: u32,
    pub active_item_id: Option<PaneItemId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,
    pub path: PathBuf,
    pub cid: Cid,
    pub mtime: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorRecord {
    pub id: EditorId,
    pub pane_id: PaneId,
    pub file_id: FileId,
    pub view_kind: ViewKind,
    pub state: Option<DocumentState>,
    pub selection: Option<SerializedSelection>,
    pub updated_at: DateTime<Utc>,
}

/// A tab joined with the file and editor it shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneItem {
    pub id: PaneItemId,
    pub pane_id: PaneId,
    pub editor_id: Option<EditorId>,
    pub file_path: PathBuf,
    pub view_kind: ViewKind,
    pub position: u32,
    pub accessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileUpsert {
    pub path: PathBuf,
    pub cid: Cid,
    pub mtime: DateTime<Utc>,
}

/// Keyed on `(pane_id, file_id)`: an existing editor keeps its id.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorUpsert {
    pub pane_id: PaneId,
    pub file_id: FileId,
    pub view_kind: ViewKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorStateUpdate {
    pub id: EditorId,
    pub state: Option<DocumentState>,
    pub selection: Option<SerializedSelection>,
}

pub trait Store: Send + Sync {
    /// Returns the workspace for `root` and its active pane, creating both
    /// on first use.
    fn ensure_workspace(&self, root: &Path) -> StoreResult<(WorkspaceRecord, PaneRecord)>;

    fn upsert_file(&self, file: FileUpsert) -> StoreResult<FileRecord>;

    fn select_file(&self, path: &Path) -> StoreResult<Option<FileRecord>>;

    /// Removes the file record together with its editors and pane items.
    fn delete_file(&self, path: &Path) -> StoreResult<bool>;

    fn upsert_editor(&self, editor: EditorUpsert) -> StoreResult<EditorRecord>;

    fn update_editor_state(&self, update: EditorStateUpdate) -> StoreResult<()>;

    fn select_latest_editor_for_file(&self, path: &Path) -> StoreResult<Option<EditorRecord>>;

    fn select_editor_by_id(&self, id: EditorId) -> StoreResult<Option<EditorRecord>>;

    fn select_editor_in_pane(
        &self,
        pane_id: PaneId,
        file_id: FileId,
    ) -> StoreResult<Option<EditorRecord>>;

    /// Drops cached structured state and selection for every editor of
    /// `path`. Returns how many editors were cleared.
    fn clear_editor_states_for_file(&self, path: &Path) -> StoreResult<usize>;

    /// Creates (or reuses) the pane item for `editor_id`, makes it active,
    /// and bumps its access time.
    fn activate_editor_in_pane(
        &self,
        editor_id: EditorId,
        pane_id: PaneId,
    ) -> StoreResult<PaneItemId>;

    /// Deletes the item and compacts positions. When the closed item was
    /// active (per the caller or the stored pointer), returns the most
    /// recently accessed remaining item (now active), or `None` with the
    /// active pointer cleared.
    fn close_pane_item_and_get_next(
        &self,
        item_id: PaneItemId,
        is_closing_active: bool,
    ) -> StoreResult<Option<PaneItem>>;

    fn set_pane_active_item(
        &self,
        pane_id: PaneId,
        item_id: Option<PaneItemId>,
    ) -> StoreResult<()>;

    fn touch_pane_item_accessed_at(&self, item_id: PaneItemId) -> StoreResult<()>;

    fn pane_items(&self, pane_id: PaneId) -> StoreResult<Vec<PaneItem>>;

    fn active_pane_item(&self, pane_id: PaneId) -> StoreResult<Option<PaneItem>>;

    fn count_pane_items_for_file(&self, path: &Path) -> StoreResult<usize>;
}
