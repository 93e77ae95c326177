//! Decides what an editor surface loads: cached blocks, cached blocks
//! flattened for another view, or the file as it is on disk.

use crate::kernel::file::EpochBoard;
use crate::kernel::language::{FileType, ViewKind};
use crate::kernel::pane::ops::choose_view;
use crate::kernel::services::ports::{
    AsyncExecutor, CodecError, DocumentCodec, DocumentState, EditorRecord, EditorUpsert,
    FileError, FileSystem, FileUpsert, SerializedSelection, Store, StoreError,
};
use crate::models::{Cid, EditorId, PaneId};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorManagerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    File(#[from] FileError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentRequest {
    pub path: PathBuf,
    pub pane_id: PaneId,
    pub view_kind: Option<ViewKind>,
    pub editor_id: Option<EditorId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorCache {
    pub editor_id: EditorId,
    pub view_kind: ViewKind,
    pub state: DocumentState,
    pub selection: Option<SerializedSelection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorFile {
    /// `None` while the editor row for a switched view is still being written
    /// in another pane.
    pub editor_id: Option<EditorId>,
    pub view_kind: ViewKind,
    pub file_type: FileType,
    pub content: String,
    pub cid: Cid,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InitialContent {
    State(EditorCache),
    File(EditorFile),
}

pub struct EditorManager {
    store: Arc<dyn Store>,
    fs: Arc<dyn FileSystem>,
    codec: Arc<dyn DocumentCodec>,
    executor: Arc<dyn AsyncExecutor>,
    epochs: EpochBoard,
}

impl EditorManager {
    pub fn new(
        store: Arc<dyn Store>,
        fs: Arc<dyn FileSystem>,
        codec: Arc<dyn DocumentCodec>,
        executor: Arc<dyn AsyncExecutor>,
        epochs: EpochBoard,
    ) -> Self {
        Self {
            store,
            fs,
            codec,
            executor,
            epochs,
        }
    }

    pub fn read_state_or_file(
        &self,
        request: &ContentRequest,
    ) -> Result<InitialContent, EditorManagerError> {
        let cached = match request.editor_id {
            Some(id) => self.store.select_editor_by_id(id)?,
            None => self.store.select_latest_editor_for_file(&request.path)?,
        };

        let Some(editor) = cached else {
            return self.load_file(request, None);
        };
        let Some(state) = editor.state.clone() else {
            // Row exists but its cache was cleared: re-derive from disk.
            return self.load_file(request, Some(editor.view_kind));
        };

        match request.view_kind {
            Some(target) if target != editor.view_kind => {
                self.switch_view(request, &editor, &state, target)
            }
            _ => Ok(InitialContent::State(EditorCache {
                editor_id: editor.id,
                view_kind: editor.view_kind,
                state,
                selection: editor.selection,
            })),
        }
    }

    fn switch_view(
        &self,
        request: &ContentRequest,
        editor: &EditorRecord,
        state: &DocumentState,
        target: ViewKind,
    ) -> Result<InitialContent, EditorManagerError> {
        let file_type = FileType::from_path(&request.path);
        let content = self.codec.serialize(file_type, state)?;
        let cid = Cid::of(&content);

        let store = Arc::clone(&self.store);
        let epochs = self.epochs.clone();
        let epoch = epochs.current(&request.path);
        let path = request.path.clone();
        let upsert = EditorUpsert {
            pane_id: request.pane_id,
            file_id: editor.file_id,
            view_kind: target,
        };
        self.executor.spawn_future(async move {
            if !epochs.is_current(&path, epoch) {
                tracing::debug!(path = %path.display(), epoch, "view switch dropped: cache invalidated");
                return;
            }
            if let Err(e) = store.upsert_editor(upsert) {
                tracing::warn!(path = %path.display(), error = %e, "failed to record view switch");
            }
        });

        tracing::debug!(
            path = %request.path.display(),
            from = %editor.view_kind,
            to = %target,
            "serving cached state in another view"
        );
        Ok(InitialContent::File(EditorFile {
            editor_id: (editor.pane_id == request.pane_id).then_some(editor.id),
            view_kind: target,
            file_type,
            content,
            cid,
        }))
    }

    fn load_file(
        &self,
        request: &ContentRequest,
        existing_view: Option<ViewKind>,
    ) -> Result<InitialContent, EditorManagerError> {
        let file = self.fs.read(&request.path)?;
        let record = self.store.upsert_file(FileUpsert {
            path: file.path.clone(),
            cid: file.cid.clone(),
            mtime: file.etag.modified_at(),
        })?;
        let view_kind = choose_view(file.file_type, request.view_kind, existing_view);
        let editor = self.store.upsert_editor(EditorUpsert {
            pane_id: request.pane_id,
            file_id: record.id,
            view_kind,
        })?;

        Ok(InitialContent::File(EditorFile {
            editor_id: Some(editor.id),
            view_kind,
            file_type: file.file_type,
            content: file.content,
            cid: file.cid,
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/editor_manager.rs"]
mod tests;
