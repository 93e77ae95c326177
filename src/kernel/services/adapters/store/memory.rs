//! Store adapter backed by in-memory tables, optionally snapshotted to a
//! JSON file after every mutating call.

use crate::kernel::language::FileType;
use crate::kernel::services::ports::{
    EditorRecord, EditorStateUpdate, EditorUpsert, FileRecord, FileUpsert, PaneItem, PaneRecord,
    Store, StoreError, StoreResult, WorkspaceRecord,
};
use crate::models::{EditorId, FileId, PaneId, PaneItemId, WorkspaceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Counters {
    workspace: u64,
    pane: u64,
    file: u64,
    editor: u64,
    item: u64,
    /// Logical clock breaking ties between equal timestamps.
    seq: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EditorRow {
    #[serde(flatten)]
    record: EditorRecord,
    seq: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ItemRow {
    id: PaneItemId,
    pane_id: PaneId,
    editor_id: Option<EditorId>,
    file_id: FileId,
    position: u32,
    accessed_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    counters: Counters,
    workspaces: BTreeMap<u64, WorkspaceRecord>,
    panes: BTreeMap<u64, PaneRecord>,
    files: BTreeMap<u64, FileRecord>,
    editors: BTreeMap<u64, EditorRow>,
    items: BTreeMap<u64, ItemRow>,
}

impl Tables {
    fn tick(&mut self) -> u64 {
        self.counters.seq += 1;
        self.counters.seq
    }

    fn file_by_path(&self, path: &Path) -> Option<&FileRecord> {
        self.files.values().find(|f| f.path == path)
    }

    fn pane_mut(&mut self, pane_id: PaneId) -> StoreResult<&mut PaneRecord> {
        self.panes
            .get_mut(&pane_id.0)
            .ok_or_else(|| StoreError::not_found("pane", pane_id))
    }

    fn join_item(&self, row: &ItemRow) -> Option<PaneItem> {
        let file = self.files.get(&row.file_id.0)?;
        let view_kind = row
            .editor_id
            .and_then(|id| self.editors.get(&id.0))
            .map(|e| e.record.view_kind)
            .unwrap_or_else(|| FileType::from_path(&file.path).default_view());
        Some(PaneItem {
            id: row.id,
            pane_id: row.pane_id,
            editor_id: row.editor_id,
            file_path: file.path.clone(),
            view_kind,
            position: row.position,
            accessed_at: row.accessed_at,
        })
    }

    fn recompact(&mut self, pane_id: PaneId) {
        let mut rows: Vec<&mut ItemRow> = self
            .items
            .values_mut()
            .filter(|r| r.pane_id == pane_id)
            .collect();
        rows.sort_by_key(|r| r.position);
        for (position, row) in rows.into_iter().enumerate() {
            row.position = position as u32;
        }
    }

    fn most_recent_item(&self, pane_id: PaneId) -> Option<&ItemRow> {
        self.items
            .values()
            .filter(|r| r.pane_id == pane_id)
            .max_by_key(|r| (r.accessed_at, r.seq))
    }

    fn editors_for_file(&self, file_id: FileId) -> impl Iterator<Item = &EditorRow> {
        self.editors
            .values()
            .filter(move |e| e.record.file_id == file_id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    snapshot: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `path` if it exists; every later mutation rewrites it.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let tables = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tables::default(),
            Err(source) => return Err(StoreError::Persist { path, source }),
        };
        tracing::info!(path = %path.display(), "store opened");
        Ok(Self {
            tables: Mutex::new(tables),
            snapshot: Some(path),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }

    fn persist(&self, tables: &Tables) -> StoreResult<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(tables)?;
        let io_err = |source| StoreError::Persist {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)
    }

    /// Applies `f` to a copy; the copy replaces the live tables only once it
    /// is persisted, so a failed call leaves nothing behind.
    fn mutate<T>(&self, f: impl FnOnce(&mut Tables) -> StoreResult<T>) -> StoreResult<T> {
        let mut tables = self.lock()?;
        let mut next = tables.clone();
        let value = f(&mut next)?;
        self.persist(&next)?;
        *tables = next;
        Ok(value)
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> StoreResult<T> {
        let tables = self.lock()?;
        Ok(f(&tables))
    }
}

impl Store for MemoryStore {
    fn ensure_workspace(&self, root: &Path) -> StoreResult<(WorkspaceRecord, PaneRecord)> {
        self.mutate(|t| {
            let existing = t.workspaces.values().find(|w| w.path == root).cloned();
            let mut workspace = match existing {
                Some(workspace) => workspace,
                None => {
                    t.counters.workspace += 1;
                    let workspace = WorkspaceRecord {
                        id: WorkspaceId(t.counters.workspace),
                        path: root.to_path_buf(),
                        layout: serde_json::Value::Null,
                        active_pane_id: None,
                    };
                    t.workspaces.insert(workspace.id.0, workspace.clone());
                    tracing::debug!(workspace = %workspace.id, root = %root.display(), "workspace created");
                    workspace
                }
            };

            let pane = workspace
                .active_pane_id
                .and_then(|id| t.panes.get(&id.0))
                .cloned();
            let pane = match pane {
                Some(pane) => pane,
                None => {
                    t.counters.pane += 1;
                    let position = t
                        .panes
                        .values()
                        .filter(|p| p.workspace_id == workspace.id)
                        .count() as u32;
                    let pane = PaneRecord {
                        id: PaneId(t.counters.pane),
                        workspace_id: workspace.id,
                        position,
                        active_item_id: None,
                    };
                    t.panes.insert(pane.id.0, pane.clone());
                    workspace.active_pane_id = Some(pane.id);
                    t.workspaces.insert(workspace.id.0, workspace.clone());
                    pane
                }
            };
            Ok((workspace, pane))
        })
    }

    fn upsert_file(&self, file: FileUpsert) -> StoreResult<FileRecord> {
        self.mutate(|t| {
            let now = Utc::now();
            if let Some(record) = t.files.values_mut().find(|f| f.path == file.path) {
                record.cid = file.cid;
                record.mtime = file.mtime;
                record.last_accessed_at = now;
                return Ok(record.clone());
            }
            t.counters.file += 1;
            let record = FileRecord {
                id: FileId(t.counters.file),
                path: file.path,
                cid: file.cid,
                mtime: file.mtime,
                last_accessed_at: now,
            };
            t.files.insert(record.id.0, record.clone());
            Ok(record)
        })
    }

    fn select_file(&self, path: &Path) -> StoreResult<Option<FileRecord>> {
        self.read(|t| t.file_by_path(path).cloned())
    }

    fn delete_file(&self, path: &Path) -> StoreResult<bool> {
        self.mutate(|t| {
            let Some(file_id) = t.file_by_path(path).map(|f| f.id) else {
                return Ok(false);
            };
            t.files.remove(&file_id.0);
            t.editors.retain(|_, e| e.record.file_id != file_id);

            let removed: Vec<(PaneItemId, PaneId)> = t
                .items
                .values()
                .filter(|r| r.file_id == file_id)
                .map(|r| (r.id, r.pane_id))
                .collect();
            for (item_id, pane_id) in &removed {
                t.items.remove(&item_id.0);
                if let Some(pane) = t.panes.get_mut(&pane_id.0) {
                    if pane.active_item_id == Some(*item_id) {
                        pane.active_item_id = None;
                    }
                }
            }
            let mut panes: Vec<PaneId> = removed.into_iter().map(|(_, pane)| pane).collect();
            panes.dedup();
            for pane_id in panes {
                t.recompact(pane_id);
            }
            tracing::debug!(path = %path.display(), "file record deleted");
            Ok(true)
        })
    }

    fn upsert_editor(&self, editor: EditorUpsert) -> StoreResult<EditorRecord> {
        self.mutate(|t| {
            let seq = t.tick();
            let now = Utc::now();
            if let Some(row) = t
                .editors
                .values_mut()
                .find(|e| e.record.pane_id == editor.pane_id && e.record.file_id == editor.file_id)
            {
                row.record.view_kind = editor.view_kind;
                row.record.updated_at = now;
                row.seq = seq;
                return Ok(row.record.clone());
            }
            if !t.files.contains_key(&editor.file_id.0) {
                return Err(StoreError::not_found("file", editor.file_id));
            }
            t.counters.editor += 1;
            let record = EditorRecord {
                id: EditorId(t.counters.editor),
                pane_id: editor.pane_id,
                file_id: editor.file_id,
                view_kind: editor.view_kind,
                state: None,
                selection: None,
                updated_at: now,
            };
            t.editors.insert(
                record.id.0,
                EditorRow {
                    record: record.clone(),
                    seq,
                },
            );
            Ok(record)
        })
    }

    fn update_editor_state(&self, update: EditorStateUpdate) -> StoreResult<()> {
        self.mutate(|t| {
            let seq = t.tick();
            let row = t
                .editors
                .get_mut(&update.id.0)
                .ok_or_else(|| StoreError::not_found("editor", update.id))?;
            row.record.state = update.state;
            row.record.selection = update.selection;
            row.record.updated_at = Utc::now();
            row.seq = seq;
            Ok(())
        })
    }

    fn select_latest_editor_for_file(&self, path: &Path) -> StoreResult<Option<EditorRecord>> {
        self.read(|t| {
            let file_id = t.file_by_path(path)?.id;
            t.editors_for_file(file_id)
                .max_by_key(|e| (e.record.updated_at, e.seq))
                .map(|e| e.record.clone())
        })
    }

    fn select_editor_by_id(&self, id: EditorId) -> StoreResult<Option<EditorRecord>> {
        self.read(|t| t.editors.get(&id.0).map(|e| e.record.clone()))
    }

    fn select_editor_in_pane(
        &self,
        pane_id: PaneId,
        file_id: FileId,
    ) -> StoreResult<Option<EditorRecord>> {
        self.read(|t| {
            t.editors_for_file(file_id)
                .find(|e| e.record.pane_id == pane_id)
                .map(|e| e.record.clone())
        })
    }

    fn clear_editor_states_for_file(&self, path: &Path) -> StoreResult<usize> {
        self.mutate(|t| {
            let Some(file_id) = t.file_by_path(path).map(|f| f.id) else {
                return Ok(0);
            };
            let mut cleared = 0;
            for row in t.editors.values_mut() {
                if row.record.file_id == file_id {
                    row.record.state = None;
                    row.record.selection = None;
                    cleared += 1;
                }
            }
            tracing::debug!(path = %path.display(), cleared, "editor states cleared");
            Ok(cleared)
        })
    }

    fn activate_editor_in_pane(
        &self,
        editor_id: EditorId,
        pane_id: PaneId,
    ) -> StoreResult<PaneItemId> {
        self.mutate(|t| {
            let file_id = t
                .editors
                .get(&editor_id.0)
                .map(|e| e.record.file_id)
                .ok_or_else(|| StoreError::not_found("editor", editor_id))?;
            t.pane_mut(pane_id)?;

            let seq = t.tick();
            let now = Utc::now();
            let existing = t
                .items
                .values_mut()
                .find(|r| r.pane_id == pane_id && r.editor_id == Some(editor_id));
            let item_id = match existing {
                Some(row) => {
                    row.accessed_at = now;
                    row.seq = seq;
                    row.id
                }
                None => {
                    let position = t.items.values().filter(|r| r.pane_id == pane_id).count() as u32;
                    t.counters.item += 1;
                    let row = ItemRow {
                        id: PaneItemId(t.counters.item),
                        pane_id,
                        editor_id: Some(editor_id),
                        file_id,
                        position,
                        accessed_at: now,
                        seq,
                    };
                    let id = row.id;
                    t.items.insert(id.0, row);
                    id
                }
            };
            t.pane_mut(pane_id)?.active_item_id = Some(item_id);
            Ok(item_id)
        })
    }

    fn close_pane_item_and_get_next(
        &self,
        item_id: PaneItemId,
        is_closing_active: bool,
    ) -> StoreResult<Option<PaneItem>> {
        self.mutate(|t| {
            let row = t
                .items
                .remove(&item_id.0)
                .ok_or_else(|| StoreError::not_found("pane item", item_id))?;
            t.recompact(row.pane_id);

            let pane = t.pane_mut(row.pane_id)?;
            let was_active = pane.active_item_id == Some(item_id);
            if !is_closing_active && !was_active {
                return Ok(None);
            }

            let next = t.most_recent_item(row.pane_id).map(|r| r.id);
            t.pane_mut(row.pane_id)?.active_item_id = next;
            Ok(next
                .and_then(|id| t.items.get(&id.0))
                .and_then(|r| t.join_item(r)))
        })
    }

    fn set_pane_active_item(
        &self,
        pane_id: PaneId,
        item_id: Option<PaneItemId>,
    ) -> StoreResult<()> {
        self.mutate(|t| {
            if let Some(id) = item_id {
                if !t.items.contains_key(&id.0) {
                    return Err(StoreError::not_found("pane item", id));
                }
            }
            t.pane_mut(pane_id)?.active_item_id = item_id;
            Ok(())
        })
    }

    fn touch_pane_item_accessed_at(&self, item_id: PaneItemId) -> StoreResult<()> {
        self.mutate(|t| {
            let seq = t.tick();
            let row = t
                .items
                .get_mut(&item_id.0)
                .ok_or_else(|| StoreError::not_found("pane item", item_id))?;
            row.accessed_at = Utc::now();
            row.seq = seq;
            Ok(())
        })
    }

    fn pane_items(&self, pane_id: PaneId) -> StoreResult<Vec<PaneItem>> {
        self.read(|t| {
            let mut items: Vec<PaneItem> = t
                .items
                .values()
                .filter(|r| r.pane_id == pane_id)
                .filter_map(|r| t.join_item(r))
                .collect();
            items.sort_by_key(|i| i.position);
            items
        })
    }

    fn active_pane_item(&self, pane_id: PaneId) -> StoreResult<Option<PaneItem>> {
        self.read(|t| {
            let id = t.panes.get(&pane_id.0)?.active_item_id?;
            t.items.get(&id.0).and_then(|r| t.join_item(r))
        })
    }

    fn count_pane_items_for_file(&self, path: &Path) -> StoreResult<usize> {
        self.read(|t| match t.file_by_path(path) {
            Some(file) => t.items.values().filter(|r| r.file_id == file.id).count(),
            None => 0,
        })
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/store/memory.rs"]
mod tests;
