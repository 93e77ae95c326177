//! In-memory mirror of the workspace tree.
//!
//! Folder listings merge into the tree without touching expanded state or
//! already-resolved subtrees. Watcher events update the tree and are turned
//! into at most one [`TreeSignal`] for the lifecycle layer.

use crate::kernel::services::ports::DirEntry;
use crate::models::{
    should_ignore, Cid, Etag, FileMeta, FileTree, FileTreeError, FileTreeRow, LoadState, NodeId,
    NodeKind,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WatchKind {
    AddFile,
    AddFolder,
    ContentChange,
    UnlinkFile,
    UnlinkFolder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEvent {
    pub kind: WatchKind,
    pub path: PathBuf,
    #[serde(default)]
    pub etag: Etag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<Cid>,
}

impl WatchEvent {
    pub fn new(kind: WatchKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            etag: Etag::default(),
            cid: None,
        }
    }

    pub fn with_identity(mut self, etag: Etag, cid: Option<Cid>) -> Self {
        self.etag = etag;
        self.cid = cid;
        self
    }
}

/// What a watcher event means for open documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeSignal {
    ExternalChange(PathBuf),
    FileRemoved(PathBuf),
    FolderRemoved(PathBuf),
    WorkspaceRemoved,
}

#[derive(Debug)]
pub struct FileTreeStore {
    tree: FileTree,
    pending_saves: FxHashMap<PathBuf, Cid>,
    ignored_names: FxHashSet<String>,
}

impl FileTreeStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            tree: FileTree::new(root),
            pending_saves: FxHashMap::default(),
            ignored_names: FxHashSet::default(),
        }
    }

    pub fn with_ignored_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn root(&self) -> &Path {
        self.tree.absolute_root()
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn rows(&self) -> Vec<FileTreeRow> {
        self.tree.flatten_for_view()
    }

    pub fn contains(&mut self, path: &Path) -> bool {
        self.tree.find_node_by_path(path).is_some()
    }

    pub fn is_resolved(&mut self, dir: &Path) -> bool {
        self.tree
            .find_node_by_path(dir)
            .and_then(|id| self.tree.load_state(id))
            == Some(LoadState::Loaded)
    }

    pub fn meta(&mut self, path: &Path) -> Option<FileMeta> {
        let id = self.tree.find_node_by_path(path)?;
        self.tree.meta(id).cloned()
    }

    pub fn expanded_paths(&mut self) -> Vec<PathBuf> {
        self.tree.expanded_paths()
    }

    /// Folders whose children are loaded, root first.
    pub fn resolved_folders(&mut self) -> Vec<PathBuf> {
        let mut folders = vec![self.root().to_path_buf()];
        let mut stack = vec![self.tree.root()];
        let mut ids = Vec::new();
        while let Some(id) = stack.pop() {
            let Some(children) = self.tree.children(id) else {
                continue;
            };
            for (_, &child) in children {
                if self.tree.is_dir(child)
                    && self.tree.load_state(child) == Some(LoadState::Loaded)
                {
                    ids.push(child);
                    stack.push(child);
                }
            }
        }
        folders.extend(ids.into_iter().map(|id| self.tree.full_path(id)));
        folders
    }

    fn is_ignored(&self, name: &str) -> bool {
        should_ignore(name) || self.ignored_names.contains(name)
    }

    fn is_ignored_path(&self, path: &Path) -> bool {
        path.strip_prefix(self.root())
            .map(|relative| {
                relative
                    .components()
                    .any(|c| self.is_ignored(&c.as_os_str().to_string_lossy()))
            })
            .unwrap_or(false)
    }

    /// Marks `dir` as being listed. Returns false for unknown or file paths.
    pub fn begin_resolve(&mut self, dir: &Path) -> bool {
        let Some(id) = self.tree.find_node_by_path(dir) else {
            return false;
        };
        if !self.tree.is_dir(id) {
            return false;
        }
        if self.tree.load_state(id) != Some(LoadState::Loaded) {
            self.tree.set_load_state(id, LoadState::Loading);
        }
        true
    }

    pub fn resolve_failed(&mut self, dir: &Path) {
        if let Some(id) = self.tree.find_node_by_path(dir) {
            if self.tree.load_state(id) == Some(LoadState::Loading) {
                self.tree.set_load_state(id, LoadState::NotLoaded);
            }
        }
    }

    /// Replaces the children of `dir` with `entries`, keeping nodes that are
    /// still present (and their expanded/resolved subtrees) untouched.
    pub fn merge_folder(&mut self, dir: &Path, entries: Vec<DirEntry>) -> Result<(), FileTreeError> {
        let id = self
            .tree
            .find_node_by_path(dir)
            .ok_or(FileTreeError::InvalidNodeId)?;
        if !self.tree.is_dir(id) {
            return Err(FileTreeError::ParentNotDirectory);
        }

        let wanted: FxHashMap<OsString, NodeKind> = entries
            .into_iter()
            .filter(|e| !self.is_ignored(&e.name.to_string_lossy()))
            .map(|e| (e.name, e.kind))
            .collect();

        let existing: Vec<(OsString, NodeId)> = self
            .tree
            .children(id)
            .map(|children| children.map(|(name, &child)| (name.clone(), child)).collect())
            .unwrap_or_default();

        let mut removed = 0usize;
        for (name, child) in &existing {
            let keep = wanted.get(name).copied() == self.tree.kind(*child);
            if !keep {
                self.tree.delete(*child)?;
                removed += 1;
            }
        }

        let mut added = 0usize;
        for (name, kind) in wanted {
            if self.tree.children(id).is_some_and(|mut c| c.any(|(n, _)| *n == name)) {
                continue;
            }
            self.tree.insert_child(id, name, kind)?;
            added += 1;
        }

        self.tree.set_load_state(id, LoadState::Loaded);
        tracing::debug!(dir = %dir.display(), added, removed, "folder merged");
        Ok(())
    }

    pub fn toggle(&mut self, dir: &Path) -> bool {
        match self.tree.find_node_by_path(dir) {
            Some(id) if self.tree.is_dir(id) => {
                self.tree.toggle_expand(id);
                self.tree.is_expanded(id)
            }
            _ => false,
        }
    }

    /// Remembers the cid being written so the watcher echo is swallowed.
    pub fn arm_pending_save(&mut self, path: &Path, cid: Cid) {
        self.pending_saves.insert(path.to_path_buf(), cid);
    }

    pub fn disarm_pending_save(&mut self, path: &Path) {
        self.pending_saves.remove(path);
    }

    pub fn has_pending_save(&self, path: &Path) -> bool {
        self.pending_saves.contains_key(path)
    }

    pub fn apply(&mut self, event: WatchEvent) -> Option<TreeSignal> {
        if event.kind == WatchKind::UnlinkFolder && event.path == self.root() {
            tracing::warn!(root = %event.path.display(), "workspace root removed");
            return Some(TreeSignal::WorkspaceRemoved);
        }
        if !event.path.starts_with(self.root()) || event.path == self.root() {
            tracing::debug!(path = %event.path.display(), "watch event outside workspace");
            return None;
        }
        if self.is_ignored_path(&event.path) {
            return None;
        }

        match event.kind {
            WatchKind::AddFile => {
                if self.tree.find_node_by_path(&event.path).is_some() {
                    // Atomic writes land as rename-over: an add for a known file.
                    return self.content_changed(event);
                }
                self.insert_node(&event.path, NodeKind::File, event.etag, event.cid);
                None
            }
            WatchKind::AddFolder => {
                if self.tree.find_node_by_path(&event.path).is_none() {
                    self.insert_node(&event.path, NodeKind::Dir, event.etag, None);
                }
                None
            }
            WatchKind::ContentChange => self.content_changed(event),
            WatchKind::UnlinkFile if self.is_known_dir(&event.path) => {
                self.apply(WatchEvent::new(WatchKind::UnlinkFolder, event.path))
            }
            WatchKind::UnlinkFile => {
                self.remove_node(&event.path);
                self.pending_saves.remove(&event.path);
                Some(TreeSignal::FileRemoved(event.path))
            }
            WatchKind::UnlinkFolder => {
                self.remove_node(&event.path);
                self.pending_saves.retain(|p, _| !p.starts_with(&event.path));
                Some(TreeSignal::FolderRemoved(event.path))
            }
        }
    }

    fn content_changed(&mut self, event: WatchEvent) -> Option<TreeSignal> {
        let node = self.tree.find_node_by_path(&event.path);

        if let (Some(pending), Some(cid)) = (self.pending_saves.get(&event.path), &event.cid) {
            if pending == cid {
                tracing::debug!(path = %event.path.display(), cid = %cid, "own save observed");
                self.pending_saves.remove(&event.path);
                if let Some(id) = node {
                    self.tree.set_meta(
                        id,
                        FileMeta {
                            etag: event.etag,
                            cid: cid.clone(),
                        },
                    );
                }
                return None;
            }
        }

        if let Some(id) = node {
            if let Some(known) = self.tree.meta(id) {
                let same_cid = event.cid.as_ref().map_or(true, |cid| *cid == known.cid);
                if known.etag == event.etag && same_cid {
                    tracing::trace!(path = %event.path.display(), "duplicate change dropped");
                    return None;
                }
            }
            if let Some(cid) = event.cid.clone() {
                self.tree.set_meta(
                    id,
                    FileMeta {
                        etag: event.etag,
                        cid,
                    },
                );
            }
        }

        Some(TreeSignal::ExternalChange(event.path))
    }

    fn insert_node(&mut self, path: &Path, kind: NodeKind, etag: Etag, cid: Option<Cid>) {
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return;
        };
        let Some(parent_id) = self.tree.find_node_by_path(parent) else {
            return;
        };
        // Unresolved folders pick the node up when they are listed.
        if self.tree.load_state(parent_id) != Some(LoadState::Loaded) {
            return;
        }

        let state = match kind {
            NodeKind::Dir => LoadState::Loaded,
            NodeKind::File => LoadState::NotLoaded,
        };
        match self
            .tree
            .insert_child_with_state(parent_id, name.to_os_string(), kind, state)
        {
            Ok(id) => {
                match (kind, cid) {
                    (NodeKind::Dir, _) => self.tree.expand(id),
                    (NodeKind::File, Some(cid)) => self.tree.set_meta(id, FileMeta { etag, cid }),
                    (NodeKind::File, None) => {}
                }
                tracing::debug!(path = %path.display(), ?kind, "tree node added");
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "tree node not added");
            }
        }
    }

    fn is_known_dir(&mut self, path: &Path) -> bool {
        self.tree
            .find_node_by_path(path)
            .is_some_and(|id| self.tree.is_dir(id))
    }

    fn remove_node(&mut self, path: &Path) {
        if let Some(id) = self.tree.find_node_by_path(path) {
            if let Err(e) = self.tree.delete(id) {
                tracing::warn!(path = %path.display(), error = %e, "tree node not removed");
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/file_tree_store.rs"]
mod tests;
