//! Workspace file tree arena.

use crate::models::{Cid, Etag};
use rustc_hash::FxHashSet;
use slotmap::{new_key_type, SlotMap};
use std::{
    collections::{BTreeMap, HashMap},
    ffi::OsString,
    path::{Path, PathBuf},
};
use thiserror::Error;

new_key_type! { pub struct NodeId; }

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir,
}

/// Whether a folder's children have been read from disk.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Loaded,
}

#[derive(Debug, Error)]
pub enum FileTreeError {
    #[error("parent is not a directory")]
    ParentNotDirectory,
    #[error("name already exists in parent")]
    NameExists,
    #[error("invalid node id")]
    InvalidNodeId,
}

/// On-disk identity of a file node, refreshed from watcher events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub etag: Etag,
    pub cid: Cid,
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    name: OsString,
    parent: Option<NodeId>,
    children: Option<BTreeMap<OsString, NodeId>>,
    load_state: LoadState,
    meta: Option<FileMeta>,
}

impl Node {
    fn new_file(name: OsString, parent: Option<NodeId>) -> Self {
        Self {
            kind: NodeKind::File,
            name,
            parent,
            children: None,
            load_state: LoadState::Loaded,
            meta: None,
        }
    }

    fn new_dir(name: OsString, parent: Option<NodeId>, load_state: LoadState) -> Self {
        Self {
            kind: NodeKind::Dir,
            name,
            parent,
            children: Some(BTreeMap::new()),
            load_state,
            meta: None,
        }
    }
}

#[derive(Debug)]
pub struct FileTree {
    arena: SlotMap<NodeId, Node>,
    root: NodeId,
    expanded: FxHashSet<NodeId>,
    absolute_root: PathBuf,
    path_cache: HashMap<NodeId, PathBuf>,
    id_by_path: HashMap<PathBuf, NodeId>,
}

impl FileTree {
    pub fn new(absolute_root: PathBuf) -> Self {
        let root_name = absolute_root
            .file_name()
            .unwrap_or(absolute_root.as_os_str())
            .to_os_string();
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Node::new_dir(root_name, None, LoadState::Loaded));

        let mut expanded = FxHashSet::default();
        expanded.insert(root);

        Self {
            arena,
            root,
            expanded,
            absolute_root,
            path_cache: HashMap::new(),
            id_by_path: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn absolute_root(&self) -> &Path {
        &self.absolute_root
    }

    pub fn load_state(&self, id: NodeId) -> Option<LoadState> {
        self.arena.get(id).map(|n| n.load_state)
    }

    pub fn set_load_state(&mut self, id: NodeId, state: LoadState) {
        if let Some(node) = self.arena.get_mut(id) {
            node.load_state = state;
        }
    }

    pub fn meta(&self, id: NodeId) -> Option<&FileMeta> {
        self.arena.get(id).and_then(|n| n.meta.as_ref())
    }

    pub fn set_meta(&mut self, id: NodeId, meta: FileMeta) {
        if let Some(node) = self.arena.get_mut(id) {
            if node.kind == NodeKind::File {
                node.meta = Some(meta);
            }
        }
    }

    pub fn insert_child(
        &mut self,
        parent: NodeId,
        name: OsString,
        kind: NodeKind,
    ) -> Result<NodeId, FileTreeError> {
        self.insert_child_with_state(parent, name, kind, LoadState::NotLoaded)
    }

    pub fn insert_child_with_state(
        &mut self,
        parent: NodeId,
        name: OsString,
        kind: NodeKind,
        load_state: LoadState,
    ) -> Result<NodeId, FileTreeError> {
        {
            let parent_ro = self.arena.get(parent).ok_or(FileTreeError::InvalidNodeId)?;
            let children_ro = parent_ro
                .children
                .as_ref()
                .ok_or(FileTreeError::ParentNotDirectory)?;
            if children_ro.contains_key(&name) {
                return Err(FileTreeError::NameExists);
            }
        }

        let node = match kind {
            NodeKind::File => Node::new_file(name.clone(), Some(parent)),
            NodeKind::Dir => Node::new_dir(name.clone(), Some(parent), load_state),
        };
        let id = self.arena.insert(node);

        let parent_node = self
            .arena
            .get_mut(parent)
            .ok_or(FileTreeError::InvalidNodeId)?;
        let children = parent_node
            .children
            .as_mut()
            .ok_or(FileTreeError::ParentNotDirectory)?;
        children.insert(name, id);

        Ok(id)
    }

    pub fn full_path(&mut self, id: NodeId) -> PathBuf {
        if id == self.root {
            self.id_by_path.insert(self.absolute_root.clone(), self.root);
            return self.absolute_root.clone();
        }

        if let Some(cached_path) = self.path_cache.get(&id) {
            return cached_path.clone();
        }

        let mut path = self.absolute_root.clone();
        let mut current = id;
        let mut components = vec![];

        while let Some(node) = self.arena.get(current) {
            if let Some(parent) = node.parent {
                components.push(node.name.as_os_str());
                current = parent;
            } else {
                break;
            }
        }

        for comp in components.iter().rev() {
            path.push(comp);
        }

        self.path_cache.insert(id, path.clone());
        self.id_by_path.insert(path.clone(), id);
        path
    }

    pub fn delete(&mut self, id: NodeId) -> Result<(), FileTreeError> {
        if id == self.root {
            return Err(FileTreeError::InvalidNodeId);
        }

        let (parent, name) = {
            let node = self.arena.get(id).ok_or(FileTreeError::InvalidNodeId)?;
            (node.parent, node.name.clone())
        };

        if let Some(parent_id) = parent {
            if let Some(children) = self
                .arena
                .get_mut(parent_id)
                .and_then(|n| n.children.as_mut())
            {
                children.remove(&name);
            }
        }

        self.recursive_remove(id);
        Ok(())
    }

    fn recursive_remove(&mut self, id: NodeId) {
        if let Some(node) = self.arena.get(id).cloned() {
            if let Some(children) = node.children {
                for (_, child_id) in children {
                    self.recursive_remove(child_id);
                }
            }

            self.expanded.remove(&id);
            if let Some(path) = self.path_cache.remove(&id) {
                self.id_by_path.remove(&path);
            }

            self.arena.remove(id);
        }
    }

    pub fn toggle_expand(&mut self, id: NodeId) {
        if self.arena.get(id).is_some_and(|n| n.kind == NodeKind::Dir) {
            if self.expanded.contains(&id) {
                self.expanded.remove(&id);
            } else {
                self.expanded.insert(id);
            }
        }
    }

    pub fn expand(&mut self, id: NodeId) {
        if self.arena.get(id).is_some_and(|n| n.kind == NodeKind::Dir) {
            self.expanded.insert(id);
        }
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.arena.get(id).map(|n| n.kind)
    }

    pub fn is_dir(&self, id: NodeId) -> bool {
        self.arena
            .get(id)
            .map(|n| n.kind == NodeKind::Dir)
            .unwrap_or(false)
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn children(&self, id: NodeId) -> Option<impl Iterator<Item = (&OsString, &NodeId)>> {
        self.arena
            .get(id)
            .and_then(|n| n.children.as_ref())
            .map(|c| c.iter())
    }

    /// Absolute paths of every expanded folder, root excluded.
    pub fn expanded_paths(&mut self) -> Vec<PathBuf> {
        let ids: Vec<NodeId> = self
            .expanded
            .iter()
            .copied()
            .filter(|id| *id != self.root)
            .collect();
        ids.into_iter().map(|id| self.full_path(id)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct FileTreeRow {
    pub id: NodeId,
    pub depth: u16,
    pub name: OsString,
    pub is_dir: bool,
    pub is_expanded: bool,
    pub load_state: LoadState,
}

impl FileTree {
    pub fn flatten_for_view(&self) -> Vec<FileTreeRow> {
        let mut result = Vec::new();
        let mut stack: Vec<(NodeId, u16)> = vec![(self.root, 0)];

        while let Some((id, depth)) = stack.pop() {
            if id != self.root {
                if let Some(node) = self.arena.get(id) {
                    result.push(FileTreeRow {
                        id,
                        depth,
                        name: node.name.clone(),
                        is_dir: node.kind == NodeKind::Dir,
                        is_expanded: self.expanded.contains(&id),
                        load_state: node.load_state,
                    });
                }
            }

            if self.expanded.contains(&id) {
                if let Some(node) = self.arena.get(id) {
                    if let Some(children) = &node.children {
                        let mut dirs = Vec::new();
                        let mut files = Vec::new();

                        for (name, &child_id) in children.iter() {
                            if let Some(child) = self.arena.get(child_id) {
                                if child.kind == NodeKind::Dir {
                                    dirs.push((name.clone(), child_id));
                                } else {
                                    files.push((name.clone(), child_id));
                                }
                            }
                        }

                        for (_, file_id) in files.into_iter().rev() {
                            stack.push((file_id, depth + 1));
                        }
                        for (_, dir_id) in dirs.into_iter().rev() {
                            stack.push((dir_id, depth + 1));
                        }
                    }
                }
            }
        }

        result
    }

    pub fn find_node_by_path(&mut self, path: &Path) -> Option<NodeId> {
        if path == self.absolute_root {
            self.id_by_path.insert(self.absolute_root.clone(), self.root);
            return Some(self.root);
        }

        if let Some(id) = self.id_by_path.get(path).copied() {
            if self.arena.contains_key(id) {
                return Some(id);
            }
        }

        let relative = path.strip_prefix(&self.absolute_root).ok()?;
        let mut current = self.root;

        for component in relative.components() {
            let name = component.as_os_str();
            let children = self.arena.get(current)?.children.as_ref()?;
            current = *children.get(name)?;
        }

        self.path_cache.insert(current, path.to_path_buf());
        self.id_by_path.insert(path.to_path_buf(), current);
        Some(current)
    }
}

pub fn should_ignore(name: &str) -> bool {
    matches!(
        name,
        ".DS_Store"
            | ".Spotlight-V100"
            | ".Trashes"
            | ".fseventsd"
            | ".TemporaryItems"
            | "Thumbs.db"
            | "desktop.ini"
            | ".git"
            | "node_modules"
    )
}

#[cfg(test)]
#[path = "../../tests/unit/models/file_tree.rs"]
mod tests;
