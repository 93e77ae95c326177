//! Single-threaded reducer over every machine in the workspace.
//!
//! `dispatch` never performs I/O: it routes an action to the machine that owns
//! it and returns the effects to run. Completions come back as actions.

use crate::kernel::action::Action;
use crate::kernel::effect::Effect;
use crate::kernel::file::{EpochBoard, FileEffect, FileEvent, FileRegistry, FileState};
use crate::kernel::file_tree_store::{FileTreeStore, TreeSignal};
use crate::kernel::machine::{DispatchResult, StateMachine};
use crate::kernel::pane::{PaneEvent, PaneMachine, PaneOutcome, PaneState};
use crate::kernel::route::Route;
use crate::models::{PaneId, WorkspaceId};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

pub struct Core {
    workspace_id: WorkspaceId,
    files: FileRegistry,
    panes: FxHashMap<PaneId, PaneMachine>,
    tree: FileTreeStore,
    listings_in_flight: usize,
}

impl Core {
    pub fn new(workspace_id: WorkspaceId, tree: FileTreeStore, epochs: EpochBoard) -> Self {
        Self {
            workspace_id,
            files: FileRegistry::new(epochs),
            panes: FxHashMap::default(),
            tree,
            listings_in_flight: 0,
        }
    }

    pub fn workspace_id(&self) -> WorkspaceId {
        self.workspace_id
    }

    pub fn root(&self) -> &Path {
        self.tree.root()
    }

    pub fn files(&self) -> &FileRegistry {
        &self.files
    }

    pub fn file_state(&self, path: &Path) -> Option<FileState> {
        self.files.state(path)
    }

    pub fn pane_state(&self, pane_id: PaneId) -> Option<PaneState> {
        self.panes.get(&pane_id).map(|p| p.state())
    }

    pub fn tree(&self) -> &FileTreeStore {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut FileTreeStore {
        &mut self.tree
    }

    /// True when no machine has work in flight or queued.
    pub fn is_settled(&self) -> bool {
        self.listings_in_flight == 0
            && self.files.all_settled()
            && self.panes.values().all(PaneMachine::is_idle)
    }

    pub fn dispatch(&mut self, action: Action) -> DispatchResult<Effect> {
        if matches!(action, Action::DirLoaded { .. } | Action::DirLoadError { .. }) {
            self.listings_in_flight = self.listings_in_flight.saturating_sub(1);
        }
        let result = self.reduce(action);
        self.listings_in_flight += result
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::LoadDir(_)))
            .count();
        result
    }

    fn reduce(&mut self, action: Action) -> DispatchResult<Effect> {
        match action {
            Action::File { path, event } => self.dispatch_file(&path, event),
            Action::Pane { pane_id, command } => {
                let workspace_id = self.workspace_id;
                self.panes
                    .entry(pane_id)
                    .or_insert_with(|| PaneMachine::new(workspace_id, pane_id))
                    .handle(PaneEvent::Command(command))
                    .map(Effect::Pane)
            }
            Action::PaneSettled { pane_id, outcome } => self.pane_settled(pane_id, outcome),
            Action::Watch(event) => match self.tree.apply(event) {
                Some(signal) => self.tree_signal(signal),
                None => DispatchResult::unchanged(),
            },
            Action::ResolveFolder(dir) => {
                if self.tree.is_resolved(&dir) || !self.tree.begin_resolve(&dir) {
                    return DispatchResult::unchanged();
                }
                DispatchResult {
                    effects: vec![Effect::LoadDir(dir)],
                    state_changed: true,
                }
            }
            Action::ToggleFolder(dir) => {
                let expanded = self.tree.toggle(&dir);
                let mut effects = Vec::new();
                if expanded && !self.tree.is_resolved(&dir) && self.tree.begin_resolve(&dir) {
                    effects.push(Effect::LoadDir(dir));
                }
                DispatchResult {
                    effects,
                    state_changed: true,
                }
            }
            Action::RefreshTree => DispatchResult {
                effects: self
                    .tree
                    .resolved_folders()
                    .into_iter()
                    .map(Effect::LoadDir)
                    .collect(),
                state_changed: false,
            },
            Action::DirLoaded { path, entries } => {
                if let Err(e) = self.tree.merge_folder(&path, entries) {
                    tracing::warn!(dir = %path.display(), error = %e, "folder listing not merged");
                    return DispatchResult::unchanged();
                }
                DispatchResult {
                    effects: Vec::new(),
                    state_changed: true,
                }
            }
            Action::DirLoadError { path, error } => {
                tracing::warn!(dir = %path.display(), error = %error, "folder listing failed");
                self.tree.resolve_failed(&path);
                DispatchResult {
                    effects: Vec::new(),
                    state_changed: true,
                }
            }
        }
    }

    fn dispatch_file(&mut self, path: &Path, event: FileEvent) -> DispatchResult<Effect> {
        if matches!(event, FileEvent::SaveFailed { .. }) {
            self.tree.disarm_pending_save(path);
        }
        let result = self.files.dispatch(path, event);
        self.file_effects(result)
    }

    fn file_effects(&mut self, result: DispatchResult<FileEffect>) -> DispatchResult<Effect> {
        for effect in &result.effects {
            if let FileEffect::Save { path, cid, .. } = effect {
                self.tree.arm_pending_save(path, cid.clone());
            }
        }
        result.map(Effect::File)
    }

    fn pane_settled(&mut self, pane_id: PaneId, outcome: PaneOutcome) -> DispatchResult<Effect> {
        let Some(pane) = self.panes.get_mut(&pane_id) else {
            tracing::warn!(pane = %pane_id, "settle for unknown pane");
            return DispatchResult::unchanged();
        };
        let mut result = pane.handle(PaneEvent::Settled).map(Effect::Pane);

        match outcome {
            PaneOutcome::Opened { path, .. } => {
                let hydrated = self
                    .files
                    .dispatch(&path, FileEvent::Hydrate { dirty: false });
                let hydrated = self.file_effects(hydrated);
                result.effects.extend(hydrated.effects);
            }
            PaneOutcome::Closed {
                path,
                still_open: false,
                ..
            } => {
                self.files.evict_if_disposable(&path);
            }
            PaneOutcome::Failed { command, error } => {
                tracing::warn!(pane = %pane_id, command, error = %error, "pane command settled with error");
            }
            PaneOutcome::Closed { .. }
            | PaneOutcome::Activated { .. }
            | PaneOutcome::NotFound { .. } => {}
        }
        result.state_changed = true;
        result
    }

    fn tree_signal(&mut self, signal: TreeSignal) -> DispatchResult<Effect> {
        match signal {
            TreeSignal::ExternalChange(path) => {
                match self.files.dispatch_existing(&path, FileEvent::ExternalChange) {
                    Some(result) => self.file_effects(result),
                    None => DispatchResult {
                        effects: Vec::new(),
                        state_changed: true,
                    },
                }
            }
            TreeSignal::FileRemoved(path) => {
                self.files.evict_if_disposable(&path);
                DispatchResult {
                    effects: vec![Effect::ForgetFile(path)],
                    state_changed: true,
                }
            }
            TreeSignal::FolderRemoved(dir) => {
                let gone: Vec<PathBuf> = self
                    .files
                    .paths()
                    .filter(|p| p.starts_with(&dir))
                    .map(Path::to_path_buf)
                    .collect();
                let mut effects = Vec::with_capacity(gone.len());
                for path in gone {
                    self.files.evict_if_disposable(&path);
                    effects.push(Effect::ForgetFile(path));
                }
                DispatchResult {
                    effects,
                    state_changed: true,
                }
            }
            TreeSignal::WorkspaceRemoved => DispatchResult {
                effects: vec![Effect::Navigate(Route::Home {
                    workspace_error: Some(self.tree.root().to_path_buf()),
                })],
                state_changed: true,
            },
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/core.rs"]
mod tests;
