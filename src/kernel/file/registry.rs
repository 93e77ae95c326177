//! Keyed singleton registry: one `FileLifecycle` per absolute path.

use super::epoch::EpochBoard;
use super::lifecycle::{FileEffect, FileEvent, FileLifecycle, FileState};
use crate::kernel::machine::{DispatchResult, StateMachine};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct FileRegistry {
    machines: FxHashMap<PathBuf, FileLifecycle>,
    epochs: EpochBoard,
}

impl FileRegistry {
    pub fn new(epochs: EpochBoard) -> Self {
        Self {
            machines: FxHashMap::default(),
            epochs,
        }
    }

    pub fn epochs(&self) -> &EpochBoard {
        &self.epochs
    }

    /// Returns the lifecycle for `path`, creating it on first touch.
    pub fn ensure(&mut self, path: &Path) -> &mut FileLifecycle {
        let epochs = &self.epochs;
        self.machines.entry(path.to_path_buf()).or_insert_with(|| {
            let epoch = epochs.current(path);
            tracing::debug!(path = %path.display(), epoch, "file lifecycle created");
            FileLifecycle::new(path.to_path_buf()).with_epoch(epoch)
        })
    }

    pub fn get(&self, path: &Path) -> Option<&FileLifecycle> {
        self.machines.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.machines.contains_key(path)
    }

    pub fn state(&self, path: &Path) -> Option<FileState> {
        self.machines.get(path).map(|m| m.state())
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.machines.keys().map(PathBuf::as_path)
    }

    /// True when no lifecycle has an effect in flight.
    pub fn all_settled(&self) -> bool {
        self.machines.values().all(|m| m.state().is_settled())
    }

    /// Dispatches to the lifecycle for `path`, creating it if needed.
    pub fn dispatch(&mut self, path: &Path, event: FileEvent) -> DispatchResult<FileEffect> {
        let machine = self.ensure(path);
        let result = machine.dispatch(event);
        let epoch = machine.epoch();
        self.epochs.publish(path, epoch);
        result
    }

    /// Dispatches only when a lifecycle already exists for `path`.
    pub fn dispatch_existing(
        &mut self,
        path: &Path,
        event: FileEvent,
    ) -> Option<DispatchResult<FileEffect>> {
        let machine = self.machines.get_mut(path)?;
        let result = machine.dispatch(event);
        self.epochs.publish(path, machine.epoch());
        Some(result)
    }

    /// Drops the lifecycle when it holds nothing worth keeping.
    pub fn evict_if_disposable(&mut self, path: &Path) -> bool {
        let disposable = self
            .machines
            .get(path)
            .is_some_and(|m| m.state().is_disposable() && !m.has_held_external_change());
        if disposable {
            self.machines.remove(path);
            tracing::debug!(path = %path.display(), "file lifecycle evicted");
        }
        disposable
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/file/registry.rs"]
mod tests;
