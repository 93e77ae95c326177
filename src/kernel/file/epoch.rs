use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Cross-thread view of each path's current cache epoch.
///
/// The loop thread publishes after every lifecycle dispatch; detached tasks
/// read it to drop writes that were scheduled before an invalidation.
#[derive(Debug, Clone, Default)]
pub struct EpochBoard {
    epochs: Arc<RwLock<FxHashMap<PathBuf, u64>>>,
}

impl EpochBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self, path: &Path) -> u64 {
        self.epochs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    pub fn publish(&self, path: &Path, epoch: u64) {
        let mut epochs = self.epochs.write().unwrap_or_else(PoisonError::into_inner);
        match epochs.get_mut(path) {
            Some(current) => *current = epoch,
            None => {
                epochs.insert(path.to_path_buf(), epoch);
            }
        }
    }

    pub fn is_current(&self, path: &Path, epoch: u64) -> bool {
        self.current(path) == epoch
    }
}
