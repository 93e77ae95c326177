//! Lets tools outside the kernel wait until every tab of a file is closed.

use crate::kernel::services::ports::FileClosedListener;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tokio::sync::oneshot;

#[derive(Debug, Default)]
pub struct CloseWaiters {
    waiters: Mutex<FxHashMap<PathBuf, Vec<oneshot::Sender<()>>>>,
}

impl CloseWaiters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the next time a tab showing `path` is closed. Waiters whose
    /// receiver was dropped are pruned here.
    pub fn wait_for_close(&self, path: impl Into<PathBuf>) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let mut waiters = self.waiters.lock().unwrap_or_else(PoisonError::into_inner);
        waiters.retain(|_, senders| {
            senders.retain(|s| !s.is_closed());
            !senders.is_empty()
        });
        waiters.entry(path.into()).or_default().push(tx);
        rx
    }

    pub fn waiting(&self, path: &Path) -> usize {
        self.waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .map_or(0, Vec::len)
    }
}

impl FileClosedListener for CloseWaiters {
    fn file_closed(&self, path: &Path) {
        let waiters = self
            .waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path)
            .unwrap_or_default();
        if waiters.is_empty() {
            return;
        }
        tracing::debug!(path = %path.display(), waiters = waiters.len(), "releasing close waiters");
        for waiter in waiters {
            // Receiver may have given up waiting.
            let _ = waiter.send(());
        }
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/close_waiters.rs"]
mod tests;
