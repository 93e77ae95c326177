//! Navigator and notifier for running without a view layer: routes are
//! remembered and notices go to the log.

use crate::kernel::route::Route;
use crate::kernel::services::ports::{NavigationError, Navigator, Notice, NoticeLevel, Notifier};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct HeadlessNavigator {
    current: Mutex<Option<Route>>,
    generation: AtomicU64,
}

impl HeadlessNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Route> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bumped by every navigation and invalidation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Navigator for HeadlessNavigator {
    fn navigate(&self, route: Route) {
        tracing::info!(?route, "navigate");
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(route);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn invalidate(&self) -> Result<(), NavigationError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, route = ?self.current(), "route invalidated");
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        let path = notice.path.as_ref().map(|p| p.display().to_string());
        let detail = notice.detail.as_deref().unwrap_or_default();
        match notice.level {
            NoticeLevel::Info => tracing::info!(title = %notice.title, ?path, detail, "notice"),
            NoticeLevel::Warning => tracing::warn!(title = %notice.title, ?path, detail, "notice"),
            NoticeLevel::Error => tracing::error!(title = %notice.title, ?path, detail, "notice"),
        }
    }
}
