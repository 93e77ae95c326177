use crate::kernel::route::Route;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("navigation failed: {0}")]
pub struct NavigationError(pub String);

/// The view layer's router.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);

    /// Re-runs loaders for the current route so it re-reads from disk.
    fn invalidate(&self) -> Result<(), NavigationError>;
}
