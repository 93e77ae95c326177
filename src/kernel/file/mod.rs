//! Per-file lifecycle machines and their registry.

mod epoch;
mod lifecycle;
mod registry;

pub use epoch::EpochBoard;
pub use lifecycle::{FileEffect, FileEvent, FileLifecycle, FileState};
pub use registry::FileRegistry;
