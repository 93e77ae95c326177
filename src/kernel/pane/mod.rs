//! Pane (tab strip) orchestration.

mod machine;
pub mod ops;

pub use machine::{OpenRequest, PaneCommand, PaneEffect, PaneEvent, PaneMachine, PaneState};
pub use ops::{PaneError, PaneOutcome, PaneServices};
