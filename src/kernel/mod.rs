//! Headless document core (state machines/action/effect).

pub mod action;
pub mod core;
pub mod editor_manager;
pub mod effect;
pub mod file;
pub mod file_tree_store;
pub mod language;
pub mod machine;
pub mod pane;
pub mod route;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use action::Action;
pub use self::core::Core;
pub use editor_manager::{ContentRequest, EditorManager, EditorManagerError, InitialContent};
pub use effect::Effect;
pub use file::{EpochBoard, FileEffect, FileEvent, FileLifecycle, FileRegistry, FileState};
pub use file_tree_store::{FileTreeStore, TreeSignal, WatchEvent, WatchKind};
pub use language::{FileType, ViewKind};
pub use machine::{DispatchResult, StateMachine};
pub use pane::{OpenRequest, PaneCommand, PaneMachine, PaneOutcome, PaneState};
pub use route::{OpenSource, Route};
