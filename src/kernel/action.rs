use crate::kernel::file::FileEvent;
use crate::kernel::file_tree_store::WatchEvent;
use crate::kernel::pane::{PaneCommand, PaneOutcome};
use crate::kernel::services::ports::DirEntry;
use crate::models::PaneId;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum Action {
    /// User edits and async completions for one file.
    File {
        path: PathBuf,
        event: FileEvent,
    },
    Pane {
        pane_id: PaneId,
        command: PaneCommand,
    },
    PaneSettled {
        pane_id: PaneId,
        outcome: PaneOutcome,
    },
    Watch(WatchEvent),
    ResolveFolder(PathBuf),
    ToggleFolder(PathBuf),
    RefreshTree,
    DirLoaded {
        path: PathBuf,
        entries: Vec<DirEntry>,
    },
    DirLoadError {
        path: PathBuf,
        error: String,
    },
}

impl Action {
    pub fn file(path: impl Into<PathBuf>, event: FileEvent) -> Self {
        Self::File {
            path: path.into(),
            event,
        }
    }
}
