//! Per-path document lifecycle: dirty/saved/conflict tracking.
//!
//! Each asynchronous state (`Saving`, `Reparsing`, `ClearingState`,
//! `Reloading`) issues exactly one effect on entry and leaves only on the
//! matching completion event. Completions carry the epoch they were started
//! under; a completion from an older epoch is dropped.

use crate::kernel::language::{FileType, ViewKind};
use crate::kernel::machine::StateMachine;
use crate::kernel::services::ports::Notice;
use crate::models::Cid;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FileState {
    Idle,
    Clean,
    Dirty,
    Saving,
    Reparsing,
    ExternalChange,
    Conflict,
    ClearingState,
    Reloading,
}

impl FileState {
    /// True while no effect of this machine is in flight.
    pub fn is_settled(self) -> bool {
        !matches!(
            self,
            Self::Saving | Self::Reparsing | Self::ClearingState | Self::Reloading
        )
    }

    /// States in which the lifecycle may be dropped without losing anything.
    pub fn is_disposable(self) -> bool {
        matches!(self, Self::Idle | Self::Clean)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileEvent {
    Hydrate { dirty: bool },
    Edit,
    Save { content: String, view_kind: ViewKind },
    ExternalChange,
    Revert,
    Reload,
    ResolveOverwrite,
    ResolveDiscard,
    SaveSucceeded { epoch: u64 },
    SaveFailed { epoch: u64, error: String },
    ReparseComplete { epoch: u64 },
    ReparseFailed { epoch: u64, error: String },
    ClearDone { epoch: u64 },
    ClearFailed { epoch: u64, error: String },
    ReloadDone { epoch: u64 },
    ReloadFailed { epoch: u64, error: String },
}

impl FileEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hydrate { .. } => "hydrate",
            Self::Edit => "edit",
            Self::Save { .. } => "save",
            Self::ExternalChange => "external_change",
            Self::Revert => "revert",
            Self::Reload => "reload",
            Self::ResolveOverwrite => "resolve_overwrite",
            Self::ResolveDiscard => "resolve_discard",
            Self::SaveSucceeded { .. } => "save_succeeded",
            Self::SaveFailed { .. } => "save_failed",
            Self::ReparseComplete { .. } => "reparse_complete",
            Self::ReparseFailed { .. } => "reparse_failed",
            Self::ClearDone { .. } => "clear_done",
            Self::ClearFailed { .. } => "clear_failed",
            Self::ReloadDone { .. } => "reload_done",
            Self::ReloadFailed { .. } => "reload_failed",
        }
    }

    /// Epoch of an async completion, `None` for user and watcher events.
    pub fn completion_epoch(&self) -> Option<u64> {
        match self {
            Self::SaveSucceeded { epoch }
            | Self::SaveFailed { epoch, .. }
            | Self::ReparseComplete { epoch }
            | Self::ReparseFailed { epoch, .. }
            | Self::ClearDone { epoch }
            | Self::ClearFailed { epoch, .. }
            | Self::ReloadDone { epoch }
            | Self::ReloadFailed { epoch, .. } => Some(*epoch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileEffect {
    /// Write `content` to disk, then drop every cached editor state of `path`.
    Save {
        path: PathBuf,
        content: String,
        cid: Cid,
        epoch: u64,
    },
    /// Re-derive blocks from the saved text and cache them on the latest editor.
    Reparse {
        path: PathBuf,
        file_type: FileType,
        epoch: u64,
    },
    ClearEditorStates { path: PathBuf, epoch: u64 },
    /// Ask the view layer to re-read from disk. `clear_cache` is set when the
    /// cached state was not already dropped by `ClearingState`.
    ReloadView {
        path: PathBuf,
        epoch: u64,
        clear_cache: bool,
    },
    Notify(Notice),
}

#[derive(Debug, Clone)]
pub struct FileLifecycle {
    path: PathBuf,
    file_type: FileType,
    state: FileState,
    epoch: u64,
    committed_view: Option<ViewKind>,
    external_change_held: bool,
    edited_in_flight: bool,
}

impl FileLifecycle {
    pub fn new(path: PathBuf) -> Self {
        let file_type = FileType::from_path(&path);
        Self {
            path,
            file_type,
            state: FileState::Idle,
            epoch: 0,
            committed_view: None,
            external_change_held: false,
            edited_in_flight: false,
        }
    }

    /// Resumes numbering from a previous instance for the same path.
    pub fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// View kind of the last save request.
    pub fn committed_view(&self) -> Option<ViewKind> {
        self.committed_view
    }

    pub fn has_held_external_change(&self) -> bool {
        self.external_change_held
    }

    pub fn has_held_edit(&self) -> bool {
        self.edited_in_flight
    }

    fn reparse_after_save(&self) -> bool {
        self.file_type.is_structured() && self.committed_view == Some(ViewKind::Rich)
    }
}

impl StateMachine for FileLifecycle {
    type State = FileState;
    type Event = FileEvent;
    type Effect = FileEffect;

    fn name(&self) -> &'static str {
        "file"
    }

    fn state(&self) -> FileState {
        self.state
    }

    fn set_state(&mut self, state: FileState) {
        self.state = state;
    }

    fn event_name(event: &FileEvent) -> &'static str {
        event.name()
    }

    fn next_state(&self, event: &FileEvent) -> Option<FileState> {
        use FileEvent as E;
        use FileState::*;

        if let Some(epoch) = event.completion_epoch() {
            if epoch != self.epoch {
                return None;
            }
        }

        let held = self.external_change_held;
        let edited = self.edited_in_flight;
        let next = match (self.state, event) {
            (Idle, E::Hydrate { dirty: false }) => Clean,
            (Idle, E::Hydrate { dirty: true }) => Dirty,

            (Clean, E::Save { .. }) => Saving,
            (Clean, E::Edit) => Dirty,
            (Clean, E::ExternalChange) => Reloading,

            (Dirty, E::Save { .. }) => Saving,
            (Dirty, E::Edit) => Dirty,
            (Dirty, E::ExternalChange) => Conflict,
            (Dirty, E::Revert) => ClearingState,

            (Saving, E::SaveSucceeded { .. }) if held => Conflict,
            (Saving, E::SaveSucceeded { .. }) if self.reparse_after_save() => Reparsing,
            (Saving, E::SaveSucceeded { .. }) if edited => Dirty,
            (Saving, E::SaveSucceeded { .. }) => Clean,
            (Saving, E::SaveFailed { .. }) if held => Conflict,
            (Saving, E::SaveFailed { .. }) => Dirty,

            (Reparsing, E::ReparseComplete { .. }) if held && edited => Conflict,
            (Reparsing, E::ReparseComplete { .. }) if held => Reloading,
            (Reparsing, E::ReparseComplete { .. }) if edited => Dirty,
            (Reparsing, E::ReparseComplete { .. }) => Clean,
            (Reparsing, E::ReparseFailed { .. }) if held => Conflict,
            (Reparsing, E::ReparseFailed { .. }) => Dirty,

            // Only reachable when constructed in this state.
            (ExternalChange, E::Reload) => ClearingState,
            (ExternalChange, E::Edit) => Conflict,

            (Conflict, E::ResolveOverwrite) => Dirty,
            (Conflict, E::ResolveDiscard) => ClearingState,

            (ClearingState, E::ClearDone { .. }) => Reloading,
            (ClearingState, E::ClearFailed { .. }) => Conflict,

            (Reloading, E::ReloadDone { .. }) if held => Reloading,
            (Reloading, E::ReloadDone { .. }) => Clean,
            (Reloading, E::ReloadFailed { .. }) => Conflict,

            _ => return None,
        };
        Some(next)
    }

    fn defer(&mut self, event: &FileEvent) -> bool {
        match event {
            FileEvent::ExternalChange if !self.state.is_settled() => {
                self.external_change_held = true;
                true
            }
            // Edits typed while the save is in flight are not on disk yet.
            FileEvent::Edit if matches!(self.state, FileState::Saving | FileState::Reparsing) => {
                self.edited_in_flight = true;
                true
            }
            _ => false,
        }
    }

    fn enter(&mut self, entered: FileState, event: FileEvent) -> Vec<FileEffect> {
        if event.completion_epoch().is_some() {
            self.external_change_held = false;
            if entered != FileState::Reparsing {
                self.edited_in_flight = false;
            }
        }

        match entered {
            FileState::Saving => {
                let FileEvent::Save { content, view_kind } = event else {
                    return Vec::new();
                };
                self.committed_view = Some(view_kind);
                let cid = Cid::of(&content);
                vec![FileEffect::Save {
                    path: self.path.clone(),
                    content,
                    cid,
                    epoch: self.epoch,
                }]
            }
            FileState::Reparsing => vec![FileEffect::Reparse {
                path: self.path.clone(),
                file_type: self.file_type,
                epoch: self.epoch,
            }],
            FileState::ClearingState => {
                self.epoch += 1;
                vec![FileEffect::ClearEditorStates {
                    path: self.path.clone(),
                    epoch: self.epoch,
                }]
            }
            FileState::Reloading => {
                let clear_cache = !matches!(event, FileEvent::ClearDone { .. });
                if clear_cache {
                    self.epoch += 1;
                }
                vec![FileEffect::ReloadView {
                    path: self.path.clone(),
                    epoch: self.epoch,
                    clear_cache,
                }]
            }
            FileState::Dirty => match event {
                FileEvent::SaveFailed { error, .. } => {
                    tracing::warn!(path = %self.path.display(), error = %error, "save failed");
                    vec![FileEffect::Notify(Notice::error(
                        "Failed to save file",
                        &self.path,
                        error,
                    ))]
                }
                FileEvent::ReparseFailed { error, .. } => {
                    tracing::warn!(path = %self.path.display(), error = %error, "reparse failed");
                    vec![FileEffect::Notify(Notice::error(
                        "Failed to refresh document",
                        &self.path,
                        error,
                    ))]
                }
                _ => Vec::new(),
            },
            FileState::Conflict => match event {
                FileEvent::SaveFailed { error, .. } | FileEvent::ReparseFailed { error, .. } => {
                    tracing::warn!(path = %self.path.display(), error = %error, "failed with external change pending");
                    vec![FileEffect::Notify(Notice::error(
                        "Failed to save file",
                        &self.path,
                        error,
                    ))]
                }
                FileEvent::ClearFailed { error, .. } | FileEvent::ReloadFailed { error, .. } => {
                    tracing::warn!(path = %self.path.display(), error = %error, "reload from disk failed");
                    Vec::new()
                }
                other => {
                    tracing::info!(
                        path = %self.path.display(),
                        event = other.name(),
                        "file needs conflict resolution"
                    );
                    Vec::new()
                }
            },
            FileState::Idle | FileState::Clean | FileState::ExternalChange => Vec::new(),
        }
    }
}

#[cfg(test)]
impl FileLifecycle {
    pub(crate) fn in_state(path: impl Into<PathBuf>, state: FileState) -> Self {
        let mut lifecycle = Self::new(path.into());
        lifecycle.state = state;
        lifecycle
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/file/lifecycle.rs"]
mod tests;
