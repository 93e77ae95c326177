use crate::kernel::effect::Effect;
use crate::kernel::file::{EpochBoard, FileEffect, FileEvent};
use crate::kernel::language::FileType;
use crate::kernel::pane::{ops, PaneCommand, PaneEffect, PaneOutcome};
use crate::kernel::services::host::{KernelServiceContext, KernelServices};
use crate::kernel::services::ports::{
    CodecError, EditorStateUpdate, FileError, FileUpsert, NavigationError, StoreError,
};
use crate::kernel::Action;
use crate::models::{Cid, PaneId, WorkspaceId};
use chrono::Utc;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
enum EffectError {
    #[error(transparent)]
    File(#[from] FileError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("background task aborted: {0}")]
    Join(String),
}

/// Runs kernel effects on the async runtime. Every effect that the loop
/// waits on reports back as exactly one action.
#[derive(Clone)]
pub struct EffectRunner {
    services: KernelServices,
    ctx: KernelServiceContext,
    epochs: EpochBoard,
}

impl EffectRunner {
    pub fn new(services: KernelServices, ctx: KernelServiceContext, epochs: EpochBoard) -> Self {
        Self {
            services,
            ctx,
            epochs,
        }
    }

    pub fn run(&self, effect: Effect) {
        match effect {
            Effect::File(effect) => self.run_file(effect),
            Effect::Pane(PaneEffect::Run {
                workspace_id,
                pane_id,
                command,
            }) => self.run_pane(workspace_id, pane_id, command),
            Effect::LoadDir(dir) => {
                let target = dir.clone();
                self.complete(
                    move |services| Ok(services.fs.list_dir(&target)?),
                    move |result| {
                        Some(match result {
                            Ok(entries) => Action::DirLoaded { path: dir, entries },
                            Err(error) => Action::DirLoadError { path: dir, error },
                        })
                    },
                )
            }
            Effect::Navigate(route) => self.services.navigator.navigate(route),
            Effect::ForgetFile(path) => self.complete(
                move |services| {
                    let removed = services.store.delete_file(&path)?;
                    tracing::debug!(path = %path.display(), removed, "store record forgotten");
                    Ok(())
                },
                |_| None,
            ),
        }
    }

    fn run_file(&self, effect: FileEffect) {
        match effect {
            FileEffect::Save {
                path,
                content,
                cid,
                epoch,
            } => {
                let target = path.clone();
                self.complete(
                    move |services| save(services, &target, &content, cid),
                    move |result| {
                        Some(Action::file(
                            path,
                            match result {
                                Ok(()) => FileEvent::SaveSucceeded { epoch },
                                Err(error) => FileEvent::SaveFailed { epoch, error },
                            },
                        ))
                    },
                )
            }
            FileEffect::Reparse {
                path,
                file_type,
                epoch,
            } => {
                let target = path.clone();
                let epochs = self.epochs.clone();
                self.complete(
                    move |services| reparse(services, &epochs, &target, file_type, epoch),
                    move |result| {
                        Some(Action::file(
                            path,
                            match result {
                                Ok(()) => FileEvent::ReparseComplete { epoch },
                                Err(error) => FileEvent::ReparseFailed { epoch, error },
                            },
                        ))
                    },
                )
            }
            FileEffect::ClearEditorStates { path, epoch } => {
                let target = path.clone();
                self.complete(
                    move |services| {
                        services.store.clear_editor_states_for_file(&target)?;
                        Ok(())
                    },
                    move |result| {
                        Some(Action::file(
                            path,
                            match result {
                                Ok(()) => FileEvent::ClearDone { epoch },
                                Err(error) => FileEvent::ClearFailed { epoch, error },
                            },
                        ))
                    },
                )
            }
            FileEffect::ReloadView {
                path,
                epoch,
                clear_cache,
            } => {
                let target = path.clone();
                self.complete(
                    move |services| {
                        if clear_cache {
                            services.store.clear_editor_states_for_file(&target)?;
                        }
                        services.navigator.invalidate()?;
                        Ok(())
                    },
                    move |result| {
                        Some(Action::file(
                            path,
                            match result {
                                Ok(()) => FileEvent::ReloadDone { epoch },
                                Err(error) => FileEvent::ReloadFailed { epoch, error },
                            },
                        ))
                    },
                )
            }
            FileEffect::Notify(notice) => self.services.notifier.notify(notice),
        }
    }

    fn run_pane(&self, workspace_id: WorkspaceId, pane_id: PaneId, command: PaneCommand) {
        let services = self.services.clone();
        let ctx = self.ctx.clone();
        let name = command.name();
        self.ctx.spawn_future(async move {
            let outcome = tokio::task::spawn_blocking(move || {
                let outcome = ops::run(services.pane(), workspace_id, pane_id, command);
                if let Some(route) = outcome.route() {
                    services.navigator.navigate(route.clone());
                }
                outcome
            })
            .await
            .unwrap_or_else(|e| {
                tracing::error!(pane = %pane_id, command = name, error = %e, "pane task aborted");
                PaneOutcome::Failed {
                    command: name,
                    error: e.to_string(),
                }
            });
            ctx.dispatch(Action::PaneSettled { pane_id, outcome });
        });
    }

    /// Runs `work` on the blocking pool, then sends whatever `done` makes of
    /// the result. Errors reach `done` rendered as text.
    fn complete<T, W, D>(&self, work: W, done: D)
    where
        T: Send + 'static,
        W: FnOnce(&KernelServices) -> Result<T, EffectError> + Send + 'static,
        D: FnOnce(Result<T, String>) -> Option<Action> + Send + 'static,
    {
        let services = self.services.clone();
        let ctx = self.ctx.clone();
        self.ctx.spawn_future(async move {
            let result = match tokio::task::spawn_blocking(move || work(&services)).await {
                Ok(result) => result,
                Err(e) => Err(EffectError::Join(e.to_string())),
            };
            let result = result.map_err(|e| {
                tracing::warn!(error = %e, "effect failed");
                e.to_string()
            });
            if let Some(action) = done(result) {
                ctx.dispatch(action);
            }
        });
    }
}

fn save(services: &KernelServices, path: &Path, content: &str, cid: Cid) -> Result<(), EffectError> {
    services.fs.save(path, content)?;
    let mtime = services
        .fs
        .stat(path)
        .map(|etag| etag.modified_at())
        .unwrap_or_else(|_| Utc::now());
    services.store.upsert_file(FileUpsert {
        path: path.to_path_buf(),
        cid,
        mtime,
    })?;
    // A cache that fails to clear would serve stale blocks, so it fails the save.
    services.store.clear_editor_states_for_file(path)?;
    Ok(())
}

fn reparse(
    services: &KernelServices,
    epochs: &EpochBoard,
    path: &Path,
    file_type: FileType,
    epoch: u64,
) -> Result<(), EffectError> {
    let file = services.fs.read(path)?;
    let state = services.codec.parse(file_type, &file.content)?;
    if !epochs.is_current(path, epoch) {
        tracing::debug!(path = %path.display(), epoch, "reparse result discarded: stale epoch");
        return Ok(());
    }
    if let Some(editor) = services.store.select_latest_editor_for_file(path)? {
        services.store.update_editor_state(EditorStateUpdate {
            id: editor.id,
            state: Some(state),
            selection: editor.selection,
        })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/runtime/effects.rs"]
mod tests;
