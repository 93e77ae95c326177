//! Bodies of the pane commands. They run off the loop thread, talk to the
//! store and file system, and report the route to navigate to.

use super::machine::{OpenRequest, PaneCommand};
use crate::kernel::language::{FileType, ViewKind};
use crate::kernel::route::Route;
use crate::kernel::services::ports::{
    EditorUpsert, FileClosedListener, FileError, FileSystem, FileUpsert, PaneItem, Store,
    StoreError,
};
use crate::models::{EditorId, PaneId, PaneItemId, WorkspaceId};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaneError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    File(#[from] FileError),
}

/// Collaborators a pane command needs.
#[derive(Clone, Copy)]
pub struct PaneServices<'a> {
    pub fs: &'a dyn FileSystem,
    pub store: &'a dyn Store,
    pub closed: &'a dyn FileClosedListener,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaneOutcome {
    Closed {
        path: PathBuf,
        next_item: Option<PaneItemId>,
        /// Another tab still shows the file.
        still_open: bool,
        route: Option<Route>,
    },
    Activated {
        item_id: PaneItemId,
        route: Option<Route>,
    },
    Opened {
        path: PathBuf,
        file_type: FileType,
        editor_id: EditorId,
        item_id: PaneItemId,
        route: Route,
    },
    NotFound {
        path: PathBuf,
        route: Route,
    },
    Failed {
        command: &'static str,
        error: String,
    },
}

impl PaneOutcome {
    pub fn route(&self) -> Option<&Route> {
        match self {
            Self::Closed { route, .. } | Self::Activated { route, .. } => route.as_ref(),
            Self::Opened { route, .. } | Self::NotFound { route, .. } => Some(route),
            Self::Failed { .. } => None,
        }
    }
}

/// Runs `command` to completion. Errors are logged and folded into the
/// outcome so the pane always returns to idle.
pub fn run(
    services: PaneServices<'_>,
    workspace_id: WorkspaceId,
    pane_id: PaneId,
    command: PaneCommand,
) -> PaneOutcome {
    let name = command.name();
    let result = match command {
        PaneCommand::Close { item_id, path } => {
            close(services, workspace_id, pane_id, item_id, &path)
        }
        PaneCommand::Activate(item) => activate(services, workspace_id, &item),
        PaneCommand::Open(request) => open(services, workspace_id, pane_id, request),
    };
    result.unwrap_or_else(|e| {
        tracing::error!(pane = %pane_id, command = name, error = %e, "pane command failed");
        PaneOutcome::Failed {
            command: name,
            error: e.to_string(),
        }
    })
}

pub fn close(
    services: PaneServices<'_>,
    workspace_id: WorkspaceId,
    pane_id: PaneId,
    item_id: PaneItemId,
    path: &Path,
) -> Result<PaneOutcome, PaneError> {
    services.closed.file_closed(path);

    // Read at run time: a queued activate may have changed it since enqueue.
    let is_active = services
        .store
        .active_pane_item(pane_id)?
        .is_some_and(|active| active.id == item_id);

    let next = services
        .store
        .close_pane_item_and_get_next(item_id, is_active)?;
    let still_open = services.store.count_pane_items_for_file(path)? > 0;

    let route = is_active.then(|| match &next {
        Some(item) => route_for_item(workspace_id, item).unwrap_or_else(|| {
            tracing::warn!(item = %item.id, "next tab has no editor");
            Route::empty_workspace(workspace_id)
        }),
        None => Route::empty_workspace(workspace_id),
    });

    tracing::debug!(
        item = %item_id,
        path = %path.display(),
        next = ?next.as_ref().map(|item| item.id),
        "pane item closed"
    );
    Ok(PaneOutcome::Closed {
        path: path.to_path_buf(),
        next_item: next.map(|item| item.id),
        still_open,
        route,
    })
}

pub fn activate(
    services: PaneServices<'_>,
    workspace_id: WorkspaceId,
    item: &PaneItem,
) -> Result<PaneOutcome, PaneError> {
    let Some(route) = route_for_item(workspace_id, item) else {
        tracing::debug!(item = %item.id, "activate skipped: no editor attached");
        return Ok(PaneOutcome::Activated {
            item_id: item.id,
            route: None,
        });
    };

    services
        .store
        .set_pane_active_item(item.pane_id, Some(item.id))?;
    services.store.touch_pane_item_accessed_at(item.id)?;

    Ok(PaneOutcome::Activated {
        item_id: item.id,
        route: Some(route),
    })
}

pub fn open(
    services: PaneServices<'_>,
    workspace_id: WorkspaceId,
    pane_id: PaneId,
    request: OpenRequest,
) -> Result<PaneOutcome, PaneError> {
    let file = match services.fs.read(&request.path) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %request.path.display(), error = %e, "open failed");
            return Ok(PaneOutcome::NotFound {
                route: Route::not_found(workspace_id, request.path.clone()),
                path: request.path,
            });
        }
    };

    let record = services.store.upsert_file(FileUpsert {
        path: file.path.clone(),
        cid: file.cid.clone(),
        mtime: file.etag.modified_at(),
    })?;

    let existing = services.store.select_editor_in_pane(pane_id, record.id)?;
    let view_kind = choose_view(
        file.file_type,
        request.view_kind,
        existing.as_ref().map(|e| e.view_kind),
    );
    let editor = match existing {
        Some(editor) if editor.view_kind == view_kind => editor,
        _ => services.store.upsert_editor(EditorUpsert {
            pane_id,
            file_id: record.id,
            view_kind,
        })?,
    };

    let item_id = services.store.activate_editor_in_pane(editor.id, pane_id)?;

    let route = Route::File {
        workspace_id,
        path: file.path.clone(),
        view: editor.view_kind,
        editor_id: editor.id,
        source: request.source,
        base_ref: request.base_ref,
        target_ref: request.target_ref,
    };
    tracing::info!(
        path = %file.path.display(),
        editor = %editor.id,
        view = %editor.view_kind,
        "file opened"
    );
    Ok(PaneOutcome::Opened {
        path: file.path,
        file_type: file.file_type,
        editor_id: editor.id,
        item_id,
        route,
    })
}

/// Explicit request beats the existing editor, which beats file-type
/// default. A view the file type cannot show falls back to the default.
pub fn choose_view(
    file_type: FileType,
    requested: Option<ViewKind>,
    existing: Option<ViewKind>,
) -> ViewKind {
    requested
        .or(existing)
        .filter(|view| {
            let supported = file_type.supports(*view);
            if !supported {
                tracing::debug!(?file_type, view = %view, "view not supported, using default");
            }
            supported
        })
        .unwrap_or_else(|| file_type.default_view())
}

fn route_for_item(workspace_id: WorkspaceId, item: &PaneItem) -> Option<Route> {
    let editor_id = item.editor_id?;
    Some(Route::file(
        workspace_id,
        item.file_path.clone(),
        item.view_kind,
        editor_id,
    ))
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/pane/ops.rs"]
mod tests;
