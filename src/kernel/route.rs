//! Navigation targets produced by pane operations and tree events.

use crate::kernel::language::ViewKind;
use crate::models::{EditorId, WorkspaceId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Who asked for a file to be opened, forwarded to the view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpenSource {
    Cli,
    ExternalTool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// Landing page, optionally carrying why the workspace was left.
    Home { workspace_error: Option<PathBuf> },
    /// Workspace with no active editor.
    Workspace {
        workspace_id: WorkspaceId,
        not_found: Option<PathBuf>,
    },
    File {
        workspace_id: WorkspaceId,
        path: PathBuf,
        view: ViewKind,
        editor_id: EditorId,
        source: Option<OpenSource>,
        base_ref: Option<String>,
        target_ref: Option<String>,
    },
}

impl Route {
    pub fn empty_workspace(workspace_id: WorkspaceId) -> Self {
        Self::Workspace {
            workspace_id,
            not_found: None,
        }
    }

    pub fn not_found(workspace_id: WorkspaceId, path: PathBuf) -> Self {
        Self::Workspace {
            workspace_id,
            not_found: Some(path),
        }
    }

    pub fn file(workspace_id: WorkspaceId, path: PathBuf, view: ViewKind, editor_id: EditorId) -> Self {
        Self::File {
            workspace_id,
            path,
            view,
            editor_id,
            source: None,
            base_ref: None,
            target_ref: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Workspace {
                not_found: Some(_),
                ..
            }
        )
    }
}
