//! 工作台：单线程事件循环
//!
//! 职责：
//! - 持有 `Core`，所有状态变更都在这里发生
//! - 把 effect 交给运行时执行，再把完成事件从 kernel bus 收回来
//! - 把文件监听事件转成 `Action::Watch`

mod bridge;
mod tick;

use crate::kernel::editor_manager::{ContentRequest, EditorManager, EditorManagerError, InitialContent};
use crate::kernel::file::{EpochBoard, FileEvent, FileState};
use crate::kernel::file_tree_store::FileTreeStore;
use crate::kernel::language::ViewKind;
use crate::kernel::pane::{OpenRequest, PaneCommand};
use crate::kernel::services::adapters::{AsyncRuntime, EffectRunner, FileWatcherService};
use crate::kernel::services::ports::{PaneItem, Settings, StoreError};
use crate::kernel::services::{KernelBusSender, KernelServiceHost, KernelServices};
use crate::kernel::{Action, Core};
use crate::models::{PaneId, PaneItemId, WorkspaceId};
use std::path::{Path, PathBuf};
use thiserror::Error;

const MAX_KERNEL_BUS_DRAIN_PER_TICK: usize = 256;

#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unknown pane item: {0}")]
    UnknownItem(PaneItemId),
}

pub struct Workbench {
    core: Core,
    host: KernelServiceHost,
    runner: EffectRunner,
    editors: EditorManager,
    watcher: Option<FileWatcherService>,
    pane_id: PaneId,
    shutdown: bool,
    // Dropped last so in-flight tasks outlive everything that feeds them.
    _runtime: AsyncRuntime,
}

impl Workbench {
    pub fn new(
        root: &Path,
        services: KernelServices,
        runtime: AsyncRuntime,
        settings: &Settings,
    ) -> Result<Self, WorkbenchError> {
        let (workspace, pane) = services.store.ensure_workspace(root)?;
        let epochs = EpochBoard::new();
        let tree = FileTreeStore::new(root.to_path_buf())
            .with_ignored_names(settings.ignored_names.iter().cloned());
        let core = Core::new(workspace.id, tree, epochs.clone());

        let executor = runtime.executor();
        let host = KernelServiceHost::new(services.clone(), executor.clone());
        let runner = EffectRunner::new(services.clone(), host.context(), epochs.clone());
        let editors = EditorManager::new(
            services.store,
            services.fs,
            services.codec,
            executor,
            epochs,
        );
        tracing::info!(
            root = %root.display(),
            workspace = %workspace.id,
            pane = %pane.id,
            "workbench ready"
        );

        let mut workbench = Self {
            core,
            host,
            runner,
            editors,
            watcher: None,
            pane_id: pane.id,
            shutdown: false,
            _runtime: runtime,
        };
        // The root starts out resolved-but-empty; a refresh lists it.
        workbench.dispatch(Action::RefreshTree);
        Ok(workbench)
    }

    pub fn with_watcher(mut self, watcher: FileWatcherService) -> Self {
        self.watcher = Some(watcher);
        self
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn root(&self) -> &Path {
        self.core.root()
    }

    pub fn workspace_id(&self) -> WorkspaceId {
        self.core.workspace_id()
    }

    pub fn pane_id(&self) -> PaneId {
        self.pane_id
    }

    pub fn bus(&self) -> KernelBusSender {
        self.host.bus()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    pub fn file_state(&self, path: &Path) -> Option<FileState> {
        self.core.file_state(path)
    }

    pub fn pane_items(&self) -> Result<Vec<PaneItem>, StoreError> {
        self.host.services().store.pane_items(self.pane_id)
    }

    pub fn open(&mut self, request: OpenRequest) -> bool {
        self.pane_command(PaneCommand::Open(request))
    }

    pub fn close(&mut self, item_id: PaneItemId) -> Result<bool, WorkbenchError> {
        let item = self.find_item(item_id)?;
        Ok(self.pane_command(PaneCommand::Close {
            item_id,
            path: item.file_path,
        }))
    }

    pub fn activate(&mut self, item_id: PaneItemId) -> Result<bool, WorkbenchError> {
        let item = self.find_item(item_id)?;
        Ok(self.pane_command(PaneCommand::Activate(item)))
    }

    pub fn edit(&mut self, path: impl Into<PathBuf>) -> bool {
        self.dispatch(Action::file(path, FileEvent::Edit))
    }

    pub fn save(&mut self, path: impl Into<PathBuf>, content: impl Into<String>, view_kind: ViewKind) -> bool {
        self.dispatch(Action::file(
            path,
            FileEvent::Save {
                content: content.into(),
                view_kind,
            },
        ))
    }

    pub fn revert(&mut self, path: impl Into<PathBuf>) -> bool {
        self.dispatch(Action::file(path, FileEvent::Revert))
    }

    pub fn reload(&mut self, path: impl Into<PathBuf>) -> bool {
        self.dispatch(Action::file(path, FileEvent::Reload))
    }

    pub fn resolve_overwrite(&mut self, path: impl Into<PathBuf>) -> bool {
        self.dispatch(Action::file(path, FileEvent::ResolveOverwrite))
    }

    pub fn resolve_discard(&mut self, path: impl Into<PathBuf>) -> bool {
        self.dispatch(Action::file(path, FileEvent::ResolveDiscard))
    }

    pub fn toggle_folder(&mut self, dir: impl Into<PathBuf>) -> bool {
        self.dispatch(Action::ToggleFolder(dir.into()))
    }

    pub fn refresh_tree(&mut self) -> bool {
        self.dispatch(Action::RefreshTree)
    }

    /// What an editor surface for `path` should start from.
    pub fn load_content(
        &self,
        path: impl Into<PathBuf>,
        view_kind: Option<ViewKind>,
    ) -> Result<InitialContent, EditorManagerError> {
        self.editors.read_state_or_file(&ContentRequest {
            path: path.into(),
            pane_id: self.pane_id,
            view_kind,
            editor_id: None,
        })
    }

    fn pane_command(&mut self, command: PaneCommand) -> bool {
        self.dispatch(Action::Pane {
            pane_id: self.pane_id,
            command,
        })
    }

    fn find_item(&self, item_id: PaneItemId) -> Result<PaneItem, WorkbenchError> {
        self.pane_items()?
            .into_iter()
            .find(|item| item.id == item_id)
            .ok_or(WorkbenchError::UnknownItem(item_id))
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/app/workbench.rs"]
mod tests;
