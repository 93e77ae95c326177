use super::*;
use crate::kernel::services::adapters::runtime::AsyncRuntime;
use std::sync::Arc;
use crate::kernel::effect::Effect;
use crate::kernel::file::{EpochBoard, FileEffect, FileEvent, FileRegistry, FileState};
use crate::kernel::language::FileType;
use crate::kernel::pane::{OpenRequest, PaneCommand, PaneEffect, PaneOutcome};
use crate::kernel::route::Route;
use crate::kernel::services::adapters::{BlockCodec, MemoryStore};
use crate::kernel::services::host::{KernelServiceHost, KernelServices};
use crate::kernel::language::ViewKind;
use crate::kernel::services::ports::{
    EditorStateUpdate, EditorUpsert, FileUpsert, NoticeLevel, Store,
};
use crate::kernel::services::KernelMessage;
use crate::kernel::testing::{MemoryFs, RecordingClosed, RecordingNavigator, RecordingNotifier};
use crate::kernel::Action;
use crate::models::{Cid, PaneId, WorkspaceId};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;

struct Harness {
    _runtime: AsyncRuntime,
    host: KernelServiceHost,
    runner: EffectRunner,
    fs: Arc<MemoryFs>,
    store: Arc<MemoryStore>,
    navigator: Arc<RecordingNavigator>,
    notifier: Arc<RecordingNotifier>,
    pane_id: PaneId,
    workspace_id: WorkspaceId,
}

impl Harness {
    fn new() -> Self {
        let runtime = AsyncRuntime::new().unwrap();
        let fs = Arc::new(MemoryFs::new().with_file("/ws/a.md", "# A\n\ntext\n"));
        let store = Arc::new(MemoryStore::new());
        let (ws, pane) = store.ensure_workspace(Path::new("/ws")).unwrap();
        let navigator = Arc::new(RecordingNavigator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let services = KernelServices {
            fs: fs.clone(),
            store: store.clone(),
            codec: Arc::new(BlockCodec::new()),
            navigator: navigator.clone(),
            notifier: notifier.clone(),
            closed: Arc::new(RecordingClosed::default()),
        };
        let host = KernelServiceHost::new(services.clone(), runtime.executor());
        let runner = EffectRunner::new(services, host.context(), EpochBoard::new());
        Self {
            _runtime: runtime,
            host,
            runner,
            fs,
            store,
            navigator,
            notifier,
            pane_id: pane.id,
            workspace_id: ws.id,
        }
    }

    fn next_action(&mut self) -> Action {
        match self.host.recv_timeout(Duration::from_secs(5)) {
            Ok(KernelMessage::Action(action)) => action,
            other => panic!("expected an action, got {other:?}"),
        }
    }

    fn cache_state(&self) {
        let file = self
            .store
            .upsert_file(FileUpsert {
                path: PathBuf::from("/ws/a.md"),
                cid: Cid::of("# A\n\ntext\n"),
                mtime: Utc::now(),
            })
            .unwrap();
        let editor = self
            .store
            .upsert_editor(EditorUpsert {
                pane_id: self.pane_id,
                file_id: file.id,
                view_kind: crate::kernel::language::ViewKind::Rich,
            })
            .unwrap();
        self.store
            .update_editor_state(EditorStateUpdate {
                id: editor.id,
                state: Some(crate::kernel::services::ports::DocumentState(
                    serde_json::json!({"fileType": "markdown", "blocks": []}),
                )),
                selection: None,
            })
            .unwrap();
    }

    fn cached_state_present(&self) -> bool {
        self.store
            .select_latest_editor_for_file(Path::new("/ws/a.md"))
            .unwrap()
            .is_some_and(|e| e.state.is_some())
    }
}

#[test]
fn save_writes_disk_and_clears_cached_state() {
    let mut h = Harness::new();
    h.cache_state();

    h.runner.run(Effect::File(FileEffect::Save {
        path: PathBuf::from("/ws/a.md"),
        content: "new".into(),
        cid: Cid::of("new"),
        epoch: 3,
    }));

    match h.next_action() {
        Action::File { path, event } => {
            assert_eq!(path, PathBuf::from("/ws/a.md"));
            assert!(matches!(event, FileEvent::SaveSucceeded { epoch: 3 }));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(h.fs.content(Path::new("/ws/a.md")).as_deref(), Some("new"));
    assert!(!h.cached_state_present());
    let record = h.store.select_file(Path::new("/ws/a.md")).unwrap().unwrap();
    assert_eq!(record.cid, Cid::of("new"));
}

#[test]
fn failed_save_reports_error() {
    let mut h = Harness::new();
    h.fs.fail_saves(true);
    let path = Path::new("/ws/a.md");
    let mut files = FileRegistry::new(EpochBoard::new());
    files.dispatch(path, FileEvent::Hydrate { dirty: true });

    let saving = files.dispatch(
        path,
        FileEvent::Save {
            content: "new".into(),
            view_kind: ViewKind::Source,
        },
    );
    for effect in saving.effects {
        h.runner.run(Effect::File(effect));
    }

    let event = match h.next_action() {
        Action::File {
            event: event @ FileEvent::SaveFailed { epoch: 0, .. },
            ..
        } => event,
        other => panic!("unexpected {other:?}"),
    };
    let FileEvent::SaveFailed { error, .. } = &event else {
        unreachable!()
    };
    assert!(error.contains("permission denied"));

    // The lifecycle turns the failure into a toast, delivered through the runner.
    let settled = files.dispatch(path, event);
    assert_eq!(files.state(path), Some(FileState::Dirty));
    for effect in settled.effects {
        h.runner.run(Effect::File(effect));
    }
    let notices = h.notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].path.as_deref(), Some(path));
}

#[test]
fn reparse_refreshes_latest_editor_state() {
    let mut h = Harness::new();
    h.cache_state();

    h.runner.run(Effect::File(FileEffect::Reparse {
        path: PathBuf::from("/ws/a.md"),
        file_type: FileType::Markdown,
        epoch: 0,
    }));

    assert!(matches!(
        h.next_action(),
        Action::File {
            event: FileEvent::ReparseComplete { epoch: 0 },
            ..
        }
    ));
    let editor = h
        .store
        .select_latest_editor_for_file(Path::new("/ws/a.md"))
        .unwrap()
        .unwrap();
    let blocks = editor.state.unwrap().0["blocks"].as_array().unwrap().len();
    assert_eq!(blocks, 2);
}

#[test]
fn reload_clears_then_invalidates() {
    let mut h = Harness::new();
    h.cache_state();

    h.runner.run(Effect::File(FileEffect::ReloadView {
        path: PathBuf::from("/ws/a.md"),
        epoch: 1,
        clear_cache: true,
    }));

    assert!(matches!(
        h.next_action(),
        Action::File {
            event: FileEvent::ReloadDone { epoch: 1 },
            ..
        }
    ));
    assert!(!h.cached_state_present());
    assert_eq!(h.navigator.invalidations(), 1);
}

#[test]
fn pane_open_navigates_and_settles() {
    let mut h = Harness::new();
    h.runner.run(Effect::Pane(PaneEffect::Run {
        workspace_id: h.workspace_id,
        pane_id: h.pane_id,
        command: PaneCommand::Open(OpenRequest::new("/ws/missing.md")),
    }));

    match h.next_action() {
        Action::PaneSettled { pane_id, outcome } => {
            assert_eq!(pane_id, h.pane_id);
            assert!(matches!(outcome, PaneOutcome::NotFound { .. }));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        h.navigator.last(),
        Some(Route::not_found(h.workspace_id, PathBuf::from("/ws/missing.md")))
    );
}

#[test]
fn load_dir_reports_entries_or_error() {
    let mut h = Harness::new();
    h.runner.run(Effect::LoadDir(PathBuf::from("/ws")));
    match h.next_action() {
        Action::DirLoaded { path, entries } => {
            assert_eq!(path, PathBuf::from("/ws"));
            assert_eq!(entries.len(), 1);
        }
        other => panic!("unexpected {other:?}"),
    }

    h.runner.run(Effect::LoadDir(PathBuf::from("/nowhere")));
    assert!(matches!(h.next_action(), Action::DirLoadError { .. }));
}
