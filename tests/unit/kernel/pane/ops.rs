use super::*;
use crate::kernel::services::adapters::store::MemoryStore;
use crate::kernel::testing::{MemoryFs, RecordingClosed};

struct Fixture {
    fs: MemoryFs,
    store: MemoryStore,
    closed: RecordingClosed,
    workspace_id: WorkspaceId,
    pane_id: PaneId,
}

impl Fixture {
    fn new() -> Self {
        let store = MemoryStore::new();
        let (ws, pane) = store.ensure_workspace(Path::new("/ws")).unwrap();
        Self {
            fs: MemoryFs::new()
                .with_file("/ws/a.md", "# A\n")
                .with_file("/ws/b.md", "# B\n")
                .with_file("/ws/app.ts", "let a = 1;\n"),
            store,
            closed: RecordingClosed::default(),
            workspace_id: ws.id,
            pane_id: pane.id,
        }
    }

    fn services(&self) -> PaneServices<'_> {
        PaneServices {
            fs: &self.fs,
            store: &self.store,
            closed: &self.closed,
        }
    }

    fn open(&self, request: OpenRequest) -> PaneOutcome {
        run(
            self.services(),
            self.workspace_id,
            self.pane_id,
            PaneCommand::Open(request),
        )
    }

    fn opened(&self, path: &str) -> (EditorId, PaneItemId) {
        match self.open(OpenRequest::new(path)) {
            PaneOutcome::Opened {
                editor_id, item_id, ..
            } => (editor_id, item_id),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}

#[test]
fn open_creates_editor_and_routes_to_file() {
    let fx = Fixture::new();
    let outcome = fx.open(OpenRequest::new("/ws/a.md").with_source(crate::kernel::route::OpenSource::Cli));

    let PaneOutcome::Opened {
        editor_id,
        item_id,
        file_type,
        route,
        ..
    } = outcome
    else {
        panic!("expected Opened");
    };
    assert_eq!(file_type, FileType::Markdown);
    assert_eq!(
        route,
        Route::File {
            workspace_id: fx.workspace_id,
            path: PathBuf::from("/ws/a.md"),
            view: ViewKind::Rich,
            editor_id,
            source: Some(crate::kernel::route::OpenSource::Cli),
            base_ref: None,
            target_ref: None,
        }
    );
    assert_eq!(
        fx.store.active_pane_item(fx.pane_id).unwrap().unwrap().id,
        item_id
    );
}

#[test]
fn reopening_reuses_editor_and_its_view() {
    let fx = Fixture::new();
    fx.open(OpenRequest::new("/ws/a.md").with_view(ViewKind::Source));
    let again = fx.open(OpenRequest::new("/ws/a.md"));

    assert_eq!(again.route().map(route_view), Some(ViewKind::Source));
    assert_eq!(fx.store.pane_items(fx.pane_id).unwrap().len(), 1);
}

#[test]
fn explicit_view_overrides_existing_editor() {
    let fx = Fixture::new();
    let (first, _) = fx.opened("/ws/a.md");
    let outcome = fx.open(OpenRequest::new("/ws/a.md").with_view(ViewKind::Source));

    let PaneOutcome::Opened { editor_id, route, .. } = outcome else {
        panic!("expected Opened");
    };
    assert_eq!(editor_id, first);
    assert_eq!(route_view(&route), ViewKind::Source);
}

#[test]
fn unsupported_view_falls_back_to_default() {
    let fx = Fixture::new();
    let outcome = fx.open(OpenRequest::new("/ws/app.ts").with_view(ViewKind::Rich));
    assert_eq!(outcome.route().map(route_view), Some(ViewKind::Source));
}

#[test]
fn open_missing_file_routes_not_found() {
    let fx = Fixture::new();
    let outcome = fx.open(OpenRequest::new("/ws/missing.md"));

    assert_eq!(
        outcome,
        PaneOutcome::NotFound {
            path: PathBuf::from("/ws/missing.md"),
            route: Route::not_found(fx.workspace_id, PathBuf::from("/ws/missing.md")),
        }
    );
    assert!(fx.store.pane_items(fx.pane_id).unwrap().is_empty());
}

#[test]
fn closing_only_tab_routes_to_empty_workspace() {
    let fx = Fixture::new();
    let (_, item) = fx.opened("/ws/a.md");

    let outcome = run(
        fx.services(),
        fx.workspace_id,
        fx.pane_id,
        PaneCommand::Close {
            item_id: item,
            path: PathBuf::from("/ws/a.md"),
        },
    );

    assert_eq!(
        outcome,
        PaneOutcome::Closed {
            path: PathBuf::from("/ws/a.md"),
            next_item: None,
            still_open: false,
            route: Some(Route::empty_workspace(fx.workspace_id)),
        }
    );
    assert_eq!(fx.closed.closed(), vec![PathBuf::from("/ws/a.md")]);
}

#[test]
fn closing_active_tab_routes_to_next() {
    let fx = Fixture::new();
    let (editor_a, item_a) = fx.opened("/ws/a.md");
    let (_, item_b) = fx.opened("/ws/b.md");

    let outcome = close(fx.services(), fx.workspace_id, fx.pane_id, item_b, Path::new("/ws/b.md")).unwrap();
    let PaneOutcome::Closed {
        next_item, route, ..
    } = outcome
    else {
        panic!("expected Closed");
    };
    assert_eq!(next_item, Some(item_a));
    assert_eq!(
        route,
        Some(Route::file(
            fx.workspace_id,
            PathBuf::from("/ws/a.md"),
            ViewKind::Rich,
            editor_a
        ))
    );
}

#[test]
fn closing_background_tab_does_not_navigate() {
    let fx = Fixture::new();
    let (_, item_a) = fx.opened("/ws/a.md");
    let (_, item_b) = fx.opened("/ws/b.md");

    let outcome = close(fx.services(), fx.workspace_id, fx.pane_id, item_a, Path::new("/ws/a.md")).unwrap();
    assert_eq!(outcome.route(), None);
    assert_eq!(
        fx.store.active_pane_item(fx.pane_id).unwrap().unwrap().id,
        item_b
    );
}

#[test]
fn close_reads_active_tab_when_it_runs() {
    let fx = Fixture::new();
    let (_, item_a) = fx.opened("/ws/a.md");
    let (editor_b, item_b) = fx.opened("/ws/b.md");
    // A tab activated after the close was requested is still closed as active.
    fx.store.set_pane_active_item(fx.pane_id, Some(item_a)).unwrap();

    let outcome = run(
        fx.services(),
        fx.workspace_id,
        fx.pane_id,
        PaneCommand::Close {
            item_id: item_a,
            path: PathBuf::from("/ws/a.md"),
        },
    );
    assert_eq!(outcome.route(), Some(&Route::file(
        fx.workspace_id,
        PathBuf::from("/ws/b.md"),
        ViewKind::Rich,
        editor_b
    )));
    assert_eq!(
        fx.store.active_pane_item(fx.pane_id).unwrap().map(|i| i.id),
        Some(item_b)
    );
}

#[test]
fn closing_unknown_item_fails_without_panicking() {
    let fx = Fixture::new();
    let outcome = run(
        fx.services(),
        fx.workspace_id,
        fx.pane_id,
        PaneCommand::Close {
            item_id: PaneItemId(42),
            path: PathBuf::from("/ws/a.md"),
        },
    );
    assert!(matches!(outcome, PaneOutcome::Failed { command: "close", .. }));
}

#[test]
fn activate_switches_active_tab() {
    let fx = Fixture::new();
    let (editor_a, item_a) = fx.opened("/ws/a.md");
    fx.opened("/ws/b.md");
    let item = fx
        .store
        .pane_items(fx.pane_id)
        .unwrap()
        .into_iter()
        .find(|i| i.id == item_a)
        .unwrap();

    let outcome = activate(fx.services(), fx.workspace_id, &item).unwrap();
    assert_eq!(
        outcome.route(),
        Some(&Route::file(
            fx.workspace_id,
            PathBuf::from("/ws/a.md"),
            ViewKind::Rich,
            editor_a
        ))
    );
    assert_eq!(
        fx.store.active_pane_item(fx.pane_id).unwrap().unwrap().id,
        item_a
    );
}

#[test]
fn activate_without_editor_is_noop() {
    let fx = Fixture::new();
    let (_, item_a) = fx.opened("/ws/a.md");
    let (_, item_b) = fx.opened("/ws/b.md");
    let mut item = fx
        .store
        .pane_items(fx.pane_id)
        .unwrap()
        .into_iter()
        .find(|i| i.id == item_a)
        .unwrap();
    item.editor_id = None;

    let outcome = activate(fx.services(), fx.workspace_id, &item).unwrap();
    assert_eq!(
        outcome,
        PaneOutcome::Activated {
            item_id: item_a,
            route: None
        }
    );
    assert_eq!(
        fx.store.active_pane_item(fx.pane_id).unwrap().unwrap().id,
        item_b
    );
}

#[test]
fn choose_view_precedence() {
    assert_eq!(
        choose_view(FileType::Markdown, Some(ViewKind::Source), Some(ViewKind::Rich)),
        ViewKind::Source
    );
    assert_eq!(
        choose_view(FileType::Markdown, None, Some(ViewKind::Source)),
        ViewKind::Source
    );
    assert_eq!(choose_view(FileType::Python, None, None), ViewKind::Rich);
    assert_eq!(
        choose_view(FileType::Plaintext, None, Some(ViewKind::Rich)),
        ViewKind::Source
    );
}

fn route_view(route: &Route) -> ViewKind {
    match route {
        Route::File { view, .. } => *view,
        other => panic!("not a file route: {other:?}"),
    }
}
