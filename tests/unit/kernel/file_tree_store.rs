use super::*;

fn root() -> PathBuf {
    PathBuf::from("/ws")
}

fn entry(name: &str, kind: NodeKind) -> DirEntry {
    DirEntry {
        name: name.into(),
        kind,
        etag: Etag::default(),
    }
}

fn etag(modify_time_ms: u64, size: u64) -> Etag {
    Etag {
        modify_time_ms,
        size,
    }
}

fn loaded_store() -> FileTreeStore {
    let mut store = FileTreeStore::new(root());
    store
        .merge_folder(
            &root(),
            vec![
                entry("docs", NodeKind::Dir),
                entry("a.md", NodeKind::File),
                entry(".git", NodeKind::Dir),
            ],
        )
        .unwrap();
    store
}

#[test]
fn merge_skips_ignored_names() {
    let mut store = loaded_store();
    assert!(store.contains(Path::new("/ws/docs")));
    assert!(store.contains(Path::new("/ws/a.md")));
    assert!(!store.contains(Path::new("/ws/.git")));
    assert!(store.is_resolved(&root()));
    assert!(!store.is_resolved(Path::new("/ws/docs")));
}

#[test]
fn refresh_keeps_expanded_and_resolved_folders() {
    let mut store = loaded_store();
    let docs = PathBuf::from("/ws/docs");
    store
        .merge_folder(&docs, vec![entry("guide.md", NodeKind::File)])
        .unwrap();
    assert!(store.toggle(&docs));

    store
        .merge_folder(
            &root(),
            vec![entry("docs", NodeKind::Dir), entry("b.md", NodeKind::File)],
        )
        .unwrap();

    assert!(!store.contains(Path::new("/ws/a.md")));
    assert!(store.contains(Path::new("/ws/b.md")));
    assert!(store.contains(Path::new("/ws/docs/guide.md")));
    assert_eq!(store.expanded_paths(), vec![docs.clone()]);
    assert!(store.is_resolved(&docs));
    assert_eq!(store.resolved_folders(), vec![root(), docs]);
}

#[test]
fn merge_replaces_node_whose_kind_changed() {
    let mut store = loaded_store();
    store
        .merge_folder(
            &root(),
            vec![entry("docs", NodeKind::File), entry("a.md", NodeKind::File)],
        )
        .unwrap();
    let rows = store.rows();
    let docs = rows.iter().find(|r| r.name == "docs").unwrap();
    assert!(!docs.is_dir);
}

#[test]
fn added_folder_is_expanded() {
    let mut store = loaded_store();
    let signal = store.apply(WatchEvent::new(WatchKind::AddFolder, "/ws/new"));
    assert_eq!(signal, None);

    let rows = store.rows();
    let new = rows.iter().find(|r| r.name == "new").unwrap();
    assert!(new.is_dir);
    assert!(new.is_expanded);
}

#[test]
fn add_under_unresolved_folder_waits_for_listing() {
    let mut store = loaded_store();
    store.apply(WatchEvent::new(WatchKind::AddFile, "/ws/docs/late.md"));
    assert!(!store.contains(Path::new("/ws/docs/late.md")));
}

#[test]
fn content_change_routes_external_change() {
    let mut store = loaded_store();
    let event = WatchEvent::new(WatchKind::ContentChange, "/ws/a.md")
        .with_identity(etag(10, 3), Some(Cid::of("abc")));

    assert_eq!(
        store.apply(event.clone()),
        Some(TreeSignal::ExternalChange(PathBuf::from("/ws/a.md")))
    );
    assert_eq!(store.meta(Path::new("/ws/a.md")).unwrap().cid, Cid::of("abc"));

    // Same etag and cid again is a duplicate.
    assert_eq!(store.apply(event), None);
}

#[test]
fn own_save_is_not_an_external_change() {
    let mut store = loaded_store();
    let path = PathBuf::from("/ws/a.md");
    store.arm_pending_save(&path, Cid::of("saved"));

    let echo = WatchEvent::new(WatchKind::ContentChange, &path)
        .with_identity(etag(20, 5), Some(Cid::of("saved")));
    assert_eq!(store.apply(echo), None);
    assert!(!store.has_pending_save(&path));

    let foreign = WatchEvent::new(WatchKind::ContentChange, &path)
        .with_identity(etag(30, 5), Some(Cid::of("other")));
    assert_eq!(store.apply(foreign), Some(TreeSignal::ExternalChange(path)));
}

#[test]
fn pending_save_with_different_cid_still_routes() {
    let mut store = loaded_store();
    let path = PathBuf::from("/ws/a.md");
    store.arm_pending_save(&path, Cid::of("mine"));

    let event = WatchEvent::new(WatchKind::ContentChange, &path)
        .with_identity(etag(40, 5), Some(Cid::of("theirs")));
    assert_eq!(store.apply(event), Some(TreeSignal::ExternalChange(path.clone())));
    assert!(store.has_pending_save(&path));
}

#[test]
fn add_for_known_file_is_atomic_write() {
    let mut store = loaded_store();
    let event = WatchEvent::new(WatchKind::AddFile, "/ws/a.md")
        .with_identity(etag(50, 8), Some(Cid::of("replaced")));
    assert_eq!(
        store.apply(event),
        Some(TreeSignal::ExternalChange(PathBuf::from("/ws/a.md")))
    );
}

#[test]
fn unlink_removes_nodes() {
    let mut store = loaded_store();
    assert_eq!(
        store.apply(WatchEvent::new(WatchKind::UnlinkFile, "/ws/a.md")),
        Some(TreeSignal::FileRemoved(PathBuf::from("/ws/a.md")))
    );
    assert!(!store.contains(Path::new("/ws/a.md")));

    assert_eq!(
        store.apply(WatchEvent::new(WatchKind::UnlinkFolder, "/ws/docs")),
        Some(TreeSignal::FolderRemoved(PathBuf::from("/ws/docs")))
    );
    assert!(!store.contains(Path::new("/ws/docs")));
}

#[test]
fn unlinking_root_removes_workspace() {
    let mut store = loaded_store();
    assert_eq!(
        store.apply(WatchEvent::new(WatchKind::UnlinkFolder, "/ws")),
        Some(TreeSignal::WorkspaceRemoved)
    );
}

#[test]
fn events_outside_workspace_or_ignored_are_dropped() {
    let mut store = loaded_store();
    assert_eq!(
        store.apply(WatchEvent::new(WatchKind::ContentChange, "/elsewhere/a.md")),
        None
    );
    assert_eq!(
        store.apply(WatchEvent::new(WatchKind::ContentChange, "/ws/.git/HEAD")),
        None
    );
    assert_eq!(
        store.apply(WatchEvent::new(WatchKind::ContentChange, "/ws-other/a.md")),
        None
    );
}

#[test]
fn custom_ignored_names_apply() {
    let mut store = FileTreeStore::new(root()).with_ignored_names(["target"]);
    store
        .merge_folder(
            &root(),
            vec![entry("target", NodeKind::Dir), entry("src", NodeKind::Dir)],
        )
        .unwrap();
    assert!(!store.contains(Path::new("/ws/target")));
    assert_eq!(
        store.apply(WatchEvent::new(WatchKind::ContentChange, "/ws/target/x")),
        None
    );
}

#[test]
fn resolve_bookkeeping() {
    let mut store = loaded_store();
    let docs = Path::new("/ws/docs");
    assert!(store.begin_resolve(docs));
    store.resolve_failed(docs);
    assert!(!store.is_resolved(docs));
    assert!(!store.begin_resolve(Path::new("/ws/a.md")));
    assert!(!store.begin_resolve(Path::new("/ws/missing")));
}

#[test]
fn unlink_file_of_known_folder_removes_folder() {
    let mut store = loaded_store();
    assert_eq!(
        store.apply(WatchEvent::new(WatchKind::UnlinkFile, "/ws/docs")),
        Some(TreeSignal::FolderRemoved(PathBuf::from("/ws/docs")))
    );
}
