use super::*;

fn tree() -> FileTree {
    FileTree::new(PathBuf::from("/root"))
}

#[test]
fn test_new_tree() {
    let tree = FileTree::new(PathBuf::from("/test"));
    assert!(tree.is_dir(tree.root()));
    assert!(tree.is_expanded(tree.root()));
    assert_eq!(tree.absolute_root(), Path::new("/test"));
}

#[test]
fn test_insert_child() {
    let mut tree = tree();
    let root = tree.root();

    let file_id = tree
        .insert_child(root, "file.txt".into(), NodeKind::File)
        .unwrap();
    let dir_id = tree
        .insert_child(root, "subdir".into(), NodeKind::Dir)
        .unwrap();

    assert!(!tree.is_dir(file_id));
    assert!(tree.is_dir(dir_id));
    assert_eq!(tree.load_state(dir_id), Some(LoadState::NotLoaded));
}

#[test]
fn test_insert_duplicate_name_is_rejected() {
    let mut tree = tree();
    let root = tree.root();

    tree.insert_child(root, "a.md".into(), NodeKind::File)
        .unwrap();
    let err = tree
        .insert_child(root, "a.md".into(), NodeKind::File)
        .unwrap_err();
    assert!(matches!(err, FileTreeError::NameExists));
}

#[test]
fn test_insert_under_file_is_rejected() {
    let mut tree = tree();
    let root = tree.root();

    let file_id = tree
        .insert_child(root, "a.md".into(), NodeKind::File)
        .unwrap();
    let err = tree
        .insert_child(file_id, "b.md".into(), NodeKind::File)
        .unwrap_err();
    assert!(matches!(err, FileTreeError::ParentNotDirectory));
}

#[test]
fn test_delete() {
    let mut tree = tree();
    let root = tree.root();

    let file_id = tree
        .insert_child(root, "file.txt".into(), NodeKind::File)
        .unwrap();
    tree.delete(file_id).unwrap();

    assert!(tree.kind(file_id).is_none());
    assert!(tree
        .find_node_by_path(Path::new("/root/file.txt"))
        .is_none());
}

#[test]
fn test_delete_root_is_rejected() {
    let mut tree = tree();
    let root = tree.root();
    assert!(tree.delete(root).is_err());
}

#[test]
fn test_toggle_expand() {
    let mut tree = tree();
    let root = tree.root();

    let dir_id = tree
        .insert_child(root, "subdir".into(), NodeKind::Dir)
        .unwrap();

    assert!(!tree.is_expanded(dir_id));
    tree.toggle_expand(dir_id);
    assert!(tree.is_expanded(dir_id));
    tree.toggle_expand(dir_id);
    assert!(!tree.is_expanded(dir_id));
}

#[test]
fn test_flatten_for_view() {
    let mut tree = tree();
    let root = tree.root();

    tree.insert_child(root, "file1.txt".into(), NodeKind::File)
        .unwrap();
    let dir_id = tree
        .insert_child(root, "subdir".into(), NodeKind::Dir)
        .unwrap();
    tree.insert_child(dir_id, "file2.txt".into(), NodeKind::File)
        .unwrap();

    let rows = tree.flatten_for_view();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].is_dir);

    tree.expand(dir_id);
    let rows = tree.flatten_for_view();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].depth, 2);
}

#[test]
fn test_find_node_by_path_and_full_path_agree() {
    let mut tree = tree();
    let root = tree.root();

    let dir_id = tree
        .insert_child(root, "docs".into(), NodeKind::Dir)
        .unwrap();
    let file_id = tree
        .insert_child(dir_id, "a.md".into(), NodeKind::File)
        .unwrap();

    assert_eq!(tree.full_path(file_id), PathBuf::from("/root/docs/a.md"));
    assert_eq!(
        tree.find_node_by_path(Path::new("/root/docs/a.md")),
        Some(file_id)
    );
    assert_eq!(tree.find_node_by_path(Path::new("/elsewhere/a.md")), None);
}

#[test]
fn test_meta_only_attaches_to_files() {
    let mut tree = tree();
    let root = tree.root();

    let file_id = tree
        .insert_child(root, "a.md".into(), NodeKind::File)
        .unwrap();
    let dir_id = tree
        .insert_child(root, "docs".into(), NodeKind::Dir)
        .unwrap();
    let meta = FileMeta {
        etag: Etag {
            modify_time_ms: 1,
            size: 2,
        },
        cid: Cid::of("hello"),
    };

    tree.set_meta(file_id, meta.clone());
    tree.set_meta(dir_id, meta.clone());

    assert_eq!(tree.meta(file_id), Some(&meta));
    assert_eq!(tree.meta(dir_id), None);
}

#[test]
fn test_expanded_paths_excludes_root() {
    let mut tree = tree();
    let root = tree.root();

    let dir_id = tree
        .insert_child(root, "docs".into(), NodeKind::Dir)
        .unwrap();
    tree.expand(dir_id);

    assert_eq!(tree.expanded_paths(), vec![PathBuf::from("/root/docs")]);
}

#[test]
fn should_ignore_filters_vcs_and_os_noise() {
    assert!(should_ignore(".git"));
    assert!(should_ignore(".DS_Store"));
    assert!(!should_ignore("README.md"));
}
