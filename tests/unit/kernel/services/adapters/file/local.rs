use super::*;
use std::fs::File;
use tempfile::tempdir;

#[test]
fn test_save_then_read() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("nested").join("note.md");

    let fs_port = LocalFileSystem::new();
    fs_port.save(&file_path, "# Hello").unwrap();

    let read = fs_port.read(&file_path).unwrap();
    assert_eq!(read.content, "# Hello");
    assert_eq!(read.cid, Cid::of("# Hello"));
    assert_eq!(read.file_type, FileType::Markdown);
    assert_eq!(read.etag.size, 7);
    assert_eq!(fs_port.stat(&file_path).unwrap(), read.etag);
}

#[test]
fn test_list_dir() {
    let dir = tempdir().unwrap();

    fs::create_dir(dir.path().join("subdir")).unwrap();
    File::create(dir.path().join("file1.txt")).unwrap();
    File::create(dir.path().join("file2.txt")).unwrap();

    let fs_port = LocalFileSystem::new();
    let mut entries = fs_port.list_dir(dir.path()).unwrap();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2].name, "subdir");
    assert_eq!(entries[2].kind, NodeKind::Dir);
    assert_eq!(entries[0].kind, NodeKind::File);
}

#[test]
fn test_not_found_error() {
    let fs_port = LocalFileSystem::new();
    let result = fs_port.read(Path::new("/nonexistent/file.txt"));
    assert!(matches!(result, Err(FileError::NotFound(_))));
    assert!(result.unwrap_err().is_not_found());
}

#[test]
fn test_read_dir_is_not_a_file() {
    let dir = tempdir().unwrap();
    let fs_port = LocalFileSystem::new();
    assert!(matches!(
        fs_port.read(dir.path()),
        Err(FileError::NotAFile(_))
    ));
}
