//! File system contract.

use crate::kernel::language::FileType;
use crate::models::{Cid, Etag, NodeKind};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FileError>;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FileError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::NotAFile(_))
    }
}

/// A file read from disk together with its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub path: PathBuf,
    pub file_type: FileType,
    pub content: String,
    pub cid: Cid,
    pub etag: Etag,
}

/// One child of a listed folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: OsString,
    pub kind: NodeKind,
    pub etag: Etag,
}

pub trait FileSystem: Send + Sync {
    fn read(&self, path: &Path) -> Result<FileContent>;

    fn save(&self, path: &Path, content: &str) -> Result<()>;

    fn stat(&self, path: &Path) -> Result<Etag>;

    /// Immediate children of `dir`, unsorted.
    fn list_dir(&self, dir: &Path) -> Result<Vec<DirEntry>>;
}
