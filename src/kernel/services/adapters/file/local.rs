//! 本地文件系统
//!
//! 实现 FileSystem port：读取时同时计算 cid 与 etag

use crate::kernel::language::FileType;
use crate::kernel::services::ports::file::{DirEntry, FileContent, FileError, FileSystem, Result};
use crate::models::{Cid, Etag, NodeKind};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn read(&self, path: &Path) -> Result<FileContent> {
        let metadata = fs::metadata(path).map_err(|e| FileError::io(path, e))?;
        if !metadata.is_file() {
            return Err(FileError::NotAFile(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| FileError::io(path, e))?;
        Ok(FileContent {
            path: path.to_path_buf(),
            file_type: FileType::from_path(path),
            cid: Cid::of(&content),
            etag: Etag::from_metadata(&metadata),
            content,
        })
    }

    fn save(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| FileError::io(parent, e))?;
            }
        }
        fs::write(path, content).map_err(|e| FileError::io(path, e))?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "file written");
        Ok(())
    }

    fn stat(&self, path: &Path) -> Result<Etag> {
        let metadata = fs::metadata(path).map_err(|e| FileError::io(path, e))?;
        Ok(Etag::from_metadata(&metadata))
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| FileError::io(dir, e))? {
            let entry = entry.map_err(|e| FileError::io(dir, e))?;
            // 条目在列举期间被删除时跳过
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            let kind = if metadata.is_dir() {
                NodeKind::Dir
            } else {
                NodeKind::File
            };
            entries.push(DirEntry {
                name: entry.file_name(),
                kind,
                etag: Etag::from_metadata(&metadata),
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/file/local.rs"]
mod tests;
