use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A user-visible toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub path: Option<PathBuf>,
    pub detail: Option<String>,
}

impl Notice {
    pub fn error(title: impl Into<String>, path: &Path, detail: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            path: Some(path.to_path_buf()),
            detail: Some(detail.into()),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Told whenever a tab showing `path` is closed, for callers waiting on it.
pub trait FileClosedListener: Send + Sync {
    fn file_closed(&self, path: &Path);
}
