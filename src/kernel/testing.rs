//! In-memory doubles for the service ports, shared by unit tests.

use crate::kernel::language::FileType;
use crate::kernel::route::Route;
use crate::kernel::services::ports::{
    AsyncExecutor, BoxFuture, DirEntry, FileClosedListener, FileContent, FileError, FileResult,
    FileSystem, NavigationError, Navigator, Notice, Notifier,
};
use crate::models::{Cid, Etag, NodeKind};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryFs {
    files: Mutex<FxHashMap<PathBuf, (String, Etag)>>,
    clock: AtomicU64,
    fail_saves: AtomicBool,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content: &str) -> Self {
        self.put(path, content);
        self
    }

    pub fn put(&self, path: impl Into<PathBuf>, content: &str) {
        let etag = Etag {
            modify_time_ms: self.clock.fetch_add(1, Ordering::SeqCst) + 1,
            size: content.len() as u64,
        };
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), (content.to_string(), etag));
    }

    pub fn remove(&self, path: &Path) {
        self.files.lock().unwrap().remove(path);
    }

    pub fn content(&self, path: &Path) -> Option<String> {
        self.files.lock().unwrap().get(path).map(|(c, _)| c.clone())
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl FileSystem for MemoryFs {
    fn read(&self, path: &Path) -> FileResult<FileContent> {
        let files = self.files.lock().unwrap();
        let (content, etag) = files
            .get(path)
            .ok_or_else(|| FileError::NotFound(path.to_path_buf()))?;
        Ok(FileContent {
            path: path.to_path_buf(),
            file_type: FileType::from_path(path),
            content: content.clone(),
            cid: Cid::of(content),
            etag: *etag,
        })
    }

    fn save(&self, path: &Path, content: &str) -> FileResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(FileError::PermissionDenied(path.to_path_buf()));
        }
        self.put(path, content);
        Ok(())
    }

    fn stat(&self, path: &Path) -> FileResult<Etag> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|(_, etag)| *etag)
            .ok_or_else(|| FileError::NotFound(path.to_path_buf()))
    }

    fn list_dir(&self, dir: &Path) -> FileResult<Vec<DirEntry>> {
        let files = self.files.lock().unwrap();
        let mut children: BTreeMap<OsString, DirEntry> = BTreeMap::new();
        for (path, (_, etag)) in files.iter() {
            let Ok(rest) = path.strip_prefix(dir) else {
                continue;
            };
            let mut parts = rest.components();
            let Some(first) = parts.next() else {
                continue;
            };
            let name = first.as_os_str().to_os_string();
            let kind = if parts.next().is_some() {
                NodeKind::Dir
            } else {
                NodeKind::File
            };
            children.entry(name.clone()).or_insert(DirEntry {
                name,
                kind,
                etag: *etag,
            });
        }
        if children.is_empty() && !files.keys().any(|p| p.starts_with(dir)) {
            return Err(FileError::NotFound(dir.to_path_buf()));
        }
        Ok(children.into_values().collect())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
    invalidations: AtomicUsize,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Route> {
        self.routes.lock().unwrap().last().cloned()
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }

    fn invalidate(&self) -> Result<(), NavigationError> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

#[derive(Debug, Default)]
pub struct RecordingClosed {
    closed: Mutex<Vec<PathBuf>>,
}

impl RecordingClosed {
    pub fn closed(&self) -> Vec<PathBuf> {
        self.closed.lock().unwrap().clone()
    }
}

impl FileClosedListener for RecordingClosed {
    fn file_closed(&self, path: &Path) {
        self.closed.lock().unwrap().push(path.to_path_buf());
    }
}

/// Holds spawned tasks until the test runs them.
#[derive(Default)]
pub struct QueueExecutor {
    tasks: Mutex<Vec<BoxFuture>>,
}

impl QueueExecutor {
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn run_all(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        for task in tasks {
            runtime.block_on(task);
        }
    }
}

impl AsyncExecutor for QueueExecutor {
    fn spawn(&self, task: BoxFuture) {
        self.tasks.lock().unwrap().push(task);
    }
}
