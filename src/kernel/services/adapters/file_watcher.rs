use crate::kernel::file_tree_store::{WatchEvent, WatchKind};
use crate::models::{should_ignore, Cid, Etag};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
enum FsDelta {
    Created { path: PathBuf, is_dir: bool },
    Deleted { path: PathBuf, is_dir: bool },
    Modified { path: PathBuf },
}

#[derive(Default)]
struct DrainBuckets {
    unlinked: FxHashMap<PathBuf, bool>,
    added: FxHashMap<PathBuf, bool>,
    modified: FxHashSet<PathBuf>,
}

/// Recursive workspace watcher that normalizes notify's platform events into
/// [`WatchEvent`]s carrying etag and cid.
pub struct FileWatcherService {
    watcher: RecommendedWatcher,
    raw_event_rx: mpsc::Receiver<notify::Event>,
    workspace_root: PathBuf,
    ignored_names: FxHashSet<String>,
    fingerprints: FxHashMap<PathBuf, Etag>,
}

impl FileWatcherService {
    pub fn new(
        workspace_root: &Path,
        poll_interval: Duration,
        ignored_names: &[String],
    ) -> Result<Self, notify::Error> {
        let workspace_root = workspace_root
            .canonicalize()
            .unwrap_or_else(|_| workspace_root.to_path_buf());
        let (tx, rx) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                let Ok(event) = res else { return };
                let _ = tx.send(event);
            },
            Config::default().with_poll_interval(poll_interval),
        )?;
        watcher.watch(&workspace_root, RecursiveMode::Recursive)?;
        tracing::info!(root = %workspace_root.display(), "watching workspace");
        Ok(Self {
            watcher,
            raw_event_rx: rx,
            workspace_root,
            ignored_names: ignored_names.iter().cloned().collect(),
            fingerprints: FxHashMap::default(),
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Seeds fingerprints for open files so metadata-only noise on them is
    /// not reported as a content change.
    pub fn sync_open_files<'a, I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = &'a Path>,
    {
        for path in paths {
            if self.fingerprints.contains_key(path) {
                continue;
            }
            if let Some(etag) = file_etag(path) {
                self.fingerprints.insert(path.to_path_buf(), etag);
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<WatchEvent> {
        let _watcher_guard = &self.watcher;

        let mut buckets = DrainBuckets::default();
        while let Ok(event) = self.raw_event_rx.try_recv() {
            for delta in normalize_notify_event(event) {
                self.route_delta(delta, &mut buckets);
            }
        }

        let DrainBuckets {
            unlinked,
            added,
            modified,
        } = buckets;

        let mut events = Vec::new();

        let mut unlinked = unlinked.into_iter().collect::<Vec<_>>();
        unlinked.sort_unstable();
        for (path, is_dir) in unlinked {
            self.fingerprints.remove(&path);
            let kind = if is_dir || path == self.workspace_root {
                WatchKind::UnlinkFolder
            } else {
                WatchKind::UnlinkFile
            };
            events.push(WatchEvent::new(kind, path));
        }

        let mut added = added.into_iter().collect::<Vec<_>>();
        added.sort_unstable();
        for (path, is_dir) in added {
            if is_dir {
                events.push(WatchEvent::new(WatchKind::AddFolder, path));
            } else if let Some((etag, cid)) = file_identity(&path) {
                self.fingerprints.insert(path.clone(), etag);
                events.push(WatchEvent::new(WatchKind::AddFile, path).with_identity(etag, cid));
            }
        }

        let mut modified = modified.into_iter().collect::<Vec<_>>();
        modified.sort_unstable();
        for path in modified {
            let Some((etag, cid)) = file_identity(&path) else {
                continue;
            };
            if self.fingerprints.insert(path.clone(), etag) == Some(etag) {
                continue;
            }
            events.push(WatchEvent::new(WatchKind::ContentChange, path).with_identity(etag, cid));
        }

        events
    }

    fn route_delta(&self, delta: FsDelta, buckets: &mut DrainBuckets) {
        match delta {
            FsDelta::Created { path, is_dir } => {
                if !path.exists() {
                    return;
                }
                if let Some(path) = self.to_workspace_path(&path) {
                    buckets.unlinked.remove(&path);
                    let entry = buckets.added.entry(path).or_insert(false);
                    *entry |= is_dir;
                }
            }
            FsDelta::Deleted { path, is_dir } => {
                let Some(path) = self.to_workspace_path(&path) else {
                    return;
                };
                if path.exists() {
                    // Deleted and recreated within one drain.
                    buckets.modified.insert(path);
                    return;
                }
                buckets.added.remove(&path);
                buckets.modified.remove(&path);
                let entry = buckets.unlinked.entry(path).or_insert(false);
                *entry |= is_dir;
            }
            FsDelta::Modified { path } => {
                let Some(path) = self.to_workspace_path(&path) else {
                    return;
                };
                if path.is_file() && !buckets.added.contains_key(&path) {
                    buckets.modified.insert(path);
                }
            }
        }
    }

    fn to_workspace_path(&self, path: &Path) -> Option<PathBuf> {
        let raw = raw_absolute_path(path, &self.workspace_root);
        let workspace = self.workspace_root.as_path();

        let resolved = if raw.starts_with(workspace) {
            Some(raw)
        } else {
            raw.canonicalize()
                .ok()
                .filter(|canonical| canonical.starts_with(workspace))
        }?;

        if self.contains_ignored_component(&resolved) {
            return None;
        }
        Some(resolved)
    }

    fn contains_ignored_component(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.workspace_root).unwrap_or(path);
        relative.components().any(|component| {
            if let Component::Normal(name) = component {
                let name = name.to_string_lossy();
                should_ignore(&name) || self.ignored_names.contains(name.as_ref())
            } else {
                false
            }
        })
    }
}

fn raw_absolute_path(path: &Path, workspace_root: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace_root.join(path)
    }
}

fn infer_is_dir(path: &Path, create_kind: Option<CreateKind>) -> bool {
    match create_kind {
        Some(CreateKind::Folder) => true,
        Some(CreateKind::File) => false,
        _ => std::fs::metadata(path)
            .map(|meta| meta.is_dir())
            .unwrap_or(false),
    }
}

fn file_etag(path: &Path) -> Option<Etag> {
    let metadata = std::fs::metadata(path).ok()?;
    metadata.is_file().then(|| Etag::from_metadata(&metadata))
}

/// Etag plus content hash; the hash is absent for non-UTF-8 files.
fn file_identity(path: &Path) -> Option<(Etag, Option<Cid>)> {
    let etag = file_etag(path)?;
    let cid = std::fs::read_to_string(path).ok().map(|text| Cid::of(&text));
    Some((etag, cid))
}

fn normalize_notify_event(event: notify::Event) -> Vec<FsDelta> {
    match event.kind {
        EventKind::Create(create_kind) => event
            .paths
            .into_iter()
            .map(|path| FsDelta::Created {
                is_dir: infer_is_dir(path.as_path(), Some(create_kind)),
                path,
            })
            .collect(),
        EventKind::Remove(remove_kind) => event
            .paths
            .into_iter()
            .map(|path| FsDelta::Deleted {
                path,
                is_dir: remove_kind == RemoveKind::Folder,
            })
            .collect(),
        EventKind::Modify(kind) => normalize_modify_event(kind, event.paths),
        _ => Vec::new(),
    }
}

fn normalize_modify_event(kind: ModifyKind, paths: Vec<PathBuf>) -> Vec<FsDelta> {
    match kind {
        ModifyKind::Name(RenameMode::Both) if paths.len() >= 2 => {
            let to = paths[1].clone();
            vec![
                FsDelta::Deleted {
                    path: paths[0].clone(),
                    is_dir: false,
                },
                FsDelta::Created {
                    is_dir: infer_is_dir(&to, None),
                    path: to,
                },
            ]
        }
        ModifyKind::Name(RenameMode::From) => paths
            .into_iter()
            .map(|path| FsDelta::Deleted {
                path,
                is_dir: false,
            })
            .collect(),
        ModifyKind::Name(RenameMode::To) => paths
            .into_iter()
            .map(|path| FsDelta::Created {
                is_dir: infer_is_dir(path.as_path(), None),
                path,
            })
            .collect(),
        ModifyKind::Data(_)
        | ModifyKind::Any
        | ModifyKind::Other
        | ModifyKind::Metadata(_)
        | ModifyKind::Name(_) => paths
            .into_iter()
            .map(|path| FsDelta::Modified { path })
            .collect(),
    }
}
