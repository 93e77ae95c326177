use clap::Parser;
use docket::app::{Workbench, WorkbenchError};
use docket::kernel::pane::OpenRequest;
use docket::kernel::route::OpenSource;
use docket::kernel::services::adapters::{
    ensure_settings_file, get_store_path, load_settings_from, AsyncRuntime, BlockCodec,
    CloseWaiters, FileWatcherService, HeadlessNavigator, LocalFileSystem, MemoryStore,
    SettingsError, TracingNotifier,
};
use docket::kernel::services::ports::{Settings, StoreError};
use docket::kernel::services::{KernelBusSender, KernelMessage, KernelServices};
use docket::kernel::ViewKind;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

mod logging;

/// Headless document workspace: opens files into a pane, keeps their cached
/// editor state in step with disk and watches the folder for outside edits.
#[derive(Debug, Parser)]
#[command(name = "docket", version, about)]
struct Cli {
    /// Workspace folder to watch.
    workspace: PathBuf,

    /// Files to open on startup, relative to the workspace or absolute.
    files: Vec<PathBuf>,

    /// View to open the files in (rich or source).
    #[arg(long)]
    view: Option<ViewKind>,

    /// Settings file; defaults to ~/.docket/settings.json.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Mirror the log to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error("workspace {}: {source}", path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("workspace {} is not a folder", .0.display())]
    NotAFolder(PathBuf),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Workbench(#[from] WorkbenchError),
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (settings, settings_error) = load_settings(cli.settings.clone());
    let _logging = logging::init(&settings.log_filter, cli.verbose);
    if let Some(e) = settings_error {
        tracing::warn!(error = %e, "settings not loaded, using defaults");
    }

    match run(cli, settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "docket exited with error");
            eprintln!("docket: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_settings(explicit: Option<PathBuf>) -> (Settings, Option<SettingsError>) {
    let path = match explicit {
        Some(path) => path,
        None => match ensure_settings_file() {
            Ok(path) => path,
            Err(_) => return (Settings::default(), None),
        },
    };
    match load_settings_from(&path) {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    }
}

fn run(cli: Cli, settings: Settings) -> Result<(), StartupError> {
    let root = cli
        .workspace
        .canonicalize()
        .map_err(|source| StartupError::Workspace {
            path: cli.workspace.clone(),
            source,
        })?;
    if !root.is_dir() {
        return Err(StartupError::NotAFolder(root));
    }

    let store = match settings.store_file.clone().or_else(get_store_path) {
        Some(path) => MemoryStore::open(path)?,
        None => {
            tracing::warn!("no data dir, store is not persisted");
            MemoryStore::new()
        }
    };
    let services = KernelServices {
        fs: Arc::new(LocalFileSystem::new()),
        store: Arc::new(store),
        codec: Arc::new(BlockCodec::new()),
        navigator: Arc::new(HeadlessNavigator::new()),
        notifier: Arc::new(TracingNotifier),
        closed: Arc::new(CloseWaiters::new()),
    };

    let runtime = AsyncRuntime::new().map_err(StartupError::Runtime)?;
    let mut workbench = Workbench::new(&root, services, runtime, &settings)?;
    match FileWatcherService::new(&root, settings.watch_poll_interval(), &settings.ignored_names) {
        Ok(watcher) => workbench = workbench.with_watcher(watcher),
        Err(e) => tracing::warn!(error = %e, "file watcher unavailable, outside edits go unnoticed"),
    }

    install_termination_signals(workbench.bus()).map_err(StartupError::Signals)?;

    for file in cli.files {
        let path = if file.is_absolute() { file } else { root.join(file) };
        let mut request = OpenRequest::new(path).with_source(OpenSource::Cli);
        if let Some(view) = cli.view {
            request = request.with_view(view);
        }
        workbench.open(request);
    }

    workbench.run(settings.watch_poll_interval());
    Ok(())
}

#[cfg(unix)]
fn install_termination_signals(bus: KernelBusSender) -> io::Result<()> {
    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::spawn(move || {
        for sig in signals.forever() {
            tracing::info!(signal = sig, "termination requested");
            if bus.send(KernelMessage::Shutdown).is_err() {
                break;
            }
            // Grace period: if the loop is wedged, hard-exit.
            std::thread::sleep(Duration::from_secs(2));
            std::process::exit(128 + sig);
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn install_termination_signals(_bus: KernelBusSender) -> io::Result<()> {
    Ok(())
}
