//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod close_waiters;
pub mod codec;
pub mod file;
pub mod file_watcher;
pub mod headless;
pub mod paths;
pub mod runtime;
pub mod settings;
pub mod store;

pub use close_waiters::CloseWaiters;
pub use codec::BlockCodec;
pub use file::LocalFileSystem;
pub use file_watcher::FileWatcherService;
pub use headless::{HeadlessNavigator, TracingNotifier};
pub use paths::{ensure_log_dir, get_log_dir, get_store_path};
pub use runtime::{AsyncRuntime, EffectRunner, TokioExecutor};
pub use settings::{
    ensure_settings_file, get_settings_path, load_settings, load_settings_from, SettingsError,
};
pub use store::MemoryStore;
