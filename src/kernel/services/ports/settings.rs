use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default = "default_watch_poll_interval_ms")]
    pub watch_poll_interval_ms: u64,
    /// Extra file/folder names the tree and watcher skip.
    #[serde(default)]
    pub ignored_names: Vec<String>,
    /// Where the store snapshot lives; defaults to the app data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_file: Option<PathBuf>,
}

fn default_log_filter() -> String {
    "docket=info".to_string()
}

fn default_watch_poll_interval_ms() -> u64 {
    250
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            watch_poll_interval_ms: default_watch_poll_interval_ms(),
            ignored_names: Vec::new(),
            store_file: None,
        }
    }
}

impl Settings {
    pub fn watch_poll_interval(&self) -> Duration {
        Duration::from_millis(self.watch_poll_interval_ms.max(10))
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        crate::models::should_ignore(name) || self.ignored_names.iter().any(|n| n == name)
    }
}
