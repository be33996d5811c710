use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration from config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub drag: DragConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON store file. Falls back to the platform data dir when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Gesture thresholds, in logical pixels and milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragConfig {
    #[serde(default = "default_entry_distance")]
    pub entry_activation_distance: f64,
    #[serde(default = "default_group_distance")]
    pub group_activation_distance: f64,
    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: i64,
}

impl Default for DragConfig {
    fn default() -> Self {
        DragConfig {
            entry_activation_distance: default_entry_distance(),
            group_activation_distance: default_group_distance(),
            long_press_ms: default_long_press_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Re-read the backend after every successful persistence sequence
    #[serde(default = "default_true")]
    pub reload_after_commit: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            reload_after_commit: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: default_log_filter(),
        }
    }
}

fn default_entry_distance() -> f64 {
    8.0
}

fn default_group_distance() -> f64 {
    5.0
}

fn default_long_press_ms() -> i64 {
    800
}

fn default_true() -> bool {
    true
}

fn default_log_filter() -> String {
    "warn".to_string()
}
