//! Runtime configuration.
//!
//! Loaded from `~/.claude-monitor/config.toml`. A missing file means defaults;
//! every field is optional so partial files are fine.

use crate::error::{MonitorError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_TARGET: &str = "claude";
pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_FULL_SCAN_INTERVAL_MS: u64 = 10_000;

pub const DEFAULT_CPU_THRESHOLD_TICKS: u64 = 50;
pub const DEFAULT_IO_THRESHOLD_BYTES: u64 = 16_384;
pub const DEFAULT_DEBOUNCE_MS: u64 = 5_000;

pub const DEFAULT_IDLE_DELAY_MS: u64 = 5_000;
pub const DEFAULT_COOLDOWN_MS: u64 = 30_000;

const CONFIG_DIR: &str = ".claude-monitor";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MonitorConfig {
    /// Substring matched against each process's command name.
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    #[serde(default = "default_full_scan_interval_ms")]
    pub full_scan_interval_ms: u64,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            proc_root: default_proc_root(),
            refresh_interval_ms: default_refresh_interval_ms(),
            full_scan_interval_ms: default_full_scan_interval_ms(),
            classifier: ClassifierConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

/// Burst thresholds, calibrated against real sessions: an idle client sits
/// around 57 B/s read, 114 B/s write and 2 ticks/s; a working one around
/// 700 KB/s read, 42 KB/s write and 96 ticks/s.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClassifierConfig {
    #[serde(default = "default_cpu_threshold_ticks")]
    pub cpu_threshold_ticks: u64,
    #[serde(default = "default_io_threshold_bytes")]
    pub io_threshold_bytes: u64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            cpu_threshold_ticks: DEFAULT_CPU_THRESHOLD_TICKS,
            io_threshold_bytes: DEFAULT_IO_THRESHOLD_BYTES,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NotificationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_idle_delay_ms")]
    pub idle_delay_ms: u64,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            idle_delay_ms: DEFAULT_IDLE_DELAY_MS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
        }
    }
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_proc_root() -> PathBuf {
    PathBuf::from(DEFAULT_PROC_ROOT)
}

fn default_refresh_interval_ms() -> u64 {
    DEFAULT_REFRESH_INTERVAL_MS
}

fn default_full_scan_interval_ms() -> u64 {
    DEFAULT_FULL_SCAN_INTERVAL_MS
}

fn default_cpu_threshold_ticks() -> u64 {
    DEFAULT_CPU_THRESHOLD_TICKS
}

fn default_io_threshold_bytes() -> u64 {
    DEFAULT_IO_THRESHOLD_BYTES
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_idle_delay_ms() -> u64 {
    DEFAULT_IDLE_DELAY_MS
}

fn default_cooldown_ms() -> u64 {
    DEFAULT_COOLDOWN_MS
}

/// Returns the monitor's home directory (~/.claude-monitor).
pub fn get_monitor_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR))
}

/// Returns the default config file path.
pub fn default_config_path() -> Option<PathBuf> {
    get_monitor_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Loads the config from `path`, or from the default location when `None`.
pub fn load_config(path: Option<&Path>) -> Result<MonitorConfig> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => return Ok(MonitorConfig::default()),
        },
    };

    if !config_path.exists() {
        return Ok(MonitorConfig::default());
    }

    let content = fs_err::read_to_string(&config_path)
        .map_err(|err| MonitorError::io("Failed to read monitor config", err))?;
    toml::from_str::<MonitorConfig>(&content).map_err(|err| MonitorError::ConfigMalformed {
        path: config_path,
        details: err.to_string(),
    })
}
