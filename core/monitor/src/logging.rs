//! Tracing setup.
//!
//! The watch view owns stdout, so logs go to a daily file under
//! `~/.claude-monitor/logs/`. Without a home directory they fall back to stderr.

use std::env;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "claude-monitor.log";
const DEBUG_ENV: &str = "CLAUDE_MONITOR_DEBUG_LOG";

/// Installs the global subscriber. Keep the returned guard alive until exit
/// or buffered log lines are lost.
pub fn init() -> Option<WorkerGuard> {
    let filter = env_filter();

    let Some(log_dir) = monitor_core::config::get_monitor_dir().map(|dir| dir.join(LOG_DIR))
    else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return None;
    };

    if let Err(err) = fs_err::create_dir_all(&log_dir) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        tracing::warn!(error = %err, "Failed to create log directory; logging to stderr");
        return None;
    }

    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

fn env_filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}
