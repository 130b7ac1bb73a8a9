//! Error types for monitor-core operations.
//!
//! Most of these never reach a user: per-process read failures are turned
//! into "skip this process this cycle" by the sampler and discoverer.

use std::path::PathBuf;

/// All errors that can occur in monitor-core operations.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    // ─────────────────────────────────────────────────────────────────────
    // Process-information source
    // ─────────────────────────────────────────────────────────────────────
    #[error("Process root unreadable: {path}: {source}")]
    ProcRootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed process data: {path}: {details}")]
    Parse { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // External commands
    // ─────────────────────────────────────────────────────────────────────
    #[error("Command execution failed: {command}: {details}")]
    CommandFailed { command: String, details: String },

    #[error("Command timed out after {timeout_ms}ms: {command}")]
    CommandTimedOut { command: String, timeout_ms: u64 },
}

impl MonitorError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        MonitorError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        MonitorError::Parse {
            path: path.into(),
            details: details.into(),
        }
    }
}

/// Convenience type alias for Results using MonitorError.
pub type Result<T> = std::result::Result<T, MonitorError>;

impl From<MonitorError> for String {
    fn from(err: MonitorError) -> String {
        err.to_string()
    }
}
