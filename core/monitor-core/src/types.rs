//! Core types shared between the engine and its consumers.
//!
//! Everything here serializes with serde so the CLI can emit snapshots as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// Status
// ═══════════════════════════════════════════════════════════════════════════════

/// Whether a monitored process is currently doing work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Active,
    Idle,
}

impl ProcessStatus {
    pub fn is_active(self) -> bool {
        matches!(self, ProcessStatus::Active)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Metrics
// ═══════════════════════════════════════════════════════════════════════════════

/// One point-in-time sample of a process's resource counters.
///
/// `read_bytes`/`write_bytes` are the logical `rchar`/`wchar` counters, which
/// include socket and pipe traffic. The physical-disk counters are dominated by
/// page cache writeback and barely move while a client streams API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetrics {
    /// Cumulative user + kernel CPU ticks.
    pub cpu_time: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
    /// Open socket descriptors at sample time.
    pub active_connections: u32,
    pub timestamp: DateTime<Utc>,
    /// CPU ticks per second since the previous sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f64>,
    /// Resident set size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_rss: Option<u64>,
}

impl ActivityMetrics {
    /// A zeroed sample, used for freshly discovered processes.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            cpu_time: 0,
            read_bytes: 0,
            write_bytes: 0,
            active_connections: 0,
            timestamp,
            cpu_percent: None,
            memory_rss: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Records
// ═══════════════════════════════════════════════════════════════════════════════

/// Identity and current classification of one monitored process.
///
/// `pid` is the only identity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    /// Controlling terminal path (e.g. `/dev/pts/3`).
    pub tty: String,
    /// Working directory, canonicalized when possible.
    pub cwd: String,
    pub start_time: DateTime<Utc>,
    pub status: ProcessStatus,
    /// Instant of the most recent status flip.
    pub last_status_change: DateTime<Utc>,
    pub metrics: ActivityMetrics,
}

/// A status flip observed between two consecutive refresh cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub pid: u32,
    pub from: ProcessStatus,
    pub to: ProcessStatus,
    pub at: DateTime<Utc>,
    /// The record as classified in the cycle that flipped.
    pub record: ProcessRecord,
}

impl StatusTransition {
    /// True for the Active → Idle edge, i.e. the process just stopped working.
    pub fn became_idle(&self) -> bool {
        self.from == ProcessStatus::Active && self.to == ProcessStatus::Idle
    }
}
