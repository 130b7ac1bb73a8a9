//! Per-process metric sampling.
//!
//! CPU ticks and I/O counters are mandatory; without both the sample is
//! useless for classification and the process is skipped this cycle.
//! Memory and socket count degrade to absent/zero on failure.

use crate::procfs::{ProcFs, PAGE_SIZE_BYTES};
use crate::types::ActivityMetrics;
use chrono::{DateTime, Utc};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct MetricSampler {
    procfs: ProcFs,
}

impl MetricSampler {
    pub fn new(procfs: ProcFs) -> Self {
        Self { procfs }
    }

    /// Reads one sample for `pid`, timestamped `now`.
    ///
    /// Returns `None` when the process exited mid-read, access was denied, or
    /// the mandatory counters are malformed.
    pub fn sample(&self, pid: u32, now: DateTime<Utc>) -> Option<ActivityMetrics> {
        let stat = match self.procfs.stat(pid) {
            Ok(stat) => stat,
            Err(err) => {
                debug!(pid, error = %err, "CPU counters unavailable; skipping sample");
                return None;
            }
        };

        let io = match self.procfs.io(pid) {
            Ok(io) => io,
            Err(err) => {
                debug!(pid, error = %err, "I/O counters unavailable; skipping sample");
                return None;
            }
        };

        let active_connections = self.procfs.socket_count(pid).unwrap_or(0);

        let memory_rss = self
            .procfs
            .statm_resident_pages(pid)
            .ok()
            .map(|pages| pages.saturating_mul(PAGE_SIZE_BYTES));

        Some(ActivityMetrics {
            cpu_time: stat.total_ticks(),
            read_bytes: io.rchar,
            write_bytes: io.wchar,
            active_connections,
            timestamp: now,
            cpu_percent: None,
            memory_rss,
        })
    }
}
