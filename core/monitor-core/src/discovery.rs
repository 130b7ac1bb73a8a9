//! Process discovery: find processes whose command name matches the target.
//!
//! A candidate is only reported when its terminal and working directory both
//! resolve. Background helpers spawned by the client (no tty) are skipped.

use crate::procfs::{ProcFs, CLOCK_TICKS_PER_SEC};
use crate::types::{ActivityMetrics, ProcessRecord, ProcessStatus};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ProcessDiscoverer {
    procfs: ProcFs,
    target: String,
}

impl ProcessDiscoverer {
    pub fn new(procfs: ProcFs, target: impl Into<String>) -> Self {
        Self {
            procfs,
            target: target.into(),
        }
    }

    pub fn procfs(&self) -> &ProcFs {
        &self.procfs
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Full enumeration. An unreadable process root yields an empty list.
    pub fn discover(&self, now: DateTime<Utc>) -> Vec<ProcessRecord> {
        let pids = match self.procfs.list_pids() {
            Ok(pids) => pids,
            Err(err) => {
                warn!(error = %err, "Process enumeration failed");
                return Vec::new();
            }
        };

        pids.into_iter()
            .filter_map(|pid| self.inspect(pid, now))
            .collect()
    }

    /// Builds a fresh record for `pid` if it matches and its identity resolves.
    pub fn inspect(&self, pid: u32, now: DateTime<Utc>) -> Option<ProcessRecord> {
        let comm = self.procfs.comm(pid).ok()?;
        if !comm.contains(self.target.as_str()) {
            return None;
        }

        let tty = match self.procfs.read_link(pid, "fd/0") {
            Ok(path) => path.to_string_lossy().to_string(),
            Err(err) => {
                debug!(pid, error = %err, "Terminal unresolvable; skipping process");
                return None;
            }
        };

        let cwd = match self.procfs.read_link(pid, "cwd") {
            Ok(path) => canonical_or_raw(&path),
            Err(err) => {
                debug!(pid, error = %err, "Working directory unresolvable; skipping process");
                return None;
            }
        };

        let start_time = self.start_time(pid, now).unwrap_or(now);

        Some(ProcessRecord {
            pid,
            tty,
            cwd,
            start_time,
            status: ProcessStatus::Idle,
            last_status_change: now,
            metrics: ActivityMetrics::empty(now),
        })
    }

    fn start_time(&self, pid: u32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let stat = self.procfs.stat(pid).ok()?;
        let uptime = self.procfs.uptime_secs().ok()?;
        Some(compute_start_time(stat.start_ticks, uptime, now))
    }
}

/// Converts "ticks since boot" into an absolute instant.
pub fn compute_start_time(start_ticks: u64, uptime_secs: f64, now: DateTime<Utc>) -> DateTime<Utc> {
    let started_after_boot = start_ticks as f64 / CLOCK_TICKS_PER_SEC as f64;
    let age_secs = (uptime_secs - started_after_boot).max(0.0);
    now - Duration::milliseconds((age_secs * 1000.0).round() as i64)
}

fn canonical_or_raw(path: &Path) -> String {
    fs_err::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}
