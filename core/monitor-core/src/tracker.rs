//! Tracked-set management across refresh cycles.
//!
//! Full enumeration walks every process on the system, so it only runs on a
//! coarse interval. In between, tracked pids get a raw existence probe and
//! only the survivors are re-inspected. New processes therefore show up within
//! one full-scan interval while exits are noticed on the next cycle.

use crate::discovery::ProcessDiscoverer;
use crate::types::ProcessRecord;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Full,
    Incremental,
}

#[derive(Debug, Clone)]
pub struct TrackedScan {
    pub mode: ScanMode,
    pub records: Vec<ProcessRecord>,
    /// Pids that left the known set during this scan.
    pub departed: Vec<u32>,
}

#[derive(Debug)]
pub struct TrackedSet {
    discoverer: ProcessDiscoverer,
    full_scan_interval: Duration,
    known: BTreeSet<u32>,
    last_full_scan: Option<DateTime<Utc>>,
}

impl TrackedSet {
    pub fn new(discoverer: ProcessDiscoverer, full_scan_interval: Duration) -> Self {
        Self {
            discoverer,
            full_scan_interval,
            known: BTreeSet::new(),
            last_full_scan: None,
        }
    }

    pub fn known_pids(&self) -> &BTreeSet<u32> {
        &self.known
    }

    pub fn is_full_scan_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_full_scan {
            None => true,
            Some(last) => now.signed_duration_since(last) >= self.full_scan_interval,
        }
    }

    pub fn scan(&mut self, now: DateTime<Utc>) -> TrackedScan {
        if self.is_full_scan_due(now) {
            self.full_scan(now)
        } else {
            self.incremental_scan(now)
        }
    }

    fn full_scan(&mut self, now: DateTime<Utc>) -> TrackedScan {
        self.last_full_scan = Some(now);
        let records = self.discoverer.discover(now);
        let discovered = records.iter().map(|record| record.pid).collect::<BTreeSet<_>>();

        let departed = self.known.difference(&discovered).copied().collect::<Vec<_>>();
        let added = discovered.difference(&self.known).count();
        self.known = discovered;

        info!(
            target_name = self.discoverer.target(),
            tracked = self.known.len(),
            added,
            departed = departed.len(),
            "Full process scan complete"
        );

        TrackedScan {
            mode: ScanMode::Full,
            records,
            departed,
        }
    }

    fn incremental_scan(&mut self, now: DateTime<Utc>) -> TrackedScan {
        let procfs = self.discoverer.procfs();
        let (alive, departed): (BTreeSet<u32>, BTreeSet<u32>) =
            self.known.iter().partition(|pid| procfs.exists(**pid));
        if !departed.is_empty() {
            debug!(departed = ?departed, "Pruned exited processes");
        }
        self.known = alive;

        // Survivors that fail inspection stay known; they may resolve next cycle.
        let records = self
            .known
            .iter()
            .filter_map(|pid| self.discoverer.inspect(*pid, now))
            .collect();

        TrackedScan {
            mode: ScanMode::Incremental,
            records,
            departed: departed.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procfs::ProcFs;
    use std::os::unix::fs::symlink;
    use std::path::Path;

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("parse")
            .with_timezone(&Utc)
    }

    fn spawn_fake(root: &Path, pid: u32) {
        let pid_dir = root.join(pid.to_string());
        std::fs::create_dir_all(pid_dir.join("fd")).expect("fd dir");
        std::fs::write(pid_dir.join("comm"), "claude\n").expect("comm");
        symlink("/dev/pts/0", pid_dir.join("fd").join("0")).expect("tty");
        symlink("/", pid_dir.join("cwd")).expect("cwd");
    }

    fn kill_fake(root: &Path, pid: u32) {
        std::fs::remove_dir_all(root.join(pid.to_string())).expect("remove");
    }

    fn tracker(root: &Path) -> TrackedSet {
        TrackedSet::new(
            ProcessDiscoverer::new(ProcFs::new(root), "claude"),
            Duration::seconds(10),
        )
    }

    fn pids(scan: &TrackedScan) -> Vec<u32> {
        scan.records.iter().map(|record| record.pid).collect()
    }

    #[test]
    fn first_scan_is_full() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        spawn_fake(temp_dir.path(), 1);
        let mut tracker = tracker(temp_dir.path());

        let scan = tracker.scan(at("2026-03-01T12:00:00Z"));
        assert_eq!(scan.mode, ScanMode::Full);
        assert_eq!(pids(&scan), vec![1]);
    }

    #[test]
    fn scans_within_interval_are_incremental_and_miss_new_processes() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        spawn_fake(temp_dir.path(), 1);
        let mut tracker = tracker(temp_dir.path());
        let start = at("2026-03-01T12:00:00Z");
        tracker.scan(start);

        spawn_fake(temp_dir.path(), 2);
        let scan = tracker.scan(start + Duration::seconds(9));
        assert_eq!(scan.mode, ScanMode::Incremental);
        assert_eq!(pids(&scan), vec![1]);

        let scan = tracker.scan(start + Duration::seconds(10));
        assert_eq!(scan.mode, ScanMode::Full);
        assert_eq!(pids(&scan), vec![1, 2]);
    }

    #[test]
    fn incremental_scan_prunes_exited_processes() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        spawn_fake(temp_dir.path(), 1);
        spawn_fake(temp_dir.path(), 2);
        let mut tracker = tracker(temp_dir.path());
        let start = at("2026-03-01T12:00:00Z");
        tracker.scan(start);

        kill_fake(temp_dir.path(), 2);
        let scan = tracker.scan(start + Duration::seconds(1));
        assert_eq!(scan.mode, ScanMode::Incremental);
        assert_eq!(pids(&scan), vec![1]);
        assert_eq!(scan.departed, vec![2]);
        assert_eq!(tracker.known_pids().iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn full_scan_replaces_known_set() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        spawn_fake(temp_dir.path(), 1);
        spawn_fake(temp_dir.path(), 2);
        let mut tracker = tracker(temp_dir.path());
        let start = at("2026-03-01T12:00:00Z");
        tracker.scan(start);

        kill_fake(temp_dir.path(), 1);
        spawn_fake(temp_dir.path(), 3);
        let scan = tracker.scan(start + Duration::seconds(15));
        assert_eq!(scan.mode, ScanMode::Full);
        assert_eq!(pids(&scan), vec![2, 3]);
        assert_eq!(scan.departed, vec![1]);
        assert!(!tracker.is_full_scan_due(start + Duration::seconds(24)));
        assert!(tracker.is_full_scan_due(start + Duration::seconds(25)));
    }

    #[test]
    fn survivor_failing_inspection_stays_known() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        spawn_fake(temp_dir.path(), 1);
        let mut tracker = tracker(temp_dir.path());
        let start = at("2026-03-01T12:00:00Z");
        tracker.scan(start);

        std::fs::remove_file(temp_dir.path().join("1").join("cwd")).expect("remove cwd");
        let scan = tracker.scan(start + Duration::seconds(1));
        assert!(scan.records.is_empty());
        assert!(scan.departed.is_empty());
        assert!(tracker.known_pids().contains(&1));
    }
}
