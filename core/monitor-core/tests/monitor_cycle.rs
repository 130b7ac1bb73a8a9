//! End-to-end refresh cycles against a fabricated process tree.

use chrono::{DateTime, Duration, Utc};
use monitor_core::{
    MonitorError, Monitor, MonitorConfig, NotificationConfig, Notifier, ProcessRecord,
    ProcessStatus, ScanMode,
};
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

struct FakeProc {
    _temp_dir: tempfile::TempDir,
    root: PathBuf,
    project: PathBuf,
}

impl FakeProc {
    fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let root = temp_dir.path().join("proc");
        let project = temp_dir.path().join("project");
        fs_err::create_dir_all(&root).expect("root");
        fs_err::create_dir_all(&project).expect("project");
        fs_err::write(root.join("uptime"), "5000.00 0.00\n").expect("uptime");
        Self {
            _temp_dir: temp_dir,
            root,
            project,
        }
    }

    fn pid_dir(&self, pid: u32) -> PathBuf {
        self.root.join(pid.to_string())
    }

    fn spawn(&self, pid: u32, comm: &str) {
        let pid_dir = self.pid_dir(pid);
        fs_err::create_dir_all(pid_dir.join("fd")).expect("fd dir");
        fs_err::write(pid_dir.join("comm"), format!("{}\n", comm)).expect("comm");
        fs_err::write(pid_dir.join("statm"), "4000 2560 100 1 0 900 0\n").expect("statm");
        symlink("/dev/pts/7", pid_dir.join("fd").join("0")).expect("tty");
        symlink("socket:[555]", pid_dir.join("fd").join("9")).expect("socket");
        symlink(&self.project, pid_dir.join("cwd")).expect("cwd");
        self.set_counters(pid, 1000, 5000, 5000);
    }

    fn set_counters(&self, pid: u32, cpu_time: u64, read: u64, write: u64) {
        let pid_dir = self.pid_dir(pid);
        fs_err::write(
            pid_dir.join("stat"),
            format!(
                "{} (claude) S 1 1 1 0 -1 0 0 0 0 0 {} 0 0 0 20 0 1 0 100000 0 0",
                pid, cpu_time
            ),
        )
        .expect("stat");
        fs_err::write(
            pid_dir.join("io"),
            format!(
                "rchar: {}\nwchar: {}\nsyscr: 1\nsyscw: 1\nread_bytes: 0\nwrite_bytes: 0\n",
                read, write
            ),
        )
        .expect("io");
    }

    fn kill(&self, pid: u32) {
        fs_err::remove_dir_all(self.pid_dir(pid)).expect("kill");
    }

    fn config(&self) -> MonitorConfig {
        MonitorConfig {
            proc_root: self.root.clone(),
            ..MonitorConfig::default()
        }
    }
}

#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<u32>>>,
    fail: bool,
}

impl Notifier for RecordingNotifier {
    fn notify_idle(&self, record: &ProcessRecord) -> monitor_core::Result<()> {
        self.sent.lock().expect("lock sent").push(record.pid);
        if self.fail {
            return Err(MonitorError::CommandFailed {
                command: "notify-send".to_string(),
                details: "display unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
        .expect("parse")
        .with_timezone(&Utc)
}

fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

fn status_of(records: &[ProcessRecord], pid: u32) -> Option<ProcessStatus> {
    records
        .iter()
        .find(|record| record.pid == pid)
        .map(|record| record.status)
}

#[test]
fn first_cycle_discovers_and_reports_idle() {
    let fake = FakeProc::new();
    fake.spawn(100, "claude");
    fake.spawn(101, "bash");
    let mut monitor = Monitor::new(&fake.config());

    let report = monitor.refresh_at(t0());
    assert_eq!(report.scan_mode, ScanMode::Full);
    assert_eq!(report.records.len(), 1);

    let record = &report.records[0];
    assert_eq!(record.pid, 100);
    assert_eq!(record.status, ProcessStatus::Idle);
    assert_eq!(record.tty, "/dev/pts/7");
    assert_eq!(record.metrics.cpu_time, 1000);
    assert_eq!(record.metrics.active_connections, 1);
    assert_eq!(record.metrics.memory_rss, Some(2560 * 4096));
    assert_eq!(record.metrics.cpu_percent, Some(0.0));
    assert!(report.transitions.is_empty());
}

#[test]
fn classification_follows_bursts_and_debounce() {
    let fake = FakeProc::new();
    fake.spawn(100, "claude");
    let mut monitor = Monitor::new(&fake.config());
    monitor.refresh_at(at(0));

    // Baseline noise: Idle, 10 ticks/s.
    fake.set_counters(100, 1010, 5100, 5100);
    let report = monitor.refresh_at(at(1));
    assert_eq!(report.scan_mode, ScanMode::Incremental);
    assert_eq!(status_of(&report.records, 100), Some(ProcessStatus::Idle));
    assert_eq!(report.records[0].metrics.cpu_percent, Some(10.0));
    assert_eq!(report.records[0].last_status_change, at(0));

    // Write burst.
    fake.set_counters(100, 1020, 5100, 40_000);
    let report = monitor.refresh_at(at(2));
    assert_eq!(status_of(&report.records, 100), Some(ProcessStatus::Active));
    assert_eq!(report.records[0].last_status_change, at(2));
    assert_eq!(report.transitions.len(), 1);
    assert_eq!(report.transitions[0].from, ProcessStatus::Idle);
    assert_eq!(report.transitions[0].to, ProcessStatus::Active);
    assert_eq!(report.transitions[0].record, report.records[0]);

    // Quiet, still inside the debounce window.
    let report = monitor.refresh_at(at(4));
    assert_eq!(status_of(&report.records, 100), Some(ProcessStatus::Active));
    assert_eq!(report.records[0].last_status_change, at(2));
    assert!(report.transitions.is_empty());

    // Debounce expired.
    let report = monitor.refresh_at(at(7));
    assert_eq!(status_of(&report.records, 100), Some(ProcessStatus::Idle));
    assert_eq!(report.records[0].last_status_change, at(7));
    assert!(report.transitions[0].became_idle());
}

#[test]
fn start_time_is_fixed_at_discovery() {
    let fake = FakeProc::new();
    fake.spawn(100, "claude");
    let mut monitor = Monitor::new(&fake.config());

    let first = monitor.refresh_at(at(0)).records[0].start_time;
    // Started 1000s after boot with 5000s uptime.
    assert_eq!(first, at(-4000));

    fs_err::remove_file(fake.root.join("uptime")).expect("remove uptime");
    let report = monitor.refresh_at(at(1));
    assert_eq!(report.records[0].start_time, first);

    fs_err::write(fake.root.join("uptime"), "5003.00 0.00\n").expect("uptime");
    let report = monitor.refresh_at(at(2));
    assert_eq!(report.records[0].start_time, first);

    // A full rescan of the same process keeps it too.
    let report = monitor.refresh_at(at(10));
    assert_eq!(report.scan_mode, ScanMode::Full);
    assert_eq!(report.records[0].start_time, first);
}

#[test]
fn new_processes_wait_for_the_next_full_scan() {
    let fake = FakeProc::new();
    fake.spawn(100, "claude");
    let mut monitor = Monitor::new(&fake.config());
    monitor.refresh_at(at(0));

    fake.spawn(200, "claude");
    let report = monitor.refresh_at(at(9));
    assert_eq!(report.scan_mode, ScanMode::Incremental);
    assert!(status_of(&report.records, 200).is_none());

    let report = monitor.refresh_at(at(10));
    assert_eq!(report.scan_mode, ScanMode::Full);
    assert_eq!(
        report.records.iter().map(|r| r.pid).collect::<Vec<_>>(),
        vec![100, 200]
    );
}

#[test]
fn reused_pid_starts_without_history() {
    let fake = FakeProc::new();
    fake.spawn(100, "claude");
    let mut monitor = Monitor::new(&fake.config());
    monitor.refresh_at(at(0));
    fake.set_counters(100, 5000, 5000, 5000);
    let report = monitor.refresh_at(at(1));
    assert_eq!(status_of(&report.records, 100), Some(ProcessStatus::Active));

    fake.kill(100);
    let report = monitor.refresh_at(at(2));
    assert!(report.records.is_empty());

    // Same pid, new process with much larger counters.
    fake.spawn(100, "claude");
    fake.set_counters(100, 900_000, 9_000_000, 9_000_000);
    let report = monitor.refresh_at(at(12));
    assert_eq!(report.scan_mode, ScanMode::Full);
    assert_eq!(status_of(&report.records, 100), Some(ProcessStatus::Idle));
    assert!(report.transitions.is_empty());
    assert_eq!(report.records[0].last_status_change, at(12));
}

#[test]
fn unavailable_sample_skips_process_for_one_cycle() {
    let fake = FakeProc::new();
    fake.spawn(100, "claude");
    let mut monitor = Monitor::new(&fake.config());
    monitor.refresh_at(at(0));

    fs_err::remove_file(fake.pid_dir(100).join("io")).expect("remove io");
    let report = monitor.refresh_at(at(1));
    assert!(report.records.is_empty());

    fake.set_counters(100, 1000, 5000, 5000);
    let report = monitor.refresh_at(at(2));
    assert_eq!(status_of(&report.records, 100), Some(ProcessStatus::Idle));
    assert_eq!(report.records[0].last_status_change, at(0));
}

#[test]
fn unreadable_process_root_yields_empty_report() {
    let config = MonitorConfig {
        proc_root: Path::new("/definitely/not/a/proc/root").to_path_buf(),
        ..MonitorConfig::default()
    };
    let mut monitor = Monitor::new(&config);
    let report = monitor.refresh_at(t0());
    assert!(report.records.is_empty());
    assert!(report.transitions.is_empty());
}

#[test]
fn idle_notifications_respect_delay_and_cooldown() {
    let fake = FakeProc::new();
    fake.spawn(100, "claude");
    let notifier = RecordingNotifier::default();
    let config = MonitorConfig {
        notifications: NotificationConfig {
            enabled: true,
            ..NotificationConfig::default()
        },
        ..fake.config()
    };
    let mut monitor = Monitor::with_notifier(&config, Box::new(notifier.clone()));

    for secs in [0, 1, 2, 3, 4] {
        assert!(monitor.refresh_at(at(secs)).notified.is_empty());
    }
    assert_eq!(monitor.refresh_at(at(5)).notified, vec![100]);
    assert!(monitor.refresh_at(at(15)).notified.is_empty());
    assert_eq!(monitor.refresh_at(at(36)).notified, vec![100]);
    assert_eq!(*notifier.sent.lock().expect("lock sent"), vec![100, 100]);
}

#[test]
fn notifications_stay_silent_while_disabled() {
    let fake = FakeProc::new();
    fake.spawn(100, "claude");
    let notifier = RecordingNotifier::default();
    let mut monitor = Monitor::with_notifier(&fake.config(), Box::new(notifier.clone()));
    assert!(!monitor.notifications_enabled());

    monitor.refresh_at(at(0));
    assert!(monitor.refresh_at(at(20)).notified.is_empty());
    assert!(notifier.sent.lock().expect("lock sent").is_empty());

    assert!(monitor.toggle_notifications());
    assert_eq!(monitor.refresh_at(at(21)).notified, vec![100]);
}

#[test]
fn delivery_failures_do_not_block_other_processes() {
    let fake = FakeProc::new();
    fake.spawn(100, "claude");
    fake.spawn(101, "claude");
    let notifier = RecordingNotifier {
        fail: true,
        ..RecordingNotifier::default()
    };
    let mut monitor = Monitor::with_notifier(&fake.config(), Box::new(notifier.clone()));
    monitor.set_notifications_enabled(true);

    monitor.refresh_at(at(0));
    let report = monitor.refresh_at(at(5));
    assert_eq!(report.notified, vec![100, 101]);
    assert_eq!(report.records.len(), 2);
    assert_eq!(*notifier.sent.lock().expect("lock sent"), vec![100, 101]);
}
