//! The refresh cycle.
//!
//! One `Monitor` owns every piece of per-pid state: the tracked set,
//! classifier history, throttle clocks and the previous cycle's records.
//! `refresh` takes `&mut self`, so cycles cannot overlap; callers that drive
//! it from a timer should run it on a single worker.
//!
//! ## Cycle
//!
//! ```text
//! tracked scan ─▶ prune state of departed pids
//!              ─▶ sample + classify each record (unavailable → skipped)
//!              ─▶ carry last_status_change, emit transitions
//!              ─▶ throttle ─▶ best-effort notifications
//! ```

use crate::classifier::ActivityClassifier;
use crate::config::MonitorConfig;
use crate::discovery::ProcessDiscoverer;
use crate::notify::{NoopNotifier, Notifier};
use crate::procfs::ProcFs;
use crate::sampler::MetricSampler;
use crate::throttle::NotificationThrottle;
use crate::tracker::{ScanMode, TrackedSet};
use crate::types::{ProcessRecord, StatusTransition};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Output of one refresh cycle.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub scan_mode: ScanMode,
    /// Classified records ordered by pid.
    pub records: Vec<ProcessRecord>,
    pub transitions: Vec<StatusTransition>,
    /// Pids an idle notification was attempted for.
    pub notified: Vec<u32>,
}

pub struct Monitor {
    tracker: TrackedSet,
    sampler: MetricSampler,
    classifier: ActivityClassifier,
    throttle: NotificationThrottle,
    notifier: Box<dyn Notifier>,
    previous: HashMap<u32, ProcessRecord>,
}

impl Monitor {
    pub fn new(config: &MonitorConfig) -> Self {
        Self::with_notifier(config, Box::new(NoopNotifier))
    }

    pub fn with_notifier(config: &MonitorConfig, notifier: Box<dyn Notifier>) -> Self {
        let procfs = ProcFs::new(&config.proc_root);
        let discoverer = ProcessDiscoverer::new(procfs.clone(), config.target.clone());
        Self {
            tracker: TrackedSet::new(
                discoverer,
                Duration::milliseconds(config.full_scan_interval_ms as i64),
            ),
            sampler: MetricSampler::new(procfs),
            classifier: ActivityClassifier::new(&config.classifier),
            throttle: NotificationThrottle::new(&config.notifications),
            notifier,
            previous: HashMap::new(),
        }
    }

    pub fn notifications_enabled(&self) -> bool {
        self.throttle.is_enabled()
    }

    pub fn set_notifications_enabled(&mut self, enabled: bool) {
        self.throttle.set_enabled(enabled);
    }

    pub fn toggle_notifications(&mut self) -> bool {
        self.throttle.toggle()
    }

    pub fn refresh(&mut self) -> RefreshReport {
        self.refresh_at(Utc::now())
    }

    pub fn refresh_at(&mut self, now: DateTime<Utc>) -> RefreshReport {
        let scan = self.tracker.scan(now);

        let known = self.tracker.known_pids();
        self.classifier.retain(known);
        self.throttle.retain(known);
        self.previous.retain(|pid, _| known.contains(pid));
        for pid in &scan.departed {
            debug!(pid, "Process departed; discarding history");
        }

        let mut records = Vec::with_capacity(scan.records.len());
        let mut transitions = Vec::new();

        for mut record in scan.records {
            let Some(mut metrics) = self.sampler.sample(record.pid, now) else {
                continue;
            };

            let classification = self.classifier.classify(record.pid, &metrics);
            metrics.cpu_percent = Some(classification.cpu_percent);
            record.status = classification.status;
            record.metrics = metrics;

            if let Some(previous) = self.previous.get(&record.pid) {
                // Start time is fixed at discovery; re-inspection only sees uptime jitter.
                record.start_time = previous.start_time;
                if previous.status != record.status {
                    record.last_status_change = now;
                    info!(
                        pid = record.pid,
                        from = ?previous.status,
                        to = ?record.status,
                        "Status changed"
                    );
                    transitions.push(StatusTransition {
                        pid: record.pid,
                        from: previous.status,
                        to: record.status,
                        at: now,
                        record: record.clone(),
                    });
                } else {
                    record.last_status_change = previous.last_status_change;
                }
            }

            records.push(record);
        }

        records.sort_by_key(|record| record.pid);

        let due = self.throttle.observe(&records, now);
        for pid in &due {
            let Some(record) = records.iter().find(|record| record.pid == *pid) else {
                continue;
            };
            if let Err(err) = self.notifier.notify_idle(record) {
                warn!(pid, error = %err, "Idle notification failed");
            }
        }

        // Pids skipped this cycle keep their last record until they leave
        // the tracked set.
        for record in &records {
            self.previous.insert(record.pid, record.clone());
        }

        RefreshReport {
            scan_mode: scan.mode,
            records,
            transitions,
            notified: due,
        }
    }
}
