//! Active/idle classification from consecutive metric samples.
//!
//! ## Algorithm
//!
//! 1. First observation of a pid → Idle (nothing to compare against).
//! 2. Non-positive elapsed time → Idle with zero CPU rate.
//! 3. Deltas are clamped at zero, so counter wrap or pid reuse never reads
//!    as a burst.
//! 4. A burst (CPU or either I/O delta over threshold) → Active and the
//!    last-activity instant is refreshed.
//! 5. No burst, but a burst within the debounce window → still Active.
//!    Client activity is bursty; without this the status flickers between
//!    API round trips.
//!
//! "Now" is the current sample's timestamp.

use crate::config::ClassifierConfig;
use crate::types::{ActivityMetrics, ProcessStatus};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub status: ProcessStatus,
    /// CPU ticks per second over the interval. Relative to the clock-tick
    /// rate, so 100 means one full core at 100 Hz.
    pub cpu_percent: f64,
}

impl Classification {
    fn idle() -> Self {
        Self {
            status: ProcessStatus::Idle,
            cpu_percent: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct PidHistory {
    previous: Option<ActivityMetrics>,
    last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct ActivityClassifier {
    cpu_threshold_ticks: u64,
    io_threshold_bytes: u64,
    debounce: Duration,
    history: HashMap<u32, PidHistory>,
}

impl Default for ActivityClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl ActivityClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            cpu_threshold_ticks: config.cpu_threshold_ticks,
            io_threshold_bytes: config.io_threshold_bytes,
            debounce: Duration::milliseconds(config.debounce_ms as i64),
            history: HashMap::new(),
        }
    }

    /// Classifies `current` against the stored previous sample for `pid`, then
    /// stores `current` as the new previous sample.
    pub fn classify(&mut self, pid: u32, current: &ActivityMetrics) -> Classification {
        let mut entry = self.history.remove(&pid).unwrap_or_default();

        let classification = match entry.previous.as_ref() {
            Some(previous) => self.analyze(&mut entry.last_activity, previous, current),
            None => Classification::idle(),
        };

        entry.previous = Some(current.clone());
        self.history.insert(pid, entry);
        classification
    }

    fn analyze(
        &self,
        last_activity: &mut Option<DateTime<Utc>>,
        previous: &ActivityMetrics,
        current: &ActivityMetrics,
    ) -> Classification {
        let elapsed = current
            .timestamp
            .signed_duration_since(previous.timestamp);
        if elapsed <= Duration::zero() {
            return Classification::idle();
        }

        let cpu_delta = current.cpu_time.saturating_sub(previous.cpu_time);
        let read_delta = current.read_bytes.saturating_sub(previous.read_bytes);
        let write_delta = current.write_bytes.saturating_sub(previous.write_bytes);

        let elapsed_secs = match elapsed.num_microseconds() {
            Some(micros) => micros as f64 / 1_000_000.0,
            None => elapsed.num_milliseconds() as f64 / 1000.0,
        };
        let cpu_percent = if elapsed_secs > 0.0 {
            cpu_delta as f64 / elapsed_secs
        } else {
            0.0
        };

        let has_activity = cpu_delta > self.cpu_threshold_ticks
            || read_delta > self.io_threshold_bytes
            || write_delta > self.io_threshold_bytes;

        let now = current.timestamp;
        if has_activity {
            *last_activity = Some(now);
            return Classification {
                status: ProcessStatus::Active,
                cpu_percent,
            };
        }

        let debounced = last_activity
            .map(|last| now.signed_duration_since(last) < self.debounce)
            .unwrap_or(false);

        Classification {
            status: if debounced {
                ProcessStatus::Active
            } else {
                ProcessStatus::Idle
            },
            cpu_percent,
        }
    }

    #[cfg(test)]
    fn last_activity(&self, pid: u32) -> Option<DateTime<Utc>> {
        self.history.get(&pid).and_then(|entry| entry.last_activity)
    }

    #[cfg(test)]
    fn has_history(&self, pid: u32) -> bool {
        self.history.contains_key(&pid)
    }

    /// Drops history for every pid not in `pids`.
    pub fn retain(&mut self, pids: &BTreeSet<u32>) {
        self.history.retain(|pid, _| pids.contains(pid));
    }
}
