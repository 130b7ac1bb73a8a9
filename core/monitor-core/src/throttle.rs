//! Idle-notification throttling.
//!
//! Policy: debounced sustained idle. A process must stay Idle for the idle
//! delay before it qualifies, and once notified it is not notified again
//! until the cooldown has passed, even if it stays Idle the whole time.
//!
//! Idle tracking runs whether or not notifications are enabled, so enabling
//! them mid-session does not reset the idle clocks.

use crate::config::NotificationConfig;
use crate::types::{ProcessRecord, ProcessStatus};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug)]
pub struct NotificationThrottle {
    enabled: bool,
    idle_delay: Duration,
    cooldown: Duration,
    idle_since: HashMap<u32, DateTime<Utc>>,
    last_notified: HashMap<u32, DateTime<Utc>>,
}

impl Default for NotificationThrottle {
    fn default() -> Self {
        Self::new(&NotificationConfig::default())
    }
}

impl NotificationThrottle {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            enabled: config.enabled,
            idle_delay: Duration::milliseconds(config.idle_delay_ms as i64),
            cooldown: Duration::milliseconds(config.cooldown_ms as i64),
            idle_since: HashMap::new(),
            last_notified: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    #[cfg(test)]
    fn idle_since(&self, pid: u32) -> Option<DateTime<Utc>> {
        self.idle_since.get(&pid).copied()
    }

    #[cfg(test)]
    fn last_notified(&self, pid: u32) -> Option<DateTime<Utc>> {
        self.last_notified.get(&pid).copied()
    }

    /// Drops state for every pid not in `pids`.
    pub fn retain(&mut self, pids: &BTreeSet<u32>) {
        self.idle_since.retain(|pid, _| pids.contains(pid));
        self.last_notified.retain(|pid, _| pids.contains(pid));
    }

    /// Updates idle tracking from this cycle's records and returns the pids
    /// that should be notified now.
    pub fn observe(&mut self, records: &[ProcessRecord], now: DateTime<Utc>) -> Vec<u32> {
        for record in records {
            match record.status {
                ProcessStatus::Idle => {
                    self.idle_since.entry(record.pid).or_insert(now);
                }
                ProcessStatus::Active => {
                    self.idle_since.remove(&record.pid);
                }
            }
        }

        if !self.enabled {
            return Vec::new();
        }

        let mut due = Vec::new();
        for record in records {
            if record.status != ProcessStatus::Idle {
                continue;
            }
            let Some(idle_start) = self.idle_since.get(&record.pid) else {
                continue;
            };
            if now.signed_duration_since(*idle_start) < self.idle_delay {
                continue;
            }
            if let Some(last_sent) = self.last_notified.get(&record.pid) {
                if now.signed_duration_since(*last_sent) < self.cooldown {
                    continue;
                }
            }
            self.last_notified.insert(record.pid, now);
            due.push(record.pid);
        }
        due
    }
}
