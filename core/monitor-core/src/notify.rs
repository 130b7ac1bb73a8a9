//! Desktop notification delivery.
//!
//! Delivery is best-effort. The engine logs failures and moves on.

use crate::command::CommandRunner;
use crate::error::Result;
use crate::grouping::abbreviate_path;
use crate::types::ProcessRecord;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const NOTIFY_PROGRAM: &str = "notify-send";
const APP_NAME: &str = "Claude Monitor";
const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(1);
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(2);

pub const IDLE_SUMMARY: &str = "Claude Instance Idle";

pub trait Notifier: Send {
    fn notify_idle(&self, record: &ProcessRecord) -> Result<()>;
}

/// Sends nothing. Used when no notification backend is installed.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify_idle(&self, _record: &ProcessRecord) -> Result<()> {
        Ok(())
    }
}

/// Notifies through `notify-send`.
#[derive(Clone)]
pub struct DesktopNotifier {
    runner: Arc<dyn CommandRunner>,
    home: Option<PathBuf>,
}

impl DesktopNotifier {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            home: dirs::home_dir(),
        }
    }

    #[cfg(test)]
    fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// True when `notify-send` is on the PATH.
    pub fn is_available(&self) -> bool {
        self.runner
            .invoke("which", &[NOTIFY_PROGRAM], AVAILABILITY_TIMEOUT)
            .is_ok()
    }

    pub fn idle_body(&self, record: &ProcessRecord) -> String {
        let project = abbreviate_path(&record.cwd, self.home.as_deref());
        format!("PID {} in {} is waiting", record.pid, project)
    }
}

impl Notifier for DesktopNotifier {
    fn notify_idle(&self, record: &ProcessRecord) -> Result<()> {
        let body = self.idle_body(record);
        self.runner
            .invoke(
                NOTIFY_PROGRAM,
                &["-a", APP_NAME, "-u", "normal", IDLE_SUMMARY, &body],
                DELIVERY_TIMEOUT,
            )
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;
    use crate::types::{ActivityMetrics, ProcessStatus};
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRunner {
        calls: Mutex<Vec<(String, Vec<String>, Duration)>>,
        fail: bool,
    }

    impl CommandRunner for RecordingRunner {
        fn invoke(&self, program: &str, args: &[&str], timeout: Duration) -> Result<String> {
            self.calls.lock().expect("lock calls").push((
                program.to_string(),
                args.iter().map(|arg| arg.to_string()).collect(),
                timeout,
            ));
            if self.fail {
                return Err(MonitorError::CommandFailed {
                    command: program.to_string(),
                    details: "exit status: 1".to_string(),
                });
            }
            Ok(String::new())
        }
    }

    fn record() -> ProcessRecord {
        let now = Utc::now();
        ProcessRecord {
            pid: 4242,
            tty: "/dev/pts/3".to_string(),
            cwd: "/home/dev/Code/app".to_string(),
            start_time: now,
            status: ProcessStatus::Idle,
            last_status_change: now,
            metrics: ActivityMetrics::empty(now),
        }
    }

    #[test]
    fn notify_idle_passes_summary_and_body_as_arguments() {
        let runner = Arc::new(RecordingRunner::default());
        let notifier = DesktopNotifier::new(runner.clone())
            .with_home(Some(PathBuf::from("/home/dev")));

        notifier.notify_idle(&record()).expect("notify");

        let calls = runner.calls.lock().expect("lock calls");
        assert_eq!(calls.len(), 1);
        let (program, args, timeout) = &calls[0];
        assert_eq!(program, "notify-send");
        assert_eq!(
            args,
            &vec![
                "-a".to_string(),
                "Claude Monitor".to_string(),
                "-u".to_string(),
                "normal".to_string(),
                "Claude Instance Idle".to_string(),
                "PID 4242 in ~/Code/app is waiting".to_string(),
            ]
        );
        assert_eq!(*timeout, Duration::from_secs(2));
    }

    #[test]
    fn availability_follows_which_result() {
        let present = DesktopNotifier::new(Arc::new(RecordingRunner::default()));
        assert!(present.is_available());

        let missing = DesktopNotifier::new(Arc::new(RecordingRunner {
            fail: true,
            ..RecordingRunner::default()
        }));
        assert!(!missing.is_available());
    }

    #[test]
    fn delivery_failure_is_returned_to_caller() {
        let notifier = DesktopNotifier::new(Arc::new(RecordingRunner {
            fail: true,
            ..RecordingRunner::default()
        }));
        assert!(notifier.notify_idle(&record()).is_err());
    }
}
