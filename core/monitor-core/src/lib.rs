//! # monitor-core
//!
//! Process discovery and activity classification for Claude Monitor.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. One refresh cycle runs at a time.
//! - **Single owner**: All per-pid state lives inside [`Monitor`]; nothing is shared.
//! - **Graceful degradation**: Unreadable processes are skipped for the cycle,
//!   an unreadable process root yields an empty list. A refresh never fails.
//! - **Injectable edges**: The process root is a path and external commands go
//!   through [`CommandRunner`], so everything is testable without real processes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use monitor_core::{Monitor, MonitorConfig};
//!
//! let mut monitor = Monitor::new(&MonitorConfig::default());
//! let report = monitor.refresh();
//! for record in &report.records {
//!     println!("{} {:?}", record.pid, record.status);
//! }
//! ```

pub mod classifier;
pub mod command;
pub mod config;
pub mod discovery;
pub mod error;
pub mod grouping;
pub mod monitor;
pub mod notify;
pub mod procfs;
pub mod sampler;
pub mod throttle;
pub mod tracker;
pub mod types;

pub use classifier::{ActivityClassifier, Classification};
pub use command::{CommandRunner, SystemCommandRunner};
pub use config::{load_config, ClassifierConfig, MonitorConfig, NotificationConfig};
pub use discovery::ProcessDiscoverer;
pub use error::{MonitorError, Result};
pub use grouping::{group_by_directory, ProjectGroup};
pub use monitor::{Monitor, RefreshReport};
pub use notify::{DesktopNotifier, NoopNotifier, Notifier};
pub use procfs::ProcFs;
pub use sampler::MetricSampler;
pub use throttle::NotificationThrottle;
pub use tracker::{ScanMode, TrackedScan, TrackedSet};
pub use types::*;
