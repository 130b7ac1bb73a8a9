//! claude-monitor: watch running Claude processes and flag when they go idle.
//!
//! ## Subcommands
//!
//! - `watch` (default): full-screen view refreshed every second, with `r`
//!   (refresh), `n` (toggle idle notifications) and `q` (quit); optionally
//!   notifies when an instance has been idle for a while
//! - `snapshot`: take two samples one interval apart and print JSON

mod logging;
mod render;
mod watch;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use monitor_core::{
    group_by_directory, load_config, DesktopNotifier, Monitor, MonitorConfig, NoopNotifier,
    Notifier, ProjectGroup, ScanMode, StatusTransition, SystemCommandRunner,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "claude-monitor")]
#[command(about = "Monitor running Claude instances and their activity")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.claude-monitor/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Command-name substring to monitor
    #[arg(long, global = true)]
    target: Option<String>,

    /// Root of the process-information filesystem
    #[arg(long, global = true, value_name = "PATH")]
    proc_root: Option<PathBuf>,

    /// Enable idle notifications at startup
    #[arg(long, global = true)]
    notify: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Continuously refresh and display classified processes
    Watch,

    /// Print one classified snapshot as JSON
    Snapshot,
}

#[derive(Serialize)]
struct SnapshotOutput {
    captured_at: DateTime<Utc>,
    scan_mode: ScanMode,
    groups: Vec<ProjectGroup>,
    transitions: Vec<StatusTransition>,
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();
    let config = resolve_config(&cli);

    tracing::info!(
        target_name = %config.target,
        proc_root = %config.proc_root.display(),
        refresh_interval_ms = config.refresh_interval_ms,
        full_scan_interval_ms = config.full_scan_interval_ms,
        "Claude monitor starting"
    );

    let result = match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => run_watch(&config),
        Commands::Snapshot => run_snapshot(&config),
    };

    if let Err(err) = result {
        tracing::error!(error = %err, "claude-monitor failed");
        eprintln!("claude-monitor: {}", err);
        std::process::exit(1);
    }
}

fn resolve_config(cli: &Cli) -> MonitorConfig {
    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to load config; using defaults");
            MonitorConfig::default()
        }
    };
    if let Some(target) = &cli.target {
        config.target = target.clone();
    }
    if let Some(proc_root) = &cli.proc_root {
        config.proc_root = proc_root.clone();
    }
    if cli.notify {
        config.notifications.enabled = true;
    }
    config
}

fn build_notifier(config: &MonitorConfig) -> (Box<dyn Notifier>, bool) {
    let notifier = DesktopNotifier::new(Arc::new(SystemCommandRunner));
    if notifier.is_available() {
        (Box::new(notifier), true)
    } else {
        if config.notifications.enabled {
            tracing::warn!("notify-send not installed; idle notifications disabled");
        }
        (Box::new(NoopNotifier), false)
    }
}

fn run_watch(config: &MonitorConfig) -> Result<(), String> {
    let (notifier, notify_available) = build_notifier(config);
    let mut monitor = Monitor::with_notifier(config, notifier);
    if !notify_available {
        monitor.set_notifications_enabled(false);
    }

    watch::run(
        monitor,
        watch::WatchOptions {
            interval: Duration::from_millis(config.refresh_interval_ms.max(1)),
            notify_available,
            home: dirs::home_dir(),
        },
    )
    .map_err(|err| format!("Terminal error: {}", err))
}

fn run_snapshot(config: &MonitorConfig) -> Result<(), String> {
    let mut monitor = Monitor::new(config);

    // The first cycle only establishes baselines; everything reads Idle.
    monitor.refresh();
    thread::sleep(Duration::from_millis(config.refresh_interval_ms.max(1)));
    let report = monitor.refresh();

    let home = dirs::home_dir();
    let output = SnapshotOutput {
        captured_at: Utc::now(),
        scan_mode: report.scan_mode,
        groups: group_by_directory(&report.records, home.as_deref()),
        transitions: report.transitions,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|err| format!("Failed to serialize snapshot: {}", err))?;
    println!("{}", json);
    Ok(())
}
