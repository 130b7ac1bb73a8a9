//! Presentation helpers: grouping by project directory and display formatting.

use crate::types::{ProcessRecord, ProcessStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Palette for project groups. A path always maps to the same colour.
pub const GROUP_COLORS: [&str; 6] = [
    "blue",
    "magenta",
    "cyan",
    "light-blue",
    "light-magenta",
    "light-cyan",
];

/// Records sharing a working directory.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectGroup {
    pub path: String,
    pub display_path: String,
    pub color: &'static str,
    pub records: Vec<ProcessRecord>,
}

/// Groups records by `cwd`. Records are ordered by pid within a group and
/// groups by display path.
pub fn group_by_directory(records: &[ProcessRecord], home: Option<&Path>) -> Vec<ProjectGroup> {
    let mut by_path: BTreeMap<&str, Vec<ProcessRecord>> = BTreeMap::new();
    for record in records {
        by_path
            .entry(record.cwd.as_str())
            .or_default()
            .push(record.clone());
    }

    let mut groups = by_path
        .into_iter()
        .map(|(path, mut records)| {
            records.sort_by_key(|record| record.pid);
            ProjectGroup {
                path: path.to_string(),
                display_path: abbreviate_path(path, home),
                color: path_to_color(path),
                records,
            }
        })
        .collect::<Vec<_>>();
    groups.sort_by(|left, right| left.display_path.cmp(&right.display_path));
    groups
}

/// Replaces a leading home directory with `~`.
pub fn abbreviate_path(path: &str, home: Option<&Path>) -> String {
    let Some(home) = home.and_then(|home| home.to_str()) else {
        return path.to_string();
    };
    let home = home.trim_end_matches('/');
    if home.is_empty() {
        return path.to_string();
    }
    match path.strip_prefix(home) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => format!("~{}", rest),
        _ => path.to_string(),
    }
}

/// Stable colour for a directory, from the first 32 bits of its MD5 digest.
pub fn path_to_color(path: &str) -> &'static str {
    let digest = md5::compute(path.as_bytes());
    let hash = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    GROUP_COLORS[hash as usize % GROUP_COLORS.len()]
}

pub fn extract_tty_name(tty: &str) -> &str {
    tty.strip_prefix("/dev/").unwrap_or(tty)
}

/// Coarse elapsed time: `42s`, `5m`, `3h`.
pub fn format_duration(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(since).num_seconds().max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h", secs / 3600)
    }
}

pub fn status_label(status: ProcessStatus) -> &'static str {
    match status {
        ProcessStatus::Active => "ACTV",
        ProcessStatus::Idle => "IDLE",
    }
}

pub fn format_cpu(cpu_percent: Option<f64>) -> String {
    match cpu_percent {
        Some(value) => format!("{:.0}%", value),
        None => "-".to_string(),
    }
}

pub fn format_memory(bytes: Option<u64>) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    match bytes {
        Some(bytes) if bytes as f64 >= 1024.0 * MIB => {
            format!("{:.1}G", bytes as f64 / (1024.0 * MIB))
        }
        Some(bytes) => format!("{:.0}M", bytes as f64 / MIB),
        None => "-".to_string(),
    }
}
