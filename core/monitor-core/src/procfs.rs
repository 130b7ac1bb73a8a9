//! Readers for the process-information pseudo-filesystem.
//!
//! Everything is resolved relative to a root directory (normally `/proc`) so
//! tests can point the reader at a fabricated tree.
//!
//! # Files read
//!
//! ```text
//! {root}/uptime          # "<uptime secs> <idle secs>"
//! {root}/{pid}/comm      # command name
//! {root}/{pid}/stat      # utime (14), stime (15), starttime (22)
//! {root}/{pid}/io        # rchar / wchar keyed lines
//! {root}/{pid}/statm     # resident pages (field 2)
//! {root}/{pid}/fd/       # descriptor links, sockets resolve to "socket:[inode]"
//! {root}/{pid}/cwd       # working directory link
//! ```

use crate::error::{MonitorError, Result};
use std::path::{Path, PathBuf};

/// Kernel clock ticks per second, fixed rather than queried.
pub const CLOCK_TICKS_PER_SEC: u64 = 100;

/// Page size used to convert `statm` pages to bytes.
pub const PAGE_SIZE_BYTES: u64 = 4096;

const SOCKET_LINK_PREFIX: &str = "socket:";

/// CPU and start-time fields parsed from `/proc/{pid}/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcStat {
    pub utime: u64,
    pub stime: u64,
    /// Ticks since boot at which the process started.
    pub start_ticks: u64,
}

impl ProcStat {
    pub fn total_ticks(&self) -> u64 {
        self.utime.saturating_add(self.stime)
    }
}

/// Logical I/O counters from `/proc/{pid}/io`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoCounters {
    pub rchar: u64,
    pub wchar: u64,
}

#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn pid_path(&self, pid: u32) -> PathBuf {
        self.root.join(pid.to_string())
    }

    /// Every numeric entry under the root.
    pub fn list_pids(&self) -> Result<Vec<u32>> {
        let entries =
            std::fs::read_dir(&self.root).map_err(|source| MonitorError::ProcRootUnreadable {
                path: self.root.clone(),
                source,
            })?;

        let mut pids = entries
            .flatten()
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
            .collect::<Vec<_>>();
        pids.sort_unstable();
        Ok(pids)
    }

    /// Cheap liveness probe: does `{root}/{pid}` exist.
    pub fn exists(&self, pid: u32) -> bool {
        self.pid_path(pid).exists()
    }

    pub fn comm(&self, pid: u32) -> Result<String> {
        let path = self.pid_path(pid).join("comm");
        let content = read_to_string(&path)?;
        Ok(content.trim().to_string())
    }

    pub fn stat(&self, pid: u32) -> Result<ProcStat> {
        let path = self.pid_path(pid).join("stat");
        let content = read_to_string(&path)?;
        parse_stat(&content).map_err(|details| MonitorError::parse(&path, details))
    }

    pub fn io(&self, pid: u32) -> Result<IoCounters> {
        let path = self.pid_path(pid).join("io");
        let content = read_to_string(&path)?;
        parse_io(&content).map_err(|details| MonitorError::parse(&path, details))
    }

    pub fn statm_resident_pages(&self, pid: u32) -> Result<u64> {
        let path = self.pid_path(pid).join("statm");
        let content = read_to_string(&path)?;
        content
            .split_whitespace()
            .nth(1)
            .and_then(|value| value.parse::<u64>().ok())
            .ok_or_else(|| MonitorError::parse(&path, "missing resident page count"))
    }

    pub fn uptime_secs(&self) -> Result<f64> {
        let path = self.root.join("uptime");
        let content = read_to_string(&path)?;
        content
            .split_whitespace()
            .next()
            .and_then(|value| value.parse::<f64>().ok())
            .ok_or_else(|| MonitorError::parse(&path, "missing uptime value"))
    }

    /// Resolves a link inside the process directory, e.g. `cwd` or `fd/0`.
    pub fn read_link(&self, pid: u32, name: &str) -> Result<PathBuf> {
        let path = self.pid_path(pid).join(name);
        std::fs::read_link(&path)
            .map_err(|err| MonitorError::io(format!("readlink {}", path.display()), err))
    }

    /// Link targets of every open descriptor. Entries that fail to resolve
    /// (closed mid-iteration, permission denied) are skipped.
    pub fn fd_links(&self, pid: u32) -> Result<Vec<PathBuf>> {
        let dir = self.pid_path(pid).join("fd");
        let entries = std::fs::read_dir(&dir)
            .map_err(|err| MonitorError::io(format!("read_dir {}", dir.display()), err))?;

        Ok(entries
            .flatten()
            .filter_map(|entry| std::fs::read_link(entry.path()).ok())
            .collect())
    }

    pub fn socket_count(&self, pid: u32) -> Result<u32> {
        let count = self
            .fd_links(pid)?
            .iter()
            .filter(|target| is_socket_link(target))
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

fn read_to_string(path: &Path) -> Result<String> {
    fs_err::read_to_string(path).map_err(|err| MonitorError::io("read process file", err))
}

fn is_socket_link(target: &Path) -> bool {
    target
        .to_str()
        .map(|value| value.starts_with(SOCKET_LINK_PREFIX))
        .unwrap_or(false)
}

/// Parses the fields we need from a `stat` line.
///
/// The command name (field 2) is wrapped in parentheses and may itself contain
/// spaces or parentheses, so fields are counted from after the last `)`.
pub fn parse_stat(content: &str) -> std::result::Result<ProcStat, String> {
    let close = content
        .rfind(')')
        .ok_or_else(|| "missing command name terminator".to_string())?;
    // rest[0] is field 3 (state).
    let rest = content[close + 1..].split_whitespace().collect::<Vec<_>>();

    let field = |number: usize| -> std::result::Result<u64, String> {
        rest.get(number - 3)
            .ok_or_else(|| format!("missing field {}", number))?
            .parse::<u64>()
            .map_err(|err| format!("field {}: {}", number, err))
    };

    Ok(ProcStat {
        utime: field(14)?,
        stime: field(15)?,
        start_ticks: field(22)?,
    })
}

/// Parses `rchar` and `wchar` from an `io` file. Both must be present.
pub fn parse_io(content: &str) -> std::result::Result<IoCounters, String> {
    let mut rchar = None;
    let mut wchar = None;

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let parsed = value.trim().parse::<u64>().ok();
        match key.trim() {
            "rchar" => rchar = parsed,
            "wchar" => wchar = parsed,
            _ => {}
        }
    }

    match (rchar, wchar) {
        (Some(rchar), Some(wchar)) => Ok(IoCounters { rchar, wchar }),
        (None, _) => Err("missing or invalid rchar".to_string()),
        (_, None) => Err("missing or invalid wchar".to_string()),
    }
}
