//! External command invocation behind a capability trait.
//!
//! Collaborators that shell out (desktop notifications) take a
//! `CommandRunner` so the engine never spawns processes directly and tests
//! can substitute a recorder.

use crate::error::{MonitorError, Result};
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` and returns its stdout. Non-zero exit and
    /// timeout expiry are both errors.
    fn invoke(&self, program: &str, args: &[&str], timeout: Duration) -> Result<String>;
}

#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn invoke(&self, program: &str, args: &[&str], timeout: Duration) -> Result<String> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| MonitorError::CommandFailed {
                command: program.to_string(),
                details: err.to_string(),
            })?;

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(MonitorError::CommandTimedOut {
                        command: program.to_string(),
                        timeout_ms: timeout.as_millis() as u64,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(err) => {
                    return Err(MonitorError::CommandFailed {
                        command: program.to_string(),
                        details: err.to_string(),
                    })
                }
            }
        };

        let mut stdout = String::new();
        if let Some(mut pipe) = child.stdout.take() {
            let _ = pipe.read_to_string(&mut stdout);
        }

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            return Err(MonitorError::CommandFailed {
                command: program.to_string(),
                details: format!("{}: {}", status, stderr.trim()),
            });
        }

        Ok(stdout)
    }
}
