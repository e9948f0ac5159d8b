use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use bundleswap_core::UpdateError;
use tracing::{info, warn};

pub(crate) const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Answers whether a process id currently exists.
pub(crate) trait ProcessProbe {
    /// `Ok(false)` means the OS reported no such process; `Err` means the
    /// question itself could not be answered.
    fn query(&self, pid: u32) -> Result<bool, UpdateError>;
}

pub(crate) struct SystemProcessProbe;

impl ProcessProbe for SystemProcessProbe {
    fn query(&self, pid: u32) -> Result<bool, UpdateError> {
        let mut command = process_query_command(pid);
        #[cfg(windows)]
        {
            let output = command
                .stdin(Stdio::null())
                .stderr(Stdio::null())
                .output()
                .map_err(|err| UpdateError::MonitoringFailure {
                    pid,
                    detail: err.to_string(),
                })?;
            if !output.status.success() {
                return Err(UpdateError::MonitoringFailure {
                    pid,
                    detail: format!("tasklist exited with {}", output.status),
                });
            }
            let stdout = String::from_utf8_lossy(&output.stdout);
            let needle = pid.to_string();
            return Ok(stdout
                .split_whitespace()
                .any(|token| token.trim_matches('"') == needle));
        }

        #[cfg(not(windows))]
        {
            let status = command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map_err(|err| UpdateError::MonitoringFailure {
                    pid,
                    detail: err.to_string(),
                })?;
            Ok(status.success())
        }
    }
}

#[cfg(windows)]
pub(crate) fn process_query_command(pid: u32) -> Command {
    let mut command = Command::new("tasklist");
    command
        .arg("/FI")
        .arg(format!("PID eq {pid}"))
        .arg("/FO")
        .arg("CSV")
        .arg("/NH");
    command
}

#[cfg(not(windows))]
pub(crate) fn process_query_command(pid: u32) -> Command {
    let mut command = Command::new("ps");
    command.arg("-p").arg(pid.to_string());
    command
}

/// Blocks until a watched process is gone.
///
/// There is no timeout: pointed at a PID that never exits, the wait never
/// returns. Giving up early would let the swap start under a live app.
pub(crate) struct LivenessMonitor<'a> {
    probe: &'a dyn ProcessProbe,
    interval: Duration,
    sleep: Box<dyn FnMut(Duration) + 'a>,
}

impl<'a> LivenessMonitor<'a> {
    pub(crate) fn new(probe: &'a dyn ProcessProbe, interval: Duration) -> Self {
        Self {
            probe,
            interval,
            sleep: Box::new(thread::sleep),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_sleeper(mut self, sleep: impl FnMut(Duration) + 'a) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    pub(crate) fn is_alive(&self, pid: u32) -> bool {
        match self.probe.query(pid) {
            Ok(true) => true,
            Ok(false) => {
                info!(pid, "process not found");
                false
            }
            Err(err) => {
                warn!(pid, reason = err.reason(), "treating process as exited: {err}");
                false
            }
        }
    }

    /// Returns how many times the process was seen alive.
    pub(crate) fn wait_for_exit(&mut self, pid: u32) -> u64 {
        info!(pid, "*** starting parent process monitoring ***");
        let mut check_count = 0_u64;

        while self.is_alive(pid) {
            check_count += 1;
            info!("parent process check #{check_count}: still alive");
            (self.sleep)(self.interval);
        }

        info!(pid, checks = check_count, "*** parent process exit detected ***");
        check_count
    }
}
