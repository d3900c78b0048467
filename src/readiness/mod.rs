//! Waits for the exporter to announce it is ready.
//!
//! The monitor repeatedly reads the exporter output through an [`OutputCapture`] until the
//! readiness marker shows up (`Waiting -> Ready`), the deadline passes
//! (`Waiting -> TimedOut`) or the exporter dies first (`Waiting -> Exited`). It never
//! acts on the process itself.

use std::process::ExitStatus;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Read-only view over the output of a process.
pub trait OutputCapture {
    fn contents(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    Waiting,
    Ready,
    TimedOut,
    Exited(ExitStatus),
}

#[derive(Error, Debug)]
pub enum ReadinessError {
    #[error("readiness marker `{marker}` not seen within {timeout:?}")]
    Timeout {
        marker: String,
        timeout: Duration,
        output: String,
    },

    #[error("exporter exited before becoming ready: {status}")]
    Exited { status: ExitStatus, output: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessMonitor {
    marker: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl ReadinessMonitor {
    pub fn new<S: Into<String>>(marker: S) -> Self {
        Self {
            marker: marker.into(),
            timeout: DEFAULT_READINESS_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn with_poll_interval(self, poll_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            ..self
        }
    }

    /// Computes the state for a single observation.
    pub fn observe(
        &self,
        output: &str,
        exit_status: Option<ExitStatus>,
        deadline: Instant,
    ) -> ReadinessState {
        if output.contains(&self.marker) {
            ReadinessState::Ready
        } else if let Some(status) = exit_status {
            ReadinessState::Exited(status)
        } else if Instant::now() >= deadline {
            ReadinessState::TimedOut
        } else {
            ReadinessState::Waiting
        }
    }

    /// Polls until the marker is found, returning how long it took.
    ///
    /// `exit_status` is queried on every poll, before the output is read, and must not block
    /// while the process runs. Once it reports an exit the capture must be complete.
    pub fn wait<C, F>(&self, capture: &C, mut exit_status: F) -> Result<Duration, ReadinessError>
    where
        C: OutputCapture + ?Sized,
        F: FnMut() -> Option<ExitStatus>,
    {
        let started = Instant::now();
        let deadline = started + self.timeout;
        debug!(marker = %self.marker, timeout = ?self.timeout, "waiting for exporter readiness");

        loop {
            let exited = exit_status();
            let output = capture.contents();
            match self.observe(&output, exited, deadline) {
                ReadinessState::Ready => {
                    let elapsed = started.elapsed();
                    info!(elapsed = ?elapsed, "exporter is ready");
                    return Ok(elapsed);
                }
                ReadinessState::Exited(status) => {
                    return Err(ReadinessError::Exited { status, output });
                }
                ReadinessState::TimedOut => {
                    return Err(ReadinessError::Timeout {
                        marker: self.marker.clone(),
                        timeout: self.timeout,
                        output,
                    });
                }
                ReadinessState::Waiting => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    std::thread::sleep(self.poll_interval.min(remaining));
                }
            }
        }
    }
}
