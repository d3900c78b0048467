use std::os::unix::process::CommandExt;
use std::fmt;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::error::CommandError;
use super::identity::Identity;
use super::output::{spawn_logger, CaptureBuffer, LogSink};
use super::shutdown::ProcessTerminator;
use crate::config::EnvironmentMap;
use crate::exporter::ArgumentList;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
// Output still buffered in the pipes when the exit is observed.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);
const OUTPUT_DRAIN_INTERVAL: Duration = Duration::from_millis(5);
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// What to run and how.
#[derive(Debug, Clone)]
pub struct ExporterExecutable {
    pub bin: PathBuf,
    pub args: ArgumentList,
    pub env: EnvironmentMap,
    pub shutdown_timeout: Duration,
}

impl ExporterExecutable {
    pub fn new<P: Into<PathBuf>>(bin: P) -> Self {
        Self {
            bin: bin.into(),
            args: ArgumentList::default(),
            env: EnvironmentMap::default(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    pub fn with_args(self, args: ArgumentList) -> Self {
        Self { args, ..self }
    }

    /// The child gets exactly this environment, nothing is inherited.
    pub fn with_env(self, env: EnvironmentMap) -> Self {
        Self { env, ..self }
    }

    pub fn with_shutdown_timeout(self, shutdown_timeout: Duration) -> Self {
        Self {
            shutdown_timeout,
            ..self
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////
// Not Started Exporter
////////////////////////////////////////////////////////////////////////////////////
pub struct ExporterCommand {
    cmd: Command,
    bin: PathBuf,
    identity: Identity,
    sink: LogSink,
    shutdown_timeout: Duration,
}

impl ExporterCommand {
    pub fn new(executable: &ExporterExecutable, identity: Identity, sink: LogSink) -> Self {
        let mut cmd = Command::new(&executable.bin);
        cmd.args(executable.args.iter())
            .env_clear()
            .envs(executable.env.iter())
            .uid(identity.uid().as_raw())
            .gid(identity.gid().as_raw())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        Self {
            cmd,
            bin: executable.bin.clone(),
            identity,
            sink,
            shutdown_timeout: executable.shutdown_timeout,
        }
    }

    /// Spawns the exporter and starts forwarding its output. Does not wait for readiness.
    pub fn start(mut self) -> Result<LaunchedProcess, CommandError> {
        let sink = self.sink.open()?;
        let mut process = self.cmd.spawn().map_err(|source| CommandError::Spawn {
            bin: self.bin.clone(),
            source,
        })?;
        info!(pid = process.id(), identity = %self.identity, bin = %self.bin.display(), "exporter started");

        let stdout = process
            .stdout
            .take()
            .ok_or(CommandError::StreamPipeError("stdout".to_string()))?;
        let stderr = process
            .stderr
            .take()
            .ok_or(CommandError::StreamPipeError("stderr".to_string()))?;

        let capture = CaptureBuffer::default();
        let loggers = vec![
            spawn_logger(stdout, "stdout", sink.clone(), capture.clone())?,
            spawn_logger(stderr, "stderr", sink, capture.clone())?,
        ];

        Ok(LaunchedProcess {
            bin: self.bin,
            process,
            capture,
            loggers,
            exit_status: None,
            shutdown_timeout: self.shutdown_timeout,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////
// Started Exporter
////////////////////////////////////////////////////////////////////////////////////
pub struct LaunchedProcess {
    bin: PathBuf,
    process: Child,
    capture: CaptureBuffer,
    loggers: Vec<JoinHandle<()>>,
    exit_status: Option<ExitStatus>,
    shutdown_timeout: Duration,
}

impl fmt::Debug for LaunchedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchedProcess")
            .field("pid", &self.get_pid())
            .field("bin", &self.bin)
            .field("exit_status", &self.exit_status)
            .finish()
    }
}

impl LaunchedProcess {
    pub fn get_pid(&self) -> u32 {
        self.process.id()
    }

    /// Read-only view of everything the exporter printed so far.
    pub fn capture(&self) -> &CaptureBuffer {
        &self.capture
    }

    /// Terminal state, if the exporter already exited.
    ///
    /// Does not wait for a running exporter. The first time the exit is observed it waits
    /// briefly for the output left in the pipes to reach the capture, so the capture is
    /// complete once this returns `Some`.
    pub fn exit_status(&mut self) -> Option<ExitStatus> {
        if self.exit_status.is_none() {
            self.exit_status = self.process.try_wait().ok().flatten();
            if self.exit_status.is_some() {
                self.drain_output(OUTPUT_DRAIN_TIMEOUT);
            }
        }
        self.exit_status
    }

    // Loggers outliving the timeout mean something else still holds the pipes open.
    fn drain_output(&self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while !self.loggers.iter().all(JoinHandle::is_finished) {
            if Instant::now() >= deadline {
                debug!(pid = self.get_pid(), "exporter output still open after exit");
                return;
            }
            std::thread::sleep(OUTPUT_DRAIN_INTERVAL);
        }
    }

    pub fn is_running(&mut self) -> bool {
        self.exit_status().is_none()
    }

    /// Blocks until the exporter exits and its output has been forwarded.
    pub fn wait(mut self) -> Result<ExitStatus, CommandError> {
        let status = match self.exit_status {
            Some(status) => status,
            None => self.process.wait()?,
        };
        self.join_loggers();
        Ok(status)
    }

    fn join_loggers(&mut self) {
        self.loggers.drain(..).for_each(|logger| {
            if logger.join().is_err() {
                warn!("exporter logger thread panicked");
            }
        });
    }

    fn is_running_after_timeout(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        while Instant::now() < deadline {
            if !self.is_running() {
                return false;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        self.is_running()
    }

    /// SIGTERM, then SIGKILL if the exporter is still running after the shutdown timeout.
    pub fn shutdown(&mut self) -> Result<(), CommandError> {
        if !self.is_running() {
            return Ok(());
        }

        let graceful_shutdown_result = ProcessTerminator::new(self.get_pid()).terminate();
        if let Err(e) = &graceful_shutdown_result {
            warn!("Graceful shutdown failed for process {}: {e}", self.get_pid());
        }

        if graceful_shutdown_result.is_err() || self.is_running_after_timeout(self.shutdown_timeout)
        {
            debug!(pid = self.get_pid(), "killing exporter");
            self.process.kill()?;
            self.exit_status = Some(self.process.wait()?);
        }
        Ok(())
    }
}
