//! Startup pipeline of the exporter container.
//!
//! Fetch the remote env file, merge it under the ambient environment, synthesize the
//! exporter flags, launch the exporter as the unprivileged identity and wait for it to be
//! ready. Every stage works on the explicit [`BootstrapConfig`], the process environment is
//! never read from here.
pub mod error;

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::command::launcher::DEFAULT_SHUTDOWN_TIMEOUT;
use crate::command::{ExporterCommand, ExporterExecutable, Identity, LaunchedProcess, LogSink};
use crate::config::env_file;
use crate::config::location::{AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_SESSION_TOKEN};
use crate::config::{EnvironmentMap, RemoteConfigLocation};
use crate::exporter::defaults::{
    EXPORTER_BINARY_PATH, EXPORTER_GROUP, EXPORTER_USER, READINESS_MARKER,
};
use crate::exporter::{ArgumentList, ResolvedSettings};
use crate::fetcher::error::FetchError;
use crate::fetcher::{fetch_optional, ConfigFetcher};
use crate::readiness::{ReadinessMonitor, DEFAULT_POLL_INTERVAL, DEFAULT_READINESS_TIMEOUT};
use error::BootstrapError;

// Only needed to reach the object storage.
const STORAGE_SECRETS: [&str; 3] = [AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_SESSION_TOKEN];

/// How and as whom the exporter is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub exporter_path: PathBuf,
    pub user: String,
    pub group: String,
    pub log_sink: LogSink,
    pub shutdown_timeout: Duration,
    /// Appended verbatim after the synthesized flags.
    pub extra_args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            exporter_path: PathBuf::from(EXPORTER_BINARY_PATH),
            user: EXPORTER_USER.to_string(),
            group: EXPORTER_GROUP.to_string(),
            log_sink: LogSink::default(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessOptions {
    pub marker: String,
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Terminate the exporter when it does not become ready in time.
    pub terminate_on_timeout: bool,
}

impl Default for ReadinessOptions {
    fn default() -> Self {
        Self {
            marker: READINESS_MARKER.to_string(),
            timeout: DEFAULT_READINESS_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            terminate_on_timeout: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Process environment, captured once at start.
    pub ambient: EnvironmentMap,
    pub launch: LaunchOptions,
    pub readiness: ReadinessOptions,
}

impl BootstrapConfig {
    pub fn new(ambient: EnvironmentMap) -> Self {
        Self {
            ambient,
            ..Default::default()
        }
    }

    pub fn with_launch(self, launch: LaunchOptions) -> Self {
        Self { launch, ..self }
    }

    pub fn with_readiness(self, readiness: ReadinessOptions) -> Self {
        Self { readiness, ..self }
    }
}

/// Everything derived before anything is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterPlan {
    /// Environment the exporter runs with.
    pub environment: EnvironmentMap,
    pub settings: ResolvedSettings,
    pub args: ArgumentList,
}

pub struct Bootstrapper<F> {
    fetcher: F,
    config: BootstrapConfig,
}

impl<F> Bootstrapper<F>
where
    F: ConfigFetcher,
{
    pub fn new(fetcher: F, config: BootstrapConfig) -> Self {
        Self { fetcher, config }
    }

    /// Ambient environment with the remote env file merged underneath.
    pub fn resolve_environment(&self) -> Result<EnvironmentMap, BootstrapError> {
        let ambient = &self.config.ambient;
        let location = RemoteConfigLocation::from_env(ambient).map_err(FetchError::from)?;

        let content = fetch_optional(&self.fetcher, location.as_ref())?;
        let remote = env_file::parse(&content)?;
        debug!(variables = remote.len(), "remote configuration parsed");

        Ok(env_file::merge(ambient.clone(), remote))
    }

    pub fn prepare(&self) -> Result<ExporterPlan, BootstrapError> {
        let mut environment = self.resolve_environment()?;
        let settings = ResolvedSettings::resolve(&environment);
        let extra_args = self.config.launch.extra_args.iter().cloned();
        let args = ArgumentList::synthesize(&settings, extra_args);
        debug!(%args, "exporter arguments synthesized");

        STORAGE_SECRETS.iter().for_each(|name| {
            environment.remove(name);
        });

        Ok(ExporterPlan {
            environment,
            settings,
            args,
        })
    }

    /// Starts the exporter as the configured identity. Does not wait for readiness.
    pub fn launch(&self, plan: &ExporterPlan) -> Result<LaunchedProcess, BootstrapError> {
        let launch = &self.config.launch;
        let identity = Identity::resolve(&launch.user, &launch.group)?;
        if identity.is_privileged() {
            warn!(%identity, "exporter runs with root privileges, only intended for development");
        }

        let executable = ExporterExecutable::new(launch.exporter_path.clone())
            .with_args(plan.args.clone())
            .with_env(plan.environment.clone())
            .with_shutdown_timeout(launch.shutdown_timeout);

        Ok(ExporterCommand::new(&executable, identity, launch.log_sink.clone()).start()?)
    }

    /// Waits for the readiness marker. On timeout the exporter is only terminated when
    /// configured to. The output is no longer captured afterwards, only forwarded.
    pub fn await_ready(&self, process: &mut LaunchedProcess) -> Result<Duration, BootstrapError> {
        let options = &self.config.readiness;
        let monitor = ReadinessMonitor::new(options.marker.as_str())
            .with_timeout(options.timeout)
            .with_poll_interval(options.poll_interval);

        let capture = process.capture().clone();
        let result = monitor.wait(&capture, || process.exit_status());
        capture.stop();

        if result.is_err() && options.terminate_on_timeout && process.is_running() {
            warn!(pid = process.get_pid(), "terminating exporter that never became ready");
            if let Err(err) = process.shutdown() {
                error!("could not terminate the exporter: {err}");
            }
        }
        Ok(result?)
    }

    /// Runs the whole startup sequence, returning the ready exporter.
    pub fn start(&self) -> Result<LaunchedProcess, BootstrapError> {
        let plan = self.prepare()?;
        let mut process = self.launch(&plan)?;
        self.await_ready(&mut process)?;
        Ok(process)
    }
}

/// Blocks until the exporter exits.
pub fn supervise(process: LaunchedProcess) -> Result<ExitStatus, BootstrapError> {
    let pid = process.get_pid();
    let status = process.wait().map_err(BootstrapError::Supervise)?;
    info!(pid, %status, "exporter exited");
    Ok(status)
}

/// Shell convention: the exit code, or 128 plus the signal that killed the process.
pub fn exit_code(status: ExitStatus) -> u8 {
    use std::os::unix::process::ExitStatusExt;

    let code = status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1);
    u8::try_from(code).unwrap_or(1)
}
