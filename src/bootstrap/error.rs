use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::command::CommandError;
use crate::config::error::EnvFileError;
use crate::fetcher::error::FetchError;
use crate::readiness::ReadinessError;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("remote configuration unavailable: {0}")]
    ConfigUnavailable(#[from] FetchError),

    #[error("remote configuration malformed: {0}")]
    ConfigMalformed(#[from] EnvFileError),

    #[error("could not drop privileges: {0}")]
    PrivilegeDropFailed(#[source] CommandError),

    #[error("could not launch the exporter: {0}")]
    LaunchFailed(#[source] CommandError),

    #[error("exporter did not print `{marker}` within {timeout:?}")]
    ReadinessTimeout {
        marker: String,
        timeout: Duration,
        output: String,
    },

    #[error("exporter exited before becoming ready: {status}")]
    ExporterExited { status: ExitStatus, output: String },

    #[error("could not wait for the exporter: {0}")]
    Supervise(#[source] CommandError),
}

impl From<CommandError> for BootstrapError {
    fn from(err: CommandError) -> Self {
        if err.is_privilege_error() {
            Self::PrivilegeDropFailed(err)
        } else {
            Self::LaunchFailed(err)
        }
    }
}

impl From<ReadinessError> for BootstrapError {
    fn from(err: ReadinessError) -> Self {
        match err {
            ReadinessError::Timeout {
                marker,
                timeout,
                output,
            } => Self::ReadinessTimeout {
                marker,
                timeout,
                output,
            },
            ReadinessError::Exited { status, output } => Self::ExporterExited { status, output },
        }
    }
}

impl BootstrapError {
    /// Exporter output captured before a readiness failure.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::ReadinessTimeout { output, .. } | Self::ExporterExited { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }
}
