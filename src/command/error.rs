use std::{fmt::Debug, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("user `{0}` does not exist")]
    UnknownUser(String),

    #[error("group `{0}` does not exist")]
    UnknownGroup(String),

    #[error("could not look up `{name}`: `{reason}`")]
    IdentityLookup { name: String, reason: String },

    #[error("could not start `{}`: `{source}`", bin.display())]
    Spawn {
        bin: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not open log file `{}`: `{source}`", path.display())]
    LogSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} not piped")]
    StreamPipeError(String),

    #[error("could not signal process: `{0}`")]
    NixError(String),

    #[error("could not set signal handler: `{0}`")]
    SignalHandler(String),

    #[error("{0}")]
    IOError(#[from] std::io::Error),
}

impl CommandError {
    /// Errors raised while resolving the identity the exporter runs as.
    pub fn is_privilege_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownUser(_) | Self::UnknownGroup(_) | Self::IdentityLookup { .. }
        )
    }
}
