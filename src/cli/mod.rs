use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::bootstrap::{BootstrapConfig, LaunchOptions, ReadinessOptions};
use crate::command::LogSink;
use crate::config::EnvironmentMap;
use crate::exporter::defaults::{
    EXPORTER_BINARY_PATH, EXPORTER_GROUP, EXPORTER_USER, READINESS_MARKER,
};

const DEFAULT_READY_TIMEOUT: &str = "15s";
const DEFAULT_POLL_INTERVAL: &str = "250ms";
const DEFAULT_SHUTDOWN_TIMEOUT: &str = "10s";

/// Fetches the exporter configuration, then launches node_exporter unprivileged and waits
/// for it to be ready.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)] // Read from `Cargo.toml`
pub struct Cli {
    /// Exporter binary to launch
    #[arg(long, default_value = EXPORTER_BINARY_PATH)]
    exporter_path: PathBuf,

    /// User the exporter runs as. Overriding it is only intended for development
    #[arg(long, default_value = EXPORTER_USER)]
    user: String,

    /// Group the exporter runs as. Overriding it is only intended for development
    #[arg(long, default_value = EXPORTER_GROUP)]
    group: String,

    /// File the exporter output is appended to. Standard output when unset
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Text in the exporter output that signals readiness
    #[arg(long, default_value = READINESS_MARKER)]
    ready_marker: String,

    #[arg(long, default_value = DEFAULT_READY_TIMEOUT, value_parser = parse_duration_arg)]
    ready_timeout: Duration,

    /// Time between two checks of the exporter output
    #[arg(long, default_value = DEFAULT_POLL_INTERVAL, value_parser = parse_poll_interval_arg)]
    poll_interval: Duration,

    /// Time the exporter gets to exit after SIGTERM before it is killed
    #[arg(long, default_value = DEFAULT_SHUTDOWN_TIMEOUT, value_parser = parse_duration_arg)]
    shutdown_timeout: Duration,

    /// Terminate the exporter if it is not ready within the readiness timeout
    #[arg(long)]
    terminate_on_timeout: bool,

    /// Print the exporter arguments, one per line, and exit
    #[arg(long, conflicts_with = "print_config")]
    print_args: bool,

    /// Print the resolved exporter settings as an env file and exit
    #[arg(long)]
    print_config: bool,

    /// Passed to the exporter after the synthesized flags
    #[arg(last = true)]
    extra_args: Vec<String>,
}

// helper needed because the arguments from the duration_str's parse function and the one expected by the clap
// `value_parser` argument have incompatible lifetimes.
fn parse_duration_arg(arg: &str) -> Result<Duration, String> {
    duration_str::parse(arg).map_err(|e| e.to_string())
}

fn parse_poll_interval_arg(arg: &str) -> Result<Duration, String> {
    match parse_duration_arg(arg)? {
        interval if interval.is_zero() => {
            Err("the poll interval must be greater than zero".to_string())
        }
        interval => Ok(interval),
    }
}

impl Cli {
    /// Parses command line arguments
    pub fn init_bootstrap_cli() -> Self {
        Self::parse()
    }

    pub fn print_args(&self) -> bool {
        self.print_args
    }

    pub fn print_config(&self) -> bool {
        self.print_config
    }

    pub fn log_sink(&self) -> LogSink {
        self.log_file
            .clone()
            .map(LogSink::File)
            .unwrap_or_default()
    }

    /// Combines the command line with the environment captured at start.
    pub fn bootstrap_config(&self, ambient: EnvironmentMap) -> BootstrapConfig {
        BootstrapConfig::new(ambient)
            .with_launch(LaunchOptions {
                exporter_path: self.exporter_path.clone(),
                user: self.user.clone(),
                group: self.group.clone(),
                log_sink: self.log_sink(),
                shutdown_timeout: self.shutdown_timeout,
                extra_args: self.extra_args.clone(),
            })
            .with_readiness(ReadinessOptions {
                marker: self.ready_marker.clone(),
                timeout: self.ready_timeout,
                poll_interval: self.poll_interval,
                terminate_on_timeout: self.terminate_on_timeout,
            })
    }
}
