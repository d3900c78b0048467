//! Container entrypoint of the node_exporter image.
use std::process::ExitCode;

use tracing::{error, info};

use node_exporter_bootstrap::bootstrap::error::BootstrapError;
use node_exporter_bootstrap::bootstrap::{exit_code, supervise, Bootstrapper};
use node_exporter_bootstrap::cli::Cli;
use node_exporter_bootstrap::command::{CommandError, ProcessTerminator};
use node_exporter_bootstrap::config::{EnvironmentMap, StorageCredentials};
use node_exporter_bootstrap::config::env_file;
use node_exporter_bootstrap::fetcher::S3ConfigFetcher;
use node_exporter_bootstrap::logging::Logging;

fn main() -> ExitCode {
    // init logging singleton
    if let Err(err) = Logging::try_init() {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    let cli = Cli::init_bootstrap_cli();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!("bootstrap failed: {err}");
            if let Some(output) = err.captured_output() {
                error!("exporter output so far:\n{output}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<u8, BootstrapError> {
    let ambient = EnvironmentMap::from_process_env();
    let fetcher = S3ConfigFetcher::new(StorageCredentials::from_env(&ambient))?;
    let bootstrapper = Bootstrapper::new(fetcher, cli.bootstrap_config(ambient));

    let plan = bootstrapper.prepare()?;
    if cli.print_args() {
        plan.args.iter().for_each(|arg| println!("{arg}"));
        return Ok(0);
    }
    if cli.print_config() {
        print!("{}", env_file::render(&plan.settings.to_environment()));
        return Ok(0);
    }

    let mut process = bootstrapper.launch(&plan)?;
    create_shutdown_signal_handler(ProcessTerminator::new(process.get_pid()))?;

    let elapsed = bootstrapper.await_ready(&mut process)?;
    info!(pid = process.get_pid(), elapsed = ?elapsed, "node_exporter is up");

    let status = supervise(process)?;
    Ok(exit_code(status))
}

/// Forwards SIGINT and SIGTERM to the exporter, which is waited for as usual.
fn create_shutdown_signal_handler(terminator: ProcessTerminator) -> Result<(), CommandError> {
    ctrlc::set_handler(move || {
        info!("Received termination signal. Stopping node_exporter");
        let _ = terminator
            .terminate()
            .inspect_err(|e| error!("Could not stop node_exporter: {e}"));
    })
    .map_err(|e| CommandError::SignalHandler(e.to_string()))
}
