pub mod bootstrap;
pub mod cli;
pub mod command;
pub mod config;
pub mod exporter;
pub mod fetcher;
pub mod logging;
pub mod readiness;
pub(crate) mod utils;
