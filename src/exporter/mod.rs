//! Everything the bootstrap knows about the exporter: its defaults, the settings it reads
//! from the environment and the flags they turn into.
pub mod args;
pub mod defaults;
pub mod settings;

pub use args::ArgumentList;
pub use settings::ResolvedSettings;
