pub mod env_file;
pub mod environment;
pub mod error;
pub mod location;

pub use environment::EnvironmentMap;
pub use location::{RemoteConfigLocation, StorageCredentials};
