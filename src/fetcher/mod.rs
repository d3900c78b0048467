pub mod error;
pub mod s3;

use tracing::{debug, info};

use crate::config::RemoteConfigLocation;
use error::FetchError;

pub use s3::S3ConfigFetcher;

/// Largest env file accepted from the object storage.
pub const MAX_CONFIG_BYTES: usize = 1024 * 1024;

/// Retrieves the raw content of a single remote configuration object.
pub trait ConfigFetcher {
    fn fetch(&self, location: &RemoteConfigLocation) -> Result<Vec<u8>, FetchError>;
}

/// Fetches the remote config when a location is configured, yields empty content otherwise.
pub fn fetch_optional<F>(
    fetcher: &F,
    location: Option<&RemoteConfigLocation>,
) -> Result<Vec<u8>, FetchError>
where
    F: ConfigFetcher + ?Sized,
{
    match location {
        Some(location) => {
            info!(%location, "fetching remote configuration");
            let content = fetcher.fetch(location)?;
            debug!(bytes = content.len(), "remote configuration retrieved");
            Ok(content)
        }
        None => {
            info!("no remote configuration location set, skipping fetch");
            Ok(Vec::new())
        }
    }
}
