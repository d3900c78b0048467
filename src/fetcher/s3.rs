use std::time::Duration;

use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use super::{error::FetchError, ConfigFetcher, MAX_CONFIG_BYTES};
use crate::config::{RemoteConfigLocation, StorageCredentials};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);
const CREDENTIALS_PROVIDER_NAME: &str = "bootstrap-environment";

/// Fetches the env file from an S3 compatible endpoint.
///
/// The AWS SDK is async, the bootstrap is not: every fetch is driven to completion on a
/// current-thread runtime owned by the fetcher.
pub struct S3ConfigFetcher {
    credentials: StorageCredentials,
    runtime: Runtime,
    max_bytes: usize,
}

impl S3ConfigFetcher {
    pub fn new(credentials: StorageCredentials) -> Result<Self, FetchError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            credentials,
            runtime,
            max_bytes: MAX_CONFIG_BYTES,
        })
    }

    pub fn with_max_bytes(self, max_bytes: usize) -> Self {
        Self { max_bytes, ..self }
    }

    async fn client(&self, location: &RemoteConfigLocation) -> Result<Client, FetchError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(location.region().to_string()))
            .endpoint_url(location.endpoint())
            // a failed fetch fails the container start, the orchestrator owns retries
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(CONNECT_TIMEOUT)
                    .operation_timeout(OPERATION_TIMEOUT)
                    .build(),
            );

        if let Some((access_key_id, secret_access_key)) = self.credentials.static_keys() {
            debug!("using static storage credentials");
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                self.credentials.session_token.clone(),
                None,
                CREDENTIALS_PROVIDER_NAME,
            ));
        } else if let Some(url) = &self.credentials.metadata_service_url {
            debug!(%url, "using metadata service credentials");
            let imds = aws_config::imds::Client::builder()
                .endpoint(url)
                .map_err(|e| FetchError::Client(e.to_string()))?
                .build();
            loader = loader.credentials_provider(
                ImdsCredentialsProvider::builder().imds_client(imds).build(),
            );
        }

        let shared_config = loader.load().await;
        // S3 compatible endpoints do not resolve virtual-hosted bucket names
        let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
            .force_path_style(true)
            .build();
        Ok(Client::from_conf(s3_config))
    }

    async fn get(&self, location: &RemoteConfigLocation) -> Result<Vec<u8>, FetchError> {
        let path = location.object_path().to_string();
        let client = self.client(location).await?;

        let output = client
            .get_object()
            .bucket(location.bucket())
            .key(location.key())
            .send()
            .await
            .map_err(|e| FetchError::Retrieve {
                path: path.clone(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        if let Some(length) = output.content_length() {
            check_size(&path, self.max_bytes, usize::try_from(length).unwrap_or(usize::MAX))?;
        }

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| FetchError::Body {
                path: path.clone(),
                reason: e.to_string(),
            })?
            .into_bytes();

        // the announced length is optional
        check_size(&path, self.max_bytes, bytes.len())?;
        Ok(bytes.to_vec())
    }
}

fn check_size(path: &str, max_bytes: usize, actual_bytes: usize) -> Result<(), FetchError> {
    if actual_bytes > max_bytes {
        return Err(FetchError::TooLarge {
            path: path.to_string(),
            max_bytes,
            actual_bytes,
        });
    }
    Ok(())
}

impl ConfigFetcher for S3ConfigFetcher {
    fn fetch(&self, location: &RemoteConfigLocation) -> Result<Vec<u8>, FetchError> {
        self.runtime.block_on(self.get(location))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use httpmock::MockServer;

    use super::*;
    use crate::bootstrap::error::BootstrapError;

    const OBJECT_PATH: &str = "s3://bucket/env-file.env";
    const ENV_FILE: &str = "NODE_EXPORTER_LOG_LEVEL=\"debug\"\nNODE_EXPORTER_PATH_ROOTFS=\"/mnt/root\"\n";

    fn static_credentials() -> StorageCredentials {
        StorageCredentials {
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
            ..Default::default()
        }
    }

    fn server_location(server: &MockServer) -> RemoteConfigLocation {
        RemoteConfigLocation::new(server.base_url(), "us-east-1", OBJECT_PATH).unwrap()
    }

    #[test]
    fn object_body_is_returned() {
        let server = MockServer::start();
        let object_mock = server.mock(|when, then| {
            when.method("GET").path("/bucket/env-file.env");
            then.status(200).body(ENV_FILE);
        });

        let content = S3ConfigFetcher::new(static_credentials())
            .unwrap()
            .fetch(&server_location(&server))
            .unwrap();

        assert_eq!(content, ENV_FILE.as_bytes());
        object_mock.assert_hits(1);
    }

    #[test]
    fn missing_object_is_unavailable_config() {
        let server = MockServer::start();
        let object_mock = server.mock(|when, then| {
            when.method("GET").path("/bucket/env-file.env");
            then.status(404)
                .header("content-type", "application/xml")
                .body(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                     <Error><Code>NoSuchKey</Code>\
                     <Message>The specified key does not exist.</Message>\
                     <Key>env-file.env</Key></Error>",
                );
        });

        let err = S3ConfigFetcher::new(static_credentials())
            .unwrap()
            .fetch(&server_location(&server))
            .unwrap_err();

        assert_matches!(&err, FetchError::Retrieve { path, reason } => {
            assert_eq!(path, OBJECT_PATH);
            assert!(reason.contains("NoSuchKey"), "{reason}");
        });
        assert_matches!(BootstrapError::from(err), BootstrapError::ConfigUnavailable(_));
        // no retries
        object_mock.assert_hits(1);
    }

    #[test]
    fn announced_length_over_the_limit_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/bucket/env-file.env");
            then.status(200).body("A".repeat(64));
        });

        let err = S3ConfigFetcher::new(static_credentials())
            .unwrap()
            .with_max_bytes(16)
            .fetch(&server_location(&server))
            .unwrap_err();

        assert_matches!(
            err,
            FetchError::TooLarge { max_bytes: 16, actual_bytes: 64, .. }
        );
    }

    #[test]
    fn body_at_the_limit_is_accepted() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/bucket/env-file.env");
            then.status(200).body(ENV_FILE);
        });

        let content = S3ConfigFetcher::new(static_credentials())
            .unwrap()
            .with_max_bytes(ENV_FILE.len())
            .fetch(&server_location(&server))
            .unwrap();

        assert_eq!(content.len(), ENV_FILE.len());
    }

    #[test]
    fn collected_body_over_the_limit_is_rejected() {
        assert!(check_size(OBJECT_PATH, 16, 16).is_ok());
        assert_matches!(
            check_size(OBJECT_PATH, 16, 17),
            Err(FetchError::TooLarge { path, max_bytes: 16, actual_bytes: 17 }) => {
                assert_eq!(path, OBJECT_PATH);
            }
        );
    }

    #[test]
    fn unreachable_endpoint_is_a_retrieve_error() {
        let credentials = StorageCredentials {
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
            ..Default::default()
        };
        // Nothing listens on the discard port in the test environment
        let location =
            RemoteConfigLocation::new("http://127.0.0.1:9", "us-east-1", "s3://bucket/env-file.env")
                .unwrap();

        let fetcher = S3ConfigFetcher::new(credentials).unwrap();

        assert_matches!(
            fetcher.fetch(&location),
            Err(FetchError::Retrieve { path, .. }) => assert_eq!(path, "s3://bucket/env-file.env")
        );
    }

    #[test]
    fn invalid_metadata_service_url_is_a_client_error() {
        let credentials = StorageCredentials {
            metadata_service_url: Some("not a url".to_string()),
            ..Default::default()
        };
        let location =
            RemoteConfigLocation::new("http://127.0.0.1:9", "us-east-1", "s3://bucket/env-file.env")
                .unwrap();

        let fetcher = S3ConfigFetcher::new(credentials).unwrap();

        assert_matches!(fetcher.fetch(&location), Err(FetchError::Client(_)));
    }
}
