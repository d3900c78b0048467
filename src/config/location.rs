use std::fmt;

use super::environment::EnvironmentMap;
use super::error::LocationError;

pub const AWS_S3_ENDPOINT_URL: &str = "AWS_S3_ENDPOINT_URL";
pub const AWS_S3_BUCKET_REGION: &str = "AWS_S3_BUCKET_REGION";
pub const AWS_S3_ENV_FILE_OBJECT_PATH: &str = "AWS_S3_ENV_FILE_OBJECT_PATH";
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const AWS_METADATA_SERVICE_URL: &str = "AWS_METADATA_SERVICE_URL";

const S3_SCHEME: &str = "s3://";

/// Where the remote env file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfigLocation {
    endpoint: String,
    region: String,
    object_path: String,
    bucket: String,
    key: String,
}

impl RemoteConfigLocation {
    pub fn new<E, R, P>(endpoint: E, region: R, object_path: P) -> Result<Self, LocationError>
    where
        E: Into<String>,
        R: Into<String>,
        P: Into<String>,
    {
        let object_path = object_path.into();
        let (bucket, key) = split_object_path(&object_path)?;
        Ok(Self {
            endpoint: endpoint.into(),
            region: region.into(),
            bucket: bucket.to_string(),
            key: key.to_string(),
            object_path,
        })
    }

    /// Resolves the location from the environment.
    ///
    /// Returns `None` unless endpoint, region and object path are all set to non-empty
    /// values: remote configuration is optional.
    pub fn from_env(env: &EnvironmentMap) -> Result<Option<Self>, LocationError> {
        let endpoint = env.get_non_empty(AWS_S3_ENDPOINT_URL);
        let region = env.get_non_empty(AWS_S3_BUCKET_REGION);
        let object_path = env.get_non_empty(AWS_S3_ENV_FILE_OBJECT_PATH);

        match (endpoint, region, object_path) {
            (Some(endpoint), Some(region), Some(object_path)) => {
                Self::new(endpoint, region, object_path).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn object_path(&self) -> &str {
        &self.object_path
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for RemoteConfigLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} @ {})", self.object_path, self.region, self.endpoint)
    }
}

fn split_object_path(object_path: &str) -> Result<(&str, &str), LocationError> {
    let invalid = || LocationError::InvalidObjectPath(object_path.to_string());

    let path = object_path.strip_prefix(S3_SCHEME).ok_or_else(invalid)?;
    let (bucket, key) = path.split_once('/').ok_or_else(invalid)?;
    if bucket.is_empty() || key.is_empty() {
        return Err(invalid());
    }
    Ok((bucket, key))
}

/// Credentials used against the object storage. Values are never displayed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StorageCredentials {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub metadata_service_url: Option<String>,
}

impl StorageCredentials {
    pub fn from_env(env: &EnvironmentMap) -> Self {
        let owned = |name: &str| env.get_non_empty(name).map(str::to_string);
        Self {
            access_key_id: owned(AWS_ACCESS_KEY_ID),
            secret_access_key: owned(AWS_SECRET_ACCESS_KEY),
            session_token: owned(AWS_SESSION_TOKEN),
            metadata_service_url: owned(AWS_METADATA_SERVICE_URL),
        }
    }

    /// Static key pair, when both halves are present.
    pub fn static_keys(&self) -> Option<(&str, &str)> {
        self.access_key_id
            .as_deref()
            .zip(self.secret_access_key.as_deref())
    }
}

impl fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "<redacted>"))
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("metadata_service_url", &self.metadata_service_url)
            .finish()
    }
}
