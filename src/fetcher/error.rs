use thiserror::Error;

use crate::config::error::LocationError;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    InvalidLocation(#[from] LocationError),

    #[error("could not build the object storage client: `{0}`")]
    Client(String),

    #[error("could not retrieve `{path}`: `{reason}`")]
    Retrieve { path: String, reason: String },

    #[error("could not read the body of `{path}`: `{reason}`")]
    Body { path: String, reason: String },

    #[error("object `{path}` is {actual_bytes} bytes, more than the {max_bytes} allowed")]
    TooLarge {
        path: String,
        max_bytes: usize,
        actual_bytes: usize,
    },
}
