use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EnvFileError {
    #[error("env file is not valid UTF-8: `{0}`")]
    NotUtf8(String),

    #[error("line {line} is not a NAME=\"VALUE\" assignment: `{content}`")]
    InvalidLine { line: usize, content: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LocationError {
    #[error("object path `{0}` is not an s3://<bucket>/<key> URI")]
    InvalidObjectPath(String),
}
