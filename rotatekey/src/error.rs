use std::time::Duration;
use thiserror::Error;

pub type RotateKeyResult<T> = Result<T, RotateKeyError>;

#[derive(Debug, Error)]
pub enum RotateKeyError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "async-ssh2-lite")]
    #[error(transparent)]
    Ssh(#[from] async_ssh2_lite::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Xml(#[from] quick_xml::DeError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error("backend is not connected")]
    NotConnected,
    #[error("unexpected status {status} from {resource}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        resource: String,
    },
    #[error("unexpected output line {line:?}: {reason}")]
    MalformedLine { line: String, reason: &'static str },
    #[error("command {command:?} rejected: {message}")]
    CommandRejected { command: String, message: String },
    #[error("unsupported platform (show version did not match any known platform)")]
    UnsupportedPlatform,
    #[error("invalid community name {0:?} (must be non-empty, without whitespace or control characters)")]
    InvalidCommunityName(String),
    #[error("unknown permission {0:?} (expected ro or rw)")]
    UnknownPermission(String),
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl RotateKeyError {
    pub fn new(msg: String) -> Self {
        RotateKeyError::Anyhow(anyhow::Error::msg(msg))
    }
}
