use thiserror::Error;

/// Errors surfaced by the post store and its transport.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Non-success HTTP status or a network failure (`status` is `None` when
    /// no response was received at all).
    #[error("Transport error ({}): {message}", .status.map(|s| s.to_string()).unwrap_or_else(|| "no status".into()))]
    Transport { status: Option<u16>, message: String },

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// The backing store rejected a write because the revision token was stale.
    #[error("Concurrent modification of '{path}'")]
    ConcurrentModification { path: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        StoreError::Transport {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<base64::DecodeError> for StoreError {
    fn from(err: base64::DecodeError) -> Self {
        StoreError::Serialization(format!("invalid base64 content: {err}"))
    }
}

impl From<std::string::FromUtf8Error> for StoreError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        StoreError::Serialization(format!("content is not valid UTF-8: {err}"))
    }
}

impl From<config::ConfigError> for StoreError {
    fn from(err: config::ConfigError) -> Self {
        StoreError::Config(err.to_string())
    }
}

/// Outcome of a read against the remote store.
///
/// Keeps "the object is not there" apart from "the read failed", so callers
/// can decide whether an empty screen or a retry prompt is appropriate.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    Absent,
    Failed(StoreError),
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Lookup::Absent)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Lookup::Failed(_))
    }

    /// Collapse to an `Option`, treating a failed read like a missing object.
    ///
    /// The failure is logged before it is dropped.
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Absent => None,
            Lookup::Failed(err) => {
                tracing::warn!("Read failed, reporting as absent: {err}");
                None
            }
        }
    }

    /// Convert into a `Result`, with `Absent` becoming `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>> {
        match self {
            Lookup::Found(value) => Ok(Some(value)),
            Lookup::Absent => Ok(None),
            Lookup::Failed(err) => Err(err),
        }
    }
}

impl<T> From<Result<Option<T>>> for Lookup<T> {
    fn from(result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Lookup::Found(value),
            Ok(None) => Lookup::Absent,
            Err(err) => Lookup::Failed(err),
        }
    }
}
