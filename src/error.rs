use thiserror::Error;

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Error taxonomy shared by every backend
///
/// `AlreadyQueued` and `NotFound` are recoverable outcomes of normal use and
/// are reported back to the caller; `Backend` and `Serialization` indicate
/// infrastructure trouble and are logged with detail before being surfaced
/// as a generic failure.
#[derive(Error, Debug, Clone)]
pub enum QueueError {
    #[error("caller {0} is already queued")]
    AlreadyQueued(String),

    #[error("caller {0} is not queued")]
    NotFound(String),

    #[error("backend unavailable: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl QueueError {
    /// Check whether this is the recoverable duplicate-enqueue outcome
    pub fn is_already_queued(&self) -> bool {
        matches!(self, Self::AlreadyQueued(_))
    }

    /// Check whether this is the recoverable absent-on-remove outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for QueueError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}
