//! Error types for the rewards engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewardsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RewardsError {
    /// Stable error code for callers that map errors onto a wire protocol.
    pub fn code(&self) -> i32 {
        match self {
            RewardsError::InvalidArgument(_) => -32602,
            RewardsError::StorageUnavailable(_) => -32001,
            RewardsError::Configuration(_) => -32002,
            RewardsError::Io(_) => -32006,
            RewardsError::Json(_) => -32700,
        }
    }

    /// Whether the caller may safely retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RewardsError::StorageUnavailable(_) | RewardsError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RewardsError>;
