use std::time::Duration;
use thiserror::Error;

pub type ApiResult<T> = Result<T, AccessorError>;

/// Fallback shown when a failure carries no server-provided text
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Error, Debug)]
pub enum AccessorError {
    /// Network failure or non-JSON body
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Response did not have the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The backend answered with a handled `error` field
    #[error("{0}")]
    Server(String),

    /// Input rejected before any remote call
    #[error("{0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AccessorError {
    /// Text for an error banner: server and validation text verbatim, generic otherwise
    pub fn user_message(&self) -> String {
        match self {
            AccessorError::Server(msg) | AccessorError::Validation(msg) if !msg.trim().is_empty() => {
                msg.clone()
            }
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Transport and shape failures, the ones optional widgets downgrade to empty state
    pub fn is_transport_or_shape(&self) -> bool {
        matches!(
            self,
            AccessorError::Transport(_) | AccessorError::Timeout(_) | AccessorError::Malformed(_)
        )
    }
}
