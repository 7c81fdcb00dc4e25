//! Session error types.

use realtime_protocol::ValidationError;
use thiserror::Error;
use tokio::task::JoinError;

use crate::transport::TransportError;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid event: {0}")]
    Validation(#[from] ValidationError),

    #[error("Producer failed: {0}")]
    Producer(String),

    #[error("Task failed: {0}")]
    Join(#[from] JoinError),

    #[error("Session already started")]
    AlreadyStarted,

    #[error("Session cancelled")]
    Cancelled,
}

impl SessionError {
    /// Whether the error means the connection is gone rather than misused.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Closed))
    }
}
