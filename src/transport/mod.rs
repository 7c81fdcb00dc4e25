//! Duplex frame transport.
//!
//! The session loop talks to the server through two halves: a [`FrameSink`]
//! owned by the single writer task and a [`FrameStream`] owned by the
//! consumer. [`websocket`] is the production implementation and [`memory`]
//! drives sessions in tests without a network.

pub mod memory;
pub mod websocket;

use async_trait::async_trait;
use thiserror::Error;

/// One complete message unit on the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Connection closed")]
    Closed,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Outbound half of a connection.
#[async_trait]
pub trait FrameSink: Send + 'static {
    async fn send(&mut self, frame: Frame) -> TransportResult<()>;

    /// Close the connection. The session calls this exactly once.
    async fn close(&mut self) -> TransportResult<()>;
}

/// Inbound half of a connection.
#[async_trait]
pub trait FrameStream: Send + 'static {
    /// Next frame, or `None` once the peer has ended the stream.
    ///
    /// Must be cancel-safe: the session drops pending calls on timeout.
    async fn next_frame(&mut self) -> Option<TransportResult<Frame>>;
}

/// A connected duplex channel that can be split into its two halves.
pub trait Transport: Send {
    type Sink: FrameSink;
    type Stream: FrameStream;

    fn split(self) -> (Self::Sink, Self::Stream);
}
