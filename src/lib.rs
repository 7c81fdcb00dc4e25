//! Realtime session client for the GLM Realtime API.
//!
//! The wire model lives in the `realtime_protocol` crate. This crate adds the
//! pieces that drive a live conversation:
//!
//! - [`session`]: the concurrent send/receive loop with cooperative shutdown
//! - [`transport`]: the frame transport seam, with WebSocket and in-memory
//!   implementations
//! - [`media`]: audio chunking and base64 helpers for append events
//! - [`flows`]: the ready-made conversations behind the `rtclient` binary

pub mod config;
pub mod error;
pub mod flows;
pub mod media;
pub mod observability;
pub mod session;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use error::{SessionError, SessionResult};
pub use realtime_protocol as protocol;
pub use session::{
    EventHandler, EventSender, Session, SessionConfig, SessionReport, SessionState, ShutdownReason,
};
pub use transport::{Frame, Transport, TransportError};
