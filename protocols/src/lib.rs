//! Wire model for the GLM Realtime API.
//!
//! The crate is transport-agnostic: it defines the typed client commands and
//! server events exchanged over a realtime connection, the decoder that turns
//! inbound JSON into typed events, and the serializer that applies
//! per-deployment wire quirks to outbound commands.

pub mod error;
pub mod event_types;
pub mod realtime;

pub use error::ValidationError;
