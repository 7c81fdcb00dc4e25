//! Inbound decoding with an explicit untyped fallback.
//!
//! A long-lived session must survive a single frame it cannot understand.
//! [`decode`] therefore never fails: a payload with a missing or unknown
//! `type`, or one whose fields do not validate, comes back unchanged as
//! [`Decoded::Unparsed`] after a warning is logged.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::server_events::ServerEvent;
use crate::{
    error::{ValidationError, ValidationResult},
    event_types::ServerEventType,
};

/// Outcome of decoding one inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Event(ServerEvent),
    /// The original payload, untouched
    Unparsed(Value),
}

impl Decoded {
    pub fn is_event(&self) -> bool {
        matches!(self, Self::Event(_))
    }

    pub fn as_event(&self) -> Option<&ServerEvent> {
        match self {
            Self::Event(event) => Some(event),
            Self::Unparsed(_) => None,
        }
    }

    pub fn into_event(self) -> Option<ServerEvent> {
        match self {
            Self::Event(event) => Some(event),
            Self::Unparsed(_) => None,
        }
    }

    /// The `type` string, typed or not.
    pub fn event_type(&self) -> Option<&str> {
        match self {
            Self::Event(event) => Some(event.event_type()),
            Self::Unparsed(raw) => raw.get("type").and_then(Value::as_str),
        }
    }
}

impl From<ServerEvent> for Decoded {
    fn from(event: ServerEvent) -> Self {
        Self::Event(event)
    }
}

/// Classify and validate a payload, reporting why it was rejected.
pub fn try_decode(raw: &Value) -> ValidationResult<ServerEvent> {
    let event_type = raw
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingDiscriminator { field: "type" })?;

    if ServerEventType::parse(event_type).is_none() {
        return Err(ValidationError::UnknownDiscriminator {
            field: "type",
            value: event_type.to_string(),
        });
    }

    Ok(ServerEvent::deserialize(raw)?)
}

/// Decode an inbound payload into a typed event, or hand it back untouched.
pub fn decode(raw: Value) -> Decoded {
    match try_decode(&raw) {
        Ok(event) => Decoded::Event(event),
        Err(error) => {
            let event_type = raw.get("type").and_then(Value::as_str).unwrap_or("<missing>");
            warn!(
                event_type,
                error = %error,
                payload = %raw,
                "Failed to decode server event"
            );
            Decoded::Unparsed(raw)
        }
    }
}

/// Decode a text frame.
///
/// Only text that is not JSON at all is an error; everything else goes
/// through [`decode`].
pub fn decode_str(text: &str) -> ValidationResult<Decoded> {
    let raw: Value = serde_json::from_str(text)?;
    Ok(decode(raw))
}
