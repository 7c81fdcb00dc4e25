//! Outbound serialization with per-deployment compatibility rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client_events::ClientEvent;
use crate::error::ValidationResult;

/// Which server deployment the client is talking to.
///
/// The two deployments disagree on how a session without turn detection is
/// spelled: [`WireDialect::Default`] wants `"turn_detection": null`, while
/// [`WireDialect::Azure`] wants `"turn_detection": {"type": "none"}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireDialect {
    #[default]
    Default,
    Azure,
}

impl WireDialect {
    pub fn from_azure_flag(azure: bool) -> Self {
        if azure {
            Self::Azure
        } else {
            Self::Default
        }
    }
}

/// Produce the wire representation of a client event.
pub fn to_wire(event: &ClientEvent, dialect: WireDialect) -> ValidationResult<Value> {
    let mut value = serde_json::to_value(event)?;

    if let ClientEvent::SessionUpdate { session, .. } = event {
        if dialect == WireDialect::Default && session.disables_turn_detection() {
            if let Some(session) = value.get_mut("session").and_then(Value::as_object_mut) {
                session.insert("turn_detection".to_string(), Value::Null);
            }
        }
    }

    Ok(value)
}

/// [`to_wire`], rendered as a text frame.
pub fn to_wire_string(event: &ClientEvent, dialect: WireDialect) -> ValidationResult<String> {
    Ok(serde_json::to_string(&to_wire(event, dialect)?)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::realtime::session::{SessionUpdateParams, TurnDetection};

    fn no_vad() -> ClientEvent {
        ClientEvent::session_update(
            SessionUpdateParams::default().with_turn_detection(TurnDetection::Disabled),
        )
    }

    #[test]
    fn test_default_dialect_nulls_disabled_turn_detection() {
        let value = to_wire(&no_vad(), WireDialect::Default).unwrap();
        assert_eq!(value["session"]["turn_detection"], Value::Null);
        assert!(value["session"].as_object().unwrap().contains_key("turn_detection"));
    }

    #[test]
    fn test_azure_dialect_keeps_object() {
        let value = to_wire(&no_vad(), WireDialect::Azure).unwrap();
        assert_eq!(value["session"]["turn_detection"], json!({"type": "none"}));
    }

    #[test]
    fn test_other_turn_detection_untouched() {
        let event = ClientEvent::session_update(
            SessionUpdateParams::default().with_turn_detection(TurnDetection::server_vad()),
        );
        let value = to_wire(&event, WireDialect::Default).unwrap();
        assert_eq!(value["session"]["turn_detection"]["type"], "server_vad");

        let value = to_wire(
            &ClientEvent::session_update(SessionUpdateParams::default()),
            WireDialect::Default,
        )
        .unwrap();
        assert_eq!(value, json!({"type": "session.update", "session": {}}));
    }

    #[test]
    fn test_other_events_serialize_structurally() {
        let text = to_wire_string(&ClientEvent::audio_commit(), WireDialect::Default).unwrap();
        assert_eq!(text, r#"{"type":"input_audio_buffer.commit"}"#);
    }

    #[test]
    fn test_from_azure_flag() {
        assert_eq!(WireDialect::from_azure_flag(true), WireDialect::Azure);
        assert_eq!(WireDialect::from_azure_flag(false), WireDialect::default());
    }
}
