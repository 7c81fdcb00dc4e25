//! Client events for the Realtime API.
//!
//! This module contains all commands the client can send to the server.
//! There are 10 client event types organized into four categories:
//!
//! - Session events: `session.update`
//! - Input buffer events: `append`, `append_video_frame`, `commit`, `clear`
//! - Conversation events: `item.create`, `item.truncate`, `item.delete`
//! - Response events: `response.create`, `response.cancel`
//!
//! Serialize through [`super::wire::to_wire`] rather than `serde_json`
//! directly so the dialect rules for `session.update` are applied.

use serde::{Deserialize, Serialize};

use super::{conversation::Item, response::ResponseCreateParams, session::SessionUpdateParams};
use crate::event_types::ClientEventType;

// ============================================================================
// Client Event Enum
// ============================================================================

/// All client events that can be sent to the Realtime API.
///
/// Each event has an optional `event_id` that can be used for tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    // === Session Events ===
    /// Update the session configuration
    #[serde(rename = "session.update")]
    SessionUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        event_id: Option<String>,
        session: SessionUpdateParams,
    },

    // === Input Buffer Events ===
    /// Append audio to the input buffer, in the session's input format
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioAppend {
        #[serde(skip_serializing_if = "Option::is_none")]
        event_id: Option<String>,
        /// Base64-encoded audio data
        audio: String,
        /// Client clock in milliseconds
        #[serde(skip_serializing_if = "Option::is_none")]
        client_timestamp: Option<i64>,
    },

    /// Report one video frame during a video call
    #[serde(rename = "input_audio_buffer.append_video_frame")]
    InputVideoFrameAppend {
        #[serde(skip_serializing_if = "Option::is_none")]
        event_id: Option<String>,
        /// Base64-encoded image data
        video_frame: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        client_timestamp: Option<i64>,
    },

    /// Commit the input buffer, creating a user message item
    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioCommit {
        #[serde(skip_serializing_if = "Option::is_none")]
        event_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        client_timestamp: Option<i64>,
    },

    /// Discard any buffered input
    #[serde(rename = "input_audio_buffer.clear")]
    InputAudioClear {
        #[serde(skip_serializing_if = "Option::is_none")]
        event_id: Option<String>,
    },

    // === Conversation Events ===
    #[serde(rename = "conversation.item.create")]
    ItemCreate {
        #[serde(skip_serializing_if = "Option::is_none")]
        event_id: Option<String>,
        /// ID of the item to insert after (None for end of conversation)
        #[serde(skip_serializing_if = "Option::is_none")]
        previous_item_id: Option<String>,
        item: Item,
    },

    /// Remove audio from an item up to a point
    #[serde(rename = "conversation.item.truncate")]
    ItemTruncate {
        #[serde(skip_serializing_if = "Option::is_none")]
        event_id: Option<String>,
        item_id: String,
        content_index: u32,
        audio_end_ms: u32,
    },

    #[serde(rename = "conversation.item.delete")]
    ItemDelete {
        #[serde(skip_serializing_if = "Option::is_none")]
        event_id: Option<String>,
        item_id: String,
    },

    // === Response Events ===
    /// Trigger model inference for a new turn
    #[serde(rename = "response.create")]
    ResponseCreate {
        #[serde(skip_serializing_if = "Option::is_none")]
        event_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<ResponseCreateParams>,
    },

    #[serde(rename = "response.cancel")]
    ResponseCancel {
        #[serde(skip_serializing_if = "Option::is_none")]
        event_id: Option<String>,
    },
}

impl ClientEvent {
    pub fn kind(&self) -> ClientEventType {
        match self {
            Self::SessionUpdate { .. } => ClientEventType::SessionUpdate,
            Self::InputAudioAppend { .. } => ClientEventType::InputAudioAppend,
            Self::InputVideoFrameAppend { .. } => ClientEventType::InputVideoFrameAppend,
            Self::InputAudioCommit { .. } => ClientEventType::InputAudioCommit,
            Self::InputAudioClear { .. } => ClientEventType::InputAudioClear,
            Self::ItemCreate { .. } => ClientEventType::ItemCreate,
            Self::ItemTruncate { .. } => ClientEventType::ItemTruncate,
            Self::ItemDelete { .. } => ClientEventType::ItemDelete,
            Self::ResponseCreate { .. } => ClientEventType::ResponseCreate,
            Self::ResponseCancel { .. } => ClientEventType::ResponseCancel,
        }
    }

    /// Get the event type as a string (e.g., "session.update")
    pub fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Get the event ID if one was specified
    pub fn event_id(&self) -> Option<&str> {
        match self {
            Self::SessionUpdate { event_id, .. }
            | Self::InputAudioAppend { event_id, .. }
            | Self::InputVideoFrameAppend { event_id, .. }
            | Self::InputAudioCommit { event_id, .. }
            | Self::InputAudioClear { event_id, .. }
            | Self::ItemCreate { event_id, .. }
            | Self::ItemTruncate { event_id, .. }
            | Self::ItemDelete { event_id, .. }
            | Self::ResponseCreate { event_id, .. }
            | Self::ResponseCancel { event_id, .. } => event_id.as_deref(),
        }
    }
}

// ============================================================================
// Builder methods for common operations
// ============================================================================

impl ClientEvent {
    pub fn session_update(session: SessionUpdateParams) -> Self {
        Self::SessionUpdate {
            event_id: None,
            session,
        }
    }

    pub fn audio_append(audio: impl Into<String>) -> Self {
        Self::InputAudioAppend {
            event_id: None,
            audio: audio.into(),
            client_timestamp: None,
        }
    }

    pub fn video_frame_append(video_frame: impl Into<String>) -> Self {
        Self::InputVideoFrameAppend {
            event_id: None,
            video_frame: video_frame.into(),
            client_timestamp: None,
        }
    }

    pub fn audio_commit() -> Self {
        Self::InputAudioCommit {
            event_id: None,
            client_timestamp: None,
        }
    }

    pub fn audio_clear() -> Self {
        Self::InputAudioClear { event_id: None }
    }

    pub fn item_create(item: Item) -> Self {
        Self::ItemCreate {
            event_id: None,
            previous_item_id: None,
            item,
        }
    }

    /// Create a conversation item placed after `previous_item_id`
    pub fn item_create_after(item: Item, previous_item_id: impl Into<String>) -> Self {
        Self::ItemCreate {
            event_id: None,
            previous_item_id: Some(previous_item_id.into()),
            item,
        }
    }

    pub fn item_truncate(item_id: impl Into<String>, content_index: u32, audio_end_ms: u32) -> Self {
        Self::ItemTruncate {
            event_id: None,
            item_id: item_id.into(),
            content_index,
            audio_end_ms,
        }
    }

    pub fn item_delete(item_id: impl Into<String>) -> Self {
        Self::ItemDelete {
            event_id: None,
            item_id: item_id.into(),
        }
    }

    /// Create a response create event with server defaults
    pub fn response_create() -> Self {
        Self::ResponseCreate {
            event_id: None,
            response: None,
        }
    }

    pub fn response_create_with(params: ResponseCreateParams) -> Self {
        Self::ResponseCreate {
            event_id: None,
            response: Some(params),
        }
    }

    pub fn response_cancel() -> Self {
        Self::ResponseCancel { event_id: None }
    }

    /// Add an event ID to this event
    pub fn with_event_id(mut self, id: impl Into<String>) -> Self {
        let id = Some(id.into());
        match &mut self {
            Self::SessionUpdate { event_id, .. }
            | Self::InputAudioAppend { event_id, .. }
            | Self::InputVideoFrameAppend { event_id, .. }
            | Self::InputAudioCommit { event_id, .. }
            | Self::InputAudioClear { event_id, .. }
            | Self::ItemCreate { event_id, .. }
            | Self::ItemTruncate { event_id, .. }
            | Self::ItemDelete { event_id, .. }
            | Self::ResponseCreate { event_id, .. }
            | Self::ResponseCancel { event_id, .. } => *event_id = id,
        }
        self
    }

    /// Stamp media and commit events with a client clock value in milliseconds.
    ///
    /// Other events carry no timestamp and are returned unchanged.
    pub fn with_client_timestamp(mut self, millis: i64) -> Self {
        match &mut self {
            Self::InputAudioAppend {
                client_timestamp, ..
            }
            | Self::InputVideoFrameAppend {
                client_timestamp, ..
            }
            | Self::InputAudioCommit {
                client_timestamp, ..
            } => *client_timestamp = Some(millis),
            _ => {}
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::realtime::session::{Modality, TurnDetection};

    fn every_variant() -> Vec<ClientEvent> {
        vec![
            ClientEvent::session_update(SessionUpdateParams::default()),
            ClientEvent::audio_append("AAAA"),
            ClientEvent::video_frame_append("/9j/"),
            ClientEvent::audio_commit(),
            ClientEvent::audio_clear(),
            ClientEvent::item_create(Item::user_text("hi")),
            ClientEvent::item_truncate("item_1", 0, 1500),
            ClientEvent::item_delete("item_1"),
            ClientEvent::response_create(),
            ClientEvent::response_cancel(),
        ]
    }

    #[test]
    fn test_kind_matches_serialized_type() {
        let events = every_variant();
        assert_eq!(events.len(), ClientEventType::ALL.len());
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.event_type());
        }
    }

    #[test]
    fn test_session_update_serialization() {
        let event = ClientEvent::session_update(
            SessionUpdateParams::default()
                .with_modalities([Modality::Text, Modality::Audio])
                .with_turn_detection(TurnDetection::ClientVad),
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"session.update\""));
        assert!(json.contains("\"turn_detection\":{\"type\":\"client_vad\"}"));
        assert!(!json.contains("event_id"));
    }

    #[test]
    fn test_video_frame_serialization() {
        let event = ClientEvent::video_frame_append("/9j/4AAQ").with_client_timestamp(1_700_000_000_000);
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "input_audio_buffer.append_video_frame",
                "video_frame": "/9j/4AAQ",
                "client_timestamp": 1_700_000_000_000_i64
            })
        );
    }

    #[test]
    fn test_client_timestamp_ignored_on_other_events() {
        let event = ClientEvent::response_cancel().with_client_timestamp(5);
        assert_eq!(event, ClientEvent::response_cancel());
    }

    #[test]
    fn test_item_create_serialization() {
        let event = ClientEvent::item_create_after(Item::user_text("Hello!"), "item_0");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"conversation.item.create\""));
        assert!(json.contains("\"previous_item_id\":\"item_0\""));
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn test_event_with_id() {
        let event = ClientEvent::response_create().with_event_id("evt_123");
        assert_eq!(event.event_id(), Some("evt_123"));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_id\":\"evt_123\""));
    }

    #[test]
    fn test_item_truncate_serialization() {
        let json = serde_json::to_string(&ClientEvent::item_truncate("item_123", 0, 5000)).unwrap();
        assert!(json.contains("\"type\":\"conversation.item.truncate\""));
        assert!(json.contains("\"item_id\":\"item_123\""));
        assert!(json.contains("\"audio_end_ms\":5000"));
    }

    #[test]
    fn test_deserialize_client_event() {
        let json = r#"{
            "type": "response.create",
            "event_id": "evt_456"
        }"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind(), ClientEventType::ResponseCreate);
        assert_eq!(event.event_id(), Some("evt_456"));
    }

    #[test]
    fn test_round_trip_every_variant() {
        for event in every_variant() {
            let event = event.with_event_id("evt_1");
            let json = serde_json::to_string(&event).unwrap();
            let back: ClientEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(back, event);
        }
    }
}
