//! Server events for the Realtime API.
//!
//! This module contains the 15 event types the client understands from the
//! server, organized into several categories:
//!
//! - Error and liveness events: `error`, `heartbeat`
//! - Session events: `created`, `updated`
//! - Input audio buffer events: `committed`, `speech_started`, `speech_stopped`
//! - Conversation events: `item.created`, `input_audio_transcription.completed`
//! - Response events: `created`, `done`
//! - Streaming events: `audio_transcript.delta`, `audio_transcript.done`,
//!   `audio.delta`, `function_call_arguments.done`
//!
//! Every variant wraps a payload struct so handlers can take exactly the
//! event they care about. Anything else is left to [`super::decode`], which
//! hands it back untyped.

use serde::{Deserialize, Serialize};

use super::{conversation::ResponseItem, response::Response, session::Session};
use crate::event_types::ServerEventType;

// ============================================================================
// Supporting Types
// ============================================================================

/// API error returned in error events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeError {
    /// Human-readable error message
    pub message: String,
    /// Error type (e.g., "invalid_request_error")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Parameter that caused the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    /// Event ID of the client event that caused the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl RealtimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: None,
            code: None,
            param: None,
            event_id: None,
        }
    }
}

// ============================================================================
// Event Payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub error: RealtimeError,
}

/// Keep-alive emitted by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<i64>,
}

/// Payload of `session.created` and `session.updated`.
///
/// `session.updated` always carries the full replacement session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub session: Session,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioCommittedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

/// Server VAD detected the start of speech.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechStartedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Offset into the input audio stream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_start_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

/// Server VAD detected the end of speech.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechStoppedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_end_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCreatedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_item_id: Option<String>,
    pub item: ResponseItem,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionCompletedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

/// Payload of `response.created` and `response.done`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response: Response,
}

/// Streaming chunk of `response.audio_transcript.delta` and
/// `response.audio.delta`.
///
/// For audio deltas `delta` is base64 audio in the session's output format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDeltaEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptDoneEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallArgumentsDoneEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// JSON-encoded arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

// ============================================================================
// Server Event Enum
// ============================================================================

/// All server events understood by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    // === Error and Liveness Events ===
    #[serde(rename = "error")]
    Error(ErrorEvent),
    #[serde(rename = "heartbeat")]
    Heartbeat(HeartbeatEvent),

    // === Session Events ===
    #[serde(rename = "session.created")]
    SessionCreated(SessionEvent),
    #[serde(rename = "session.updated")]
    SessionUpdated(SessionEvent),

    // === Input Audio Buffer Events ===
    #[serde(rename = "input_audio_buffer.committed")]
    InputAudioCommitted(InputAudioCommittedEvent),
    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted(SpeechStartedEvent),
    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped(SpeechStoppedEvent),

    // === Conversation Events ===
    #[serde(rename = "conversation.item.created")]
    ItemCreated(ItemCreatedEvent),
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    InputAudioTranscriptionCompleted(TranscriptionCompletedEvent),

    // === Response Events ===
    #[serde(rename = "response.created")]
    ResponseCreated(ResponseEvent),
    #[serde(rename = "response.done")]
    ResponseDone(ResponseEvent),

    // === Streaming Events ===
    #[serde(rename = "response.audio_transcript.delta")]
    ResponseAudioTranscriptDelta(ResponseDeltaEvent),
    #[serde(rename = "response.audio_transcript.done")]
    ResponseAudioTranscriptDone(TranscriptDoneEvent),
    #[serde(rename = "response.audio.delta")]
    ResponseAudioDelta(ResponseDeltaEvent),
    #[serde(rename = "response.function_call_arguments.done")]
    ResponseFunctionCallArgumentsDone(FunctionCallArgumentsDoneEvent),
}

impl ServerEvent {
    pub fn kind(&self) -> ServerEventType {
        match self {
            Self::Error(_) => ServerEventType::Error,
            Self::Heartbeat(_) => ServerEventType::Heartbeat,
            Self::SessionCreated(_) => ServerEventType::SessionCreated,
            Self::SessionUpdated(_) => ServerEventType::SessionUpdated,
            Self::InputAudioCommitted(_) => ServerEventType::InputAudioCommitted,
            Self::SpeechStarted(_) => ServerEventType::SpeechStarted,
            Self::SpeechStopped(_) => ServerEventType::SpeechStopped,
            Self::ItemCreated(_) => ServerEventType::ItemCreated,
            Self::InputAudioTranscriptionCompleted(_) => {
                ServerEventType::InputAudioTranscriptionCompleted
            }
            Self::ResponseCreated(_) => ServerEventType::ResponseCreated,
            Self::ResponseDone(_) => ServerEventType::ResponseDone,
            Self::ResponseAudioTranscriptDelta(_) => ServerEventType::ResponseAudioTranscriptDelta,
            Self::ResponseAudioTranscriptDone(_) => ServerEventType::ResponseAudioTranscriptDone,
            Self::ResponseAudioDelta(_) => ServerEventType::ResponseAudioDelta,
            Self::ResponseFunctionCallArgumentsDone(_) => {
                ServerEventType::ResponseFunctionCallArgumentsDone
            }
        }
    }

    /// Get the event type as a string (e.g., "session.created")
    pub fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn event_id(&self) -> Option<&str> {
        let id = match self {
            Self::Error(e) => &e.event_id,
            Self::Heartbeat(e) => &e.event_id,
            Self::SessionCreated(e) | Self::SessionUpdated(e) => &e.event_id,
            Self::InputAudioCommitted(e) => &e.event_id,
            Self::SpeechStarted(e) => &e.event_id,
            Self::SpeechStopped(e) => &e.event_id,
            Self::ItemCreated(e) => &e.event_id,
            Self::InputAudioTranscriptionCompleted(e) => &e.event_id,
            Self::ResponseCreated(e) | Self::ResponseDone(e) => &e.event_id,
            Self::ResponseAudioTranscriptDelta(e) | Self::ResponseAudioDelta(e) => &e.event_id,
            Self::ResponseAudioTranscriptDone(e) => &e.event_id,
            Self::ResponseFunctionCallArgumentsDone(e) => &e.event_id,
        };
        id.as_deref()
    }

    /// Extract function call details if this is a function call done event
    ///
    /// Returns a `(call_id, name, arguments)` tuple, or `None` if any of the
    /// three is missing since such a call cannot be answered.
    pub fn get_function_call(&self) -> Option<(&str, &str, &str)> {
        match self {
            Self::ResponseFunctionCallArgumentsDone(e) => Some((
                e.call_id.as_deref()?,
                e.name.as_deref()?,
                e.arguments.as_deref()?,
            )),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn as_error(&self) -> Option<&RealtimeError> {
        match self {
            Self::Error(e) => Some(&e.error),
            _ => None,
        }
    }

    /// The session snapshot carried by `session.created`/`session.updated`
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SessionCreated(e) | Self::SessionUpdated(e) => Some(&e.session),
            _ => None,
        }
    }

    /// The response carried by `response.created`/`response.done`
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::ResponseCreated(e) | Self::ResponseDone(e) => Some(&e.response),
            _ => None,
        }
    }

    /// Check if this is a streaming delta event
    pub fn is_delta_event(&self) -> bool {
        matches!(
            self,
            Self::ResponseAudioTranscriptDelta(_) | Self::ResponseAudioDelta(_)
        )
    }
}
