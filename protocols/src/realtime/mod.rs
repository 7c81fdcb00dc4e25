//! GLM Realtime API protocol types.
//!
//! The Realtime API is a bidirectional, multimodal (text, audio, video)
//! session carried over a single WebSocket. This module defines:
//!
//! - **Session types**: configuration sent by the client and the snapshot
//!   reported by the server
//! - **Conversation types**: role-constrained messages, function calls and
//!   their outputs
//! - **Response types**: `response.create` parameters and the response object
//! - **Client events**: commands sent to the server (10 types)
//! - **Server events**: events received from the server (15 types)
//! - **Decoding**: [`decode`] turns a raw payload into a [`ServerEvent`] or
//!   hands it back as [`Decoded::Unparsed`]
//! - **Wire dialects**: [`to_wire`] applies deployment-specific quirks
//!
//! # Example
//!
//! ```rust
//! use realtime_protocol::realtime::{
//!     decode, to_wire, ClientEvent, Decoded, SessionUpdateParams, TurnDetection, WireDialect,
//! };
//! use serde_json::json;
//!
//! let update = ClientEvent::session_update(
//!     SessionUpdateParams::default().with_turn_detection(TurnDetection::Disabled),
//! );
//! let wire = to_wire(&update, WireDialect::Default).unwrap();
//! assert!(wire["session"]["turn_detection"].is_null());
//!
//! match decode(json!({"type": "heartbeat"})) {
//!     Decoded::Event(event) => assert_eq!(event.event_type(), "heartbeat"),
//!     Decoded::Unparsed(raw) => panic!("unexpected fallback: {raw}"),
//! }
//! ```

pub mod client_events;
pub mod conversation;
pub mod decode;
pub mod response;
pub mod server_events;
pub mod session;
pub mod wire;

// Re-export all public types for convenience
pub use client_events::ClientEvent;
pub use conversation::{
    AssistantContentPart, AssistantMessageItem, FunctionCallItem, FunctionCallOutputItem,
    InputAudioContentPart, InputTextContentPart, Item, ItemStatus, MessageItem,
    OutputTextContentPart, ResponseContentPart, ResponseFunctionCallItem,
    ResponseFunctionCallOutputItem, ResponseItem, ResponseMessageItem, Role, SystemContentPart,
    SystemMessageItem, UserContentPart, UserMessageItem,
};
pub use decode::{decode, decode_str, try_decode, Decoded};
pub use response::{
    CancelledReason, IncompleteReason, InputTokenDetails, OutputTokenDetails, Response,
    ResponseCreateParams, ResponseStatus, ResponseStatusDetails, Usage,
};
pub use server_events::{
    ErrorEvent, FunctionCallArgumentsDoneEvent, HeartbeatEvent, InputAudioCommittedEvent,
    ItemCreatedEvent, RealtimeError, ResponseDeltaEvent, ResponseEvent, ServerEvent, SessionEvent,
    SpeechStartedEvent, SpeechStoppedEvent, TranscriptDoneEvent, TranscriptionCompletedEvent,
};
pub use session::{
    AudioFormat, FunctionTool, FunctionToolChoice, FunctionType, InputAudioTranscription,
    MaxTokens, Modality, ServerVad, Session, SessionUpdateParams, Temperature, ToolChoice,
    ToolChoiceMode, TurnDetection, VadThreshold, Voice,
};
pub use wire::{to_wire, to_wire_string, WireDialect};
