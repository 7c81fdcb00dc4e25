//! Discriminator literals for every realtime frame type.

use std::fmt;

/// Client-to-server command discriminators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientEventType {
    SessionUpdate,
    InputAudioAppend,
    InputVideoFrameAppend,
    InputAudioCommit,
    InputAudioClear,
    ItemCreate,
    ItemTruncate,
    ItemDelete,
    ResponseCreate,
    ResponseCancel,
}

impl ClientEventType {
    pub const SESSION_UPDATE: &'static str = "session.update";
    pub const INPUT_AUDIO_APPEND: &'static str = "input_audio_buffer.append";
    pub const INPUT_VIDEO_FRAME_APPEND: &'static str = "input_audio_buffer.append_video_frame";
    pub const INPUT_AUDIO_COMMIT: &'static str = "input_audio_buffer.commit";
    pub const INPUT_AUDIO_CLEAR: &'static str = "input_audio_buffer.clear";
    pub const ITEM_CREATE: &'static str = "conversation.item.create";
    pub const ITEM_TRUNCATE: &'static str = "conversation.item.truncate";
    pub const ITEM_DELETE: &'static str = "conversation.item.delete";
    pub const RESPONSE_CREATE: &'static str = "response.create";
    pub const RESPONSE_CANCEL: &'static str = "response.cancel";

    pub const ALL: [Self; 10] = [
        Self::SessionUpdate,
        Self::InputAudioAppend,
        Self::InputVideoFrameAppend,
        Self::InputAudioCommit,
        Self::InputAudioClear,
        Self::ItemCreate,
        Self::ItemTruncate,
        Self::ItemDelete,
        Self::ResponseCreate,
        Self::ResponseCancel,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SessionUpdate => Self::SESSION_UPDATE,
            Self::InputAudioAppend => Self::INPUT_AUDIO_APPEND,
            Self::InputVideoFrameAppend => Self::INPUT_VIDEO_FRAME_APPEND,
            Self::InputAudioCommit => Self::INPUT_AUDIO_COMMIT,
            Self::InputAudioClear => Self::INPUT_AUDIO_CLEAR,
            Self::ItemCreate => Self::ITEM_CREATE,
            Self::ItemTruncate => Self::ITEM_TRUNCATE,
            Self::ItemDelete => Self::ITEM_DELETE,
            Self::ResponseCreate => Self::RESPONSE_CREATE,
            Self::ResponseCancel => Self::RESPONSE_CANCEL,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for ClientEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-to-client event discriminators understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerEventType {
    Error,
    Heartbeat,
    SessionCreated,
    SessionUpdated,
    InputAudioCommitted,
    SpeechStarted,
    SpeechStopped,
    ItemCreated,
    InputAudioTranscriptionCompleted,
    ResponseCreated,
    ResponseDone,
    ResponseAudioTranscriptDelta,
    ResponseAudioTranscriptDone,
    ResponseAudioDelta,
    ResponseFunctionCallArgumentsDone,
}

impl ServerEventType {
    pub const ERROR: &'static str = "error";
    pub const HEARTBEAT: &'static str = "heartbeat";
    pub const SESSION_CREATED: &'static str = "session.created";
    pub const SESSION_UPDATED: &'static str = "session.updated";
    pub const INPUT_AUDIO_COMMITTED: &'static str = "input_audio_buffer.committed";
    pub const SPEECH_STARTED: &'static str = "input_audio_buffer.speech_started";
    pub const SPEECH_STOPPED: &'static str = "input_audio_buffer.speech_stopped";
    pub const ITEM_CREATED: &'static str = "conversation.item.created";
    pub const INPUT_AUDIO_TRANSCRIPTION_COMPLETED: &'static str =
        "conversation.item.input_audio_transcription.completed";
    pub const RESPONSE_CREATED: &'static str = "response.created";
    pub const RESPONSE_DONE: &'static str = "response.done";
    pub const RESPONSE_AUDIO_TRANSCRIPT_DELTA: &'static str = "response.audio_transcript.delta";
    pub const RESPONSE_AUDIO_TRANSCRIPT_DONE: &'static str = "response.audio_transcript.done";
    pub const RESPONSE_AUDIO_DELTA: &'static str = "response.audio.delta";
    pub const RESPONSE_FUNCTION_CALL_ARGUMENTS_DONE: &'static str =
        "response.function_call_arguments.done";

    pub const ALL: [Self; 15] = [
        Self::Error,
        Self::Heartbeat,
        Self::SessionCreated,
        Self::SessionUpdated,
        Self::InputAudioCommitted,
        Self::SpeechStarted,
        Self::SpeechStopped,
        Self::ItemCreated,
        Self::InputAudioTranscriptionCompleted,
        Self::ResponseCreated,
        Self::ResponseDone,
        Self::ResponseAudioTranscriptDelta,
        Self::ResponseAudioTranscriptDone,
        Self::ResponseAudioDelta,
        Self::ResponseFunctionCallArgumentsDone,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => Self::ERROR,
            Self::Heartbeat => Self::HEARTBEAT,
            Self::SessionCreated => Self::SESSION_CREATED,
            Self::SessionUpdated => Self::SESSION_UPDATED,
            Self::InputAudioCommitted => Self::INPUT_AUDIO_COMMITTED,
            Self::SpeechStarted => Self::SPEECH_STARTED,
            Self::SpeechStopped => Self::SPEECH_STOPPED,
            Self::ItemCreated => Self::ITEM_CREATED,
            Self::InputAudioTranscriptionCompleted => Self::INPUT_AUDIO_TRANSCRIPTION_COMPLETED,
            Self::ResponseCreated => Self::RESPONSE_CREATED,
            Self::ResponseDone => Self::RESPONSE_DONE,
            Self::ResponseAudioTranscriptDelta => Self::RESPONSE_AUDIO_TRANSCRIPT_DELTA,
            Self::ResponseAudioTranscriptDone => Self::RESPONSE_AUDIO_TRANSCRIPT_DONE,
            Self::ResponseAudioDelta => Self::RESPONSE_AUDIO_DELTA,
            Self::ResponseFunctionCallArgumentsDone => Self::RESPONSE_FUNCTION_CALL_ARGUMENTS_DONE,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for ServerEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
