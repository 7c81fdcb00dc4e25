//! Ready-made conversations: the session setups, producers and handler used
//! by the `rtclient` binary.
//!
//! Each flow configures the session first, then streams media, and relies on
//! [`ConversationHandler`] to drive the turn from the server's replies.

use std::time::Duration;

use async_trait::async_trait;
use realtime_protocol::realtime::{
    AudioFormat, ClientEvent, ErrorEvent, FunctionCallArgumentsDoneEvent, FunctionTool,
    InputAudioCommittedEvent, Item, Modality, ResponseDeltaEvent, ResponseEvent, SessionEvent,
    SessionUpdateParams, SpeechStartedEvent, SpeechStoppedEvent, TranscriptDoneEvent,
    TranscriptionCompletedEvent, TurnDetection,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::SessionResult,
    media::{now_millis, AudioChunker},
    session::{paced, sequence, EventHandler, EventSender},
};

/// Video frames per second in a video call.
pub const VIDEO_FRAME_INTERVAL: Duration = Duration::from_millis(500);
pub const VIDEO_FRAME_COUNT: usize = 2;

/// Name of the demo tool offered in the function-call flow.
pub const PHONE_CALL_TOOL: &str = "phoneCall";

/// Conversation style requested through the `chat_mode` beta field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    Audio,
    VideoPassive,
}

impl ChatMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::VideoPassive => "video_passive",
        }
    }
}

/// Session settings shared by every flow: WAV in, PCM out, audio and text,
/// end-to-end TTS and no web search.
pub fn session_params(mode: ChatMode, turn_detection: TurnDetection) -> SessionUpdateParams {
    SessionUpdateParams {
        input_audio_format: Some(AudioFormat::Wav),
        output_audio_format: Some(AudioFormat::Pcm),
        tools: Some(Vec::new()),
        ..SessionUpdateParams::default()
    }
    .with_modalities([Modality::Audio, Modality::Text])
    .with_turn_detection(turn_detection)
    .with_beta_field("chat_mode", mode.as_str())
    .with_beta_field("tts_source", "e2e")
    .with_beta_field("auto_search", false)
}

pub fn phone_call_tool() -> FunctionTool {
    FunctionTool::new(
        PHONE_CALL_TOOL,
        "拨打电话给指定的联系人",
        json!({
            "type": "object",
            "properties": {
                "contact_name": {
                    "type": "string",
                    "description": "要拨打的联系人姓名"
                }
            },
            "required": ["contact_name"]
        }),
    )
}

/// Configure the session, append one whole audio clip and commit it.
pub async fn push_to_talk(
    sender: EventSender,
    token: CancellationToken,
    session: SessionUpdateParams,
    audio: String,
) -> SessionResult<()> {
    let events = [
        ClientEvent::session_update(session),
        ClientEvent::audio_append(audio).with_client_timestamp(now_millis()),
        ClientEvent::audio_commit().with_client_timestamp(now_millis()),
    ];
    sequence(sender, events, token).await
}

/// Configure server VAD, then stream the clip in overlapping windows at
/// playback pace. The server decides when turns start and end.
pub async fn stream_server_vad(
    sender: EventSender,
    token: CancellationToken,
    session: SessionUpdateParams,
    chunker: AudioChunker,
) -> SessionResult<()> {
    sequence(sender.clone(), [ClientEvent::session_update(session)], token.clone()).await?;
    let step = chunker.step();
    paced(sender, chunker, step, token).await
}

/// Configure a video session, then send the audio clip while a second flow
/// shows the same still image [`VIDEO_FRAME_COUNT`] times. Commits once both
/// are done.
pub async fn video_call(
    sender: EventSender,
    token: CancellationToken,
    session: SessionUpdateParams,
    audio: String,
    frame: String,
) -> SessionResult<()> {
    sequence(sender.clone(), [ClientEvent::session_update(session)], token.clone()).await?;

    let base = now_millis();
    let audio = sequence(
        sender.clone(),
        [ClientEvent::audio_append(audio).with_client_timestamp(base)],
        token.clone(),
    );
    let frames = (0..VIDEO_FRAME_COUNT).map(move |i| {
        let offset = VIDEO_FRAME_INTERVAL.as_millis() as i64 * i as i64;
        ClientEvent::video_frame_append(frame.clone()).with_client_timestamp(base + offset)
    });
    let video = paced(sender.clone(), frames, VIDEO_FRAME_INTERVAL, token.clone());
    tokio::try_join!(audio, video)?;

    sequence(
        sender,
        [ClientEvent::audio_commit().with_client_timestamp(now_millis())],
        token,
    )
    .await
}

/// Reply for a `phoneCall` invocation.
pub fn phone_call_output(arguments: &str) -> String {
    let contact = serde_json::from_str::<Value>(arguments)
        .ok()
        .and_then(|args| {
            args.get("contact_name")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "未知姓名".to_string());
    json!({
        "status": "success",
        "message": format!("成功拨打电话给 {contact}"),
    })
    .to_string()
}

/// Logs the conversation and drives turn-taking.
///
/// - after a manual commit it asks for a response
/// - it answers `phoneCall` invocations and asks the model to continue
/// - once `finish_after` answers are done it shuts the session down
#[derive(Debug, Default)]
pub struct ConversationHandler {
    respond_on_commit: bool,
    answer_function_calls: bool,
    finish_after: Option<usize>,
    answers: usize,
    transcript: String,
    audio_chunks: usize,
    errors: usize,
}

impl ConversationHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send `response.create` when the server confirms a commit.
    pub fn respond_on_commit(mut self) -> Self {
        self.respond_on_commit = true;
        self
    }

    pub fn answer_function_calls(mut self) -> Self {
        self.answer_function_calls = true;
        self
    }

    /// Request shutdown after this many responses that are not function
    /// calls have completed.
    pub fn finish_after(mut self, answers: usize) -> Self {
        self.finish_after = Some(answers);
        self
    }

    pub fn answers(&self) -> usize {
        self.answers
    }

    /// Assistant transcript accumulated from streaming deltas.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn audio_chunks(&self) -> usize {
        self.audio_chunks
    }

    pub fn errors(&self) -> usize {
        self.errors
    }
}

#[async_trait]
impl EventHandler for ConversationHandler {
    async fn on_error(&mut self, event: ErrorEvent, _sender: &EventSender) -> SessionResult<()> {
        self.errors += 1;
        warn!(
            message = %event.error.message,
            error_type = ?event.error.error_type,
            code = ?event.error.code,
            "Server error"
        );
        Ok(())
    }

    async fn on_session_created(
        &mut self,
        event: SessionEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        info!(session_id = %event.session.id, model = %event.session.model, "Session created");
        Ok(())
    }

    async fn on_session_updated(
        &mut self,
        event: SessionEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        info!(
            session_id = %event.session.id,
            turn_detection = ?event.session.turn_detection.as_ref().map(TurnDetection::kind),
            "Session updated"
        );
        Ok(())
    }

    async fn on_input_audio_committed(
        &mut self,
        event: InputAudioCommittedEvent,
        sender: &EventSender,
    ) -> SessionResult<()> {
        info!(item_id = ?event.item_id, "Input audio committed");
        if self.respond_on_commit {
            sender.send(ClientEvent::response_create()).await?;
        }
        Ok(())
    }

    async fn on_speech_started(
        &mut self,
        event: SpeechStartedEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        info!(audio_start_ms = ?event.audio_start_ms, "Speech started");
        Ok(())
    }

    async fn on_speech_stopped(
        &mut self,
        event: SpeechStoppedEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        info!(audio_end_ms = ?event.audio_end_ms, "Speech stopped");
        Ok(())
    }

    async fn on_input_audio_transcription_completed(
        &mut self,
        event: TranscriptionCompletedEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        info!(transcript = ?event.transcript, "User transcript");
        Ok(())
    }

    async fn on_response_created(
        &mut self,
        event: ResponseEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        debug!(response_id = %event.response.id, "Response created");
        Ok(())
    }

    async fn on_response_audio_transcript_delta(
        &mut self,
        event: ResponseDeltaEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        if let Some(delta) = event.delta {
            self.transcript.push_str(&delta);
        }
        Ok(())
    }

    async fn on_response_audio_transcript_done(
        &mut self,
        event: TranscriptDoneEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        info!(transcript = ?event.transcript, "Assistant transcript");
        Ok(())
    }

    async fn on_response_audio_delta(
        &mut self,
        event: ResponseDeltaEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        self.audio_chunks += 1;
        debug!(
            response_id = ?event.response_id,
            len = event.delta.as_deref().map_or(0, str::len),
            "Audio delta"
        );
        Ok(())
    }

    async fn on_response_function_call_arguments_done(
        &mut self,
        event: FunctionCallArgumentsDoneEvent,
        sender: &EventSender,
    ) -> SessionResult<()> {
        info!(
            name = ?event.name,
            arguments = ?event.arguments,
            "Function call requested"
        );
        if !self.answer_function_calls || event.name.as_deref() != Some(PHONE_CALL_TOOL) {
            return Ok(());
        }

        let Some(call_id) = event.call_id else {
            warn!(name = ?event.name, "Function call without call_id, not answering");
            return Ok(());
        };
        let output = phone_call_output(event.arguments.as_deref().unwrap_or("{}"));
        sender
            .send(ClientEvent::item_create(Item::function_output(call_id, output)))
            .await?;
        sender.send(ClientEvent::response_create()).await
    }

    async fn on_response_done(
        &mut self,
        event: ResponseEvent,
        sender: &EventSender,
    ) -> SessionResult<()> {
        let response = event.response;
        info!(response_id = %response.id, status = ?response.status, "Response done");
        if response
            .output_items()
            .iter()
            .any(|item| item.is_function_call())
        {
            return Ok(());
        }

        self.answers += 1;
        if self.finish_after.is_some_and(|n| self.answers >= n) {
            info!(answers = self.answers, "Conversation complete");
            sender.request_shutdown();
        }
        Ok(())
    }
}
