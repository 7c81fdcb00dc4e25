//! Per-event callbacks for the consumer side of a session.

use async_trait::async_trait;
use realtime_protocol::realtime::{
    Decoded, ErrorEvent, FunctionCallArgumentsDoneEvent, HeartbeatEvent, InputAudioCommittedEvent,
    ItemCreatedEvent, ResponseDeltaEvent, ResponseEvent, ServerEvent, SessionEvent,
    SpeechStartedEvent, SpeechStoppedEvent, TranscriptDoneEvent, TranscriptionCompletedEvent,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::producer::EventSender;
use crate::error::SessionResult;

/// Callbacks for inbound server events.
///
/// Every method defaults to a no-op, so implementors only override the events
/// they care about. The `sender` argument lets a handler reply on the same
/// connection, e.g. answering a function call. Returning an error ends the
/// session with [`super::ShutdownReason::Failed`].
#[async_trait]
pub trait EventHandler: Send {
    async fn on_error(&mut self, event: ErrorEvent, _sender: &EventSender) -> SessionResult<()> {
        warn!(
            message = %event.error.message,
            code = ?event.error.code,
            "Server reported an error"
        );
        Ok(())
    }

    async fn on_heartbeat(
        &mut self,
        _event: HeartbeatEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        Ok(())
    }

    async fn on_session_created(
        &mut self,
        _event: SessionEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        Ok(())
    }

    async fn on_session_updated(
        &mut self,
        _event: SessionEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        Ok(())
    }

    async fn on_input_audio_committed(
        &mut self,
        _event: InputAudioCommittedEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        Ok(())
    }

    async fn on_speech_started(
        &mut self,
        _event: SpeechStartedEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        Ok(())
    }

    async fn on_speech_stopped(
        &mut self,
        _event: SpeechStoppedEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        Ok(())
    }

    async fn on_item_created(
        &mut self,
        _event: ItemCreatedEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        Ok(())
    }

    async fn on_input_audio_transcription_completed(
        &mut self,
        _event: TranscriptionCompletedEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        Ok(())
    }

    async fn on_response_created(
        &mut self,
        _event: ResponseEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        Ok(())
    }

    async fn on_response_done(
        &mut self,
        _event: ResponseEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        Ok(())
    }

    async fn on_response_audio_transcript_delta(
        &mut self,
        _event: ResponseDeltaEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        Ok(())
    }

    async fn on_response_audio_transcript_done(
        &mut self,
        _event: TranscriptDoneEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        Ok(())
    }

    async fn on_response_audio_delta(
        &mut self,
        _event: ResponseDeltaEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        Ok(())
    }

    async fn on_response_function_call_arguments_done(
        &mut self,
        _event: FunctionCallArgumentsDoneEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        Ok(())
    }

    /// A JSON frame the decoder could not type. The raw payload is passed
    /// through untouched.
    async fn on_unparsed(&mut self, raw: Value, _sender: &EventSender) -> SessionResult<()> {
        let event_type = raw.get("type").and_then(Value::as_str).unwrap_or("<missing>");
        debug!(event_type, "Unparsed server frame");
        Ok(())
    }
}

/// Handler that ignores every event.
#[async_trait]
impl EventHandler for () {}

/// Route a decoded frame to the matching handler method.
pub async fn dispatch<H>(handler: &mut H, decoded: Decoded, sender: &EventSender) -> SessionResult<()>
where
    H: EventHandler + ?Sized,
{
    let event = match decoded {
        Decoded::Event(event) => event,
        Decoded::Unparsed(raw) => return handler.on_unparsed(raw, sender).await,
    };

    match event {
        ServerEvent::Error(e) => handler.on_error(e, sender).await,
        ServerEvent::Heartbeat(e) => handler.on_heartbeat(e, sender).await,
        ServerEvent::SessionCreated(e) => handler.on_session_created(e, sender).await,
        ServerEvent::SessionUpdated(e) => handler.on_session_updated(e, sender).await,
        ServerEvent::InputAudioCommitted(e) => handler.on_input_audio_committed(e, sender).await,
        ServerEvent::SpeechStarted(e) => handler.on_speech_started(e, sender).await,
        ServerEvent::SpeechStopped(e) => handler.on_speech_stopped(e, sender).await,
        ServerEvent::ItemCreated(e) => handler.on_item_created(e, sender).await,
        ServerEvent::InputAudioTranscriptionCompleted(e) => {
            handler.on_input_audio_transcription_completed(e, sender).await
        }
        ServerEvent::ResponseCreated(e) => handler.on_response_created(e, sender).await,
        ServerEvent::ResponseDone(e) => handler.on_response_done(e, sender).await,
        ServerEvent::ResponseAudioTranscriptDelta(e) => {
            handler.on_response_audio_transcript_delta(e, sender).await
        }
        ServerEvent::ResponseAudioTranscriptDone(e) => {
            handler.on_response_audio_transcript_done(e, sender).await
        }
        ServerEvent::ResponseAudioDelta(e) => handler.on_response_audio_delta(e, sender).await,
        ServerEvent::ResponseFunctionCallArgumentsDone(e) => {
            handler
                .on_response_function_call_arguments_done(e, sender)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use realtime_protocol::realtime::{decode, WireDialect};
    use serde_json::json;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<&'static str>,
        unparsed: Vec<Value>,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn on_heartbeat(
            &mut self,
            _event: HeartbeatEvent,
            _sender: &EventSender,
        ) -> SessionResult<()> {
            self.seen.push("heartbeat");
            Ok(())
        }

        async fn on_response_audio_delta(
            &mut self,
            event: ResponseDeltaEvent,
            _sender: &EventSender,
        ) -> SessionResult<()> {
            assert_eq!(event.delta.as_deref(), Some("UklGRg=="));
            self.seen.push("audio_delta");
            Ok(())
        }

        async fn on_unparsed(&mut self, raw: Value, _sender: &EventSender) -> SessionResult<()> {
            self.unparsed.push(raw);
            Ok(())
        }
    }

    fn sender() -> (EventSender, mpsc::Receiver<super::super::producer::Outbound>) {
        let (tx, rx) = mpsc::channel(4);
        (
            EventSender::new(tx, WireDialect::Default, CancellationToken::new()),
            rx,
        )
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_variant() {
        let (sender, _rx) = sender();
        let mut recorder = Recorder::default();

        dispatch(&mut recorder, decode(json!({"type": "heartbeat"})), &sender)
            .await
            .unwrap();
        dispatch(
            &mut recorder,
            decode(json!({
                "type": "response.audio.delta",
                "response_id": "resp_1",
                "item_id": "item_1",
                "output_index": 0,
                "content_index": 0,
                "delta": "UklGRg=="
            })),
            &sender,
        )
        .await
        .unwrap();
        // Not handled by the recorder, falls through to the default.
        let created = json!({
            "type": "response.created",
            "response": {"id": "resp_1", "status": "in_progress"}
        });
        dispatch(&mut recorder, decode(created), &sender)
            .await
            .unwrap();

        assert_eq!(recorder.seen, ["heartbeat", "audio_delta"]);
        assert!(recorder.unparsed.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_unparsed_keeps_raw_payload() {
        let (sender, _rx) = sender();
        let mut recorder = Recorder::default();
        let raw = json!({"type": "rate_limits.updated", "rate_limits": []});

        dispatch(&mut recorder, decode(raw.clone()), &sender)
            .await
            .unwrap();

        assert_eq!(recorder.unparsed, vec![raw]);
    }

    #[tokio::test]
    async fn test_unit_handler_accepts_everything() {
        let (sender, _rx) = sender();
        let error = json!({"type": "error", "error": {"message": "boom"}});
        dispatch(&mut (), decode(error), &sender).await.unwrap();
    }

    #[tokio::test]
    async fn test_default_unparsed_hook_accepts_untyped_frames() {
        let (sender, _rx) = sender();
        dispatch(&mut (), decode(json!({"type": "rate_limits.updated"})), &sender)
            .await
            .unwrap();
        dispatch(&mut (), decode(json!({"payload": 1})), &sender)
            .await
            .unwrap();
    }
}
