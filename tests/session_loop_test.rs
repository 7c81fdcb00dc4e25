//! Integration tests for the session loop.
//!
//! These tests drive a [`Session`] over the in-memory transport and verify:
//! - Paced producers are not blocked by the polling consumer
//! - Cancellation closes the session within one receive cycle
//! - The transport is closed exactly once on every exit path
//! - Frame accounting for typed, unparsed and skipped frames
//! - Handlers can reply on the same connection
//! - Shutdown stays bounded when a producer or the transport never yields

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use realtime_protocol::realtime::{ClientEvent, HeartbeatEvent, TurnDetection};
use rtclient::{
    flows::{self, ChatMode, ConversationHandler},
    session::{paced, sequence},
    transport::{
        memory::{pair, MemoryServer},
        Frame, FrameSink, FrameStream, Transport, TransportResult,
    },
    EventHandler, EventSender, Session, SessionConfig, SessionError, SessionResult, SessionState,
    ShutdownReason,
};
use serde_json::{json, Value};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn config() -> SessionConfig {
    SessionConfig {
        receive_timeout: Duration::from_secs(1),
        ..SessionConfig::default()
    }
}

fn video_frames(count: usize) -> impl Iterator<Item = ClientEvent> + Send {
    (0..count).map(|_| ClientEvent::video_frame_append("/9j/4AAQ"))
}

async fn wait_for(server: &mut MemoryServer, event_type: &str) -> Value {
    loop {
        let frame = server.recv_json().await.expect("client hung up");
        if frame["type"] == event_type {
            return frame;
        }
    }
}

fn failed_with(reason: &ShutdownReason, needle: &str) -> bool {
    matches!(reason, ShutdownReason::Failed(cause) if cause.contains(needle))
}

#[tokio::test(start_paused = true)]
async fn test_paced_producer_runs_alongside_consumer() {
    let (transport, mut server) = pair();
    let token = CancellationToken::new();
    let mut session = Session::new(
        SessionConfig {
            close_when_producers_done: true,
            ..config()
        },
        &token,
    );
    session.add_producer("video", |sender, token| {
        paced(sender, video_frames(2), Duration::from_millis(500), token)
    });

    let started = Instant::now();
    let report = session.run(transport, &mut ()).await.unwrap();

    assert_eq!(report.reason, ShutdownReason::ProducersDone);
    assert!(started.elapsed() <= Duration::from_millis(500 * 2 + 1000));
    assert_eq!(report.frames_sent, 2);

    let sent = server.drain_json();
    assert_eq!(sent.len(), 2);
    assert!(sent
        .iter()
        .all(|frame| frame["type"] == "input_audio_buffer.append_video_frame"));
    assert_eq!(server.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_closes_within_one_receive_cycle() {
    let (transport, server) = pair();
    let token = CancellationToken::new();
    let mut session = Session::new(config(), &token);
    let state = session.state();
    assert_eq!(*state.borrow(), SessionState::Idle);

    // Would keep sending for 100 seconds.
    session.add_producer("video", |sender, token| {
        paced(sender, video_frames(1000), Duration::from_millis(100), token)
    });

    let canceller = token.clone();
    let cancel_at = Duration::from_millis(2300);
    tokio::spawn(async move {
        tokio::time::sleep(cancel_at).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let report = session.run(transport, &mut ()).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.reason, ShutdownReason::Cancelled);
    assert!(elapsed >= cancel_at);
    assert!(elapsed <= cancel_at + Duration::from_secs(1));
    assert!(report.frames_sent >= 20);
    assert_eq!(*state.borrow(), SessionState::Closed);
    assert_eq!(server.close_count(), 1);
}

#[tokio::test]
async fn test_end_of_stream_closes_once() {
    let (transport, mut server) = pair();
    server.send_json(json!({"type": "heartbeat"}));
    server.hang_up();

    let token = CancellationToken::new();
    let mut session = Session::new(config(), &token);
    let report = session.run(transport, &mut ()).await.unwrap();

    assert_eq!(report.reason, ShutdownReason::EndOfStream);
    assert_eq!(report.frames_received, 1);
    assert_eq!(report.events_dispatched, 1);
    assert_eq!(server.close_count(), 1);
    assert!(!token.is_cancelled());
}

#[derive(Default)]
struct Recorder {
    heartbeats: usize,
    unparsed: Vec<Value>,
}

#[async_trait]
impl EventHandler for Recorder {
    async fn on_heartbeat(
        &mut self,
        _event: HeartbeatEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        self.heartbeats += 1;
        Ok(())
    }

    async fn on_unparsed(&mut self, raw: Value, _sender: &EventSender) -> SessionResult<()> {
        self.unparsed.push(raw);
        Ok(())
    }
}

#[tokio::test]
async fn test_frame_accounting() {
    let (transport, mut server) = pair();
    let unknown = json!({"type": "rate_limits.updated", "rate_limits": []});
    // A complete session object whose only fault is the temperature.
    let bad_temperature = json!({
        "type": "session.updated",
        "session": {
            "id": "sess_1",
            "model": "glm-realtime",
            "modalities": ["audio", "text"],
            "instructions": "You are a helpful assistant.",
            "voice": "tongtong",
            "input_audio_format": "wav",
            "output_audio_format": "pcm",
            "turn_detection": {"type": "server_vad", "threshold": 0.5},
            "tool_choice": "auto",
            "temperature": 5.0,
            "beta_fields": {"chat_mode": "audio"}
        }
    });
    server.send_json(json!({"type": "heartbeat", "client_timestamp": 1}));
    server.send_json(unknown.clone());
    server.send_json(bad_temperature.clone());
    server.send(Frame::Text("not json".to_string()));
    server.send(Frame::Binary(vec![0, 1, 2]));
    server.hang_up();

    let token = CancellationToken::new();
    let mut session = Session::new(config(), &token);
    let mut recorder = Recorder::default();
    let report = session.run(transport, &mut recorder).await.unwrap();

    assert_eq!(report.reason, ShutdownReason::EndOfStream);
    assert_eq!(report.frames_received, 5);
    assert_eq!(report.events_dispatched, 1);
    assert_eq!(report.unparsed, 2);
    assert_eq!(report.skipped, 2);

    assert_eq!(recorder.heartbeats, 1);
    assert_eq!(recorder.unparsed, vec![unknown, bad_temperature]);
}

#[tokio::test]
async fn test_receive_error_fails_session() {
    let (transport, server) = pair();
    server.fail("connection reset");

    let token = CancellationToken::new();
    let mut session = Session::new(config(), &token);
    let report = session.run(transport, &mut ()).await.unwrap();

    assert!(report.is_failure());
    assert!(failed_with(&report.reason, "connection reset"));
    assert_eq!(server.close_count(), 1);
}

#[tokio::test]
async fn test_producer_failure_does_not_cancel_caller_token() {
    let (transport, server) = pair();
    let token = CancellationToken::new();
    let mut session = Session::new(config(), &token);
    session.add_producer("broken", |_sender, _token| async {
        Err(SessionError::Producer("camera unplugged".to_string()))
    });

    let report = session.run(transport, &mut ()).await.unwrap();

    assert!(failed_with(&report.reason, "camera unplugged"));
    assert!(session.token().is_cancelled());
    assert!(!token.is_cancelled());
    assert_eq!(server.close_count(), 1);
}

struct FailingHandler;

#[async_trait]
impl EventHandler for FailingHandler {
    async fn on_heartbeat(
        &mut self,
        _event: HeartbeatEvent,
        _sender: &EventSender,
    ) -> SessionResult<()> {
        Err(SessionError::Producer("handler gave up".to_string()))
    }
}

#[tokio::test]
async fn test_handler_error_fails_session() {
    let (transport, server) = pair();
    server.send_json(json!({"type": "heartbeat"}));

    let token = CancellationToken::new();
    let mut session = Session::new(config(), &token);
    let report = session.run(transport, &mut FailingHandler).await.unwrap();

    assert!(failed_with(&report.reason, "handler gave up"));
    assert_eq!(server.close_count(), 1);
}

#[tokio::test]
async fn test_run_twice_is_rejected() {
    let (transport, mut server) = pair();
    server.hang_up();
    let token = CancellationToken::new();
    let mut session = Session::new(config(), &token);
    session.run(transport, &mut ()).await.unwrap();

    let (transport, _server) = pair();
    let err = session.run(transport, &mut ()).await.unwrap_err();
    assert!(matches!(err, SessionError::AlreadyStarted));
}

#[tokio::test]
async fn test_sender_usable_outside_producers() {
    let (transport, mut server) = pair();
    let token = CancellationToken::new();
    let mut session = Session::new(config(), &token);
    let sender = session.sender();

    let script = tokio::spawn(async move {
        let frame = wait_for(&mut server, "response.cancel").await;
        assert_eq!(frame, json!({"type": "response.cancel"}));
        server.hang_up();
        server
    });
    sender.send(ClientEvent::response_cancel()).await.unwrap();

    let report = session.run(transport, &mut ()).await.unwrap();
    let server = script.await.unwrap();
    assert_eq!(report.reason, ShutdownReason::EndOfStream);
    assert_eq!(report.frames_sent, 1);
    assert_eq!(server.close_count(), 1);
}

#[tokio::test]
async fn test_audio_turn_requests_response_after_commit() {
    let (transport, mut server) = pair();
    let token = CancellationToken::new();
    let mut session = Session::new(config(), &token);
    let params = flows::session_params(ChatMode::Audio, TurnDetection::ClientVad);
    session.add_producer("audio", |sender, token| {
        flows::push_to_talk(sender, token, params, "UklGRiQAAABXQVZF".to_string())
    });

    let script = tokio::spawn(async move {
        let update = wait_for(&mut server, "session.update").await;
        let append = wait_for(&mut server, "input_audio_buffer.append").await;
        wait_for(&mut server, "input_audio_buffer.commit").await;
        server.send_json(json!({"type": "input_audio_buffer.committed", "item_id": "item_1"}));

        wait_for(&mut server, "response.create").await;
        server.send_json(json!({
            "type": "response.done",
            "response": {"id": "resp_1", "status": "completed", "output": []}
        }));
        (server, update, append)
    });

    let mut handler = ConversationHandler::new().respond_on_commit().finish_after(1);
    let report = session.run(transport, &mut handler).await.unwrap();
    let (server, update, append) = script.await.unwrap();

    assert_eq!(report.reason, ShutdownReason::Cancelled);
    assert_eq!(handler.answers(), 1);
    assert_eq!(update["session"]["turn_detection"], json!({"type": "client_vad"}));
    assert_eq!(append["audio"], "UklGRiQAAABXQVZF");
    assert!(append["client_timestamp"].is_i64());
    assert_eq!(server.close_count(), 1);
    assert!(!token.is_cancelled());
}

#[tokio::test]
async fn test_function_call_is_answered() {
    let (transport, mut server) = pair();
    let token = CancellationToken::new();
    let mut session = Session::new(config(), &token);
    let mut params = flows::session_params(ChatMode::Audio, TurnDetection::ClientVad);
    params.tools = Some(vec![flows::phone_call_tool().into_value().unwrap()]);
    session.add_producer("function-call", |sender, token| {
        flows::push_to_talk(sender, token, params, "UklGRg==".to_string())
    });

    let arguments = r#"{"contact_name":"张三"}"#;
    let script = tokio::spawn(async move {
        let update = wait_for(&mut server, "session.update").await;
        assert_eq!(update["session"]["tools"][0]["name"], flows::PHONE_CALL_TOOL);

        wait_for(&mut server, "input_audio_buffer.commit").await;
        server.send_json(json!({"type": "input_audio_buffer.committed"}));
        wait_for(&mut server, "response.create").await;

        server.send_json(json!({
            "type": "response.function_call_arguments.done",
            "response_id": "resp_1",
            "item_id": "item_2",
            "output_index": 0,
            "call_id": "call_1",
            "name": "phoneCall",
            "arguments": arguments
        }));
        server.send_json(json!({
            "type": "response.done",
            "response": {
                "id": "resp_1",
                "status": "completed",
                "output": [{
                    "type": "function_call",
                    "id": "item_2",
                    "call_id": "call_1",
                    "name": "phoneCall",
                    "arguments": arguments
                }]
            }
        }));

        let output = wait_for(&mut server, "conversation.item.create").await;
        wait_for(&mut server, "response.create").await;
        server.send_json(json!({
            "type": "response.done",
            "response": {"id": "resp_2", "status": "completed"}
        }));
        (server, output)
    });

    let mut handler = ConversationHandler::new()
        .respond_on_commit()
        .answer_function_calls()
        .finish_after(1);
    let report = session.run(transport, &mut handler).await.unwrap();
    let (server, output) = script.await.unwrap();

    assert_eq!(report.reason, ShutdownReason::Cancelled);
    assert_eq!(handler.answers(), 1);

    let item = &output["item"];
    assert_eq!(item["type"], "function_call_output");
    assert_eq!(item["call_id"], "call_1");
    let result: Value = serde_json::from_str(item["output"].as_str().unwrap()).unwrap();
    assert_eq!(result["status"], "success");
    assert_eq!(result["message"], "成功拨打电话给 张三");
    assert_eq!(server.close_count(), 1);
}

/// A connection whose sends never complete and that never receives.
struct StalledTransport {
    closes: Arc<AtomicUsize>,
}

struct StalledSink {
    closes: Arc<AtomicUsize>,
}

struct SilentStream;

#[async_trait]
impl FrameSink for StalledSink {
    async fn send(&mut self, _frame: Frame) -> TransportResult<()> {
        std::future::pending().await
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl FrameStream for SilentStream {
    async fn next_frame(&mut self) -> Option<TransportResult<Frame>> {
        std::future::pending().await
    }
}

impl Transport for StalledTransport {
    type Sink = StalledSink;
    type Stream = SilentStream;

    fn split(self) -> (Self::Sink, Self::Stream) {
        (StalledSink { closes: self.closes }, SilentStream)
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_with_stalled_transport_is_bounded() {
    let closes = Arc::new(AtomicUsize::new(0));
    let transport = StalledTransport {
        closes: closes.clone(),
    };
    let token = CancellationToken::new();
    let mut session = Session::new(
        SessionConfig {
            outbound_buffer: 2,
            ..config()
        },
        &token,
    );
    // Fills the queue behind the stalled send and then blocks on it.
    session.add_producer("video", |sender, token| {
        sequence(sender, video_frames(100), token)
    });
    let state = session.state();

    let canceller = token.clone();
    let cancel_at = Duration::from_secs(2);
    tokio::spawn(async move {
        tokio::time::sleep(cancel_at).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let report = session.run(transport, &mut ()).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.reason, ShutdownReason::Cancelled);
    assert!(elapsed >= cancel_at);
    assert!(elapsed <= cancel_at + Duration::from_secs(2));
    assert_eq!(report.frames_sent, 0);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(*state.borrow(), SessionState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_producer_ignoring_cancellation_is_aborted() {
    let (transport, server) = pair();
    let token = CancellationToken::new();
    let mut session = Session::new(config(), &token);
    session.add_producer("stubborn", |_sender, _token| async {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    });

    let canceller = token.clone();
    let cancel_at = Duration::from_millis(1500);
    tokio::spawn(async move {
        tokio::time::sleep(cancel_at).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let report = session.run(transport, &mut ()).await.unwrap();
    let elapsed = started.elapsed();

    // One receive cycle of grace, then the producer is aborted.
    assert_eq!(report.reason, ShutdownReason::Cancelled);
    assert!(elapsed >= cancel_at + Duration::from_secs(1));
    assert!(elapsed <= cancel_at + Duration::from_secs(2));
    assert_eq!(server.close_count(), 1);
}

#[tokio::test]
async fn test_function_call_without_call_id_is_not_answered() {
    let (transport, mut server) = pair();
    let token = CancellationToken::new();
    let mut session = Session::new(config(), &token);
    let params = flows::session_params(ChatMode::Audio, TurnDetection::ClientVad);
    session.add_producer("function-call", |sender, token| {
        flows::push_to_talk(sender, token, params, "UklGRg==".to_string())
    });

    let script = tokio::spawn(async move {
        wait_for(&mut server, "input_audio_buffer.commit").await;
        server.send_json(json!({"type": "input_audio_buffer.committed"}));
        wait_for(&mut server, "response.create").await;

        server.send_json(json!({
            "type": "response.function_call_arguments.done",
            "name": "phoneCall",
            "arguments": r#"{"contact_name":"张三"}"#
        }));
        server.send_json(json!({
            "type": "response.done",
            "response": {"id": "resp_1", "status": "completed"}
        }));
        server
    });

    let mut handler = ConversationHandler::new()
        .respond_on_commit()
        .answer_function_calls()
        .finish_after(1);
    let report = session.run(transport, &mut handler).await.unwrap();
    let mut server = script.await.unwrap();

    assert_eq!(report.reason, ShutdownReason::Cancelled);
    assert_eq!(handler.answers(), 1);
    assert!(server
        .drain_json()
        .iter()
        .all(|frame| frame["type"] != "conversation.item.create"));
    assert_eq!(server.close_count(), 1);
}
