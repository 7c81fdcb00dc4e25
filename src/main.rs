//! rtclient entry point.

mod cli;

use std::{process::ExitCode, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use realtime_protocol::realtime::{ServerVad, TurnDetection, WireDialect};
use rtclient::{
    flows::{self, ChatMode, ConversationHandler},
    media::{read_base64, AudioChunker, WavAudio},
    observability::{init_tracing, LoggingConfig},
    transport::websocket::WebSocketTransport,
    ClientConfig, Session,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(LoggingConfig {
        level: cli.log_level,
        format: cli.log_format,
        directives: None,
    }) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig::new(cli.api_key.unwrap_or_default())?
        .with_url(&cli.url)?
        .with_receive_timeout(Duration::from_millis(cli.receive_timeout_ms))
        .with_dialect(WireDialect::from_azure_flag(cli.azure));
    config.validate()?;

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, shutting down");
            ctrl_c.cancel();
        }
    });

    let mut session = Session::new(config.session_config(), &token);
    let mut handler = ConversationHandler::new();

    match cli.command {
        Command::Audio { file } => {
            let audio = read_base64(&file)?;
            let params = flows::session_params(ChatMode::Audio, TurnDetection::ClientVad);
            session.add_producer("audio", move |sender, token| {
                flows::push_to_talk(sender, token, params, audio)
            });
            handler = handler.respond_on_commit().finish_after(1);
        }
        Command::ServerVad { file, threshold } => {
            let audio = WavAudio::open(&file)?;
            info!(
                sample_rate = audio.format.sample_rate,
                channels = audio.format.channels,
                bits = audio.format.bits_per_sample,
                duration_ms = audio.duration().as_millis() as u64,
                "Streaming audio"
            );
            let vad = match threshold {
                Some(threshold) => ServerVad::with_threshold(threshold)?,
                None => ServerVad::default(),
            };
            let params = flows::session_params(ChatMode::Audio, vad.into());
            let chunker = AudioChunker::new(audio);
            session.add_producer("server-vad", move |sender, token| {
                flows::stream_server_vad(sender, token, params, chunker)
            });
        }
        Command::Video { audio, image } => {
            let audio = read_base64(&audio)?;
            let frame = read_base64(&image)?;
            let params = flows::session_params(ChatMode::VideoPassive, TurnDetection::ClientVad);
            session.add_producer("video", move |sender, token| {
                flows::video_call(sender, token, params, audio, frame)
            });
            handler = handler.respond_on_commit().finish_after(1);
        }
        Command::FunctionCall { file } => {
            let audio = read_base64(&file)?;
            let mut params = flows::session_params(ChatMode::Audio, TurnDetection::ClientVad);
            params.tools = Some(vec![flows::phone_call_tool().into_value()?]);
            session.add_producer("function-call", move |sender, token| {
                flows::push_to_talk(sender, token, params, audio)
            });
            handler = handler
                .respond_on_commit()
                .answer_function_calls()
                .finish_after(1);
        }
    }

    info!(url = %config.url, "Connecting");
    let transport = WebSocketTransport::connect(&config.url, &config.api_key)
        .await
        .context("failed to connect to realtime endpoint")?;

    let report = session.run(transport, &mut handler).await?;
    if !handler.transcript().is_empty() {
        info!(transcript = handler.transcript(), "Conversation transcript");
    }
    if handler.errors() > 0 {
        warn!(errors = handler.errors(), "Server reported errors");
    }
    if report.is_failure() {
        anyhow::bail!("session {}", report.reason);
    }
    Ok(())
}
