//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rtclient::{config::DEFAULT_URL, observability::LogFormat};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "rtclient", version, about = "GLM Realtime API sample client")]
pub struct Cli {
    /// Realtime endpoint
    #[arg(long, global = true, env = "ZHIPU_REALTIME_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// API key sent as a bearer token
    #[arg(long, global = true, env = "ZHIPU_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Bounded wait for each inbound frame, in milliseconds
    #[arg(long, global = true, default_value_t = 1000)]
    pub receive_timeout_ms: u64,

    /// Use the Azure wire dialect (keeps `turn_detection: {"type": "none"}`)
    #[arg(long, global = true)]
    pub azure: bool,

    #[arg(long, global = true, default_value_t = Level::INFO)]
    pub log_level: Level,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a whole WAV clip, commit it and wait for the answer
    Audio {
        /// WAV file to send
        file: PathBuf,
    },

    /// Stream a WAV clip in real time and let server VAD find the turns
    ServerVad {
        file: PathBuf,

        /// Server VAD activation threshold (0.0-1.0)
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Send a WAV clip together with a still image as video frames
    Video {
        audio: PathBuf,
        /// JPEG image shown as each frame
        image: PathBuf,
    },

    /// Like `audio`, with a `phoneCall` tool the model may invoke
    FunctionCall { file: PathBuf },
}
