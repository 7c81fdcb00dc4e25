//! Logging setup.
//!
//! `RUST_LOG` overrides the configured level when set.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("failed to parse log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level used when `RUST_LOG` is not set
    pub level: Level,
    pub format: LogFormat,
    /// Extra filter directives, e.g. `tokio_tungstenite=warn`
    pub directives: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            directives: None,
        }
    }
}

impl LoggingConfig {
    fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        let mut spec = format!(
            "rtclient={level},realtime_protocol={level},warn",
            level = self.level
        );
        if let Some(extra) = &self.directives {
            spec.push(',');
            spec.push_str(extra);
        }
        Ok(EnvFilter::try_new(spec)?)
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: LoggingConfig) -> Result<(), LoggingError> {
    let filter = config.env_filter()?;

    match config.format {
        LogFormat::Pretty => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_target(true));
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Compact => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_target(true));
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Json => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_current_span(true));
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}
