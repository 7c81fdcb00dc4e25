//! Client configuration.

use std::{fmt, time::Duration};

use realtime_protocol::realtime::WireDialect;
use thiserror::Error;
use url::Url;

use crate::session::SessionConfig;

pub const DEFAULT_URL: &str = "wss://open.bigmodel.cn/api/paas/v4/realtime";
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key is missing (set ZHIPU_API_KEY or pass --api-key)")]
    MissingApiKey,

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Endpoint must use ws:// or wss://, got `{0}`")]
    UnsupportedScheme(String),

    #[error("Receive timeout must be greater than zero")]
    ZeroTimeout,

    #[error("Outbound buffer must hold at least one event")]
    ZeroBuffer,
}

/// Everything needed to open and drive one realtime session.
#[derive(Clone)]
pub struct ClientConfig {
    pub url: Url,
    pub api_key: String,
    /// Bounded wait of the inbound loop before it re-checks for shutdown
    pub receive_timeout: Duration,
    pub dialect: WireDialect,
    /// Capacity of the queue between producers and the writer task
    pub outbound_buffer: usize,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            url: Url::parse(DEFAULT_URL)?,
            api_key: api_key.into(),
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            dialect: WireDialect::default(),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        })
    }

    pub fn with_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.url = Url::parse(url)?;
        Ok(self)
    }

    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    pub fn with_dialect(mut self, dialect: WireDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Check the configuration before any connection is attempted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if !matches!(self.url.scheme(), "ws" | "wss") {
            return Err(ConfigError::UnsupportedScheme(self.url.scheme().to_string()));
        }
        if self.receive_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.outbound_buffer == 0 {
            return Err(ConfigError::ZeroBuffer);
        }
        Ok(())
    }

    /// Loop settings derived from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            receive_timeout: self.receive_timeout,
            dialect: self.dialect,
            outbound_buffer: self.outbound_buffer,
            ..SessionConfig::default()
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url.as_str())
            .field("api_key", &"<redacted>")
            .field("receive_timeout", &self.receive_timeout)
            .field("dialect", &self.dialect)
            .field("outbound_buffer", &self.outbound_buffer)
            .finish()
    }
}
