//! Client configuration.
//!
//! A [`ClientConfig`] is resolved once when the client is built and shared
//! read-only by every request and stream issued through that client.
//!
//! Sources, in order of preference:
//! - explicit values via [`ClientBuilder`](crate::ClientBuilder)
//! - a TOML document via [`ClientConfig::from_toml_str`]
//! - environment variables via [`ClientConfig::from_env`]:
//!   - `METIS_API_KEY` (required)
//!   - `METIS_BASE_URL`
//!   - `METIS_TIMEOUT_SECS`

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::stream::StreamMode;

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.metisai.ir";

/// Default connect/read/write timeout for ordinary requests, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 70;

/// Default timeout for streaming connections, in seconds.
pub const DEFAULT_STREAM_TIMEOUT_SECS: u64 = 60;

const API_KEY_ENV: &str = "METIS_API_KEY";
const BASE_URL_ENV: &str = "METIS_BASE_URL";
const TIMEOUT_ENV: &str = "METIS_TIMEOUT_SECS";

/// Authentication and endpoint settings for a client instance.
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Base URL every request path is resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for ordinary requests.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Timeout for streaming connections.
    #[serde(default = "default_stream_timeout_secs")]
    pub stream_timeout_secs: u64,
    /// Custom user agent.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Surface undecodable stream lines as errors instead of skipping them.
    #[serde(default)]
    pub strict_streaming: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_stream_timeout_secs() -> u64 {
    DEFAULT_STREAM_TIMEOUT_SECS
}

impl ClientConfig {
    /// Create a config for the production host with default timeouts.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            stream_timeout_secs: DEFAULT_STREAM_TIMEOUT_SECS,
            user_agent: None,
            strict_streaming: false,
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{API_KEY_ENV} is not set")))?;

        let mut config = Self::new(api_key.trim());

        if let Some(base_url) = lookup(BASE_URL_ENV) {
            config.base_url = base_url;
        }

        if let Some(timeout) = lookup(TIMEOUT_ENV) {
            config.timeout_secs = timeout.trim().parse().map_err(|_| {
                Error::Config(format!("{TIMEOUT_ENV} must be a whole number of seconds"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration and return the parsed base URL.
    pub fn validate(&self) -> Result<Url> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config("api_key must not be empty".to_string()));
        }
        if self.timeout_secs == 0 || self.stream_timeout_secs == 0 {
            return Err(Error::Config("timeouts must be greater than zero".to_string()));
        }

        let url = Url::parse(self.base_url.trim_end_matches('/'))
            .map_err(|e| Error::Config(format!("invalid base_url {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "base_url must use http or https, got {:?}",
                url.scheme()
            )));
        }
        Ok(url)
    }

    /// Timeout for ordinary requests.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Timeout for streaming connections.
    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_secs)
    }

    /// Decoding mode for streamed events.
    pub fn stream_mode(&self) -> StreamMode {
        if self.strict_streaming {
            StreamMode::Strict
        } else {
            StreamMode::Lenient
        }
    }

    /// User agent sent with every request.
    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("metis-client/{}", env!("CARGO_PKG_VERSION")))
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("stream_timeout_secs", &self.stream_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("strict_streaming", &self.strict_streaming)
            .finish()
    }
}
