//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::{ChatApi, CreditApi, MetaApi, StorageApi, WrapperApi};
use crate::config::{
    ClientConfig, DEFAULT_BASE_URL, DEFAULT_STREAM_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS,
};
use crate::error::{Error, Result};
use crate::multipart::MultipartForm;
use crate::stream::{SseStream, StreamConsumer};
use crate::transport::Transport;

/// Metis API client.
///
/// Cheap to clone; clones share the connection pool and configuration.
///
/// # Example
///
/// ```no_run
/// use metis_client::MetisClient;
///
/// # async fn example() -> metis_client::Result<()> {
/// let client = MetisClient::builder()
///     .api_key("secret")
///     .build()?;
///
/// let meta = client.meta().get().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct MetisClient {
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
#[derive(Debug)]
struct ClientInner {
    config: Arc<ClientConfig>,
    transport: Transport,
    streams: StreamConsumer,
}

impl MetisClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client for the production host.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(ClientConfig::new(api_key))
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_config(ClientConfig::from_env()?)
    }

    /// Create a client from a resolved configuration.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let config = Arc::new(config);
        let transport = Transport::new(Arc::clone(&config))?;
        let streams = StreamConsumer::new(Arc::clone(&config))?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                streams,
            }),
        })
    }

    /// Configuration shared by this client.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The shared request executor.
    pub fn transport(&self) -> &Transport {
        &self.inner.transport
    }

    /// The streaming request consumer.
    pub fn streams(&self) -> &StreamConsumer {
        &self.inner.streams
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the provider passthrough API.
    pub fn wrapper(&self) -> WrapperApi {
        WrapperApi::new(self.clone())
    }

    /// Access the chat session API.
    pub fn chat(&self) -> ChatApi {
        ChatApi::new(self.clone())
    }

    /// Access the storage API.
    pub fn storage(&self) -> StorageApi {
        StorageApi::new(self.clone())
    }

    /// Access the meta API.
    pub fn meta(&self) -> MetaApi {
        MetaApi::new(self.clone())
    }

    /// Access the credit API.
    pub fn credit(&self) -> CreditApi {
        CreditApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Typed HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Make a GET request and decode the response.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let body = self.inner.transport.get(path, query).await?;
        decode(&body)
    }

    /// Make a POST request with a JSON body and decode the response.
    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.inner.transport.post(path, encode(body)?, &[]).await?;
        decode(&body)
    }

    /// Make a PUT request with a JSON body and decode the response.
    pub async fn put_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.inner.transport.put(path, encode(body)?, &[]).await?;
        decode(&body)
    }

    /// Make a PATCH request with a JSON body and decode the response.
    pub async fn patch_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.inner.transport.patch(path, encode(body)?, &[]).await?;
        decode(&body)
    }

    /// Make a DELETE request, discarding the response body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.inner.transport.delete(path, &[]).await?;
        Ok(())
    }

    /// Make a POST request with a JSON body, discarding the response body.
    pub async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.inner.transport.post(path, encode(body)?, &[]).await?;
        Ok(())
    }

    /// Upload a multipart form and decode the response.
    pub async fn post_multipart_json<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
    ) -> Result<T> {
        let body = self.inner.transport.post_multipart(path, form, &[]).await?;
        decode(&body)
    }

    /// Open an event stream and decode each event as `T`.
    pub async fn stream_json<T, B>(&self, path: &str, body: &B) -> Result<SseStream<T>>
    where
        T: DeserializeOwned + Send + 'static,
        B: Serialize + ?Sized,
    {
        self.inner.streams.stream_json(path, encode(body)?).await
    }

    /// Open an event stream and yield each payload as text.
    pub async fn stream_raw<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<SseStream<String>> {
        self.inner.streams.stream_raw(path, encode(body)?).await
    }
}

/// Serialize a request body. Failures never reach the network.
fn encode<B: Serialize + ?Sized>(body: &B) -> Result<String> {
    serde_json::to_string(body).map_err(|e| Error::Encoding(e.to_string()))
}

/// Decode a 2xx response body, reporting a mismatch as [`Error::Parse`].
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::parse(e, body))
}

/// Builder for creating a [`MetisClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    stream_timeout: Duration,
    user_agent: Option<String>,
    strict_streaming: bool,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            stream_timeout: Duration::from_secs(DEFAULT_STREAM_TIMEOUT_SECS),
            user_agent: None,
            strict_streaming: false,
        }
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL for the server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout. Sub-second parts are rounded up.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the streaming connection timeout.
    pub fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Yield parse errors for undecodable stream events instead of skipping them.
    pub fn strict_streaming(mut self, strict: bool) -> Self {
        self.strict_streaming = strict;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<MetisClient> {
        let api_key = self
            .api_key
            .ok_or_else(|| Error::Config("api_key is required".to_string()))?;

        let config = ClientConfig {
            api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            timeout_secs: whole_seconds(self.timeout),
            stream_timeout_secs: whole_seconds(self.stream_timeout),
            user_agent: self.user_agent,
            strict_streaming: self.strict_streaming,
        };

        MetisClient::from_config(config)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn whole_seconds(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamMode;

    #[test]
    fn test_builder_requires_api_key() {
        let result = ClientBuilder::new().build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_defaults() {
        let client = ClientBuilder::new().api_key("key").build().unwrap();

        assert_eq!(client.config().base_url, DEFAULT_BASE_URL);
        assert_eq!(client.config().timeout(), Duration::from_secs(70));
        assert_eq!(client.config().stream_mode(), StreamMode::Lenient);
    }

    #[test]
    fn test_builder_normalizes_trailing_slash() {
        let client = ClientBuilder::new()
            .api_key("key")
            .base_url("http://localhost:8080/")
            .build()
            .unwrap();

        assert_eq!(client.config().base_url, "http://localhost:8080");
    }

    #[test]
    fn test_builder_rejects_invalid_base_url() {
        let result = ClientBuilder::new().api_key("key").base_url("::nope").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_accepts_longest_timeout() {
        let client = ClientBuilder::new()
            .api_key("key")
            .timeout(Duration::MAX)
            .stream_timeout(Duration::MAX)
            .build()
            .unwrap();

        assert_eq!(client.config().timeout_secs, u64::MAX);
        assert_eq!(client.config().stream_timeout_secs, u64::MAX);
    }

    #[test]
    fn test_builder_rounds_timeouts_up() {
        let client = ClientBuilder::new()
            .api_key("key")
            .timeout(Duration::from_millis(1500))
            .stream_timeout(Duration::from_millis(1))
            .strict_streaming(true)
            .build()
            .unwrap();

        assert_eq!(client.config().timeout_secs, 2);
        assert_eq!(client.config().stream_timeout_secs, 1);
        assert_eq!(client.config().stream_mode(), StreamMode::Strict);
    }

    #[test]
    fn test_clones_share_state() {
        let client = MetisClient::new("key").unwrap();
        let clone = client.clone();
        assert!(Arc::ptr_eq(&client.inner, &clone.inner));
    }

    #[test]
    fn test_decode_reports_parse_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Expected {
            #[allow(dead_code)]
            id: String,
        }

        let err = decode::<Expected>(r#"{"name":"x"}"#).unwrap_err();
        match err {
            Error::Parse { body, .. } => assert_eq!(body, r#"{"name":"x"}"#),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
