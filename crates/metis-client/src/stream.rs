//! Server-sent event streaming.
//!
//! Streams run on their own HTTP client, separate from the shared
//! [`Transport`](crate::transport::Transport) pool. That client keeps no idle
//! connections, so each stream opens a fresh connection and closes it when the
//! [`SseStream`] is dropped, whether it was exhausted, failed, or abandoned
//! early.
//!
//! The body is read line by line. Only `data:` lines carry payloads; a payload
//! of `[DONE]` ends the stream without producing an item.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::endpoint::build_url;
use crate::error::{classify, Error, Result};
use crate::transport::JSON_CONTENT_TYPE;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// How undecodable `data:` payloads are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreamMode {
    /// Skip the line and keep reading.
    #[default]
    Lenient,
    /// Yield [`Error::Parse`] for the line, then keep reading.
    Strict,
}

/// A classified line of an event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// Payload of a `data:` line, trimmed.
    Data(&'a str),
    /// The `[DONE]` sentinel.
    Done,
}

/// Classify one line. Returns `None` for anything that is not a `data:` line.
pub fn parse_line(line: &str) -> Option<SseLine<'_>> {
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();
    if payload == DONE_SENTINEL {
        Some(SseLine::Done)
    } else {
        Some(SseLine::Data(payload))
    }
}

/// Longest event line accepted before the stream is abandoned.
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// Splits an incoming byte stream into lines.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across chunks are reassembled before decoding.
#[derive(Debug)]
pub struct LineBuffer {
    buffer: Vec<u8>,
    /// Bytes already searched for a newline.
    scanned: usize,
    max_line: usize,
    finished: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer that gives up on lines longer than `max_line` bytes.
    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            max_line,
            finished: false,
        }
    }

    /// Append a chunk of the body.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Mark the end of the body. A trailing line without a newline becomes available.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// True once the body has ended.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True when the pending partial line is longer than the limit.
    pub fn is_overlong(&self) -> bool {
        self.scanned > self.max_line
    }

    /// Take the next complete line, without its line terminator.
    pub fn next_line(&mut self) -> Option<String> {
        let newline = self.buffer[self.scanned..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|offset| self.scanned + offset);

        let line: Vec<u8> = match newline {
            Some(end) => {
                let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
                line.pop();
                line
            }
            None if self.finished && !self.buffer.is_empty() => std::mem::take(&mut self.buffer),
            None => {
                self.scanned = self.buffer.len();
                return None;
            }
        };
        self.scanned = 0;

        let mut line = String::from_utf8_lossy(&line).into_owned();
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }
}

type Decoder<T> = fn(&str) -> serde_json::Result<T>;

struct State<S, T> {
    bytes: Pin<Box<S>>,
    lines: LineBuffer,
    decode: Decoder<T>,
    mode: StreamMode,
    done: bool,
}

/// Lazily decoded event stream bound to one response body.
///
/// Pull-based: the body is only read as far as the consumer has asked.
/// Dropping the stream releases the underlying connection.
pub struct SseStream<T> {
    inner: BoxStream<'static, Result<T>>,
}

impl<T: DeserializeOwned + Send + 'static> SseStream<T> {
    /// Decode each payload as JSON of type `T`.
    pub fn json<S, E>(bytes: S, mode: StreamMode) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: fmt::Display,
    {
        Self::from_bytes(
            bytes,
            LineBuffer::new(),
            |data: &str| serde_json::from_str::<T>(data),
            mode,
        )
    }
}

impl SseStream<String> {
    /// Yield each payload as raw text.
    pub fn raw<S, E>(bytes: S) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: fmt::Display,
    {
        Self::from_bytes(
            bytes,
            LineBuffer::new(),
            |data: &str| Ok(data.to_string()),
            StreamMode::Lenient,
        )
    }
}

impl<T: Send + 'static> SseStream<T> {
    fn from_bytes<S, E>(bytes: S, lines: LineBuffer, decode: Decoder<T>, mode: StreamMode) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: fmt::Display,
    {
        let state = State {
            bytes: Box::pin(bytes),
            lines,
            decode,
            mode,
            done: false,
        };

        let inner = stream::unfold(state, |mut state| async move {
            loop {
                if state.done {
                    return None;
                }

                while let Some(line) = state.lines.next_line() {
                    match parse_line(&line) {
                        None => continue,
                        Some(SseLine::Done) => {
                            tracing::debug!("Stream finished with [DONE]");
                            state.done = true;
                            return None;
                        }
                        Some(SseLine::Data(data)) => match (state.decode)(data) {
                            Ok(item) => return Some((Ok(item), state)),
                            Err(e) => match state.mode {
                                StreamMode::Strict => {
                                    return Some((Err(Error::parse(e, data)), state));
                                }
                                StreamMode::Lenient => {
                                    tracing::warn!(
                                        data = %data,
                                        error = %e,
                                        "Skipping undecodable stream event"
                                    );
                                }
                            },
                        },
                    }
                }

                if state.lines.is_overlong() {
                    state.done = true;
                    let err = Error::Parse {
                        message: format!("event line exceeds {} bytes", state.lines.max_line),
                        body: String::new(),
                    };
                    return Some((Err(err), state));
                }

                if state.lines.is_finished() {
                    tracing::debug!("Stream body ended without [DONE]");
                    state.done = true;
                    return None;
                }

                match state.bytes.next().await {
                    Some(Ok(chunk)) => state.lines.extend(&chunk),
                    Some(Err(e)) => {
                        state.done = true;
                        let err = Error::Network {
                            message: format!("stream interrupted: {e}"),
                            source: None,
                        };
                        return Some((Err(err), state));
                    }
                    None => state.lines.finish(),
                }
            }
        });

        Self {
            inner: inner.boxed(),
        }
    }
}

impl<T> Stream for SseStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl<T> fmt::Debug for SseStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SseStream").finish_non_exhaustive()
    }
}

/// Opens streaming requests on a dedicated, unpooled HTTP client.
#[derive(Clone)]
pub struct StreamConsumer {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl StreamConsumer {
    /// Create a consumer for the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .connect_timeout(config.stream_timeout())
            .read_timeout(config.stream_timeout())
            .pool_max_idle_per_host(0)
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| Error::Config(format!("failed to build streaming client: {e}")))?;

        Ok(Self { http, config })
    }

    /// POST `body` to `path` and decode each event as JSON.
    pub async fn stream_json<T>(&self, path: &str, body: impl Into<String>) -> Result<SseStream<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let response = self.open(path, body.into()).await?;
        Ok(SseStream::json(response.bytes_stream(), self.config.stream_mode()))
    }

    /// POST `body` to `path` and yield each event payload as text.
    pub async fn stream_raw(
        &self,
        path: &str,
        body: impl Into<String>,
    ) -> Result<SseStream<String>> {
        let response = self.open(path, body.into()).await?;
        Ok(SseStream::raw(response.bytes_stream()))
    }

    /// Send the request and fail before any event if the exchange is not 2xx.
    async fn open(&self, path: &str, body: String) -> Result<reqwest::Response> {
        let url = build_url::<&str, &str>(&self.config.base_url, path, &[])?;

        tracing::debug!(%url, "Opening event stream");

        let response = self
            .http
            .post(url.clone())
            .bearer_auth(&self.config.api_key)
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .body(body)
            .send()
            .await
            .map_err(Error::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::debug!(%url, status = status.as_u16(), "Event stream rejected");
            return Err(classify(status, &text).unwrap_or_else(|| Error::Api {
                status: status.as_u16(),
                message: "stream rejected".to_string(),
            }));
        }

        Ok(response)
    }
}

impl fmt::Debug for StreamConsumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamConsumer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Chunk {
        id: String,
    }

    fn body(
        chunks: &'static [&'static str],
    ) -> impl Stream<Item = std::result::Result<Bytes, Infallible>> + Send + 'static {
        stream::iter(chunks.iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))))
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("data: {\"a\":1}"), Some(SseLine::Data("{\"a\":1}")));
        assert_eq!(parse_line("data:{\"a\":1}  "), Some(SseLine::Data("{\"a\":1}")));
        assert_eq!(parse_line("data: [DONE]"), Some(SseLine::Done));
        assert_eq!(parse_line("data:[DONE] "), Some(SseLine::Done));
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line(": keep-alive"), None);
        assert_eq!(parse_line("event: message"), None);
        assert_eq!(parse_line(" data: indented"), None);
    }

    #[test]
    fn test_line_buffer_splits_across_chunks() {
        let mut lines = LineBuffer::new();
        lines.extend(b"data: fir");
        assert_eq!(lines.next_line(), None);

        lines.extend(b"st\r\ndata: second\n");
        assert_eq!(lines.next_line().as_deref(), Some("data: first"));
        assert_eq!(lines.next_line().as_deref(), Some("data: second"));
        assert_eq!(lines.next_line(), None);
    }

    #[test]
    fn test_line_buffer_flushes_trailing_line() {
        let mut lines = LineBuffer::new();
        lines.extend(b"data: tail");
        assert_eq!(lines.next_line(), None);

        lines.finish();
        assert_eq!(lines.next_line().as_deref(), Some("data: tail"));
        assert_eq!(lines.next_line(), None);
    }

    #[test]
    fn test_line_buffer_reassembles_utf8() {
        let text = "data: héllo\n".as_bytes();
        let split = text.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut lines = LineBuffer::new();
        lines.extend(&text[..split]);
        lines.extend(&text[split..]);
        assert_eq!(lines.next_line().as_deref(), Some("data: héllo"));
    }

    #[test]
    fn test_line_buffer_resumes_scan_after_partial_line() {
        let mut lines = LineBuffer::new();
        lines.extend(b"data: a");
        assert_eq!(lines.next_line(), None);
        lines.extend(b"bc");
        assert_eq!(lines.next_line(), None);

        lines.extend(b"d\ndata: e\ndata: f");
        assert_eq!(lines.next_line().as_deref(), Some("data: abcd"));
        assert_eq!(lines.next_line().as_deref(), Some("data: e"));
        assert_eq!(lines.next_line(), None);

        lines.extend(b"g\n");
        assert_eq!(lines.next_line().as_deref(), Some("data: fg"));
    }

    #[test]
    fn test_line_buffer_flags_overlong_line() {
        let mut lines = LineBuffer::with_max_line(8);
        lines.extend(b"data: 1234");
        assert_eq!(lines.next_line(), None);
        assert!(lines.is_overlong());

        let mut lines = LineBuffer::with_max_line(8);
        lines.extend(b"data: 1\n");
        assert_eq!(lines.next_line().as_deref(), Some("data: 1"));
        assert!(!lines.is_overlong());
    }

    #[tokio::test]
    async fn test_overlong_line_ends_stream() {
        let stream = SseStream::<String>::from_bytes(
            body(&["data: ok\n", "data: 0123", "456789", "abcdef\n", "data: late\n"]),
            LineBuffer::with_max_line(12),
            |data: &str| Ok(data.to_string()),
            StreamMode::Lenient,
        );
        let items: Vec<_> = stream.collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_deref().unwrap(), "ok");
        assert!(matches!(
            items[1],
            Err(Error::Parse { ref message, .. }) if message.contains("12")
        ));
    }

    #[tokio::test]
    async fn test_stops_at_done() {
        let stream = SseStream::<Chunk>::json(
            body(&["data: {\"id\":\"1\"}\n\ndata: [DONE]\n\ndata: {\"id\":\"2\"}\n\n"]),
            StreamMode::Lenient,
        );
        let items: Vec<_> = stream.collect().await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().id, "1");
    }

    #[tokio::test]
    async fn test_ends_without_done() {
        let stream = SseStream::<Chunk>::json(body(&["data: {\"id\":\"1\"}"]), StreamMode::Lenient);
        let items: Vec<_> = stream.collect().await;

        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_strict_mode_surfaces_bad_lines() {
        let stream = SseStream::<Chunk>::json(
            body(&["data: {\"id\":\"1\"}\n", "data: nope\n", "data: {\"id\":\"2\"}\n"]),
            StreamMode::Strict,
        );
        let items: Vec<_> = stream.collect().await;

        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(Error::Parse { ref body, .. }) if body == "nope"));
        assert!(items[2].is_ok());
    }

    #[tokio::test]
    async fn test_raw_payloads() {
        let stream = SseStream::raw(body(&[
            "id: 7\ndata:  {\"x\":1} \n\ndata: not json\ndata: [DONE]\n",
        ]));
        let items: Vec<String> = stream.map(|item| item.unwrap()).collect().await;

        assert_eq!(items, vec!["{\"x\":1}".to_string(), "not json".to_string()]);
    }

    #[tokio::test]
    async fn test_body_error_ends_stream() {
        let chunks: Vec<std::result::Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"data: {\"id\":\"1\"}\n")),
            Err("connection reset".to_string()),
            Ok(Bytes::from_static(b"data: {\"id\":\"2\"}\n")),
        ];
        let stream = SseStream::<Chunk>::json(stream::iter(chunks), StreamMode::Lenient);
        let items: Vec<_> = stream.collect().await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(
            items[1],
            Err(Error::Network { ref message, .. }) if message.contains("connection reset")
        ));
    }
}
