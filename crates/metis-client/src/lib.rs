//! HTTP client SDK for the Metis conversational AI platform.
//!
//! This crate turns typed calls into authenticated HTTP requests and turns
//! JSON and server-sent-event responses back into typed results.
//!
//! # Example
//!
//! ```no_run
//! use metis_client::{MetisClient, Result};
//! use metis_client::types::{ChatCompletionRequest, Message};
//!
//! # async fn example() -> Result<()> {
//! // Create a client
//! let client = MetisClient::builder()
//!     .api_key("secret")
//!     .build()?;
//!
//! // Upload a file
//! let file = client.storage().upload_file("report.pdf").await?;
//! println!("Uploaded to {}", file.url);
//!
//! // Stream a completion
//! use futures::StreamExt;
//! let request = ChatCompletionRequest::new(vec![Message::user("Tell me a story")]);
//! let mut stream = client.wrapper().stream_chat_completions("openai", &request).await?;
//! while let Some(chunk) = stream.next().await {
//!     println!("{}", chunk?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Layers
//!
//! - [`Transport`]: shared request executor, returns raw bodies or classified errors
//! - [`StreamConsumer`]: dedicated connections for `text/event-stream` responses
//! - [`MultipartForm`]: ordered multipart bodies for uploads
//! - [`MetisClient`]: typed JSON helpers and resource groups built on the above
//!
//! The client never retries; see [`Error::is_retryable`] for building a policy.

pub mod api;
#[cfg(feature = "blocking")]
pub mod blocking;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod media;
pub mod multipart;
pub mod stream;
pub mod transport;
pub mod types;

pub use client::{ClientBuilder, MetisClient};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use multipart::{FileRef, MultipartField, MultipartForm};
pub use stream::{SseStream, StreamConsumer, StreamMode};
pub use transport::{Method, RequestBody, RequestDescriptor, Transport};
