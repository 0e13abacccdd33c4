//! Chat session API.

use crate::client::MetisClient;
use crate::error::Result;
use crate::stream::SseStream;
use crate::types::{ChatStreamChunk, Message, SendMessageRequest};

/// Chat session API client.
pub struct ChatApi {
    client: MetisClient,
}

impl ChatApi {
    pub(crate) fn new(client: MetisClient) -> Self {
        Self { client }
    }

    /// Send a message to a session and stream the reply.
    ///
    /// Undecodable chunks are skipped, or surfaced as [`Error::Parse`] when
    /// the client was built with strict streaming.
    ///
    /// [`Error::Parse`]: crate::Error::Parse
    pub async fn stream_message(
        &self,
        session_id: &str,
        message: &Message,
    ) -> Result<SseStream<ChatStreamChunk>> {
        let request = SendMessageRequest {
            message: message.clone(),
        };
        self.client
            .stream_json(
                &format!("api/v1/chat/session/{}/message/stream", session_id),
                &request,
            )
            .await
    }
}
