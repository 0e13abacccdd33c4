//! Provider passthrough API.
//!
//! Requests are forwarded to the named provider as-is.

use crate::client::MetisClient;
use crate::error::Result;
use crate::stream::SseStream;
use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, EmbeddingRequest, EmbeddingResponse,
};

/// Provider passthrough API client.
pub struct WrapperApi {
    client: MetisClient,
}

impl WrapperApi {
    pub(crate) fn new(client: MetisClient) -> Self {
        Self { client }
    }

    /// Get a chat completion from a provider.
    pub async fn chat_completions(
        &self,
        provider: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let mut request = request.clone();
        request.stream = false;
        self.client
            .post_json(&format!("api/v1/chat/{}/completions", provider), &request)
            .await
    }

    /// Stream a chat completion from a provider.
    ///
    /// Provider chunk formats differ, so each event is yielded as raw JSON text.
    pub async fn stream_chat_completions(
        &self,
        provider: &str,
        request: &ChatCompletionRequest,
    ) -> Result<SseStream<String>> {
        let mut request = request.clone();
        request.stream = true;
        self.client
            .stream_raw(&format!("api/v1/chat/{}/completions", provider), &request)
            .await
    }

    /// Get embeddings from a provider.
    pub async fn embeddings(
        &self,
        provider: &str,
        request: &EmbeddingRequest,
    ) -> Result<EmbeddingResponse> {
        self.client
            .post_json(&format!("api/v1/wrapper/{}/embeddings", provider), request)
            .await
    }
}
