//! Request and response types for the Metis API.
//!
//! These types mirror the server's API contract. Field names are camelCase on
//! the wire.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────────────────────────────────────

/// Sender of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    User,
    Assistant,
    System,
}

/// A conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent the message.
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Message text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Attached files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl Message {
    fn new(message_type: MessageType, content: impl Into<String>) -> Self {
        Self {
            message_type,
            content: Some(content.into()),
            attachments: None,
            metadata: None,
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageType::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageType::Assistant, content)
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageType::System, content)
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment kind, e.g. `IMAGE`.
    #[serde(rename = "type")]
    pub attachment_type: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Wrapper (provider passthrough)
// ─────────────────────────────────────────────────────────────────────────────

/// Chat completion request forwarded to a provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatCompletionRequest {
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    /// Set by the client for streaming calls.
    #[serde(default)]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<HashMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl ChatCompletionRequest {
    /// Create a request from messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the output token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Chat completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One completion choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub index: u32,
    pub message: Message,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Body of a message sent to a chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: Message,
}

/// One chunk of a streamed chat session reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    pub id: String,
    #[serde(default)]
    pub content: Option<String>,
    pub done: bool,
}

/// Embedding request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub input: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Embedding response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<Embedding>,
    pub model: String,
    pub usage: Usage,
}

/// A single embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub embedding: Vec<f64>,
    pub index: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage
// ─────────────────────────────────────────────────────────────────────────────

/// Response listing uploaded files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageFiles {
    pub files: Vec<StorageFile>,
}

/// A file held in gateway storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageFile {
    /// Object key in the store.
    pub object_name: String,
    /// Public URL.
    pub url: String,
    /// Size in bytes.
    pub size: u64,
    pub content_type: String,
    #[serde(default)]
    pub name: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Meta
// ─────────────────────────────────────────────────────────────────────────────

/// A model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub accept_image_attachment: bool,
    #[serde(default)]
    pub accept_file_attachment: bool,
}

/// A provider with capability tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderWithTags {
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Available providers and models.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaResponse {
    pub summarizers: Vec<Provider>,
    pub chunkers: Vec<Provider>,
    pub chat_providers: Vec<Provider>,
    pub embedding_providers: Vec<Provider>,
    pub reranker_providers: Vec<Provider>,
    pub generation_providers: Vec<ProviderWithTags>,
}

/// Pricing for chat and image providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResponse {
    pub chat_providers: Vec<ProviderPricing>,
    pub image_providers: Vec<ProviderPricing>,
}

/// Pricing for one provider model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPricing {
    pub name: String,
    pub model: String,
    pub currency: String,
    pub fixed_call_income: f64,
    pub input_token_unit_income: f64,
    pub output_token_unit_income: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Credit
// ─────────────────────────────────────────────────────────────────────────────

/// A user's balance and transaction history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatement {
    pub user_id: String,
    pub balance: f64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// A credit transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub amount: f64,
    /// Balance after the transaction.
    pub balance: f64,
    pub agent: String,
    pub reason: String,
    /// Timestamp (ISO 8601).
    pub timestamp: String,
}

/// Request to credit a user's account (admin only).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCreditRequest {
    pub user_id: String,
    pub amount: f64,
    pub agent: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_format() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "USER", "content": "hi"}));
    }

    #[test]
    fn test_completion_request_is_camel_case() {
        let request = ChatCompletionRequest::new(vec![Message::system("be brief")])
            .with_model("gpt-4o")
            .with_max_tokens(64);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["maxTokens"], 64);
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["stream"], false);
        assert!(json.get("topP").is_none());
    }

    #[test]
    fn test_storage_file_deserializes() {
        let file: StorageFile = serde_json::from_str(
            r#"{"objectName":"o/1","url":"https://cdn/x","size":5,"contentType":"text/plain"}"#,
        )
        .unwrap();
        assert_eq!(file.object_name, "o/1");
        assert!(file.name.is_none());
    }
}
