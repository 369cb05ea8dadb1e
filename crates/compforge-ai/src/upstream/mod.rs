//! Upstream chat-completion API.
//!
//! [`ChatClient`] is the seam the generation service talks to;
//! [`OpenRouterClient`] is the reqwest implementation for OpenRouter and other
//! OpenAI-compatible endpoints.
mod client;
mod config;
pub(crate) mod transport;

use std::pin::Pin;

pub use client::OpenRouterClient;
pub use config::UpstreamConfig;

use crate::errors::UpstreamError;

/// Raw body of a streaming response, chunked as it arrives on the socket.
///
/// Dropping the stream releases the underlying connection.
pub type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, UpstreamError>> + Send + 'static>>;

/// One chat message on the wire.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`.
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Chat-completion request body.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

/// Contract for upstream chat-completion clients.
#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    /// Issues a non-streaming request and returns the first choice's message content.
    async fn complete(&self, request: ChatRequest) -> Result<String, UpstreamError>;

    /// Issues a streaming request and returns the raw SSE body once the
    /// response status has been checked.
    async fn open_stream(&self, request: ChatRequest) -> Result<ByteStream, UpstreamError>;
}
