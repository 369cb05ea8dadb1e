use futures::TryStreamExt as _;
use tracing::{debug, error};

use crate::errors::UpstreamError;

use super::config::UpstreamConfig;
use super::transport::extract_message_content;
use super::{ByteStream, ChatClient, ChatRequest};

/// reqwest client for OpenRouter's OpenAI-compatible chat-completion API.
pub struct OpenRouterClient {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl OpenRouterClient {
    /// Creates a client from explicit configuration.
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        if config.api_key.trim().is_empty() {
            return Err(UpstreamError::config("upstream api_key must not be empty"));
        }
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| UpstreamError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Creates a client using `OPENROUTER_API_KEY`.
    pub fn from_env() -> Result<Self, UpstreamError> {
        Self::new(UpstreamConfig::from_env()?)
    }

    async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response, UpstreamError> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            stream = request.stream,
            "sending chat completion request"
        );
        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(request)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(format!("chat completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            error!(status = %status, body = %body, "upstream rejected chat completion request");
            return Err(UpstreamError::status(status.as_u16(), body));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl ChatClient for OpenRouterClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, UpstreamError> {
        let response = self.send(&request).await?;
        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::protocol(format!("invalid chat completion JSON: {e}")))?;
        extract_message_content(&value).ok_or_else(|| {
            UpstreamError::protocol("chat completion response has no choices[0].message.content")
        })
    }

    async fn open_stream(&self, request: ChatRequest) -> Result<ByteStream, UpstreamError> {
        let response = self.send(&request).await?;
        let stream = response
            .bytes_stream()
            .map_err(|e| UpstreamError::transport(format!("streaming read failed: {e}")));
        Ok(Box::pin(stream))
    }
}
