//! React component generation over an OpenAI-compatible chat-completion API.
//!
//! The upstream client is namespaced under `upstream::*`; everything else is
//! provider-agnostic and works against the [`ChatClient`] trait.
//!
//! # Streaming usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use compforge_ai::prelude::*;
//! use compforge_ai::upstream::{OpenRouterClient, UpstreamConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenRouterClient::new(UpstreamConfig::from_env()?)?;
//! let service = GenerationService::new(Arc::new(client));
//!
//! let (mut tx, mut rx) = tokio::sync::mpsc::channel::<StreamEvent>(64);
//! tokio::spawn(async move {
//!     service
//!         .generate_streaming("A pricing card with three tiers", &[], &mut tx)
//!         .await;
//! });
//!
//! while let Some(event) = rx.recv().await {
//!     print!("{}", event.to_sse_frame());
//! }
//! # Ok(())
//! # }
//! ```

/// Request history and result types.
pub mod content;
/// Public error types.
pub mod errors;
/// Generation service: single-shot, streaming and modify operations.
pub mod generation;
/// Extraction of `{jsxCode, cssCode}` from raw model output.
pub mod normalize;
/// Common imports for typical usage.
pub mod prelude;
/// System prompt and derived prompt construction.
pub mod prompt;
/// Stream relay turning upstream SSE bytes into downstream events.
pub mod relay;
/// Downstream event consumers.
pub mod sink;
/// Downstream stream events and their SSE frame encoding.
pub mod stream;
/// Upstream chat-completion client contract and the OpenRouter implementation.
pub mod upstream;

pub use content::{GenerationRequest, GenerationResult, HistoryMessage, Role};
pub use errors::{GENERIC_FAILURE, GenerationError, Operation, UpstreamError};
pub use generation::{
    GenerationOptions, GenerationService, validate_instruction, validate_prompt,
};
pub use normalize::normalize;
pub use relay::{RelayState, StreamRelay};
pub use sink::{EventSink, SinkClosed};
pub use stream::StreamEvent;
pub use upstream::{ByteStream, ChatClient, ChatMessage, ChatRequest};
