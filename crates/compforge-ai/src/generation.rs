use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::content::{GenerationRequest, GenerationResult, HistoryMessage};
use crate::errors::{GenerationError, Operation};
use crate::normalize::normalize;
use crate::prompt::{build_messages, modify_prompt};
use crate::relay::StreamRelay;
use crate::sink::EventSink;
use crate::stream::StreamEvent;
use crate::upstream::{ChatClient, ChatRequest};

/// Sampling parameters sent with every upstream request.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationOptions {
    /// Upstream model identifier.
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

impl GenerationOptions {
    /// Sets the upstream model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the completion token limit.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Stateless orchestration of component generation.
///
/// Cloning is cheap; clones share the upstream client. Every call owns its
/// own message list and accumulation buffer, so concurrent calls need no
/// coordination.
#[derive(Clone)]
pub struct GenerationService {
    client: Arc<dyn ChatClient>,
    options: GenerationOptions,
}

impl GenerationService {
    /// Creates a service with default options.
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self {
            client,
            options: GenerationOptions::default(),
        }
    }

    /// Replaces the sampling options.
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Single-shot generation for a prepared [`GenerationRequest`].
    pub async fn generate_request(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        self.generate(&request.prompt, &request.history).await
    }

    /// Generates a component in a single upstream call.
    ///
    /// The upstream call is not retried. Unstructured model output is not an
    /// error; see [`normalize`].
    #[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4(), history = history.len()))]
    pub async fn generate(
        &self,
        prompt: &str,
        history: &[HistoryMessage],
    ) -> Result<GenerationResult, GenerationError> {
        let request = self.chat_request(prompt, history, false)?;
        let raw = self.client.complete(request).await.map_err(|err| {
            error!(error = %err, "component generation failed");
            GenerationError::upstream(err)
        })?;
        debug!(chars = raw.len(), "upstream completion received");
        Ok(normalize(&raw))
    }

    /// Generates a component, writing relay events to `sink` as they arrive.
    ///
    /// Failures are reported as a single `Error` event; this never returns an
    /// error. If the sink's consumer disconnects, the upstream stream is
    /// dropped right away, even while waiting on the upstream socket.
    #[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4(), history = history.len()))]
    pub async fn generate_streaming<S>(&self, prompt: &str, history: &[HistoryMessage], sink: &mut S)
    where
        S: EventSink + ?Sized,
    {
        let request = match self.chat_request(prompt, history, true) {
            Ok(request) => request,
            Err(err) => {
                let _ = sink.emit(StreamEvent::Error(err.to_string())).await;
                return;
            }
        };

        let open = tokio::select! {
            _ = sink.closed() => {
                debug!("downstream closed before upstream stream opened");
                return;
            }
            open = self.client.open_stream(request) => open,
        };
        let relay = match open {
            Ok(body) => StreamRelay::new(body),
            Err(err) => StreamRelay::failed(&err),
        };
        pump(relay, sink).await;
    }

    /// Applies `instruction` to `original_code` by generating a full replacement.
    ///
    /// Equivalent to [`Self::generate`] with [`modify_prompt`]; no diffing or
    /// merging happens on this side.
    pub async fn modify(
        &self,
        original_code: &str,
        instruction: &str,
        history: &[HistoryMessage],
    ) -> Result<GenerationResult, GenerationError> {
        validate_instruction(instruction)?;
        self.generate(&modify_prompt(original_code, instruction), history)
            .await
            .map_err(|err| err.during(Operation::Modify))
    }

    /// Streaming variant of [`Self::modify`].
    pub async fn modify_streaming<S>(
        &self,
        original_code: &str,
        instruction: &str,
        history: &[HistoryMessage],
        sink: &mut S,
    ) where
        S: EventSink + ?Sized,
    {
        if let Err(err) = validate_instruction(instruction) {
            let _ = sink.emit(StreamEvent::Error(err.to_string())).await;
            return;
        }
        self.generate_streaming(&modify_prompt(original_code, instruction), history, sink)
            .await;
    }

    fn chat_request(
        &self,
        prompt: &str,
        history: &[HistoryMessage],
        stream: bool,
    ) -> Result<ChatRequest, GenerationError> {
        validate_prompt(prompt)?;
        Ok(ChatRequest {
            model: self.options.model.clone(),
            messages: build_messages(prompt, history),
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
            stream,
        })
    }
}

/// Rejects an empty or whitespace-only prompt.
///
/// Callers that answer over SSE run this before opening the response so the
/// failure can be reported with a proper status code.
pub fn validate_prompt(prompt: &str) -> Result<(), GenerationError> {
    if prompt.trim().is_empty() {
        return Err(GenerationError::validation("prompt must not be empty"));
    }
    Ok(())
}

/// Rejects an empty or whitespace-only modification request.
pub fn validate_instruction(instruction: &str) -> Result<(), GenerationError> {
    if instruction.trim().is_empty() {
        return Err(GenerationError::validation(
            "modification request must not be empty",
        ));
    }
    Ok(())
}

async fn pump<S>(mut relay: StreamRelay, sink: &mut S)
where
    S: EventSink + ?Sized,
{
    let mut deltas = 0_u64;
    loop {
        let next = tokio::select! {
            _ = sink.closed() => {
                info!(deltas, "downstream disconnected; dropping upstream stream");
                return;
            }
            next = relay.next_event() => next,
        };
        let Some(event) = next else {
            return;
        };
        let terminal = event.is_terminal();
        if !terminal {
            deltas = deltas.saturating_add(1);
        }
        if sink.emit(event).await.is_err() {
            info!(deltas, "downstream disconnected; dropping upstream stream");
            return;
        }
        if terminal {
            debug!(deltas, state = ?relay.state(), "stream relay finished");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{GENERIC_FAILURE, UpstreamError};
    use crate::prompt::SYSTEM_PROMPT;
    use crate::upstream::ByteStream;
    use bytes::Bytes;
    use futures::stream;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::{Notify, mpsc};

    enum FakeBehavior {
        Reply(String),
        Fail(UpstreamError),
        Chunks(Vec<Result<&'static str, UpstreamError>>),
        Pending {
            opened: Arc<Notify>,
            dropped: Arc<AtomicBool>,
        },
    }

    struct FakeClient {
        behavior: FakeBehavior,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl FakeClient {
        fn new(behavior: FakeBehavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().expect("lock").clone()
        }
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait::async_trait]
    impl ChatClient for FakeClient {
        async fn complete(&self, request: ChatRequest) -> Result<String, UpstreamError> {
            self.requests.lock().expect("lock").push(request);
            match &self.behavior {
                FakeBehavior::Reply(text) => Ok(text.clone()),
                FakeBehavior::Fail(err) => Err(err.clone()),
                _ => unreachable!("complete not scripted"),
            }
        }

        async fn open_stream(&self, request: ChatRequest) -> Result<ByteStream, UpstreamError> {
            self.requests.lock().expect("lock").push(request);
            match &self.behavior {
                FakeBehavior::Fail(err) => Err(err.clone()),
                FakeBehavior::Chunks(chunks) => {
                    let items: Vec<Result<Bytes, UpstreamError>> = chunks
                        .iter()
                        .cloned()
                        .map(|c| c.map(|s| Bytes::from_static(s.as_bytes())))
                        .collect();
                    Ok(Box::pin(stream::iter(items)))
                }
                FakeBehavior::Pending { opened, dropped } => {
                    let flag = DropFlag(dropped.clone());
                    let body = stream::unfold(flag, |flag| async move {
                        std::future::pending::<()>().await;
                        Some((Ok::<Bytes, UpstreamError>(Bytes::new()), flag))
                    });
                    opened.notify_one();
                    Ok(Box::pin(body))
                }
                FakeBehavior::Reply(_) => unreachable!("open_stream not scripted"),
            }
        }
    }

    #[tokio::test]
    async fn generate_builds_messages_and_normalizes() {
        let client = FakeClient::new(FakeBehavior::Reply(
            r#"{"jsxCode":"<Card/>","cssCode":".card{}"}"#.into(),
        ));
        let service = GenerationService::new(client.clone());
        let history = vec![HistoryMessage::user("hi"), HistoryMessage::assistant("hello")];

        let result = service.generate("a card", &history).await.expect("generate");
        assert_eq!(result, GenerationResult::new("<Card/>", ".card{}"));

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(!request.stream);
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.max_tokens, 2000);
        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(request.messages.len(), 4);
        assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
        assert_eq!(request.messages[3].role, "user");
        assert_eq!(request.messages[3].content, "a card");
    }

    #[tokio::test]
    async fn prepared_request_carries_history_and_options() {
        let client = FakeClient::new(FakeBehavior::Reply("<Hero/>".into()));
        let service = GenerationService::new(client.clone())
            .with_options(GenerationOptions::default().model("claude-3-haiku").max_tokens(512));
        assert_eq!(service.options().model, "claude-3-haiku");

        let request = GenerationRequest::new("a hero").history(vec![HistoryMessage::user("hi")]);
        let result = service.generate_request(&request).await.expect("generate");
        assert_eq!(result, GenerationResult::new("<Hero/>", ""));

        let sent = &client.requests()[0];
        assert_eq!(sent.model, "claude-3-haiku");
        assert_eq!(sent.max_tokens, 512);
        assert_eq!(sent.messages.len(), 3);
        assert_eq!(sent.messages[2].content, "a hero");
    }

    #[test]
    fn validators_reject_blank_input() {
        assert!(validate_prompt("a card").is_ok());
        assert_eq!(
            validate_prompt(" \n").expect_err("blank").to_string(),
            "prompt must not be empty"
        );
        assert!(matches!(
            validate_instruction("\t"),
            Err(GenerationError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn generate_surfaces_generic_upstream_failure() {
        let client = FakeClient::new(FakeBehavior::Fail(UpstreamError::status(500, "secret detail")));
        let err = GenerationService::new(client.clone())
            .generate("a card", &[])
            .await
            .expect_err("should fail");
        assert!(err.is_upstream());
        assert_eq!(err.to_string(), GENERIC_FAILURE);
        assert_eq!(client.requests().len(), 1, "no retries");
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected_before_upstream() {
        let client = FakeClient::new(FakeBehavior::Reply("x".into()));
        let err = GenerationService::new(client.clone())
            .generate("   ", &[])
            .await
            .expect_err("should fail");
        assert!(matches!(err, GenerationError::Validation(_)));
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn modify_delegates_to_generate_with_derived_prompt() {
        let reply = r#"{"jsxCode":"<Button className=\"border\"/>"}"#;
        let original = "export default function Button() { return <button/>; }";
        let instruction = "add a border";

        let modify_client = FakeClient::new(FakeBehavior::Reply(reply.into()));
        let modified = GenerationService::new(modify_client.clone())
            .modify(original, instruction, &[])
            .await
            .expect("modify");

        let generate_client = FakeClient::new(FakeBehavior::Reply(reply.into()));
        let generated = GenerationService::new(generate_client.clone())
            .generate(&modify_prompt(original, instruction), &[])
            .await
            .expect("generate");

        assert_eq!(modified, generated);
        assert_eq!(modify_client.requests(), generate_client.requests());
    }

    #[tokio::test]
    async fn modify_failure_names_the_operation() {
        let client = FakeClient::new(FakeBehavior::Fail(UpstreamError::transport("reset")));
        let err = GenerationService::new(client)
            .modify("<a/>", "make it bold", &[])
            .await
            .expect_err("should fail");
        assert_eq!(err.to_string(), "Failed to modify component");
    }

    #[tokio::test]
    async fn streaming_writes_deltas_then_done() {
        let client = FakeClient::new(FakeBehavior::Chunks(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n\n"),
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"llo\"}}]}\n\n"),
            Ok("data: [DONE]\n\n"),
        ]));
        let service = GenerationService::new(client.clone());
        let mut events: Vec<StreamEvent> = Vec::new();
        service.generate_streaming("greet", &[], &mut events).await;

        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("He".into()),
                StreamEvent::Delta("llo".into()),
                StreamEvent::Done(normalize("Hello")),
            ]
        );
        assert!(client.requests()[0].stream);
    }

    #[tokio::test]
    async fn streaming_open_failure_is_a_single_error_event() {
        let client = FakeClient::new(FakeBehavior::Fail(UpstreamError::status(401, "bad key")));
        let mut events: Vec<StreamEvent> = Vec::new();
        GenerationService::new(client)
            .generate_streaming("greet", &[], &mut events)
            .await;
        assert_eq!(events, vec![StreamEvent::Error(GENERIC_FAILURE.into())]);
    }

    #[tokio::test]
    async fn streaming_transport_error_ends_stream() {
        let client = FakeClient::new(FakeBehavior::Chunks(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n"),
            Err(UpstreamError::transport("eof")),
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"llo\"}}]}\n"),
        ]));
        let mut events: Vec<StreamEvent> = Vec::new();
        GenerationService::new(client)
            .generate_streaming("greet", &[], &mut events)
            .await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("He".into()),
                StreamEvent::Error(GENERIC_FAILURE.into()),
            ]
        );
    }

    #[tokio::test]
    async fn streaming_validation_error_is_reported_in_band() {
        let client = FakeClient::new(FakeBehavior::Chunks(vec![]));
        let mut events: Vec<StreamEvent> = Vec::new();
        GenerationService::new(client.clone())
            .modify_streaming("<a/>", " ", &[], &mut events)
            .await;
        assert_eq!(
            events,
            vec![StreamEvent::Error("modification request must not be empty".into())]
        );
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn downstream_disconnect_drops_idle_upstream() {
        let opened = Arc::new(Notify::new());
        let dropped = Arc::new(AtomicBool::new(false));
        let client = FakeClient::new(FakeBehavior::Pending {
            opened: opened.clone(),
            dropped: dropped.clone(),
        });
        let service = GenerationService::new(client);

        let (mut tx, rx) = mpsc::channel::<StreamEvent>(8);
        let task = tokio::spawn(async move {
            service.generate_streaming("greet", &[], &mut tx).await;
        });
        opened.notified().await;
        drop(rx);

        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .expect("relay task should stop after disconnect")
            .expect("task join");
        assert!(dropped.load(Ordering::SeqCst), "upstream body was not dropped");
    }
}
