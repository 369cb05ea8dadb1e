use std::collections::VecDeque;

use futures::StreamExt as _;
use tracing::{debug, error};

use crate::errors::{GENERIC_FAILURE, UpstreamError};
use crate::normalize::normalize;
use crate::stream::StreamEvent;
use crate::upstream::ByteStream;
use crate::upstream::transport::{Frame, LineDecoder, classify_line};

/// Lifecycle of a [`StreamRelay`].
///
/// `Streaming → Completing → Closed` on success, `Streaming → Errored → Closed`
/// on failure. `Completing` and `Errored` last until the terminal event has
/// been handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Streaming,
    Completing,
    Errored,
    Closed,
}

/// Translates an upstream chat-completion SSE body into [`StreamEvent`]s.
///
/// Events are produced lazily, one upstream read at a time; the relay is
/// finite and cannot be restarted. Deltas come out in arrival order and the
/// last event is always a single `Done` or `Error`. Dropping the relay drops
/// the upstream body.
pub struct StreamRelay {
    upstream: Option<ByteStream>,
    decoder: LineDecoder,
    pending: VecDeque<StreamEvent>,
    accumulated: String,
    state: RelayState,
}

impl StreamRelay {
    /// Wraps an upstream body that is already known to be a successful response.
    pub fn new(upstream: ByteStream) -> Self {
        Self {
            upstream: Some(upstream),
            decoder: LineDecoder::default(),
            pending: VecDeque::new(),
            accumulated: String::new(),
            state: RelayState::Streaming,
        }
    }

    /// A relay that has already failed, for upstream calls that never produced a body.
    pub fn failed(err: &UpstreamError) -> Self {
        let mut relay = Self {
            upstream: None,
            decoder: LineDecoder::default(),
            pending: VecDeque::new(),
            accumulated: String::new(),
            state: RelayState::Streaming,
        };
        relay.fail(err);
        relay
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Waits for and returns the next event.
    ///
    /// Returns `None` once the terminal event has been returned.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                if event.is_terminal() {
                    self.state = RelayState::Closed;
                }
                return Some(event);
            }
            if self.state != RelayState::Streaming {
                self.state = RelayState::Closed;
                return None;
            }
            let Some(upstream) = self.upstream.as_mut() else {
                self.complete();
                continue;
            };

            match upstream.next().await {
                Some(Ok(chunk)) => match self.decoder.push_chunk(&chunk) {
                    Ok(lines) => {
                        for line in lines {
                            self.handle_line(&line);
                            if self.state != RelayState::Streaming {
                                break;
                            }
                        }
                    }
                    Err(err) => self.fail(&err),
                },
                Some(Err(err)) => self.fail(&err),
                None => {
                    if let Some(line) = self.decoder.finish() {
                        self.handle_line(&line);
                    }
                    if self.state == RelayState::Streaming {
                        self.complete();
                    }
                }
            }
        }
    }

    /// Converts the relay into a `futures::Stream`.
    pub fn into_stream(self) -> impl futures::Stream<Item = StreamEvent> + Send + 'static {
        futures::stream::unfold(self, |mut relay| async move {
            relay.next_event().await.map(|event| (event, relay))
        })
    }

    fn handle_line(&mut self, line: &str) {
        match classify_line(line) {
            Frame::Delta(text) => {
                self.accumulated.push_str(&text);
                self.pending.push_back(StreamEvent::Delta(text));
            }
            Frame::Done => self.complete(),
            Frame::Failed(message) => self.fail(&UpstreamError::protocol(message)),
            Frame::Skip => {}
        }
    }

    fn complete(&mut self) {
        self.state = RelayState::Completing;
        self.release_upstream();
        let result = normalize(&self.accumulated);
        debug!(
            chars = self.accumulated.len(),
            css = !result.css_code.is_empty(),
            "upstream stream completed"
        );
        self.pending.push_back(StreamEvent::Done(result));
    }

    fn fail(&mut self, err: &UpstreamError) {
        error!(error = %err, "upstream stream failed");
        self.state = RelayState::Errored;
        self.release_upstream();
        self.pending
            .push_back(StreamEvent::Error(GENERIC_FAILURE.to_string()));
    }

    fn release_upstream(&mut self) {
        self.upstream = None;
        self.decoder.clear();
    }
}
