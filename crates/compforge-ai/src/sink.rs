use tokio::sync::mpsc;

use crate::stream::StreamEvent;

/// Returned by [`EventSink::emit`] once the consumer has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("downstream event sink is closed")]
pub struct SinkClosed;

/// Consumer of relay events, typically the connection to the caller.
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers one event, waiting for capacity if the consumer is slow.
    async fn emit(&mut self, event: StreamEvent) -> Result<(), SinkClosed>;

    /// Resolves once the consumer has disconnected. Never resolves for sinks
    /// that cannot disconnect.
    async fn closed(&self);
}

#[async_trait::async_trait]
impl EventSink for mpsc::Sender<StreamEvent> {
    async fn emit(&mut self, event: StreamEvent) -> Result<(), SinkClosed> {
        self.send(event).await.map_err(|_| SinkClosed)
    }

    async fn closed(&self) {
        mpsc::Sender::closed(self).await;
    }
}

/// Collects events in memory.
#[async_trait::async_trait]
impl EventSink for Vec<StreamEvent> {
    async fn emit(&mut self, event: StreamEvent) -> Result<(), SinkClosed> {
        self.push(event);
        Ok(())
    }

    async fn closed(&self) {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_sink_reports_dropped_receiver() {
        let (mut tx, rx) = mpsc::channel::<StreamEvent>(4);
        tx.emit(StreamEvent::Delta("a".into())).await.expect("open");
        drop(rx);
        tx.closed().await;
        assert_eq!(tx.emit(StreamEvent::Delta("b".into())).await, Err(SinkClosed));
    }
}
