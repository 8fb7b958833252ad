//! Progress notifications for the host

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::types::{ProgressStatus, StatusEvent};

/// Receiver of status events, supplied by the host.
///
/// Delivery is fire-and-forget: a sink that cannot deliver an event drops it.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn emit(&self, event: StatusEvent);
}

#[async_trait]
impl ProgressSink for UnboundedSender<StatusEvent> {
    async fn emit(&self, event: StatusEvent) {
        // Receiver gone means nobody is listening any more.
        let _ = self.send(event);
    }
}

/// Sink backed by a plain closure
pub struct FnSink<F>(pub F);

#[async_trait]
impl<F> ProgressSink for FnSink<F>
where
    F: Fn(StatusEvent) + Send + Sync,
{
    async fn emit(&self, event: StatusEvent) {
        (self.0)(event)
    }
}

/// Forwards status events to an optional sink
#[derive(Clone, Default)]
pub struct Progress {
    sink: Option<Arc<dyn ProgressSink>>,
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress")
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl Progress {
    /// Create a notifier, optionally backed by a sink
    pub fn new(sink: Option<Arc<dyn ProgressSink>>) -> Self {
        Self { sink }
    }

    /// A notifier that drops every event
    pub fn silent() -> Self {
        Self::default()
    }

    /// Send one status event to the sink, if there is one
    pub async fn notify(&self, description: impl Into<String>, status: ProgressStatus, done: bool) {
        let description = description.into();
        tracing::debug!(?status, done, "{}", description);

        if let Some(sink) = &self.sink {
            sink.emit(StatusEvent::new(description, status, done)).await;
        }
    }

    /// Report a step that is still running
    pub async fn in_progress(&self, description: impl Into<String>) {
        self.notify(description, ProgressStatus::InProgress, false)
            .await
    }

    /// Report a finished step
    pub async fn done(&self, description: impl Into<String>) {
        self.notify(description, ProgressStatus::Done, true).await
    }

    /// Error events are final from the host's point of view, so `done` is set
    pub async fn error(&self, description: impl Into<String>) {
        self.notify(description, ProgressStatus::Error, true).await
    }
}
