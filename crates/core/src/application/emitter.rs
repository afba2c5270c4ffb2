// Event Emitter
//
// One observer is one push channel to a single client. Messages are JSON text frames,
// delivered FIFO over an unbounded channel so a slow client never blocks the engine.
// The channel closes when the `Observer` is dropped; `push_final` consumes it, so a
// second terminal event cannot be written.

use super::constants::UNBOUND_OBSERVER;
use crate::domain::JobRecord;
use serde::Serialize;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, error, info};

/// Body of one stream message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StreamPayload {
    /// Full job record
    Snapshot(JobRecord),
    /// Query-time failure, sent as the final event
    Error { error: String },
    /// `{}`: the job is unknown or gone
    Empty(EmptyPayload),
}

/// Serializes as an empty JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmptyPayload {}

impl StreamPayload {
    pub fn empty() -> Self {
        StreamPayload::Empty(EmptyPayload {})
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamPayload::Error {
            error: message.into(),
        }
    }
}

impl From<JobRecord> for StreamPayload {
    fn from(job: JobRecord) -> Self {
        StreamPayload::Snapshot(job)
    }
}

/// Sending half of an observer channel
pub struct Observer {
    label: String,
    tx: mpsc::UnboundedSender<String>,
    disconnect_logged: AtomicBool,
}

impl Observer {
    /// Attach the job id used in log lines
    pub fn bind(&mut self, job_id: &str) {
        self.label = job_id.to_string();
    }

    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Write one message and keep the channel open.
    ///
    /// Returns `false` when nothing was delivered (disconnected client or a
    /// payload that failed to serialize). Never raises.
    pub fn push_update(&self, payload: &StreamPayload) -> bool {
        self.send(payload)
    }

    /// Write the terminal message, then close the channel
    pub fn push_final(self, payload: &StreamPayload) -> bool {
        let delivered = self.send(payload);
        debug!(job_id = %self.label, delivered, "Closing observer stream");
        delivered
    }

    /// Resolves once the receiving side is gone
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    fn send(&self, payload: &StreamPayload) -> bool {
        if self.tx.is_closed() {
            self.note_disconnect();
            return false;
        }

        let frame = match serde_json::to_string(payload) {
            Ok(frame) => frame,
            Err(e) => {
                error!(job_id = %self.label, error = %e, "Failed to serialize stream payload");
                return false;
            }
        };

        if self.tx.send(frame).is_err() {
            self.note_disconnect();
            return false;
        }
        true
    }

    fn note_disconnect(&self) {
        if !self.disconnect_logged.swap(true, Ordering::SeqCst) {
            info!(job_id = %self.label, "Observer disconnected, dropping further events");
        }
    }
}

/// Receiving half, owned by the transport.
///
/// Also a `Stream` of frames, so transports can adapt it without knowing the channel.
pub struct ObserverStream {
    frames: UnboundedReceiverStream<String>,
}

impl ObserverStream {
    /// Next frame, or `None` once the observer closed the channel
    pub async fn recv(&mut self) -> Option<String> {
        self.frames.next().await
    }

    /// Read frames until the channel closes
    pub async fn collect(self) -> Vec<String> {
        StreamExt::collect(self.frames).await
    }
}

impl Stream for ObserverStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        Pin::new(&mut self.frames).poll_next(cx)
    }
}

/// Create a connected observer pair
pub fn observer_channel() -> (Observer, ObserverStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Observer {
            label: UNBOUND_OBSERVER.to_string(),
            tx,
            disconnect_logged: AtomicBool::new(false),
        },
        ObserverStream {
            frames: UnboundedReceiverStream::new(rx),
        },
    )
}
