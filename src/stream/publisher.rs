//! Live stream publisher
//!
//! Fan-out of enriched records to push-stream viewers. Session handlers
//! publish into a broadcast channel; each subscriber drains it with a
//! bounded wait, emitting a keepalive frame whenever a full interval
//! passes without data, so a viewer's connection-liveness detection keeps
//! working through lulls between timing reads.
//!
//! Broadcast semantics: every subscriber sees every event. The deployed
//! system only ever ran one display client, but nothing here depends on
//! that.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;

use crate::directory::DisplayRecord;

/// Default keepalive interval for idle subscribers
pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(1);

/// Channel capacity; a display client lagging this far behind starts
/// skipping old events rather than stalling publishers
const CHANNEL_CAPACITY: usize = 1024;

/// One frame delivered to a stream subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// An enriched timing event
    Event(DisplayRecord),
    /// Heartbeat emitted when no event arrived within the interval
    Keepalive,
}

impl StreamFrame {
    /// JSON body of the frame: the record object, or `{"keepalive": true}`
    pub fn to_json(&self) -> String {
        match self {
            // unwrap: DisplayRecord is all strings, serialization cannot fail
            StreamFrame::Event(record) => serde_json::to_string(record).unwrap(),
            StreamFrame::Keepalive => r#"{"keepalive": true}"#.to_owned(),
        }
    }

    /// Frame rendered as one server-sent event
    pub fn to_sse(&self) -> String {
        format!("data: {}\n\n", self.to_json())
    }
}

/// Publisher half of the live stream
pub struct LiveStream {
    tx: broadcast::Sender<DisplayRecord>,
    keepalive: Duration,
}

impl LiveStream {
    pub fn new() -> Self {
        Self::with_keepalive(DEFAULT_KEEPALIVE)
    }

    pub fn with_keepalive(keepalive: Duration) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx, keepalive }
    }

    /// Publish an event to all current subscribers; never blocks
    pub fn publish(&self, record: DisplayRecord) {
        // send() errs only when there are no subscribers, which is fine:
        // the display queue is the durable-ish path, the stream is push.
        let _ = self.tx.send(record);
    }

    pub fn subscribe(&self) -> LiveSubscriber {
        LiveSubscriber {
            rx: self.tx.subscribe(),
            keepalive: self.keepalive,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LiveStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber half of the live stream
pub struct LiveSubscriber {
    rx: broadcast::Receiver<DisplayRecord>,
    keepalive: Duration,
}

impl LiveSubscriber {
    /// Next frame: an event if one arrives within the keepalive interval,
    /// otherwise a keepalive
    ///
    /// A lagged receiver skips to the oldest retained event. A closed
    /// channel degrades to keepalives so the viewer connection stays
    /// detectably alive while the server side winds down.
    pub async fn next_frame(&mut self) -> StreamFrame {
        loop {
            match timeout(self.keepalive, self.rx.recv()).await {
                Ok(Ok(record)) => return StreamFrame::Event(record),
                Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    tracing::warn!(skipped = skipped, "Stream subscriber lagged, skipping ahead");
                    continue;
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => {
                    tokio::time::sleep(self.keepalive).await;
                    return StreamFrame::Keepalive;
                }
                Err(_elapsed) => return StreamFrame::Keepalive,
            }
        }
    }
}
