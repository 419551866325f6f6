//! Race display service
//!
//! One owned struct holding all shared state: the participant directory,
//! the display queue, the live stream, and the message book. The acceptor,
//! its sessions, and any HTTP layer share it by `Arc`, so each test (and
//! each deployment) constructs its own isolated instance instead of
//! leaning on process globals.

use std::sync::Arc;

use crate::directory::{DisplayRecord, ParticipantDirectory};
use crate::protocol::parse_line;
use crate::queue::DisplayQueue;
use crate::server::ServerConfig;
use crate::messages::MessageBook;
use crate::stream::LiveStream;

/// Shared state and per-line pipeline of the display server
pub struct RaceDisplayService {
    directory: ParticipantDirectory,
    queue: DisplayQueue,
    live: LiveStream,
    messages: MessageBook,
    field_separator: String,
    format_id: String,
}

impl RaceDisplayService {
    pub fn new(config: &ServerConfig) -> Arc<Self> {
        Arc::new(Self {
            directory: ParticipantDirectory::new(),
            queue: DisplayQueue::with_capacity(config.max_queue_size),
            live: LiveStream::with_keepalive(config.keepalive_interval),
            messages: MessageBook::new(),
            field_separator: config.field_separator.clone(),
            format_id: config.format_id.clone(),
        })
    }

    pub fn directory(&self) -> &ParticipantDirectory {
        &self.directory
    }

    pub fn queue(&self) -> &DisplayQueue {
        &self.queue
    }

    pub fn live(&self) -> &LiveStream {
        &self.live
    }

    pub fn messages(&self) -> &MessageBook {
        &self.messages
    }

    /// Run one data line through the full pipeline
    ///
    /// Parse, drop gun-time markers, resolve the bib (provisioning in
    /// pre-race mode), attach a rotating message, enqueue for the polling
    /// display and publish to stream subscribers. Returns the enriched
    /// record, or `None` when the line produced nothing to display.
    pub async fn ingest_line(&self, line: &str) -> Option<DisplayRecord> {
        let event = parse_line(line, &self.field_separator, &self.format_id)?;

        if event.is_guntime() {
            tracing::debug!(sequence = %event.sequence, "Skipping gun-time event");
            return None;
        }

        let participant = self.directory.resolve_or_provision(&event.bib).await?;
        let record = DisplayRecord::new(&event, &participant, self.messages.pick());

        self.queue.enqueue_or_promote(record.clone());
        self.live.publish(record.clone());

        Some(record)
    }
}
