//! Race timing feed ingestion and live display server
//!
//! Ingests tag-read "beacon" events from a race-timing appliance over a
//! line-oriented TCP protocol, enriches each event with the runner's
//! roster or results record, and hands the enriched record to a bounded
//! de-duplicating display queue (for polling clients) and a live push
//! stream (for server-sent-event viewers).
//!
//! # Architecture
//!
//! ```text
//!  appliance ──TCP──► TimingServer ──spawn──► TimingSession (per conn)
//!                                                  │ data line
//!                                                  ▼
//!                                      RaceDisplayService::ingest_line
//!                                   parse ► guntime filter ► resolve bib
//!                                                  │ DisplayRecord
//!                                ┌─────────────────┴──────────────────┐
//!                                ▼                                    ▼
//!                          DisplayQueue                          LiveStream
//!                    (poll: current / displayed /            (push: subscribers,
//!                      status / clear endpoints)               1 s keepalive)
//! ```
//!
//! The `RaceDisplayService` owns all shared state (participant directory,
//! queue, stream, message book); everything else borrows it through an
//! `Arc`, so tests and embedders construct isolated instances.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use racedisplay::{DirectoryMode, RaceDisplayService, ServerConfig, TimingServer};
//!
//! #[tokio::main]
//! async fn main() -> racedisplay::Result<()> {
//!     let config = ServerConfig::default();
//!     let service = RaceDisplayService::new(&config);
//!     service.directory().set_mode(DirectoryMode::PreRace);
//!
//!     let server = Arc::new(TimingServer::new(config, Arc::clone(&service)));
//!     server.run().await
//! }
//! ```

pub mod directory;
pub mod error;
pub mod messages;
pub mod protocol;
pub mod queue;
pub mod server;
pub mod service;
pub mod stream;

pub use directory::{
    DirectoryMode, DisplayRecord, ParticipantDirectory, ParticipantRecord, ResultsExtension,
};
pub use error::{Error, Result};
pub use messages::MessageBook;
pub use protocol::{parse_line, TimingEvent};
pub use queue::{DisplayQueue, EnqueueOutcome, QueueStatus};
pub use server::{ServerConfig, SessionPhase, TimingServer, TimingSession};
pub use service::RaceDisplayService;
pub use stream::{LiveStream, LiveSubscriber, StreamFrame};
