//! Timing appliance session handler
//!
//! One session per accepted TCP connection, driven through a small state
//! machine:
//!
//! ```text
//! Greeting ──► Negotiating ──► Streaming ──► Closed
//!   consume      announce +       read loop:   EOF / "stop" /
//!   one line     settings +       ping, ack,   socket error /
//!                commands         data lines   shutdown
//! ```
//!
//! Negotiation is fire-and-forget: the appliance does not reply to the
//! settings or command lines, it just starts pushing data. Inside the
//! streaming loop every fault is per-line: a garbled line is logged and
//! skipped, only socket-level failures end the session.
//!
//! The transport is generic so tests drive a session over
//! `tokio::io::duplex` without opening sockets.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::protocol::constants::{
    ACK, NEGOTIATION_COMMANDS, NEGOTIATION_SETTINGS, PING, SERVER_NAME, SERVER_VERSION, STOP,
};
use crate::server::config::ServerConfig;
use crate::service::RaceDisplayService;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the appliance's self-identification line
    Greeting,
    /// Sending our identity, settings and feed-start commands
    Negotiating,
    /// Reading the data feed
    Streaming,
    /// Session ended
    Closed,
}

/// Handler for one appliance connection
pub struct TimingSession<S> {
    id: u64,
    peer_addr: SocketAddr,
    reader: BufReader<tokio::io::ReadHalf<S>>,
    writer: tokio::io::WriteHalf<S>,
    config: ServerConfig,
    service: Arc<RaceDisplayService>,
    cancel: CancellationToken,
    phase: SessionPhase,
}

impl<S: AsyncRead + AsyncWrite> TimingSession<S> {
    pub fn new(
        id: u64,
        transport: S,
        peer_addr: SocketAddr,
        config: ServerConfig,
        service: Arc<RaceDisplayService>,
        cancel: CancellationToken,
    ) -> Self {
        let (read_half, write_half) = tokio::io::split(transport);
        Self {
            id,
            peer_addr,
            reader: BufReader::new(read_half),
            writer: write_half,
            config,
            service,
            cancel,
            phase: SessionPhase::Greeting,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Drive the session to completion
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(session_id = self.id, peer = %self.peer_addr, "Appliance connected");

        let cancel = self.cancel.clone();
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(session_id = self.id, "Session cancelled by shutdown");
                Ok(())
            }
            result = self.handshake_and_stream() => result,
        };
        self.phase = SessionPhase::Closed;

        tracing::info!(session_id = self.id, peer = %self.peer_addr, "Appliance disconnected");
        result
    }

    async fn handshake_and_stream(&mut self) -> Result<()> {
        // Greeting: the appliance identifies itself first. Content is not
        // validated, only consumed.
        match self.read_command().await? {
            Some(greeting) => {
                tracing::debug!(session_id = self.id, greeting = %greeting, "Received greeting");
            }
            None => return Ok(()), // closed before saying anything
        }

        self.phase = SessionPhase::Negotiating;
        self.negotiate().await?;

        self.phase = SessionPhase::Streaming;
        self.stream_loop().await
    }

    /// Announce our identity, declared settings and feed commands
    async fn negotiate(&mut self) -> Result<()> {
        let settings_count = NEGOTIATION_SETTINGS.len().to_string();
        self.write_command(&[SERVER_NAME, SERVER_VERSION, &settings_count])
            .await?;

        for setting in NEGOTIATION_SETTINGS {
            self.write_command(&[setting]).await?;
        }
        for command in NEGOTIATION_COMMANDS {
            self.write_command(&[command]).await?;
        }

        tracing::debug!(session_id = self.id, "Negotiation sent, feed started");
        Ok(())
    }

    async fn stream_loop(&mut self) -> Result<()> {
        let ack_prefix = format!("{}{}", ACK, self.config.field_separator);

        loop {
            let line = match self.read_command().await? {
                Some(line) => line,
                None => return Ok(()), // EOF
            };

            if line.is_empty() {
                continue;
            }

            tracing::trace!(session_id = self.id, line = %line, "Line received");

            if line == PING {
                self.write_command(&[ACK, PING]).await?;
                continue;
            }

            if line == STOP {
                tracing::info!(session_id = self.id, "Stop command received");
                return Ok(());
            }

            // Acknowledgements of our negotiation commands are session
            // bookkeeping, consumed without further handling.
            if line.starts_with(&ack_prefix) {
                tracing::debug!(session_id = self.id, ack = %line, "Acknowledgement consumed");
                continue;
            }

            // One bad line must never end the feed; the pipeline itself is
            // infallible (non-events come back as None).
            if let Some(record) = self.service.ingest_line(&line).await {
                tracing::info!(
                    session_id = self.id,
                    bib = %record.bib,
                    name = %record.name,
                    location = %record.location,
                    "Timing event enriched"
                );
            }
        }
    }

    async fn write_command(&mut self, fields: &[&str]) -> Result<()> {
        let mut command = fields.join(&self.config.field_separator);
        tracing::trace!(session_id = self.id, command = %command, "Command sent");
        command.push_str(&self.config.line_terminator);
        self.writer.write_all(command.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn read_command(&mut self) -> Result<Option<String>> {
        read_line_capped(&mut self.reader, self.config.max_line_length).await
    }
}

/// Read one line, decoded lossily and trimmed, bounded in length
///
/// Returns `Ok(None)` on a clean EOF. The cap fails the read (and thus the
/// session) rather than buffering without bound; timing appliances emit
/// short lines, so anything over the limit is not a timing feed.
async fn read_line_capped<R: tokio::io::AsyncBufRead + Unpin>(
    reader: &mut R,
    limit: usize,
) -> Result<Option<String>> {
    let mut buf: Vec<u8> = Vec::new();

    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            // EOF; a partial unterminated line still counts as a line
            if buf.is_empty() {
                return Ok(None);
            }
            break;
        }

        match chunk.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                buf.extend_from_slice(&chunk[..pos]);
                reader.consume(pos + 1);
                break;
            }
            None => {
                buf.extend_from_slice(chunk);
                let consumed = chunk.len();
                reader.consume(consumed);
            }
        }

        if buf.len() > limit {
            return Err(Error::LineTooLong { limit });
        }
    }

    Ok(Some(String::from_utf8_lossy(&buf).trim().to_owned()))
}
