//! Crate error types

/// Convenience result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for server and session operations
///
/// Per-line faults inside a session are not represented here: they are
/// logged and the line is skipped, so only socket-level and startup
/// failures surface as errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket or filesystem I/O failure
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A line from the appliance exceeded the configured maximum length
    #[error("protocol line exceeded {limit} bytes")]
    LineTooLong { limit: usize },

    /// Message file could not be parsed
    #[error("invalid message file: {0}")]
    InvalidMessageFile(#[from] serde_json::Error),
}
