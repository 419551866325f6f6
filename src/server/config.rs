//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::protocol::constants::*;
use crate::queue::DEFAULT_MAX_QUEUE_SIZE;
use crate::stream::DEFAULT_KEEPALIVE;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the timing listener binds to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent appliance connections (0 = unlimited)
    pub max_connections: usize,

    /// Field separator within protocol lines
    pub field_separator: String,

    /// Line terminator for outgoing commands
    pub line_terminator: String,

    /// Format tag expected on data lines
    pub format_id: String,

    /// Maximum accepted line length in bytes
    pub max_line_length: usize,

    /// Enable TCP_NODELAY on accepted sockets
    pub tcp_nodelay: bool,

    /// Display queue capacity
    pub max_queue_size: usize,

    /// Keepalive interval for live stream subscribers
    pub keepalive_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            max_connections: 0, // Unlimited; in practice one appliance connects
            field_separator: FIELD_SEPARATOR.to_owned(),
            line_terminator: LINE_TERMINATOR.to_owned(),
            format_id: FORMAT_ID.to_owned(),
            max_line_length: MAX_LINE_LENGTH,
            tcp_nodelay: true,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            keepalive_interval: DEFAULT_KEEPALIVE,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the field separator
    pub fn field_separator(mut self, separator: impl Into<String>) -> Self {
        self.field_separator = separator.into();
        self
    }

    /// Set the expected format tag
    pub fn format_id(mut self, format_id: impl Into<String>) -> Self {
        self.format_id = format_id.into();
        self
    }

    /// Set the display queue capacity
    pub fn max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    /// Set the stream keepalive interval
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }
}
