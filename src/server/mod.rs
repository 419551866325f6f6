//! TCP server for the timing appliance feed

pub mod config;
pub mod listener;
pub mod session;

pub use config::ServerConfig;
pub use listener::TimingServer;
pub use session::{SessionPhase, TimingSession};
