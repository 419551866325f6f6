//! Timing appliance wire protocol
//!
//! The appliance speaks a line-oriented, UTF-8, CRLF-terminated protocol.
//! After a one-line greeting from the appliance, this server announces
//! itself together with a fixed settings list, requests event info and
//! locations, and starts the feed. From then on the appliance pushes data
//! lines interleaved with `ping`/`ack` control lines until `stop` or EOF.

pub mod constants;
pub mod parser;

pub use parser::{parse_line, TimingEvent};
