//! Push stream to live display viewers

pub mod publisher;

pub use publisher::{LiveStream, LiveSubscriber, StreamFrame, DEFAULT_KEEPALIVE};
