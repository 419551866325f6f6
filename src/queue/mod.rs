//! Display queue for enriched runner records

pub mod display;

pub use display::{
    DisplayQueue, EnqueueOutcome, QueueEntrySummary, QueueStatus, DEFAULT_MAX_QUEUE_SIZE,
};
