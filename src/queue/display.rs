//! Bounded, de-duplicating display queue
//!
//! Enriched runner records wait here until the display client marks them
//! shown. The "current" record is always the head; a poll returns it
//! without consuming, and an explicit mark-displayed pops it. One bib
//! appears at most once in the queue at a time, and exceeding capacity
//! evicts the oldest record.
//!
//! All operations take the single internal mutex for their full duration,
//! so producer (session handlers) and consumers (poll/status endpoints)
//! never observe a half-applied mutation. Nothing awaits while holding the
//! lock and hold times are bounded by the queue capacity.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::Serialize;

use crate::directory::DisplayRecord;

/// Default maximum number of queued runners
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 200;

/// What happened to an enqueued record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Queue was empty: the record became head and current at once, so the
    /// first runner after a lull shows without waiting for a poll cycle
    ImmediateDisplay,
    /// Appended to the tail
    Queued,
    /// A record with this bib is already queued; the new one was dropped
    Duplicate,
}

/// Per-entry summary in a status snapshot
#[derive(Debug, Clone, Serialize)]
pub struct QueueEntrySummary {
    pub name: String,
    pub bib: String,
    pub timestamp: String,
}

/// Read-only diagnostic snapshot of the queue
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub size: usize,
    pub capacity: usize,
    pub current: Option<DisplayRecord>,
    pub contents: Vec<QueueEntrySummary>,
}

/// FIFO queue of runners awaiting display
pub struct DisplayQueue {
    inner: Mutex<VecDeque<DisplayRecord>>,
    capacity: usize,
}

impl DisplayQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_QUEUE_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<DisplayRecord>> {
        // A poisoned queue lock means a panic mid-mutation elsewhere; the
        // data is plain records, so continue with whatever is there.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Enqueue a record, de-duplicating by bib and evicting on overflow
    pub fn enqueue_or_promote(&self, record: DisplayRecord) -> EnqueueOutcome {
        let mut queue = self.lock();

        if queue.iter().any(|queued| queued.bib == record.bib) {
            tracing::debug!(bib = %record.bib, name = %record.name, "Runner already queued, dropping");
            return EnqueueOutcome::Duplicate;
        }

        let outcome = if queue.is_empty() {
            tracing::info!(bib = %record.bib, name = %record.name, "Immediate display, queue was empty");
            EnqueueOutcome::ImmediateDisplay
        } else {
            tracing::debug!(bib = %record.bib, name = %record.name, queued = queue.len(), "Runner queued");
            EnqueueOutcome::Queued
        };
        queue.push_back(record);

        // Capacity eviction drops the oldest record; current follows the
        // new head automatically since current is defined as the head.
        if queue.len() > self.capacity {
            if let Some(evicted) = queue.pop_front() {
                tracing::warn!(
                    bib = %evicted.bib,
                    name = %evicted.name,
                    capacity = self.capacity,
                    "Queue full, evicted oldest runner"
                );
            }
        }

        outcome
    }

    /// Current record (the head), without consuming it
    pub fn peek_current(&self) -> Option<DisplayRecord> {
        self.lock().front().cloned()
    }

    /// Pop the current record once the display has shown it
    ///
    /// The next record in arrival order becomes current.
    pub fn pop_displayed(&self) -> Option<DisplayRecord> {
        let mut queue = self.lock();
        let displayed = queue.pop_front();
        if let Some(ref record) = displayed {
            tracing::info!(
                bib = %record.bib,
                name = %record.name,
                remaining = queue.len(),
                "Runner displayed and removed from queue"
            );
        }
        displayed
    }

    /// Empty the queue, returning how many records were dropped
    pub fn clear(&self) -> usize {
        let mut queue = self.lock();
        let cleared = queue.len();
        queue.clear();
        tracing::info!(cleared = cleared, "Queue cleared");
        cleared
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Diagnostic snapshot: size, current record, per-entry summary
    pub fn status(&self) -> QueueStatus {
        let queue = self.lock();
        QueueStatus {
            size: queue.len(),
            capacity: self.capacity,
            current: queue.front().cloned(),
            contents: queue
                .iter()
                .map(|record| QueueEntrySummary {
                    name: record.name.clone(),
                    bib: record.bib.clone(),
                    timestamp: record.timestamp.clone(),
                })
                .collect(),
        }
    }
}

impl Default for DisplayQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::ParticipantRecord;
    use crate::protocol::parse_line;
    use crate::protocol::constants::{FIELD_SEPARATOR, FORMAT_ID};

    fn record(bib: &str) -> DisplayRecord {
        let line = format!("CT01_33~1~finish~{}~15:10:02.00~0~0ABC12~1", bib);
        let event = parse_line(&line, FIELD_SEPARATOR, FORMAT_ID).unwrap();
        DisplayRecord::new(
            &event,
            &ParticipantRecord::named("Runner", bib),
            String::new(),
        )
    }

    #[test]
    fn test_dedup_by_bib() {
        let queue = DisplayQueue::new();

        assert_eq!(queue.enqueue_or_promote(record("42")), EnqueueOutcome::ImmediateDisplay);
        assert_eq!(queue.enqueue_or_promote(record("42")), EnqueueOutcome::Duplicate);

        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_immediate_display_fast_path() {
        let queue = DisplayQueue::new();

        let outcome = queue.enqueue_or_promote(record("7"));

        assert_eq!(outcome, EnqueueOutcome::ImmediateDisplay);
        assert_eq!(queue.peek_current().unwrap().bib, "7");
    }

    #[test]
    fn test_fifo_order_after_fast_path() {
        let queue = DisplayQueue::new();
        queue.enqueue_or_promote(record("1"));
        queue.enqueue_or_promote(record("2"));
        queue.enqueue_or_promote(record("3"));

        // Fast path only applies on empty -> 1; no reordering afterwards
        assert_eq!(queue.peek_current().unwrap().bib, "1");
        assert_eq!(queue.pop_displayed().unwrap().bib, "1");
        assert_eq!(queue.pop_displayed().unwrap().bib, "2");
        assert_eq!(queue.pop_displayed().unwrap().bib, "3");
        assert!(queue.pop_displayed().is_none());
    }

    #[test]
    fn test_pop_advances_current() {
        let queue = DisplayQueue::new();
        queue.enqueue_or_promote(record("A"));
        queue.enqueue_or_promote(record("B"));
        queue.enqueue_or_promote(record("C"));

        let displayed = queue.pop_displayed().unwrap();
        assert_eq!(displayed.bib, "A");
        assert_eq!(queue.peek_current().unwrap().bib, "B");
    }

    #[test]
    fn test_peek_does_not_consume() {
        let queue = DisplayQueue::new();
        queue.enqueue_or_promote(record("9"));

        assert_eq!(queue.peek_current().unwrap().bib, "9");
        assert_eq!(queue.peek_current().unwrap().bib, "9");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_eviction_keeps_most_recent() {
        let capacity = 10;
        let queue = DisplayQueue::with_capacity(capacity);

        for i in 0..capacity + 5 {
            queue.enqueue_or_promote(record(&i.to_string()));
        }

        assert_eq!(queue.len(), capacity);
        // Oldest five were evicted; head is now bib "5"
        assert_eq!(queue.peek_current().unwrap().bib, "5");

        let status = queue.status();
        let bibs: Vec<&str> = status.contents.iter().map(|e| e.bib.as_str()).collect();
        let expected: Vec<String> = (5..capacity + 5).map(|i| i.to_string()).collect();
        assert_eq!(bibs, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_eviction_recomputes_current() {
        // With capacity 1 every enqueue evicts the previous head, and
        // current must always track the surviving record.
        let queue = DisplayQueue::with_capacity(1);

        queue.enqueue_or_promote(record("1"));
        assert_eq!(queue.peek_current().unwrap().bib, "1");

        queue.enqueue_or_promote(record("2"));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek_current().unwrap().bib, "2");
    }

    #[test]
    fn test_clear() {
        let queue = DisplayQueue::new();
        queue.enqueue_or_promote(record("1"));
        queue.enqueue_or_promote(record("2"));

        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert!(queue.peek_current().is_none());
        assert_eq!(queue.clear(), 0);
    }

    #[test]
    fn test_status_snapshot() {
        let queue = DisplayQueue::with_capacity(50);
        queue.enqueue_or_promote(record("11"));
        queue.enqueue_or_promote(record("22"));

        let status = queue.status();
        assert_eq!(status.size, 2);
        assert_eq!(status.capacity, 50);
        assert_eq!(status.current.unwrap().bib, "11");
        assert_eq!(status.contents.len(), 2);
        assert_eq!(status.contents[1].bib, "22");
        assert_eq!(status.contents[1].name, "Runner 22");
    }

    #[test]
    fn test_concurrent_producers_and_consumer() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let queue = Arc::new(DisplayQueue::with_capacity(64));
        let done = Arc::new(AtomicBool::new(false));
        let mut producers = Vec::new();

        for t in 0..4 {
            let queue = Arc::clone(&queue);
            producers.push(std::thread::spawn(move || {
                for i in 0..50 {
                    queue.enqueue_or_promote(record(&format!("{}-{}", t, i)));
                }
            }));
        }

        let consumer = {
            let queue = Arc::clone(&queue);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                let mut popped = 0usize;
                loop {
                    if queue.pop_displayed().is_some() {
                        popped += 1;
                    } else if done.load(Ordering::Acquire) {
                        return popped;
                    } else {
                        std::thread::yield_now();
                    }
                }
            })
        };

        for producer in producers {
            producer.join().unwrap();
        }
        done.store(true, Ordering::Release);

        let popped = consumer.join().unwrap();

        // Every record was either popped or evicted; capacity never exceeded
        assert!(popped <= 200);
        assert!(queue.is_empty());
    }
}
