//! Rotating display messages
//!
//! Each enriched record carries one encouragement string picked at random.
//! Operators can load their own list from a JSON file; a missing or
//! unreadable file falls back to the stock set.

use std::path::Path;
use std::sync::RwLock;

use rand::seq::SliceRandom;

use crate::error::Result;

/// Stock messages used when no custom list is loaded
pub const DEFAULT_MESSAGES: [&str; 5] = [
    "Great job!",
    "Keep it up!",
    "You're doing amazing!",
    "Almost there!",
    "Looking strong!",
];

/// A replaceable list of display messages
pub struct MessageBook {
    messages: RwLock<Vec<String>>,
}

impl MessageBook {
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(DEFAULT_MESSAGES.iter().map(|m| (*m).to_owned()).collect()),
        }
    }

    /// Load messages from a JSON array file, falling back to the defaults
    /// if the file is missing
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Message file missing, using defaults");
            return Ok(Self::new());
        }
        let contents = std::fs::read_to_string(path)?;
        let messages: Vec<String> = serde_json::from_str(&contents)?;

        let book = Self::new();
        book.replace(messages);
        Ok(book)
    }

    /// Replace the message list; an empty list restores the defaults
    pub fn replace(&self, messages: Vec<String>) {
        let messages = if messages.is_empty() {
            DEFAULT_MESSAGES.iter().map(|m| (*m).to_owned()).collect()
        } else {
            messages
        };
        *self.messages.write().unwrap_or_else(|e| e.into_inner()) = messages;
    }

    /// Pick one message uniformly at random
    pub fn pick(&self) -> String {
        let messages = self.messages.read().unwrap_or_else(|e| e.into_inner());
        messages
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }

    pub fn list(&self) -> Vec<String> {
        self.messages
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for MessageBook {
    fn default() -> Self {
        Self::new()
    }
}
