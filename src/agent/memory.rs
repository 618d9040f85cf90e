//! Bounded conversation memory.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default number of remembered rounds.
pub const DEFAULT_MEMORY_CAPACITY: usize = 10;

/// One completed round: the user's request and the answer given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub user_text: String,
    pub assistant_text: String,
}

/// FIFO buffer of the most recent rounds. Never holds more than `capacity` entries.
#[derive(Debug, Clone)]
pub struct BufferMemory {
    capacity: usize,
    entries: VecDeque<MemoryEntry>,
}

impl Default for BufferMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAPACITY)
    }
}

impl BufferMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a round, evicting the oldest ones past capacity.
    pub fn append(&mut self, user_text: impl Into<String>, assistant_text: impl Into<String>) {
        self.entries.push_back(MemoryEntry {
            user_text: user_text.into(),
            assistant_text: assistant_text.into(),
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Entries from oldest to newest.
    pub fn entries(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Render as alternating `User:` / `Assistant:` lines. Empty memory renders as "".
    pub fn as_text(&self) -> String {
        self.entries
            .iter()
            .flat_map(|e| {
                [
                    format!("User: {}", e.user_text),
                    format!("Assistant: {}", e.assistant_text),
                ]
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
