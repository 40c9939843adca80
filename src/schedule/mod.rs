// src/schedule/mod.rs
//! Structured outage schedule: queues in first-seen order, each with its
//! outage windows in source order.

pub mod format;
pub mod parser;

pub use format::format_announcement;
pub use parser::{extract_date, parse};

use serde::{Deserialize, Serialize};

/// One outage interval, kept as the clock strings found in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

impl TimeWindow {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueWindows {
    pub key: String, // e.g. "3.1"
    pub windows: Vec<TimeWindow>,
}

/// Parse result. Queue keys are unique; `queues` keeps insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub reference_date: Option<String>,
    pub queues: Vec<QueueWindows>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&[TimeWindow]> {
        self.queues
            .iter()
            .find(|q| q.key == key)
            .map(|q| q.windows.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.queues.iter().map(|q| q.key.as_str())
    }

    /// Returns the index of `key`, inserting an empty queue at the end if unseen.
    pub(crate) fn open_queue(&mut self, key: &str) -> usize {
        if let Some(i) = self.queues.iter().position(|q| q.key == key) {
            return i;
        }
        self.queues.push(QueueWindows {
            key: key.to_string(),
            windows: Vec::new(),
        });
        self.queues.len() - 1
    }
}
