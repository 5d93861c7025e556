//! Snapshot-based undo/redo.

use crate::document::Document;
use std::collections::VecDeque;
use web_time::{SystemTime, UNIX_EPOCH};

/// Maximum number of undo states to keep.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// An immutable copy of a document captured for history.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub document: Document,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub description: Option<String>,
}

impl Snapshot {
    fn capture(document: Document, description: Option<String>) -> Self {
        Self {
            document,
            timestamp: now_millis(),
            description,
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Linear undo/redo history over whole documents.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Snapshot>,
    present: Snapshot,
    future: VecDeque<Snapshot>,
    max_size: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(Document::new())
    }
}

impl History {
    /// Create a history seeded with `document`.
    pub fn new(document: Document) -> Self {
        Self::with_max_size(document, DEFAULT_MAX_HISTORY)
    }

    /// Create a history that keeps at most `max_size` undo states.
    pub fn with_max_size(document: Document, max_size: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: Snapshot::capture(document, None),
            future: VecDeque::new(),
            max_size,
        }
    }

    /// The current document.
    pub fn present(&self) -> &Document {
        &self.present.document
    }

    pub fn present_snapshot(&self) -> &Snapshot {
        &self.present
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Description of the change an undo would revert.
    pub fn undo_description(&self) -> Option<&str> {
        if self.past.is_empty() {
            return None;
        }
        self.present.description.as_deref()
    }

    /// Description of the change a redo would reapply.
    pub fn redo_description(&self) -> Option<&str> {
        self.future.front().and_then(|s| s.description.as_deref())
    }

    fn trim_past(&mut self) {
        while self.past.len() > self.max_size {
            self.past.pop_front();
        }
    }

    /// Record `document` as the new present.
    ///
    /// Returns false without touching any stack when `document` equals the
    /// current present.
    pub fn commit(&mut self, document: Document, description: Option<&str>) -> bool {
        if document == self.present.document {
            return false;
        }
        let next = Snapshot::capture(document, description.map(str::to_string));
        let previous = std::mem::replace(&mut self.present, next);
        self.past.push_back(previous);
        self.trim_past();
        self.future.clear();
        log::debug!(
            "History commit {:?} (past {}, max {})",
            description,
            self.past.len(),
            self.max_size
        );
        true
    }

    /// Undo the last change.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push_front(current);
        true
    }

    /// Redo the last undone change.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.past.push_back(current);
        self.trim_past();
        true
    }

    /// Drop all history and seed the present with `document`.
    pub fn reset(&mut self, document: Document) {
        self.past.clear();
        self.future.clear();
        self.present = Snapshot::capture(document, None);
    }
}
