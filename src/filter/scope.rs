//! Bounded look-back window.
//!
//! Defers the keep/drop decision for each record until later same-named
//! records have had a chance to classify the read. Entries leave strictly
//! in FIFO order, which is what preserves the input's relative ordering in
//! the output. Window capacity trades memory for recall of distant mates.

use crate::io::bam::Record;
use std::collections::VecDeque;

/// A record waiting for resolution, paired with its name fingerprint.
#[derive(Debug)]
pub struct ScopeEntry {
    /// Fingerprint of the record's read name.
    pub fingerprint: u64,
    /// The record itself, exclusively owned by the window while resident.
    pub record: Record,
}

/// FIFO window of records whose keep/drop decision is deferred.
#[derive(Debug, Default)]
pub struct ScopeWindow {
    entries: VecDeque<ScopeEntry>,
}

impl ScopeWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the back of the window.
    pub fn push(&mut self, fingerprint: u64, record: Record) {
        self.entries.push_back(ScopeEntry {
            fingerprint,
            record,
        });
    }

    /// Remove and return the front entry if the window holds more than
    /// `max_size` entries. Called once per ingested record, bounding the
    /// window at `max_size + 1` entries.
    pub fn pop_front_if_over(&mut self, max_size: usize) -> Option<ScopeEntry> {
        if self.entries.len() > max_size {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Remove and return the front entry unconditionally (end-of-stream
    /// drain).
    pub fn pop_front(&mut self) -> Option<ScopeEntry> {
        self.entries.pop_front()
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
