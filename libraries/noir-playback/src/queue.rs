//! User queue
//!
//! Tracks the user explicitly lined up. Queued tracks always play before
//! anything the selector would pick, even with repeat-one enabled.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Read/consume access to the user queue
///
/// The selector only ever looks at or takes the head.
pub trait PlaybackQueue {
    /// Next queued track without consuming it
    fn peek(&self) -> Option<&Path>;

    /// Consume the next queued track
    fn pop(&mut self) -> Option<PathBuf>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// FIFO queue of track paths
///
/// ```text
/// Currently Playing: Track A
/// ─────────────────────────────
/// Queue (plays next):
///   - Track B   <- add_next
///   - Track C
///   - Track D   <- add_to_end
/// ```
#[derive(Debug, Clone, Default)]
pub struct Queue {
    entries: VecDeque<PathBuf>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a track in front of everything already queued
    pub fn add_next(&mut self, path: PathBuf) {
        self.entries.push_front(path);
    }

    /// Append a track behind everything already queued
    pub fn add_to_end(&mut self, path: PathBuf) {
        self.entries.push_back(path);
    }

    /// Remove track from queue by position
    ///
    /// Returns the removed track if successful
    pub fn remove(&mut self, index: usize) -> Option<PathBuf> {
        self.entries.remove(index)
    }

    /// Clear entire queue
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over queued tracks in play order
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(PathBuf::as_path)
    }
}

impl PlaybackQueue for Queue {
    fn peek(&self) -> Option<&Path> {
        self.entries.front().map(PathBuf::as_path)
    }

    fn pop(&mut self) -> Option<PathBuf> {
        self.entries.pop_front()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
