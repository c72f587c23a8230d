//! # Canvas History
//!
//! Bounded undo/redo history over raster snapshots.
//!
//! ```text
//! entries:  [s0] [s1] [s2] [s3]
//!                      ^
//!                   position
//!
//! undo   -> position - 1 (no-op at 0)
//! redo   -> position + 1 (no-op at len - 1)
//! commit -> drop s3, append new entry, select it
//! ```
//!
//! When a commit would exceed the capacity the oldest entry is evicted and
//! the cursor is re-based so the newest entry stays selected.

use std::collections::VecDeque;

use crate::Snapshot;

/// Default number of snapshots retained.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Cursor-addressed sequence of snapshots with a fixed maximum length.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Snapshot>,
    /// Index of the displayed entry. Meaningless while `entries` is empty.
    position: usize,
    capacity: usize,
}

impl History {
    /// Create an empty history with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty history holding at most `capacity` snapshots.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            position: 0,
            capacity,
        }
    }

    /// Append a snapshot, discarding any redo tail and evicting the oldest
    /// entry on overflow.
    pub fn commit(&mut self, snapshot: Snapshot) {
        if !self.entries.is_empty() {
            let discarded = self.entries.len() - (self.position + 1);
            if discarded > 0 {
                tracing::debug!(discarded, "Commit discards redo history");
            }
            self.entries.truncate(self.position + 1);
        }

        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
        self.position = self.entries.len() - 1;
    }

    /// Step back one entry.
    ///
    /// Returns the snapshot now active, or `None` if already at the oldest entry.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.position -= 1;
        self.entries.get(self.position)
    }

    /// Step forward one entry.
    ///
    /// Returns the snapshot now active, or `None` if already at the newest entry.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.position += 1;
        self.entries.get(self.position)
    }

    /// Whether [`undo`](Self::undo) would move the cursor.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.position > 0
    }

    /// Whether [`redo`](Self::redo) would move the cursor.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.position + 1 < self.entries.len()
    }

    /// The displayed snapshot, or `None` before the first commit.
    #[must_use]
    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.position)
    }

    /// Number of retained snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been committed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor index of the displayed snapshot.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Maximum number of snapshots retained.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total pixel bytes held by retained snapshots.
    #[must_use]
    pub fn retained_bytes(&self) -> usize {
        self.entries.iter().map(Snapshot::byte_len).sum()
    }

    /// Iterate retained snapshots from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(shade: u8) -> Snapshot {
        Snapshot::filled(2, 2, [shade, shade, shade, 255])
    }

    #[test]
    fn test_history_creation() {
        let history = History::new();
        assert!(history.is_empty());
        assert_eq!(history.len(), 0);
        assert_eq!(history.capacity(), DEFAULT_HISTORY_CAPACITY);
        assert!(history.current().is_none());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut history = History::with_capacity(0);
        assert_eq!(history.capacity(), 1);
        history.commit(snap(1));
        let newest = snap(2);
        history.commit(newest.clone());
        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), Some(&newest));
    }

    #[test]
    fn test_commit_selects_newest() {
        let mut history = History::new();
        let a = snap(10);
        history.commit(a.clone());
        assert_eq!(history.current(), Some(&a));
        assert_eq!(history.position(), 0);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_undo_noop_on_single_entry() {
        let mut history = History::new();
        history.commit(snap(1));
        assert!(history.undo().is_none());
        assert_eq!(history.position(), 0);
    }

    #[test]
    fn test_undo_then_redo_restores() {
        let mut history = History::new();
        let a = snap(1);
        let b = snap(2);
        history.commit(a.clone());
        history.commit(b.clone());

        assert_eq!(history.undo(), Some(&a));
        assert!(history.can_redo());

        assert_eq!(history.redo(), Some(&b));
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_commit_after_undo_truncates_redo() {
        let mut history = History::new();
        for shade in 0..4 {
            history.commit(snap(shade));
        }
        history.undo();
        history.undo();
        assert_eq!(history.position(), 1);
        assert!(history.can_redo());

        let fresh = snap(99);
        history.commit(fresh.clone());
        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), Some(&fresh));
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut history = History::new();
        let first = snap(0);
        history.commit(first.clone());
        for i in 1..=50_u8 {
            history.commit(snap(i));
        }

        assert_eq!(history.len(), 50);
        assert_eq!(history.position(), 49);
        assert!(history.iter().all(|s| s != &first));
        let newest = history.current().expect("newest entry");
        assert_eq!(&newest.pixels()[..4], &[50, 50, 50, 255]);
    }

    #[test]
    fn test_overflow_after_undo_keeps_newest_selected() {
        let mut history = History::with_capacity(3);
        for shade in 0..3 {
            history.commit(snap(shade));
        }
        history.undo();
        // Truncation frees a slot, so nothing is evicted.
        history.commit(snap(7));
        assert_eq!(history.len(), 3);
        assert_eq!(history.position(), 2);
    }

    #[test]
    fn test_can_undo_redo_track_position() {
        let mut history = History::new();
        for shade in 0..3 {
            history.commit(snap(shade));
        }
        assert!(history.can_undo());
        assert!(!history.can_redo());

        history.undo();
        assert!(history.can_undo());
        assert!(history.can_redo());

        history.undo();
        assert!(!history.can_undo());
        assert!(history.can_redo());
    }

    #[test]
    fn test_retained_bytes() {
        let mut history = History::new();
        history.commit(snap(1));
        history.commit(snap(2));
        assert_eq!(history.retained_bytes(), 32);
    }
}
