//! Bounded snapshot history.
//!
//! Every destructive edit commits the new working buffer as a snapshot.
//! Snapshots are [`PixelBuffer`] clones, so they share pixels with the
//! working buffer instead of copying them.
//!
//! There is no redo: committing after an undo drops every snapshot past the
//! cursor. When the stack grows beyond its capacity the oldest snapshot is
//! evicted, so at most `capacity - 1` undos are ever possible.

use crate::buffer::PixelBuffer;
use std::collections::VecDeque;

/// Default number of snapshots kept.
pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<PixelBuffer>,
    /// Index of the snapshot matching the working buffer. `None` when empty.
    cursor: Option<usize>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(capacity + 1),
            cursor: None,
            capacity: capacity.max(1),
        }
    }

    /// Push a snapshot, discarding any entries after the cursor.
    pub fn commit(&mut self, buffer: PixelBuffer) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.snapshots.truncate(keep);
        self.snapshots.push_back(buffer);
        if self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
        self.cursor = Some(self.snapshots.len() - 1);
    }

    /// Step back one snapshot and return it, or `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<PixelBuffer> {
        let cursor = self.cursor.filter(|&c| c > 0)? - 1;
        self.cursor = Some(cursor);
        self.snapshots.get(cursor).cloned()
    }

    /// Drop every snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = None;
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of undo steps currently available.
    pub fn undo_depth(&self) -> usize {
        self.cursor.unwrap_or(0)
    }

    /// Snapshot at the cursor.
    pub fn current(&self) -> Option<&PixelBuffer> {
        self.cursor.and_then(|c| self.snapshots.get(c))
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
