//! # Undo/Redo Stack
//!
//! Snapshot timeline over a block document.
//!
//! ## Design
//!
//! - Every committed document change is observed and stored as a deep copy
//! - A cursor points at the snapshot matching the live document
//! - Undo/redo move the cursor and hand back a copy of the snapshot
//! - A change observed after an undo discards the redo future
//! - The timeline is a sliding window: past capacity the oldest snapshot
//!   is dropped and the cursor stays put
//!
//! Restorations are themselves document changes. `undo`/`redo` arm a
//! one-shot flag so the following `observe` call does not record the
//! restored document as a new entry.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = UndoStack::new();
//! stack.observe(&doc);              // seed
//! stack.observe(&edited);           // after an edit
//!
//! let restored = stack.undo().unwrap();
//! stack.observe(&restored);         // skipped: restoration
//! ```

use crate::Document;

/// Default number of snapshots kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Undo/redo timeline of whole-document snapshots
#[derive(Debug, Clone)]
pub struct UndoStack {
    /// Snapshots, oldest first
    entries: Vec<Document>,

    /// Snapshot matching the live document (`None` before the first one)
    cursor: Option<usize>,

    /// Maximum number of snapshots kept
    capacity: usize,

    /// Set by undo/redo so the restored document is not re-recorded
    restoring: bool,
}

impl UndoStack {
    /// Create a stack with the default capacity (50)
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a stack keeping at most `capacity` snapshots (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            capacity: capacity.max(1),
            restoring: false,
        }
    }

    /// Record the document produced by a committed change
    ///
    /// Returns false when the change was a restoration and was skipped.
    pub fn observe(&mut self, doc: &Document) -> bool {
        if self.restoring {
            self.restoring = false;
            return false;
        }

        let keep = self.cursor.map_or(0, |cursor| cursor + 1);
        self.entries.truncate(keep);
        self.entries.push(doc.clone());

        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        } else {
            self.cursor = Some(keep);
        }

        tracing::trace!(
            entries = self.entries.len(),
            cursor = ?self.cursor,
            "history snapshot recorded"
        );
        true
    }

    /// Step back one snapshot and return a copy of it
    pub fn undo(&mut self) -> Option<Document> {
        let cursor = self.cursor.filter(|&cursor| cursor > 0)?;
        self.restore(cursor - 1)
    }

    /// Step forward one snapshot and return a copy of it
    pub fn redo(&mut self) -> Option<Document> {
        let next = self.cursor.map_or(0, |cursor| cursor + 1);
        if next >= self.entries.len() {
            return None;
        }
        self.restore(next)
    }

    fn restore(&mut self, index: usize) -> Option<Document> {
        let snapshot = self.entries.get(index)?.clone();
        self.cursor = Some(index);
        self.restoring = true;
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(cursor) if cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |cursor| cursor + 1) < self.entries.len()
    }

    /// Number of undo steps available
    pub fn undo_levels(&self) -> usize {
        self.cursor.unwrap_or(0)
    }

    /// Number of redo steps available
    pub fn redo_levels(&self) -> usize {
        self.entries.len() - self.cursor.map_or(0, |cursor| cursor + 1)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
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

    /// Snapshot under the cursor
    pub fn current(&self) -> Option<&Document> {
        self.cursor.and_then(|cursor| self.entries.get(cursor))
    }

    /// Drop all history
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
        self.restoring = false;
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
