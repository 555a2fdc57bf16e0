//! Undo/redo snapshots of the document.
//!
//! A snapshot is pushed immediately before a gesture's first mutating step,
//! so undo restores the document as it was when the gesture began.

use std::collections::VecDeque;

use crate::Document;

/// Bounded undo/redo stacks of whole-document snapshots.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Document>,
    redo: Vec<Document>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(100)
    }
}

impl History {
    /// Create a history keeping at most `limit` undo steps.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record the pre-mutation state. Clears the redo stack.
    pub fn push_snapshot(&mut self, snapshot: Document) {
        if self.undo.len() == self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(snapshot);
        self.redo.clear();
        tracing::trace!("History snapshot pushed ({} undo steps)", self.undo.len());
    }

    /// Step back: returns the state to restore and files `current` for redo.
    pub fn undo(&mut self, current: Document) -> Option<Document> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Step forward: returns the state to restore and files `current` for undo.
    pub fn redo(&mut self, current: Document) -> Option<Document> {
        let next = self.redo.pop()?;
        self.undo.push_back(current);
        Some(next)
    }

    /// Number of available undo steps.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of available redo steps.
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Whether undo is possible.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether redo is possible.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Drop all snapshots.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
