//! Bounded undo and redo stacks of history records.

use super::record::HistoryRecord;
use std::collections::VecDeque;

/// Linear undo/redo history; the undo side evicts its oldest entry when
/// full.
#[derive(Debug, Clone)]
pub struct UndoRedoStack {
    undo: VecDeque<HistoryRecord>,
    redo: Vec<HistoryRecord>,
    limit: usize,
}

impl UndoRedoStack {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            undo: VecDeque::with_capacity(limit),
            redo: Vec::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Push a fresh forward edit: evicts past the limit and clears redo.
    ///
    /// Returns the evicted record, if any.
    pub fn push_edit(&mut self, record: HistoryRecord) -> Option<HistoryRecord> {
        self.redo.clear();
        self.push_undo(record)
    }

    /// Push onto the undo side without touching redo.
    pub fn push_undo(&mut self, record: HistoryRecord) -> Option<HistoryRecord> {
        self.undo.push_back(record);
        if self.undo.len() > self.limit {
            self.undo.pop_front()
        } else {
            None
        }
    }

    pub fn push_redo(&mut self, record: HistoryRecord) {
        self.redo.push(record);
    }

    pub fn pop_undo(&mut self) -> Option<HistoryRecord> {
        self.undo.pop_back()
    }

    pub fn pop_redo(&mut self) -> Option<HistoryRecord> {
        self.redo.pop()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Undo entries, oldest first.
    pub fn undo_entries(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.undo.iter()
    }

    pub fn redo_entries(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.redo.iter()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl Default for UndoRedoStack {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_UNDO_LIMIT)
    }
}
