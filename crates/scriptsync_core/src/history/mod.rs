//! Undo/redo history built from persisted patch pairs.

mod record;
mod redb_store;
mod stack;
mod store;
mod tables;

pub use record::HistoryRecord;
pub use redb_store::RedbChangeStore;
pub use stack::UndoRedoStack;
pub use store::{ChangeStore, MemoryChangeStore};
pub use tables::{CHANGES, CHANGES_BY_SEQ};

use crate::error::SyncError;
use std::sync::Arc;

/// Host callbacks for undo/redo availability.
pub trait HistoryObserver {
    fn on_undo_available_changed(&self, _available: bool) {}
    fn on_redo_available_changed(&self, _available: bool) {}
}

/// The stack a replayed entry was taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackSide {
    Undo,
    Redo,
}

/// Owns the undo/redo stacks of one open document and writes every
/// transition to the change store.
pub struct HistoryManager {
    store: Arc<dyn ChangeStore>,
    stack: UndoRedoStack,
    author: String,
    drafts: bool,
    observers: Vec<Box<dyn HistoryObserver>>,
}

impl HistoryManager {
    pub fn new(store: Arc<dyn ChangeStore>, author: impl Into<String>, limit: usize) -> Self {
        Self {
            store,
            stack: UndoRedoStack::new(limit),
            author: author.into(),
            drafts: false,
            observers: Vec::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ChangeStore> {
        &self.store
    }

    pub fn stack(&self) -> &UndoRedoStack {
        &self.stack
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Mark every record written from now on as draft.
    pub fn set_draft_mode(&mut self, drafts: bool) {
        self.drafts = drafts;
    }

    pub fn is_draft_mode(&self) -> bool {
        self.drafts
    }

    pub fn add_observer(&mut self, observer: Box<dyn HistoryObserver>) {
        self.observers.push(observer);
    }

    pub fn is_undo_available(&self) -> bool {
        self.stack.undo_len() > 0
    }

    pub fn is_redo_available(&self) -> bool {
        self.stack.redo_len() > 0
    }

    fn availability(&self) -> (bool, bool) {
        (self.is_undo_available(), self.is_redo_available())
    }

    fn notify(&self, before: (bool, bool)) {
        let (undo, redo) = self.availability();
        if undo != before.0 {
            for observer in &self.observers {
                observer.on_undo_available_changed(undo);
            }
        }
        if redo != before.1 {
            for observer in &self.observers {
                observer.on_redo_available_changed(redo);
            }
        }
    }

    /// Persist a new forward edit and push it onto the undo stack.
    ///
    /// # Errors
    /// Store failures; the stacks are untouched when the append fails.
    pub fn commit(
        &mut self,
        undo_patch: String,
        redo_patch: String,
    ) -> Result<HistoryRecord, SyncError> {
        let record = HistoryRecord::new(self.author.clone(), undo_patch, redo_patch, self.drafts);
        self.store.append(&record)?;
        tracing::info!(uuid = %record.uuid, draft = record.is_draft, "committed history record");

        let before = self.availability();
        if let Some(evicted) = self.stack.push_edit(record.clone()) {
            tracing::debug!(uuid = %evicted.uuid, "evicted oldest undo entry");
        }
        self.notify(before);
        Ok(record)
    }

    pub fn take_undo(&mut self) -> Option<HistoryRecord> {
        let before = self.availability();
        let record = self.stack.pop_undo();
        self.notify(before);
        record
    }

    pub fn take_redo(&mut self) -> Option<HistoryRecord> {
        let before = self.availability();
        let record = self.stack.pop_redo();
        self.notify(before);
        record
    }

    /// Push onto the undo stack: an entry whose replay failed, or the
    /// inverse of a redo. The redo stack is kept.
    pub fn push_undo(&mut self, record: HistoryRecord) {
        let before = self.availability();
        self.stack.push_undo(record);
        self.notify(before);
    }

    pub fn push_redo(&mut self, record: HistoryRecord) {
        let before = self.availability();
        self.stack.push_redo(record);
        self.notify(before);
    }

    /// Record that `record`, taken from the `from` stack, was replayed.
    ///
    /// The inverse (patches swapped, draft flag kept) goes onto the opposite
    /// stack first and is then appended to the store.
    ///
    /// # Errors
    /// Store failures. The inverse stays on its stack because the document
    /// has already moved.
    pub fn record_replay(
        &mut self,
        record: &HistoryRecord,
        from: StackSide,
    ) -> Result<HistoryRecord, SyncError> {
        let inverse = record.inverse(self.author.clone());
        match from {
            StackSide::Undo => self.push_redo(inverse.clone()),
            StackSide::Redo => self.push_undo(inverse.clone()),
        }
        self.store.append(&inverse)?;
        tracing::info!(
            uuid = %inverse.uuid,
            replayed = %record.uuid,
            "recorded history replay"
        );
        Ok(inverse)
    }

    /// Forget both stacks (a new document was loaded).
    pub fn reset(&mut self) {
        let before = self.availability();
        self.stack.clear();
        self.notify(before);
    }
}

#[cfg(test)]
mod tests;
