//! Saving, undo/redo and remote history intake.

use super::ScriptSession;
use crate::error::SyncError;
use crate::history::{HistoryRecord, StackSide};
use crate::patch;

impl ScriptSession {
    /// Persist the difference to the last saved state as a history record.
    ///
    /// # Returns
    /// `Ok(None)` when nothing changed since the last save.
    pub fn save_changes(&mut self) -> Result<Option<HistoryRecord>, SyncError> {
        self.ensure_idle()?;
        self.update_snapshot()?;
        if self.snapshot.same_content(&self.last_saved) {
            return Ok(None);
        }
        let undo_patch = patch::encoded_diff(&self.snapshot.xml, &self.last_saved.xml)?;
        let redo_patch = patch::encoded_diff(&self.last_saved.xml, &self.snapshot.xml)?;
        let record = self.history.commit(undo_patch, redo_patch)?;
        self.last_saved = self.snapshot.clone();
        Ok(Some(record))
    }

    pub fn is_undo_available(&self) -> bool {
        self.history.is_undo_available()
    }

    pub fn is_redo_available(&self) -> bool {
        self.history.is_redo_available()
    }

    /// Revert the newest undo entry.
    ///
    /// # Returns
    /// `Ok(None)` when there is nothing to undo, otherwise the caret hint.
    pub fn undo(&mut self) -> Result<Option<usize>, SyncError> {
        self.ensure_idle()?;
        self.save_changes()?;
        let Some(record) = self.history.take_undo() else {
            return Ok(None);
        };
        match self.replay(&record.undo_patch) {
            Ok(position) => {
                self.history.record_replay(&record, StackSide::Undo)?;
                Ok(Some(position))
            }
            Err(err) => {
                self.history.push_undo(record);
                Err(err)
            }
        }
    }

    /// Re-apply the newest undone entry. Pending edits are flushed first,
    /// and a flushed edit ends the redo chain.
    pub fn redo(&mut self) -> Result<Option<usize>, SyncError> {
        self.ensure_idle()?;
        self.save_changes()?;
        let Some(record) = self.history.take_redo() else {
            return Ok(None);
        };
        match self.replay(&record.undo_patch) {
            Ok(position) => {
                self.history.record_replay(&record, StackSide::Redo)?;
                Ok(Some(position))
            }
            Err(err) => {
                self.history.push_redo(record);
                Err(err)
            }
        }
    }

    /// Take in records produced elsewhere: unseen ones have their redo
    /// patches applied in order, then are appended to the store.
    ///
    /// # Returns
    /// How many records were new.
    ///
    /// # Errors
    /// A patch that does not apply fails the whole batch; the document and
    /// the store are left unchanged, so the same batch can be retried.
    pub fn apply_remote_changes(&mut self, records: &[HistoryRecord]) -> Result<usize, SyncError> {
        self.ensure_idle()?;
        self.save_changes()?;
        let mut unseen: Vec<&HistoryRecord> = Vec::new();
        for record in records {
            if self.history.store().contains(&record.uuid)?
                || unseen.iter().any(|seen| seen.uuid == record.uuid)
            {
                continue;
            }
            unseen.push(record);
        }
        if unseen.is_empty() {
            return Ok(0);
        }
        tracing::info!(count = unseen.len(), "applying remote changes");
        let patches: Vec<String> = unseen
            .iter()
            .map(|record| record.redo_patch.clone())
            .collect();
        self.apply_patches(&patches)?;
        for record in &unseen {
            self.history.store().append(record)?;
        }
        Ok(unseen.len())
    }
}
