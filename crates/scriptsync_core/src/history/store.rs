//! Append-only change stores.

use super::record::HistoryRecord;
use crate::error::SyncError;
use std::sync::Mutex;

/// Append-only log of history records.
///
/// Records are never edited; undo and redo append inverse records instead.
pub trait ChangeStore {
    /// Append a record.
    ///
    /// # Errors
    /// Fails when a record with the same uuid exists or storage fails.
    fn append(&self, record: &HistoryRecord) -> Result<(), SyncError>;

    fn get(&self, uuid: &str) -> Result<Option<HistoryRecord>, SyncError>;

    fn contains(&self, uuid: &str) -> Result<bool, SyncError> {
        Ok(self.get(uuid)?.is_some())
    }

    /// Uuids in append order.
    fn uuids(&self) -> Result<Vec<String>, SyncError>;

    /// The newest `count` records, oldest first.
    fn last(&self, count: usize) -> Result<Vec<HistoryRecord>, SyncError> {
        let mut all = self.all()?;
        let skip = all.len().saturating_sub(count);
        Ok(all.split_off(skip))
    }

    /// Every record in append order.
    fn all(&self) -> Result<Vec<HistoryRecord>, SyncError>;

    fn len(&self) -> Result<usize, SyncError> {
        Ok(self.uuids()?.len())
    }

    fn is_empty(&self) -> Result<bool, SyncError> {
        Ok(self.len()? == 0)
    }
}

pub(crate) fn duplicate_record(uuid: &str) -> SyncError {
    SyncError::StorageMessage(format!("History record '{}' already exists", uuid))
}

/// In-memory store for sessions without a database.
#[derive(Debug, Default)]
pub struct MemoryChangeStore {
    records: Mutex<Vec<HistoryRecord>>,
}

impl MemoryChangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<std::sync::MutexGuard<'_, Vec<HistoryRecord>>, SyncError> {
        self.records
            .lock()
            .map_err(|_| SyncError::StorageMessage("change store lock poisoned".to_string()))
    }
}

impl ChangeStore for MemoryChangeStore {
    fn append(&self, record: &HistoryRecord) -> Result<(), SyncError> {
        let mut records = self.records()?;
        if records.iter().any(|existing| existing.uuid == record.uuid) {
            return Err(duplicate_record(&record.uuid));
        }
        records.push(record.clone());
        Ok(())
    }

    fn get(&self, uuid: &str) -> Result<Option<HistoryRecord>, SyncError> {
        Ok(self
            .records()?
            .iter()
            .find(|record| record.uuid == uuid)
            .cloned())
    }

    fn uuids(&self) -> Result<Vec<String>, SyncError> {
        Ok(self
            .records()?
            .iter()
            .map(|record| record.uuid.clone())
            .collect())
    }

    fn all(&self) -> Result<Vec<HistoryRecord>, SyncError> {
        Ok(self.records()?.clone())
    }

    fn len(&self) -> Result<usize, SyncError> {
        Ok(self.records()?.len())
    }
}
