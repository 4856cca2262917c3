//! Change store backed by a redb database file.

use super::record::{decode_record, encode_record, HistoryRecord};
use super::store::{duplicate_record, ChangeStore};
use super::tables::{CHANGES, CHANGES_BY_SEQ};
use crate::error::SyncError;
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata};
use std::path::Path;
use std::sync::Arc;

/// Accessor for the history tables.
pub struct RedbChangeStore {
    db: Arc<redb::Database>,
}

impl RedbChangeStore {
    /// Open (or create) the database at `path`, creating parent directories.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be created or redb
    /// initialization fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(path)?;
        tracing::debug!(path = %path.display(), "opened history store");
        Self::from_database(Arc::new(db))
    }

    /// Initialize history tables on an already-open database.
    pub fn from_database(db: Arc<redb::Database>) -> Result<Self, SyncError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(CHANGES)?;
        write_txn.open_table(CHANGES_BY_SEQ)?;
        write_txn.commit()?;
        Ok(Self { db })
    }
}

impl ChangeStore for RedbChangeStore {
    fn append(&self, record: &HistoryRecord) -> Result<(), SyncError> {
        let encoded = encode_record(record)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut changes = write_txn.open_table(CHANGES)?;
            let mut by_seq = write_txn.open_table(CHANGES_BY_SEQ)?;

            if changes.get(record.uuid.as_str())?.is_some() {
                return Err(duplicate_record(&record.uuid));
            }
            let next_seq = match by_seq.last()? {
                Some((key, _)) => key.value() + 1,
                None => 0,
            };

            changes.insert(record.uuid.as_str(), encoded.as_slice())?;
            by_seq.insert(next_seq, record.uuid.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get(&self, uuid: &str) -> Result<Option<HistoryRecord>, SyncError> {
        let read_txn = self.db.begin_read()?;
        let changes = read_txn.open_table(CHANGES)?;
        match changes.get(uuid)? {
            Some(value) => Ok(Some(decode_record(value.value())?)),
            None => Ok(None),
        }
    }

    fn contains(&self, uuid: &str) -> Result<bool, SyncError> {
        let read_txn = self.db.begin_read()?;
        let changes = read_txn.open_table(CHANGES)?;
        Ok(changes.get(uuid)?.is_some())
    }

    fn uuids(&self) -> Result<Vec<String>, SyncError> {
        let read_txn = self.db.begin_read()?;
        let by_seq = read_txn.open_table(CHANGES_BY_SEQ)?;
        let mut uuids = Vec::new();
        for item in by_seq.iter()? {
            let (_, uuid) = item?;
            uuids.push(uuid.value().to_string());
        }
        Ok(uuids)
    }

    fn last(&self, count: usize) -> Result<Vec<HistoryRecord>, SyncError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let read_txn = self.db.begin_read()?;
        let by_seq = read_txn.open_table(CHANGES_BY_SEQ)?;
        let changes = read_txn.open_table(CHANGES)?;
        let mut records = Vec::with_capacity(count);
        for item in by_seq.iter()?.rev() {
            let (_, uuid) = item?;
            let Some(value) = changes.get(uuid.value())? else {
                tracing::warn!(uuid = uuid.value(), "history index points at a missing record");
                continue;
            };
            records.push(decode_record(value.value())?);
            if records.len() >= count {
                break;
            }
        }
        records.reverse();
        Ok(records)
    }

    fn all(&self) -> Result<Vec<HistoryRecord>, SyncError> {
        let read_txn = self.db.begin_read()?;
        let by_seq = read_txn.open_table(CHANGES_BY_SEQ)?;
        let changes = read_txn.open_table(CHANGES)?;
        let mut records = Vec::new();
        for item in by_seq.iter()? {
            let (_, uuid) = item?;
            let Some(value) = changes.get(uuid.value())? else {
                tracing::warn!(uuid = uuid.value(), "history index points at a missing record");
                continue;
            };
            records.push(decode_record(value.value())?);
        }
        Ok(records)
    }

    fn len(&self) -> Result<usize, SyncError> {
        let read_txn = self.db.begin_read()?;
        let by_seq = read_txn.open_table(CHANGES_BY_SEQ)?;
        Ok(usize::try_from(by_seq.len()?).unwrap_or(usize::MAX))
    }
}
