//! redb table definitions for the history store.

use redb::TableDefinition;

/// History records by uuid (`HistoryRecord`, bincode-encoded).
pub const CHANGES: TableDefinition<&str, &[u8]> = TableDefinition::new("changes");
/// Append order: sequence number to record uuid.
pub const CHANGES_BY_SEQ: TableDefinition<u64, &str> = TableDefinition::new("changes_by_seq");
