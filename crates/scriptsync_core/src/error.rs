//! Error types for the sync core: storage, codec, and patch failures.
use thiserror::Error;

/// Top-level error type for document sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Storage error: {0}")]
    StorageMessage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Malformed script XML: {0}")]
    MalformedXml(String),

    #[error("Invalid patch: {0}")]
    InvalidPatch(String),

    #[error("Patch hunk {hunk} does not match the document")]
    PatchMismatch { hunk: usize },

    #[error("Compression error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Patch encoding error: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Patch application already in progress")]
    Busy,

    #[error("Not found")]
    NotFound,
}

impl From<redb::DatabaseError> for SyncError {
    fn from(value: redb::DatabaseError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TransactionError> for SyncError {
    fn from(value: redb::TransactionError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TableError> for SyncError {
    fn from(value: redb::TableError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::StorageError> for SyncError {
    fn from(value: redb::StorageError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::CommitError> for SyncError {
    fn from(value: redb::CommitError) -> Self {
        Self::Database(value.into())
    }
}
