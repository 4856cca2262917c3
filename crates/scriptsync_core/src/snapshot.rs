//! Serialized view of a document plus its content hash.

use crate::document::ScriptDocument;
use crate::error::SyncError;
use crate::xml;

/// XML serialization, plain text and blake3 digest of one document state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub xml: String,
    pub plain_text: String,
    pub hash: blake3::Hash,
}

impl DocumentSnapshot {
    /// Snapshot of already-serialized XML.
    pub fn from_xml(xml: String, plain_text: String) -> Self {
        let hash = blake3::hash(xml.as_bytes());
        Self {
            xml,
            plain_text,
            hash,
        }
    }

    /// Serialize `doc` and hash the result.
    ///
    /// # Errors
    /// Propagates XML writer failures.
    pub fn capture(doc: &ScriptDocument) -> Result<Self, SyncError> {
        let xml = xml::serialize(doc, None)?;
        Ok(Self::from_xml(xml, doc.plain_text()))
    }

    /// `true` when both snapshots hash to the same digest.
    pub fn same_content(&self, other: &DocumentSnapshot) -> bool {
        self.hash == other.hash
    }

    pub fn hash_hex(&self) -> String {
        self.hash.to_hex().to_string()
    }
}

impl Default for DocumentSnapshot {
    fn default() -> Self {
        Self::from_xml(String::new(), String::new())
    }
}
