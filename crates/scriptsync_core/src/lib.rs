//! Sync core for a structured screenplay editor: flat document, outline,
//! position corrections, XML codec, patch replay and undo/redo history.

/// Configuration loading and defaults.
pub mod config;
/// Shared constants (limits, XML names, defaults).
pub mod constants;
/// Logical/document position mapping and decorations.
pub mod corrector;
/// Flat block document model.
pub mod document;
/// Error types.
pub mod error;
/// Persisted undo/redo history and change stores.
pub mod history;
/// Scene/folder outline tree.
pub mod outline;
/// Character diffs, wire format and change trimming.
pub mod patch;
/// Registry of open sessions.
pub mod registry;
/// Editing session façade.
pub mod session;
/// XML snapshots with content hashes.
pub mod snapshot;
/// Text normalization helpers.
pub mod text;
/// Canonical script XML codec.
pub mod xml;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use corrector::{CorrectionOptions, PositionCorrector};
pub use document::{BlockType, ScriptDocument};
pub use error::SyncError;
pub use history::{ChangeStore, HistoryManager, HistoryRecord, MemoryChangeStore, RedbChangeStore};
pub use outline::OutlineTree;
pub use patch::{Patch, PatchState};
pub use registry::SessionRegistry;
pub use session::{DocumentObserver, ScriptSession, SessionOptions};
pub use snapshot::DocumentSnapshot;
