//! Text patches between XML snapshots, and the pieces used to replay them
//! onto a live document.

mod changed;
mod hunk;
mod trim;
mod wire;

pub use changed::{differing_span, ChangeSet, FragmentUnit};
pub use hunk::{apply_hunks, make_hunks, parse_hunks, Applied, DiffOp, Hunk};
pub use trim::TrimStats;

use crate::error::SyncError;
use std::fmt;

/// Where a patch application currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PatchState {
    #[default]
    Idle,
    Diffing,
    Trimming,
    Replacing,
}

impl PatchState {
    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }
}

/// Directional character diff between two texts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Patch {
    hunks: Vec<Hunk>,
}

impl Patch {
    /// Patch turning `old` into `new`.
    pub fn diff(old: &str, new: &str) -> Self {
        Self {
            hunks: make_hunks(old, new),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// Parse the plain (uncompressed) text form.
    ///
    /// # Errors
    /// [`SyncError::InvalidPatch`] for unreadable headers, lines or escapes.
    pub fn parse(text: &str) -> Result<Self, SyncError> {
        Ok(Self {
            hunks: parse_hunks(text)?,
        })
    }

    /// Compressed wire form, as stored in history records.
    pub fn encode(&self) -> Result<String, SyncError> {
        wire::compress(&self.to_string())
    }

    /// Inverse of [`Patch::encode`].
    ///
    /// # Errors
    /// Fails on bad base64, a corrupt zlib stream or unparsable patch text.
    pub fn decode(encoded: &str) -> Result<Self, SyncError> {
        Self::parse(&wire::decompress(encoded)?)
    }

    /// Apply to `text`; see [`apply_hunks`].
    pub fn apply(&self, text: &str) -> Result<Applied, SyncError> {
        apply_hunks(&self.hunks, text)
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for hunk in &self.hunks {
            write!(f, "{}", hunk)?;
        }
        Ok(())
    }
}

/// Encoded patch turning `old` into `new`.
pub fn encoded_diff(old: &str, new: &str) -> Result<String, SyncError> {
    Patch::diff(old, new).encode()
}

/// Decode `encoded` and apply it to `text`, returning only the new text.
pub fn apply_encoded(encoded: &str, text: &str) -> Result<String, SyncError> {
    Ok(Patch::decode(encoded)?.apply(text)?.text)
}
