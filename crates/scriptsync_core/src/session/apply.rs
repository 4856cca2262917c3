//! Patch replay onto the live document.

use super::ScriptSession;
use crate::error::SyncError;
use crate::outline;
use crate::patch::{self, differing_span, ChangeSet, Patch, PatchState};
use crate::snapshot::DocumentSnapshot;
use crate::xml;
use std::ops::Range;

impl ScriptSession {
    /// Apply one encoded patch, after flushing pending local edits into
    /// history.
    ///
    /// # Returns
    /// Document position where the replaced region starts (caret hint).
    ///
    /// # Errors
    /// [`SyncError::Busy`] while another patch is applied; decode, parse or
    /// [`SyncError::PatchMismatch`] failures leave the document unmodified.
    pub fn apply_patch(&mut self, encoded: &str) -> Result<usize, SyncError> {
        self.ensure_idle()?;
        self.save_changes()?;
        self.replay(encoded)
    }

    /// Apply one patch without flushing first; used by undo and redo.
    pub(super) fn replay(&mut self, encoded: &str) -> Result<usize, SyncError> {
        self.ensure_idle()?;
        self.state = PatchState::Diffing;
        let result = self.replay_inner(encoded);
        self.state = PatchState::Idle;
        self.finish_replay(result)
    }

    fn replay_inner(&mut self, encoded: &str) -> Result<usize, SyncError> {
        let patch = Patch::decode(encoded)?;
        let old_xml = self.snapshot.xml.clone();
        let applied = patch.apply(&old_xml)?;
        match applied.old_span {
            Some(span) => self.replace_changed(&old_xml, &applied.text, span),
            None => Ok(0),
        }
    }

    /// Apply several patches in order with a single document replacement.
    pub fn apply_patches(&mut self, batch: &[String]) -> Result<(), SyncError> {
        self.apply_patches_with_progress(batch, |_, _| {})
    }

    /// Like [`ScriptSession::apply_patches`], calling `progress(done, total)`
    /// after each patch has been applied to the XML text.
    ///
    /// # Errors
    /// Any failing patch aborts the batch before the document is touched.
    pub fn apply_patches_with_progress(
        &mut self,
        batch: &[String],
        mut progress: impl FnMut(usize, usize),
    ) -> Result<(), SyncError> {
        self.ensure_idle()?;
        self.save_changes()?;
        if batch.is_empty() {
            return Ok(());
        }
        self.state = PatchState::Diffing;
        let result = self.apply_batch_inner(batch, &mut progress);
        self.state = PatchState::Idle;
        self.finish_replay(result).map(|_| ())
    }

    fn apply_batch_inner(
        &mut self,
        batch: &[String],
        progress: &mut impl FnMut(usize, usize),
    ) -> Result<usize, SyncError> {
        let old_xml = self.snapshot.xml.clone();
        let mut xml = old_xml.clone();
        for (index, encoded) in batch.iter().enumerate() {
            xml = patch::apply_encoded(encoded, &xml)?;
            progress(index + 1, batch.len());
        }
        tracing::debug!(patches = batch.len(), "applied patch batch to snapshot text");
        match differing_span(&old_xml, &xml) {
            Some(span) => self.replace_changed(&old_xml, &xml, span),
            None => Ok(0),
        }
    }

    fn finish_replay(&mut self, result: Result<usize, SyncError>) -> Result<usize, SyncError> {
        let position = result?;
        self.snapshot = DocumentSnapshot::capture(&self.document)?;
        self.last_saved = self.snapshot.clone();
        self.check_annotations();
        Ok(position)
    }

    /// Replace the trimmed changed region of `old_xml` in the document so it
    /// serializes to `new_xml`.
    fn replace_changed(
        &mut self,
        old_xml: &str,
        new_xml: &str,
        old_span: Range<usize>,
    ) -> Result<usize, SyncError> {
        self.state = PatchState::Trimming;
        let mut changes = ChangeSet::between(old_xml, new_xml, old_span)?;
        let stats = changes.trim();
        tracing::debug!(
            leading = stats.leading,
            trailing = stats.trailing,
            position = changes.plain_position,
            length = changes.plain_length,
            "trimmed patch region"
        );

        self.state = PatchState::Replacing;
        // Plain positions address the document directly once it is undecorated.
        let stripped = self.corrector.strip(&mut self.document);
        let from = changes.plain_position;
        self.document.begin_edit_block();
        self.document.remove_text(from, changes.plain_length);
        xml::insert_units(&mut self.document, changes.after_units(), from, false);
        let outcome = self.document.end_edit_block();

        if xml::serialize(&self.document, None)? != new_xml {
            self.fallback_rebuilds += 1;
            tracing::warn!(
                position = from,
                "trimmed replacement diverged from patched XML; rebuilding document"
            );
            self.rebuild_from(new_xml)?;
        } else if stripped || self.corrector.options().any() {
            self.corrector.recompute(&mut self.document);
            self.document.take_change();
            outline::rebuild(&mut self.outline, &self.document, &self.chronometry);
        } else if let Some(outcome) = outcome {
            self.process_change(outcome);
        }
        Ok(self.corrector.corrected_position(from))
    }
}
