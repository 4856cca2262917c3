//! One open script: document, outline, corrections, snapshots and history,
//! kept consistent behind a single façade.

mod apply;
mod undo;

use crate::config::{Chronometry, Config};
use crate::constants::DEFAULT_UNDO_LIMIT;
use crate::corrector::{CorrectionOptions, PositionCorrector};
use crate::document::{
    AnnotationFingerprint, BlockType, Bookmark, EditOutcome, ReviewMark, SceneInfo,
    ScriptDocument,
};
use crate::error::SyncError;
use crate::history::{ChangeStore, HistoryManager, HistoryObserver};
use crate::outline::{self, OutlineTree};
use crate::patch::PatchState;
use crate::snapshot::DocumentSnapshot;
use crate::xml;
use std::sync::Arc;

/// Per-session settings, usually derived from [`Config`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub author: String,
    pub undo_limit: usize,
    pub corrections: CorrectionOptions,
    pub chronometry: Chronometry,
    /// Mark every history record written by this session as draft.
    pub draft: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            author: crate::constants::DEFAULT_AUTHOR.to_string(),
            undo_limit: DEFAULT_UNDO_LIMIT,
            corrections: CorrectionOptions::default(),
            chronometry: Chronometry::default(),
            draft: false,
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            author: config.author.clone(),
            undo_limit: config.undo_limit,
            corrections: CorrectionOptions::from_config(config),
            chronometry: config.chronometry,
            draft: false,
        }
    }
}

/// Host callbacks for annotation changes.
pub trait DocumentObserver {
    fn on_review_changed(&self) {}
    fn on_bookmarks_changed(&self) {}
}

/// Editing session for one script.
pub struct ScriptSession {
    document: ScriptDocument,
    outline: OutlineTree,
    corrector: PositionCorrector,
    history: HistoryManager,
    chronometry: Chronometry,
    snapshot: DocumentSnapshot,
    last_saved: DocumentSnapshot,
    state: PatchState,
    fallback_rebuilds: usize,
    annotations: AnnotationFingerprint,
    observers: Vec<Box<dyn DocumentObserver>>,
}

impl ScriptSession {
    /// Open a session holding the empty script.
    ///
    /// # Errors
    /// Propagates XML failures while building the empty script.
    pub fn new(store: Arc<dyn ChangeStore>, options: SessionOptions) -> Result<Self, SyncError> {
        let mut history = HistoryManager::new(store, options.author, options.undo_limit);
        history.set_draft_mode(options.draft);
        let document = ScriptDocument::new();
        let annotations = document.annotation_fingerprint();
        let mut session = Self {
            document,
            outline: OutlineTree::new(),
            corrector: PositionCorrector::new(options.corrections),
            history,
            chronometry: options.chronometry,
            snapshot: DocumentSnapshot::default(),
            last_saved: DocumentSnapshot::default(),
            state: PatchState::Idle,
            fallback_rebuilds: 0,
            annotations,
            observers: Vec::new(),
        };
        session.load("")?;
        Ok(session)
    }

    /// Replace the whole document with `xml` and start a fresh history.
    ///
    /// Empty input loads the empty script (one empty scene heading). The
    /// saved snapshot is the canonical re-serialization of the input.
    ///
    /// # Errors
    /// Malformed XML; the session is left unchanged.
    pub fn load(&mut self, xml: &str) -> Result<(), SyncError> {
        self.ensure_idle()?;
        let source = if xml.trim().is_empty() {
            xml::default_script_xml()?
        } else {
            xml.to_string()
        };
        self.rebuild_from(&source)?;
        self.snapshot = DocumentSnapshot::capture(&self.document)?;
        self.last_saved = self.snapshot.clone();
        self.history.reset();
        self.annotations = self.document.annotation_fingerprint();
        tracing::info!(
            blocks = self.document.block_count(),
            scenes = self.outline.len().saturating_sub(1),
            "loaded script"
        );
        Ok(())
    }

    /// Rebuild document, decorations and outline from `xml`, history kept.
    pub(crate) fn rebuild_from(&mut self, xml: &str) -> Result<(), SyncError> {
        let units = xml::parse_units(xml)?;
        self.corrector.clear();
        self.document.reset();
        xml::insert_units(&mut self.document, units, 0, false);
        self.document.take_change();
        self.corrector.recompute(&mut self.document);
        self.document.take_change();
        outline::rebuild(&mut self.outline, &self.document, &self.chronometry);
        Ok(())
    }

    pub(crate) fn ensure_idle(&self) -> Result<(), SyncError> {
        if self.state.is_idle() {
            Ok(())
        } else {
            Err(SyncError::Busy)
        }
    }

    pub fn document(&self) -> &ScriptDocument {
        &self.document
    }

    pub fn outline(&self) -> &OutlineTree {
        &self.outline
    }

    pub fn corrector(&self) -> &PositionCorrector {
        &self.corrector
    }

    /// Latest snapshot; refreshed by [`ScriptSession::update_snapshot`].
    pub fn snapshot(&self) -> &DocumentSnapshot {
        &self.snapshot
    }

    pub fn last_saved(&self) -> &DocumentSnapshot {
        &self.last_saved
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn state(&self) -> PatchState {
        self.state
    }

    /// Replays whose trimmed replacement missed the patched XML and had to
    /// rebuild the whole document.
    pub fn fallback_rebuilds(&self) -> usize {
        self.fallback_rebuilds
    }

    pub fn add_observer(&mut self, observer: Box<dyn DocumentObserver>) {
        self.observers.push(observer);
    }

    pub fn add_history_observer(&mut self, observer: Box<dyn HistoryObserver>) {
        self.history.add_observer(observer);
    }

    /// Serialize the selection between two document positions.
    pub fn mime_from_selection(&self, start: usize, end: usize) -> Result<String, SyncError> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        xml::serialize(&self.document, Some(start..end))
    }

    /// Paste script XML at `position`; headings get fresh uuids.
    ///
    /// # Errors
    /// Malformed XML; the document is left unchanged.
    pub fn insert_from_mime(&mut self, position: usize, xml: &str) -> Result<(), SyncError> {
        self.ensure_idle()?;
        let units = xml::parse_units(xml)?;
        self.edit(|doc| xml::insert_units(doc, units, position, true));
        Ok(())
    }

    /// Open an edit block; changes are processed when the outermost block
    /// closes.
    pub fn begin_edit_block(&mut self) {
        debug_assert!(self.state.is_idle(), "edit while a patch is applied");
        self.document.begin_edit_block();
    }

    pub fn end_edit_block(&mut self) {
        if let Some(outcome) = self.document.end_edit_block() {
            self.process_change(outcome);
        }
    }

    fn edit<T>(&mut self, apply: impl FnOnce(&mut ScriptDocument) -> T) -> T {
        self.begin_edit_block();
        let result = apply(&mut self.document);
        self.end_edit_block();
        result
    }

    pub fn insert_text(&mut self, position: usize, text: &str) {
        self.edit(|doc| doc.insert_text(position, text));
    }

    pub fn remove_text(&mut self, position: usize, length: usize) {
        self.edit(|doc| doc.remove_text(position, length));
    }

    pub fn insert_block(&mut self, position: usize, kind: BlockType) {
        self.edit(|doc| doc.insert_block(position, kind));
    }

    pub fn set_block_type(&mut self, index: usize, kind: BlockType) -> bool {
        self.edit(|doc| doc.set_block_type(index, kind))
    }

    pub fn set_scene_info(&mut self, index: usize, info: SceneInfo) -> bool {
        self.edit(|doc| doc.set_scene_info(index, info))
    }

    pub fn add_review_mark(&mut self, index: usize, mark: ReviewMark) -> bool {
        self.edit(|doc| doc.add_review_mark(index, mark))
    }

    pub fn clear_review_marks(&mut self, index: usize) -> bool {
        self.edit(|doc| doc.clear_review_marks(index))
    }

    pub fn set_bookmark(&mut self, index: usize, bookmark: Option<Bookmark>) -> bool {
        self.edit(|doc| doc.set_bookmark(index, bookmark))
    }

    /// Keep decorations and the outline in step with a finished edit.
    fn process_change(&mut self, outcome: EditOutcome) {
        let decorated = self.corrector.correct(&mut self.document, outcome.change);
        let synced = !outcome.structural
            && !decorated
            && outline::sync_incremental(
                &mut self.outline,
                &self.document,
                outcome.change,
                &self.chronometry,
            );
        if !synced {
            outline::rebuild(&mut self.outline, &self.document, &self.chronometry);
        }
        self.check_annotations();
    }

    fn check_annotations(&mut self) {
        let current = self.document.annotation_fingerprint();
        if current.reviews != self.annotations.reviews {
            for observer in &self.observers {
                observer.on_review_changed();
            }
        }
        if current.bookmarks != self.annotations.bookmarks {
            for observer in &self.observers {
                observer.on_bookmarks_changed();
            }
        }
        self.annotations = current;
    }

    /// Apply new correction options and re-derive every decoration.
    pub fn set_correction_options(&mut self, options: CorrectionOptions) {
        if !self.corrector.set_options(options) {
            return;
        }
        self.corrector.recompute(&mut self.document);
        self.document.take_change();
        outline::rebuild(&mut self.outline, &self.document, &self.chronometry);
    }

    /// Refresh the snapshot from the live document. Does nothing while a
    /// patch is being applied.
    pub fn update_snapshot(&mut self) -> Result<(), SyncError> {
        if !self.state.is_idle() {
            return Ok(());
        }
        self.snapshot = DocumentSnapshot::capture(&self.document)?;
        Ok(())
    }

    /// `true` when the live document differs from the last saved state.
    pub fn has_unsaved_changes(&mut self) -> Result<bool, SyncError> {
        self.update_snapshot()?;
        Ok(!self.snapshot.same_content(&self.last_saved))
    }
}

#[cfg(test)]
mod tests;
