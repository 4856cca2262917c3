//! Contents-change bookkeeping shared by the document, corrector, and outline.

/// One contiguous replacement: `chars_removed` characters at `position` were
/// replaced by `chars_added` characters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContentsChange {
    pub position: usize,
    pub chars_removed: usize,
    pub chars_added: usize,
}

impl ContentsChange {
    pub fn new(position: usize, chars_removed: usize, chars_added: usize) -> Self {
        Self {
            position,
            chars_removed,
            chars_added,
        }
    }

    /// `true` when nothing was removed or added.
    pub fn is_empty(&self) -> bool {
        self.chars_removed == 0 && self.chars_added == 0
    }

    /// Signed length delta of the change.
    pub fn delta(&self) -> isize {
        self.chars_added as isize - self.chars_removed as isize
    }

    /// End of the replaced span in pre-change coordinates.
    pub fn old_end(&self) -> usize {
        self.position + self.chars_removed
    }

    /// End of the inserted span in post-change coordinates.
    pub fn new_end(&self) -> usize {
        self.position + self.chars_added
    }

    /// Fold `next` (expressed in post-`self` coordinates) into one change
    /// covering both, expressed against the state before `self`.
    pub fn merge(self, next: ContentsChange) -> ContentsChange {
        let low = self.position.min(next.position);
        let high_mid = self.new_end().max(next.old_end());
        let old_high = high_mid + self.chars_removed - self.chars_added;
        let new_high = high_mid + next.chars_added - next.chars_removed;
        ContentsChange::new(low, old_high - low, new_high - low)
    }
}

/// Result of closing the outermost edit block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditOutcome {
    pub change: ContentsChange,
    /// Block count, block type, or heading info changed.
    pub structural: bool,
}
