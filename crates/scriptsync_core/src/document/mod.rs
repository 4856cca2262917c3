//! Flat screenplay document: a rope of block texts joined by `\n`, plus one
//! [`Block`] of attributes per line.
//!
//! Positions are character offsets into the rope ("document positions").
//! Decorations (continuation suffixes and page padding blocks) are part of
//! the rope but not of the logical text returned by [`ScriptDocument::plain_text`].

mod block;
mod change;

pub(crate) use block::marks;
pub use block::{Block, BlockType, Bookmark, ReviewComment, ReviewMark, SceneInfo};
pub use change::{ContentsChange, EditOutcome};

use crate::text::{char_len, flatten_line_breaks, normalize_line_breaks};
use ropey::Rope;
use std::ops::Range;

/// One unit of an inserted fragment: its text plus the attributes it carries.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentBlock {
    pub block: Block,
    pub text: String,
}

/// Digest of all review marks and bookmarks, used to detect annotation changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnnotationFingerprint {
    pub reviews: blake3::Hash,
    pub bookmarks: blake3::Hash,
}

#[derive(Clone, Copy, Debug)]
struct PendingEdit {
    change: ContentsChange,
    structural: bool,
}

/// Rope-backed screenplay text with per-block attributes.
#[derive(Clone, Debug)]
pub struct ScriptDocument {
    rope: Rope,
    blocks: Vec<Block>,
    revision: u64,
    edit_depth: usize,
    pending: Option<PendingEdit>,
}

impl Default for ScriptDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptDocument {
    /// Empty document holding a single empty block.
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            blocks: vec![Block::new(BlockType::Undefined)],
            revision: 0,
            edit_depth: 0,
            pending: None,
        }
    }

    /// Monotonic counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.len() == 1 && self.rope.len_chars() == 0
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Full document text, decorations included.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Text for a document range, clamped to the document.
    pub fn slice(&self, range: Range<usize>) -> String {
        let end = range.end.min(self.len_chars());
        let start = range.start.min(end);
        self.rope.slice(start..end).to_string()
    }

    /// Index of the block containing `position` (clamped to the document).
    pub fn block_index_at(&self, position: usize) -> usize {
        let line = self.rope.char_to_line(position.min(self.len_chars()));
        line.min(self.blocks.len() - 1)
    }

    /// Document position of the first character of block `index`.
    pub fn block_start(&self, index: usize) -> usize {
        if index >= self.blocks.len() {
            return self.len_chars();
        }
        self.rope.line_to_char(index)
    }

    /// Block length in characters, excluding the separator.
    pub fn block_len(&self, index: usize) -> usize {
        if index >= self.blocks.len() {
            return 0;
        }
        let line = self.rope.line(index);
        let len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    pub fn block_range(&self, index: usize) -> Range<usize> {
        let start = self.block_start(index);
        start..start + self.block_len(index)
    }

    /// Block text including any decorative suffix.
    pub fn block_text(&self, index: usize) -> String {
        self.slice(self.block_range(index))
    }

    /// Block text without its decorative suffix.
    pub fn block_content(&self, index: usize) -> String {
        let range = self.block_range(index);
        let suffix = self.blocks.get(index).map_or(0, |block| block.suffix_len);
        self.slice(range.start..range.end - suffix.min(range.len()))
    }

    /// Logical text: content blocks without decorations, joined by `\n`.
    pub fn plain_text(&self) -> String {
        let mut out = String::with_capacity(self.rope.len_bytes());
        let mut first = true;
        for (index, block) in self.blocks.iter().enumerate() {
            if block.padding {
                continue;
            }
            if !first {
                out.push('\n');
            }
            first = false;
            out.push_str(&self.block_content(index));
        }
        out
    }

    /// Length of [`ScriptDocument::plain_text`] in characters.
    pub fn plain_len(&self) -> usize {
        let decorated: usize = self
            .blocks
            .iter()
            .map(|block| if block.padding { 1 } else { block.suffix_len })
            .sum();
        self.len_chars() - decorated.min(self.len_chars())
    }

    // ----- edit blocks -----

    /// Open a (possibly nested) edit block.
    pub fn begin_edit_block(&mut self) {
        self.edit_depth += 1;
    }

    /// Close an edit block. The outermost close returns the merged change.
    pub fn end_edit_block(&mut self) -> Option<EditOutcome> {
        self.edit_depth = self.edit_depth.saturating_sub(1);
        if self.edit_depth > 0 {
            return None;
        }
        self.take_change()
    }

    pub fn in_edit_block(&self) -> bool {
        self.edit_depth > 0
    }

    /// Take the change accumulated since the last take.
    pub fn take_change(&mut self) -> Option<EditOutcome> {
        self.pending.take().map(|pending| EditOutcome {
            change: pending.change,
            structural: pending.structural,
        })
    }

    fn record(&mut self, change: ContentsChange, structural: bool) {
        self.revision += 1;
        self.pending = Some(match self.pending.take() {
            Some(previous) => PendingEdit {
                change: previous.change.merge(change),
                structural: previous.structural || structural,
            },
            None => PendingEdit { change, structural },
        });
    }

    // ----- text edits -----

    /// Drop all content, leaving a single empty block.
    pub fn reset(&mut self) {
        let removed = self.len_chars();
        self.rope = Rope::new();
        self.blocks = vec![Block::new(BlockType::Undefined)];
        self.record(ContentsChange::new(0, removed, 0), true);
    }

    /// Insert text; every line break starts a new block of the same kind.
    pub fn insert_text(&mut self, position: usize, text: &str) -> ContentsChange {
        let text = normalize_line_breaks(text);
        let position = position.min(self.len_chars());
        if text.is_empty() {
            return ContentsChange::new(position, 0, 0);
        }
        let index = self.block_index_at(position);
        let column = position - self.block_start(index);
        let block_len = self.block_len(index);
        let added = char_len(&text);
        self.rope.insert(position, &text);

        let pieces: Vec<&str> = text.split('\n').collect();
        let structural = pieces.len() > 1;
        if structural {
            let mut first = self.blocks[index].clone();
            let tail_reviews = marks::split_off(&mut first.reviews, column);
            let tail_suffix = first.suffix_len.min(block_len - column);
            first.suffix_len -= tail_suffix;
            first.padding = false;
            let kind = first.kind();

            let mut replacement = Vec::with_capacity(pieces.len());
            replacement.push(first);
            replacement.extend((1..pieces.len()).map(|_| Block::new(kind)));
            if let Some(last) = replacement.last_mut() {
                let last_piece_len = pieces.last().map_or(0, |piece| char_len(piece));
                marks::extend_shifted(&mut last.reviews, tail_reviews, last_piece_len);
                last.suffix_len = tail_suffix;
            }
            self.blocks.splice(index..=index, replacement);
        } else {
            let block = &mut self.blocks[index];
            marks::insert(&mut block.reviews, column, added);
            block.padding = false;
            block.suffix_len = block.suffix_len.min(block_len - column);
        }

        let change = ContentsChange::new(position, 0, added);
        self.record(change, structural);
        change
    }

    /// Remove a range; blocks spanned by it merge, keeping the first block's
    /// attributes unless the first block is page padding.
    pub fn remove_text(&mut self, position: usize, length: usize) -> ContentsChange {
        let total = self.len_chars();
        let start = position.min(total);
        let end = position.saturating_add(length).min(total);
        if start >= end {
            return ContentsChange::new(start, 0, 0);
        }
        let first = self.block_index_at(start);
        let last = self.block_index_at(end);
        let col_a = start - self.block_start(first);
        let col_b = end - self.block_start(last);
        let len_b = self.block_len(last);
        let structural = first != last;

        if structural {
            let head = &self.blocks[first];
            let tail = &self.blocks[last];
            let mut merged = if head.padding && !tail.padding {
                tail.clone()
            } else {
                head.clone()
            };
            let mut reviews = marks::clip(&head.reviews, 0, col_a);
            marks::extend_shifted(
                &mut reviews,
                marks::clip(&tail.reviews, col_b, usize::MAX),
                col_a,
            );
            let eaten = col_b.saturating_sub(len_b - tail.suffix_len);
            merged.suffix_len = tail.suffix_len - eaten.min(tail.suffix_len);
            merged.padding = head.padding && tail.padding;
            merged.reviews = reviews;
            self.blocks.splice(first..=last, [merged]);
        } else {
            let block = &mut self.blocks[first];
            marks::remove(&mut block.reviews, col_a, col_b);
            let suffix_from = len_b - block.suffix_len;
            let overlap = col_b.saturating_sub(col_a.max(suffix_from));
            block.suffix_len -= overlap.min(block.suffix_len);
        }
        self.rope.remove(start..end);

        let change = ContentsChange::new(start, end - start, 0);
        self.record(change, structural);
        change
    }

    /// Split the block at `position`; the new block gets `kind`.
    pub fn insert_block(&mut self, position: usize, kind: BlockType) -> ContentsChange {
        let change = self.insert_text(position, "\n");
        let index = self.block_index_at(change.new_end());
        self.set_block_type(index, kind);
        change
    }

    /// Insert fragment units at `position`.
    ///
    /// The first unit's text joins the block at the insertion point; its
    /// attributes replace the block's only when that block is empty. Every
    /// further unit becomes a new block, and the text after the insertion
    /// point ends up at the end of the last one. Insertions never land inside
    /// a decorative suffix.
    pub fn insert_fragment(&mut self, position: usize, units: Vec<FragmentBlock>) -> ContentsChange {
        let position = position.min(self.len_chars());
        if units.is_empty() {
            return ContentsChange::new(position, 0, 0);
        }
        let index = self.block_index_at(position);
        let block_start = self.block_start(index);
        let block_len = self.block_len(index);
        let original = self.blocks[index].clone();
        let column = (position - block_start).min(block_len - original.suffix_len);
        let position = block_start + column;
        let adopt_first = block_len == 0;
        let structural = units.len() > 1 || adopt_first;

        let mut head = original.clone();
        let tail_reviews = marks::split_off(&mut head.reviews, column);
        head.suffix_len = 0;
        head.padding = false;
        let mut head = Some(head);

        let mut texts = Vec::with_capacity(units.len());
        let mut replacement = Vec::with_capacity(units.len());
        let mut last_len = 0;
        for unit in units {
            let text = flatten_line_breaks(&unit.text).into_owned();
            let text_len = char_len(&text);
            let block = match head.take().filter(|_| !adopt_first) {
                Some(mut block) => {
                    marks::extend_shifted(&mut block.reviews, unit.block.reviews, column);
                    last_len = column + text_len;
                    block
                }
                None => {
                    let mut block = unit.block;
                    block.padding = false;
                    block.suffix_len = 0;
                    last_len = text_len;
                    block
                }
            };
            texts.push(text);
            replacement.push(block);
        }
        if let Some(last) = replacement.last_mut() {
            marks::extend_shifted(&mut last.reviews, tail_reviews, last_len);
            last.suffix_len = original.suffix_len;
        }

        let joined = texts.join("\n");
        let added = char_len(&joined);
        self.rope.insert(position, &joined);
        self.blocks.splice(index..=index, replacement);

        let change = ContentsChange::new(position, 0, added);
        self.record(change, structural);
        change
    }

    // ----- attribute edits -----

    fn touch_block(&mut self, index: usize, structural: bool) {
        let position = self.block_start(index);
        self.record(ContentsChange::new(position, 0, 0), structural);
    }

    /// Change a block's kind. Returns `false` when nothing changed.
    pub fn set_block_type(&mut self, index: usize, kind: BlockType) -> bool {
        match self.blocks.get_mut(index) {
            Some(block) if !block.padding && block.kind() != kind => block.set_kind(kind),
            _ => return false,
        }
        self.touch_block(index, true);
        true
    }

    /// Replace the heading info of a heading block.
    pub fn set_scene_info(&mut self, index: usize, info: SceneInfo) -> bool {
        match self.blocks.get_mut(index) {
            Some(block) if block.kind().is_heading() && block.info() != Some(&info) => {
                block.set_info(info)
            }
            _ => return false,
        }
        self.touch_block(index, true);
        true
    }

    pub fn add_review_mark(&mut self, index: usize, mark: ReviewMark) -> bool {
        let len = self.block_len(index);
        match self.blocks.get_mut(index) {
            Some(block) if !block.padding && mark.length > 0 && mark.end() <= len => {
                block.reviews.push(mark);
                block.reviews.sort_by_key(|mark| mark.start);
            }
            _ => return false,
        }
        self.touch_block(index, false);
        true
    }

    pub fn clear_review_marks(&mut self, index: usize) -> bool {
        match self.blocks.get_mut(index) {
            Some(block) if !block.reviews.is_empty() => block.reviews.clear(),
            _ => return false,
        }
        self.touch_block(index, false);
        true
    }

    pub fn set_bookmark(&mut self, index: usize, bookmark: Option<Bookmark>) -> bool {
        match self.blocks.get_mut(index) {
            Some(block) if !block.padding && block.bookmark != bookmark => {
                block.bookmark = bookmark
            }
            _ => return false,
        }
        self.touch_block(index, false);
        true
    }

    // ----- decorations (not reported as edits) -----

    /// Replace block `index`'s decorative suffix with `suffix`.
    pub(crate) fn set_suffix(&mut self, index: usize, suffix: &str) -> ContentsChange {
        let range = self.block_range(index);
        let old = self.blocks[index].suffix_len.min(range.len());
        let at = range.end - old;
        if old > 0 {
            self.rope.remove(at..range.end);
        }
        let added = char_len(suffix);
        if added > 0 {
            self.rope.insert(at, suffix);
        }
        self.blocks[index].suffix_len = added;
        self.revision += 1;
        ContentsChange::new(at, old, added)
    }

    /// Insert an empty padding block before block `index`.
    pub(crate) fn insert_padding(&mut self, index: usize) -> ContentsChange {
        let at = self.block_start(index);
        self.rope.insert(at, "\n");
        self.blocks.insert(index.min(self.blocks.len()), Block::padding());
        self.revision += 1;
        ContentsChange::new(at, 0, 1)
    }

    /// Remove padding block `index` together with one separator.
    pub(crate) fn remove_padding(&mut self, index: usize) -> ContentsChange {
        let start = self.block_start(index);
        let removable = self.blocks.len() > 1
            && self.block_len(index) == 0
            && self.blocks.get(index).is_some_and(|block| block.padding);
        if !removable {
            return ContentsChange::new(start, 0, 0);
        }
        let at = if index + 1 < self.blocks.len() {
            start
        } else {
            start - 1
        };
        self.rope.remove(at..at + 1);
        self.blocks.remove(index);
        self.revision += 1;
        ContentsChange::new(at, 1, 0)
    }

    /// `(position, length)` of every decoration, in document order.
    pub fn decoration_spans(&self) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        for (index, block) in self.blocks.iter().enumerate() {
            let range = self.block_range(index);
            if block.padding {
                let at = if index + 1 < self.blocks.len() {
                    range.start
                } else {
                    range.start.saturating_sub(1)
                };
                spans.push((at, 1));
            } else if block.suffix_len > 0 {
                spans.push((range.end - block.suffix_len, block.suffix_len));
            }
        }
        spans
    }

    /// Digest review marks and bookmarks of content blocks.
    pub fn annotation_fingerprint(&self) -> AnnotationFingerprint {
        fn put(hasher: &mut blake3::Hasher, value: &str) {
            hasher.update(&(value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        }

        let mut reviews = blake3::Hasher::new();
        let mut bookmarks = blake3::Hasher::new();
        for (index, block) in self.blocks.iter().filter(|b| !b.padding).enumerate() {
            let index = (index as u64).to_le_bytes();
            for mark in &block.reviews {
                reviews.update(&index);
                reviews.update(&(mark.start as u64).to_le_bytes());
                reviews.update(&(mark.length as u64).to_le_bytes());
                reviews.update(&[u8::from(mark.done)]);
                put(&mut reviews, &mark.color);
                for comment in &mark.comments {
                    put(&mut reviews, &comment.author);
                    put(&mut reviews, &comment.date);
                    put(&mut reviews, &comment.text);
                }
            }
            if let Some(bookmark) = &block.bookmark {
                bookmarks.update(&index);
                put(&mut bookmarks, &bookmark.text);
                put(&mut bookmarks, &bookmark.color);
            }
        }
        AnnotationFingerprint {
            reviews: reviews.finalize(),
            bookmarks: bookmarks.finalize(),
        }
    }
}

#[cfg(test)]
mod tests;
