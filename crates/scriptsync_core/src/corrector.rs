//! Logical/document position mapping and decoration maintenance.
//!
//! The document may hold decorations that are not part of the script: a
//! continuation suffix on a repeated speaker and padding blocks that push a
//! heading or speaker off the last line of a page. The corrector owns the
//! rules that place them and a sorted offset table used to translate logical
//! positions (plain text, as seen by XML and patches) into document positions.

use crate::config::Config;
use crate::constants::{CONTINUED_SUFFIX, DEFAULT_LINES_PER_PAGE};
use crate::document::{BlockType, ContentsChange, ScriptDocument};

/// Which decorations the corrector maintains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CorrectionOptions {
    pub character_names: bool,
    pub page_breaks: bool,
    pub lines_per_page: usize,
}

impl Default for CorrectionOptions {
    fn default() -> Self {
        Self {
            character_names: false,
            page_breaks: false,
            lines_per_page: DEFAULT_LINES_PER_PAGE,
        }
    }
}

impl CorrectionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            character_names: config.correct_character_names,
            page_breaks: config.correct_page_breaks,
            lines_per_page: config.lines_per_page.max(2),
        }
    }

    pub fn any(&self) -> bool {
        self.character_names || self.page_breaks
    }
}

/// A decorative span in document coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoration {
    pub position: usize,
    pub length: usize,
}

impl Decoration {
    fn end(&self) -> usize {
        self.position + self.length
    }
}

fn opens_section(kind: BlockType) -> bool {
    matches!(
        kind,
        BlockType::SceneHeading | BlockType::FolderHeader | BlockType::FolderFooter
    )
}

fn speaker_name(content: &str) -> Option<String> {
    let name = content.split('(').next().unwrap_or_default().trim();
    (!name.is_empty()).then(|| name.to_uppercase())
}

fn already_continued(content: &str) -> bool {
    let upper = content.to_uppercase();
    upper.contains("CONT'D") || upper.contains("CONT\u{2019}D")
}

/// Maintains decorations and the logical-to-document offset table.
#[derive(Clone, Debug, Default)]
pub struct PositionCorrector {
    options: CorrectionOptions,
    decorations: Vec<Decoration>,
}

impl PositionCorrector {
    pub fn new(options: CorrectionOptions) -> Self {
        Self {
            options,
            decorations: Vec::new(),
        }
    }

    pub fn options(&self) -> CorrectionOptions {
        self.options
    }

    /// Decorations in document order.
    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    /// Map a logical position to a document position.
    ///
    /// The result is never smaller than `logical`.
    pub fn corrected_position(&self, logical: usize) -> usize {
        let mut position = logical;
        for decoration in &self.decorations {
            if decoration.position > position {
                break;
            }
            position += decoration.length;
        }
        position
    }

    /// Map a document position back to a logical one. Positions inside a
    /// decoration clamp to its start.
    pub fn logical_position(&self, position: usize) -> usize {
        let mut hidden = 0;
        for decoration in &self.decorations {
            if decoration.position >= position {
                break;
            }
            hidden += decoration.length.min(position - decoration.position);
        }
        position - hidden
    }

    /// Forget every decoration without touching the document.
    pub fn clear(&mut self) {
        self.decorations.clear();
    }

    /// Change options. Call [`PositionCorrector::recompute`] afterwards.
    pub fn set_options(&mut self, options: CorrectionOptions) -> bool {
        let options = CorrectionOptions {
            lines_per_page: options.lines_per_page.max(2),
            ..options
        };
        if self.options == options {
            return false;
        }
        self.options = options;
        true
    }

    /// Strip and re-derive every decoration in `doc`.
    ///
    /// # Returns
    /// `true` when the document text changed.
    pub fn recompute(&mut self, doc: &mut ScriptDocument) -> bool {
        self.decorations.clear();
        let mutated = self.rederive(doc, 0, None);
        tracing::debug!(
            decorations = self.decorations.len(),
            "recomputed position corrections"
        );
        mutated
    }

    /// Update after a document edit described by `change`.
    ///
    /// Table entries after the edit shift, entries it overlapped are dropped,
    /// and decorations are re-derived from the start of the affected scene.
    ///
    /// # Returns
    /// `true` when the document text changed.
    pub fn correct(&mut self, doc: &mut ScriptDocument, change: ContentsChange) -> bool {
        self.shift_table(change);
        if !self.options.any() && self.decorations.is_empty() {
            return false;
        }

        let mut from = self.section_start(doc, doc.block_index_at(change.position));
        while from > 0 && doc.block(from - 1).is_some_and(|block| block.is_padding()) {
            from -= 1;
        }
        let to = if self.options.page_breaks {
            None
        } else {
            Some(self.section_end(doc, doc.block_index_at(change.new_end())))
        };
        self.rederive(doc, from, to)
    }

    fn section_start(&self, doc: &ScriptDocument, block: usize) -> usize {
        (0..=block.min(doc.block_count().saturating_sub(1)))
            .rev()
            .find(|index| {
                doc.block(*index)
                    .is_some_and(|b| b.is_content() && opens_section(b.kind()))
            })
            .unwrap_or(0)
    }

    fn section_end(&self, doc: &ScriptDocument, block: usize) -> usize {
        (block + 1..doc.block_count())
            .find(|index| {
                doc.block(*index)
                    .is_some_and(|b| b.is_content() && opens_section(b.kind()))
            })
            .unwrap_or(doc.block_count())
    }

    fn shift_table(&mut self, change: ContentsChange) {
        if change.is_empty() {
            return;
        }
        let old_end = change.old_end();
        self.decorations.retain_mut(|decoration| {
            if decoration.position >= old_end {
                decoration.position = decoration.position + change.chars_added - change.chars_removed;
                true
            } else {
                decoration.end() <= change.position
            }
        });
    }

    fn record(&mut self, change: ContentsChange) {
        self.shift_table(change);
        if change.chars_added > 0 {
            let entry = Decoration {
                position: change.position,
                length: change.chars_added,
            };
            let at = self
                .decorations
                .partition_point(|decoration| decoration.position < entry.position);
            self.decorations.insert(at, entry);
        }
    }

    /// Remove every decoration from `doc`, leaving the plain script and an
    /// empty table, so document positions equal logical ones.
    ///
    /// # Returns
    /// `true` when the document text changed.
    pub fn strip(&mut self, doc: &mut ScriptDocument) -> bool {
        let (mutated, _) = self.strip_blocks(doc, 0, doc.block_count());
        self.decorations.clear();
        mutated
    }

    /// Strip decorations of blocks `[from, end)`; returns whether anything
    /// changed and the range end after padding removal.
    fn strip_blocks(&mut self, doc: &mut ScriptDocument, from: usize, end: usize) -> (bool, usize) {
        let mut mutated = false;
        let mut end = end;
        let mut index = from;
        while index < end {
            let Some(block) = doc.block(index) else {
                break;
            };
            if block.is_padding() {
                let change = doc.remove_padding(index);
                if !change.is_empty() {
                    self.shift_table(change);
                    mutated = true;
                    end -= 1;
                    continue;
                }
            } else if block.suffix_len() > 0 {
                let change = doc.set_suffix(index, "");
                self.shift_table(change);
                mutated = true;
            }
            index += 1;
        }
        (mutated, end)
    }

    /// Strip decorations of blocks `[from, to)` and apply the rules again.
    fn rederive(&mut self, doc: &mut ScriptDocument, from: usize, to: Option<usize>) -> bool {
        let end = to.unwrap_or(usize::MAX).min(doc.block_count());
        let (mut mutated, mut end) = self.strip_blocks(doc, from, end);
        if !self.options.any() {
            return mutated;
        }

        let lines = self.options.lines_per_page;
        let mut last_speaker: Option<String> = None;
        let mut index = from;
        while index < end {
            let Some(kind) = doc.block(index).map(|block| block.kind()) else {
                break;
            };
            let widow_prone = matches!(kind, BlockType::SceneHeading | BlockType::Character);
            if self.options.page_breaks && widow_prone && index % lines == lines - 1 {
                let change = doc.insert_padding(index);
                self.record(change);
                mutated = true;
                index += 1;
                end += 1;
            }

            if opens_section(kind) {
                last_speaker = None;
            } else if kind == BlockType::Character && self.options.character_names {
                let content = doc.block_content(index);
                let name = speaker_name(&content);
                if name.is_some() && name == last_speaker && !already_continued(&content) {
                    let change = doc.set_suffix(index, CONTINUED_SUFFIX);
                    self.record(ContentsChange::new(change.position, 0, change.chars_added));
                    mutated = true;
                }
                last_speaker = name;
            }
            index += 1;
        }
        mutated
    }
}
