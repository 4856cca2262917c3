//! Block (paragraph) attributes stored alongside the flat text.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Screenplay paragraph kind. Each kind maps to a fixed XML tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    #[default]
    Undefined,
    SceneHeading,
    SceneCharacters,
    Action,
    Character,
    Parenthetical,
    Dialogue,
    Transition,
    Note,
    TitleHeader,
    Title,
    NoprintableText,
    FolderHeader,
    FolderFooter,
    Lyrics,
}

impl BlockType {
    pub const ALL: [BlockType; 15] = [
        BlockType::Undefined,
        BlockType::SceneHeading,
        BlockType::SceneCharacters,
        BlockType::Action,
        BlockType::Character,
        BlockType::Parenthetical,
        BlockType::Dialogue,
        BlockType::Transition,
        BlockType::Note,
        BlockType::TitleHeader,
        BlockType::Title,
        BlockType::NoprintableText,
        BlockType::FolderHeader,
        BlockType::FolderFooter,
        BlockType::Lyrics,
    ];

    /// XML element name for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            BlockType::Undefined => "undefined",
            BlockType::SceneHeading => "scene_heading",
            BlockType::SceneCharacters => "scene_characters",
            BlockType::Action => "action",
            BlockType::Character => "character",
            BlockType::Parenthetical => "parenthetical",
            BlockType::Dialogue => "dialogue",
            BlockType::Transition => "transition",
            BlockType::Note => "note",
            BlockType::TitleHeader => "title_header",
            BlockType::Title => "title",
            BlockType::NoprintableText => "noprintable_text",
            BlockType::FolderHeader => "folder_header",
            BlockType::FolderFooter => "folder_footer",
            BlockType::Lyrics => "lyrics",
        }
    }

    /// Reverse of [`BlockType::tag`].
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag().as_bytes() == tag)
    }

    /// Kinds that open an outline element and therefore carry [`SceneInfo`].
    pub fn is_heading(self) -> bool {
        matches!(self, BlockType::SceneHeading | BlockType::FolderHeader)
    }
}

/// Identity and outline metadata attached to a heading block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneInfo {
    pub uuid: String,
    pub colors: String,
    pub title: String,
    pub description: String,
    pub stamp: String,
    /// Locked scene number, meaningful when `fixed` is set.
    pub number: String,
    pub fixed: bool,
    pub fix_nesting: u32,
    pub number_suffix: u32,
}

impl SceneInfo {
    /// Fresh info with a new v4 uuid.
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            ..Self::default()
        }
    }

    pub fn rebuild_uuid(&mut self) {
        self.uuid = Uuid::new_v4().to_string();
    }
}

/// Reviewer comment attached to a [`ReviewMark`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub author: String,
    pub date: String,
    pub text: String,
}

/// Highlighted span inside one block, in block-relative characters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewMark {
    pub start: usize,
    pub length: usize,
    pub color: String,
    pub done: bool,
    pub comments: Vec<ReviewComment>,
}

impl ReviewMark {
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// Bookmark placed on a block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub text: String,
    pub color: String,
}

/// Attributes of one paragraph. The text itself lives in the document rope.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    kind: BlockType,
    info: Option<SceneInfo>,
    pub reviews: Vec<ReviewMark>,
    pub bookmark: Option<Bookmark>,
    pub(crate) suffix_len: usize,
    pub(crate) padding: bool,
}

impl Block {
    /// New block of `kind`; heading kinds get a fresh [`SceneInfo`].
    pub fn new(kind: BlockType) -> Self {
        Self {
            kind,
            info: kind.is_heading().then(SceneInfo::new),
            ..Self::default()
        }
    }

    pub(crate) fn padding() -> Self {
        Self {
            padding: true,
            ..Self::default()
        }
    }

    /// Block created by splitting `self`: same kind, no annotations.
    pub(crate) fn continuation(&self) -> Self {
        Self::new(self.kind)
    }

    pub fn kind(&self) -> BlockType {
        self.kind
    }

    /// Change the kind, creating or dropping heading info as needed.
    pub fn set_kind(&mut self, kind: BlockType) {
        self.kind = kind;
        if kind.is_heading() {
            if self.info.is_none() {
                self.info = Some(SceneInfo::new());
            }
        } else {
            self.info = None;
        }
    }

    pub fn info(&self) -> Option<&SceneInfo> {
        self.info.as_ref()
    }

    pub fn info_mut(&mut self) -> Option<&mut SceneInfo> {
        self.info.as_mut()
    }

    /// Replace heading info. Ignored for non-heading kinds.
    pub fn set_info(&mut self, info: SceneInfo) {
        if self.kind.is_heading() {
            self.info = Some(info);
        }
    }

    /// Decorative padding inserted by page-break correction.
    pub fn is_padding(&self) -> bool {
        self.padding
    }

    /// Length of the decorative suffix at the end of the block text.
    pub fn suffix_len(&self) -> usize {
        self.suffix_len
    }

    /// `true` for non-decorative blocks carrying real content.
    pub fn is_content(&self) -> bool {
        !self.padding
    }
}

pub(crate) mod marks {
    //! Review mark arithmetic for edits inside one block.

    use super::ReviewMark;

    fn adjust_for_removal(value: usize, from: usize, to: usize) -> usize {
        if value <= from {
            value
        } else if value >= to {
            value - (to - from)
        } else {
            from
        }
    }

    /// Shift marks for `count` characters inserted at `column`.
    pub(crate) fn insert(marks: &mut [ReviewMark], column: usize, count: usize) {
        for mark in marks.iter_mut() {
            let end = mark.end();
            if mark.start >= column {
                mark.start += count;
            }
            let new_end = if end > column { end + count } else { end };
            mark.length = new_end.saturating_sub(mark.start);
        }
    }

    /// Drop the characters `[from, to)` from every mark; empty marks vanish.
    pub(crate) fn remove(marks: &mut Vec<ReviewMark>, from: usize, to: usize) {
        if from >= to {
            return;
        }
        marks.retain_mut(|mark| {
            let start = adjust_for_removal(mark.start, from, to);
            let end = adjust_for_removal(mark.end(), from, to);
            mark.start = start;
            mark.length = end.saturating_sub(start);
            mark.length > 0
        });
    }

    /// Split at `column`: marks before it stay (clipped), the rest are
    /// returned rebased to column zero.
    pub(crate) fn split_off(marks: &mut Vec<ReviewMark>, column: usize) -> Vec<ReviewMark> {
        let mut tail = Vec::new();
        marks.retain_mut(|mark| {
            if mark.start >= column {
                let mut moved = mark.clone();
                moved.start -= column;
                tail.push(moved);
                return false;
            }
            if mark.end() > column {
                mark.length = column - mark.start;
            }
            mark.length > 0
        });
        tail
    }

    /// Keep the portion of each mark inside `[from, to)`, rebased to `from`.
    pub(crate) fn clip(marks: &[ReviewMark], from: usize, to: usize) -> Vec<ReviewMark> {
        marks
            .iter()
            .filter_map(|mark| {
                let start = mark.start.max(from);
                let end = mark.end().min(to);
                (end > start).then(|| ReviewMark {
                    start: start - from,
                    length: end - start,
                    ..mark.clone()
                })
            })
            .collect()
    }

    /// Append `extra` shifted right by `offset`.
    pub(crate) fn extend_shifted(
        marks: &mut Vec<ReviewMark>,
        extra: impl IntoIterator<Item = ReviewMark>,
        offset: usize,
    ) {
        marks.extend(extra.into_iter().map(|mut mark| {
            mark.start += offset;
            mark
        }));
    }
}
