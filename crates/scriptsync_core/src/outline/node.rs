//! Outline element data: scenes, folders, and the scenario root.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};
use unicode_segmentation::UnicodeSegmentation;

/// Kind of outline element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    #[default]
    Undefined,
    Scene,
    Folder,
    Scenario,
}

/// Word and character statistics for a span of text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub words: usize,
    pub characters_with_spaces: usize,
    pub characters_without_spaces: usize,
}

impl Counter {
    /// Count words (Unicode word boundaries) and characters in `text`.
    pub fn from_text(text: &str) -> Self {
        let mut with_spaces = 0;
        let mut without_spaces = 0;
        for ch in text.chars() {
            with_spaces += 1;
            if !ch.is_whitespace() {
                without_spaces += 1;
            }
        }
        Self {
            words: text.unicode_words().count(),
            characters_with_spaces: with_spaces,
            characters_without_spaces: without_spaces,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `self - old + new`, saturating at zero.
    pub(crate) fn replaced(self, old: Counter, new: Counter) -> Counter {
        Counter {
            words: (self.words + new.words).saturating_sub(old.words),
            characters_with_spaces: (self.characters_with_spaces + new.characters_with_spaces)
                .saturating_sub(old.characters_with_spaces),
            characters_without_spaces: (self.characters_without_spaces
                + new.characters_without_spaces)
                .saturating_sub(old.characters_without_spaces),
        }
    }
}

impl Add for Counter {
    type Output = Counter;

    fn add(self, rhs: Counter) -> Counter {
        Counter {
            words: self.words + rhs.words,
            characters_with_spaces: self.characters_with_spaces + rhs.characters_with_spaces,
            characters_without_spaces: self.characters_without_spaces
                + rhs.characters_without_spaces,
        }
    }
}

impl AddAssign for Counter {
    fn add_assign(&mut self, rhs: Counter) {
        *self = *self + rhs;
    }
}

macro_rules! text_setter {
    ($(#[$doc:meta])* $setter:ident, $field:ident) => {
        $(#[$doc])*
        pub fn $setter(&mut self, value: impl Into<String>) -> bool {
            let value = value.into();
            if self.$field == value {
                return false;
            }
            self.$field = value;
            true
        }
    };
}

macro_rules! copy_setter {
    ($setter:ident, $field:ident, $ty:ty) => {
        pub fn $setter(&mut self, value: $ty) -> bool {
            if self.$field == value {
                return false;
            }
            self.$field = value;
            true
        }
    };
}

/// One element of the outline tree.
///
/// Setters return `true` only when the stored value actually changed.
/// Duration and counter live on the tree, which propagates them to ancestors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutlineNode {
    uuid: String,
    position: usize,
    length: usize,
    scene_number: String,
    fixed: bool,
    fix_nesting: u32,
    number_suffix: u32,
    header: String,
    footer: String,
    colors: String,
    stamp: String,
    name: String,
    description: String,
    text: String,
    full_text: String,
    has_note: bool,
    kind: ElementKind,
    pub(super) duration: f64,
    pub(super) counter: Counter,
}

impl OutlineNode {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }
    pub fn position(&self) -> usize {
        self.position
    }
    pub fn length(&self) -> usize {
        self.length
    }
    /// `position + length`.
    pub fn end_position(&self) -> usize {
        self.position + self.length
    }
    pub fn scene_number(&self) -> &str {
        &self.scene_number
    }
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }
    pub fn fix_nesting(&self) -> u32 {
        self.fix_nesting
    }
    pub fn number_suffix(&self) -> u32 {
        self.number_suffix
    }
    pub fn header(&self) -> &str {
        &self.header
    }
    pub fn footer(&self) -> &str {
        &self.footer
    }
    pub fn colors(&self) -> &str {
        &self.colors
    }
    pub fn stamp(&self) -> &str {
        &self.stamp
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    /// Short body text.
    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn full_text(&self) -> &str {
        &self.full_text
    }
    pub fn has_note(&self) -> bool {
        self.has_note
    }
    pub fn kind(&self) -> ElementKind {
        self.kind
    }
    /// Duration in seconds; for folders and the root, the sum over children.
    pub fn duration(&self) -> f64 {
        self.duration
    }
    pub fn counter(&self) -> Counter {
        self.counter
    }

    text_setter!(set_uuid, uuid);
    text_setter!(set_scene_number, scene_number);
    text_setter!(set_header, header);
    text_setter!(set_footer, footer);
    text_setter!(set_colors, colors);
    text_setter!(set_stamp, stamp);
    text_setter!(set_name, name);
    text_setter!(set_description, description);
    text_setter!(
        /// Short body text shown in outline views.
        set_text,
        text
    );
    text_setter!(set_full_text, full_text);
    copy_setter!(set_position, position, usize);
    copy_setter!(set_length, length, usize);
    copy_setter!(set_fixed, fixed, bool);
    copy_setter!(set_fix_nesting, fix_nesting, u32);
    copy_setter!(set_number_suffix, number_suffix, u32);
    copy_setter!(set_has_note, has_note, bool);

    /// Change the element kind. A real change clears header and footer.
    pub fn set_kind(&mut self, kind: ElementKind) -> bool {
        if self.kind == kind {
            return false;
        }
        self.kind = kind;
        self.header.clear();
        self.footer.clear();
        true
    }
}
