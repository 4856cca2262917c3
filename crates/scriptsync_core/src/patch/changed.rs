//! Unit-granular changed region between two XML snapshots.

use crate::error::SyncError;
use crate::text::{byte_offset, char_len};
use crate::xml::{self, XmlUnit};
use std::ops::Range;

/// A unit plus its exact source text, compared during trimming.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentUnit {
    pub unit: XmlUnit,
    pub raw: String,
}

impl FragmentUnit {
    fn new(unit: XmlUnit, source: &str) -> Self {
        let raw = unit.raw(source).to_string();
        Self { unit, raw }
    }

    pub fn text_len(&self) -> usize {
        char_len(&self.unit.text)
    }

    /// Drop text and review marks, keeping the unit as a position slot.
    pub(crate) fn blank(&mut self) {
        self.unit.text.clear();
        self.unit.block.reviews.clear();
        self.raw.clear();
    }
}

/// The units that must be replaced (`before`) and their replacement
/// (`after`), anchored in the plain-text projection of the old document.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeSet {
    pub before: Vec<FragmentUnit>,
    pub after: Vec<FragmentUnit>,
    pub plain_position: usize,
    pub plain_length: usize,
}

fn plain_extent(units: &[XmlUnit], range: &Range<usize>) -> (usize, usize) {
    let position = units[..range.start]
        .iter()
        .map(|unit| char_len(&unit.text) + 1)
        .sum();
    let texts: usize = units[range.clone()]
        .iter()
        .map(|unit| char_len(&unit.text))
        .sum();
    (position, texts + range.len().saturating_sub(1))
}

impl ChangeSet {
    /// Region of `old_xml` covered by `old_span` (chars), expanded to whole
    /// units, and the matching units of `new_xml`.
    ///
    /// # Errors
    /// Propagates XML parse failures of either snapshot.
    pub fn between(
        old_xml: &str,
        new_xml: &str,
        old_span: Range<usize>,
    ) -> Result<Self, SyncError> {
        let old_units = xml::parse_units(old_xml)?;
        let new_units = xml::parse_units(new_xml)?;
        let start = byte_offset(old_xml, old_span.start);
        let end = byte_offset(old_xml, old_span.end);

        let first = old_units.iter().position(|unit| unit.span.end >= start);
        let last = old_units.iter().rposition(|unit| unit.span.start <= end);
        let mut old_range = match (first, last) {
            (Some(first), Some(last)) if first <= last => first..last + 1,
            _ => 0..old_units.len(),
        };
        let trailing = old_units.len() - old_range.end;
        let mut new_range =
            old_range.start.min(new_units.len())..new_units.len().saturating_sub(trailing);
        if new_range.end < new_range.start {
            old_range = 0..old_units.len();
            new_range = 0..new_units.len();
        }

        // Whole units removed: widen by one shared neighbour so the
        // replacement always carries a unit to land on.
        if new_range.is_empty() {
            if old_range.end < old_units.len() && new_range.end < new_units.len() {
                old_range.end += 1;
                new_range.end += 1;
            } else if old_range.start > 0 && new_range.start > 0 {
                old_range.start -= 1;
                new_range.start -= 1;
            }
        }

        Ok(Self::from_ranges(
            old_xml, new_xml, old_units, new_units, old_range, new_range,
        ))
    }

    /// Every unit of both snapshots: the untrimmed, whole-document region.
    pub fn whole(old_xml: &str, new_xml: &str) -> Result<Self, SyncError> {
        let old_units = xml::parse_units(old_xml)?;
        let new_units = xml::parse_units(new_xml)?;
        let old_range = 0..old_units.len();
        let new_range = 0..new_units.len();
        Ok(Self::from_ranges(
            old_xml, new_xml, old_units, new_units, old_range, new_range,
        ))
    }

    fn from_ranges(
        old_xml: &str,
        new_xml: &str,
        old_units: Vec<XmlUnit>,
        new_units: Vec<XmlUnit>,
        old_range: Range<usize>,
        new_range: Range<usize>,
    ) -> Self {
        let (plain_position, plain_length) = plain_extent(&old_units, &old_range);
        let before = old_units
            .into_iter()
            .skip(old_range.start)
            .take(old_range.len())
            .map(|unit| FragmentUnit::new(unit, old_xml))
            .collect();
        let after = new_units
            .into_iter()
            .skip(new_range.start)
            .take(new_range.len())
            .map(|unit| FragmentUnit::new(unit, new_xml))
            .collect();
        Self {
            before,
            after,
            plain_position,
            plain_length,
        }
    }

    /// Replacement units, ready for insertion into the document.
    pub fn after_units(&self) -> Vec<XmlUnit> {
        self.after.iter().map(|unit| unit.unit.clone()).collect()
    }
}

/// Char span of `old` that differs from `new`: everything between their
/// common prefix and common suffix. `None` when the texts are equal.
pub fn differing_span(old: &str, new: &str) -> Option<Range<usize>> {
    if old == new {
        return None;
    }
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();
    let prefix = old_chars
        .iter()
        .zip(&new_chars)
        .take_while(|(a, b)| a == b)
        .count();
    let room = old_chars.len().min(new_chars.len()) - prefix;
    let suffix = old_chars
        .iter()
        .rev()
        .zip(new_chars.iter().rev())
        .take(room)
        .take_while(|(a, b)| a == b)
        .count();
    Some(prefix..old_chars.len() - suffix)
}
