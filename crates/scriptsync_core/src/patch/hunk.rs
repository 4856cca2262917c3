//! Character-level hunks and their textual patch format.
//!
//! Coordinates are char indices. The text form follows the classic
//! diff-match-patch layout:
//!
//! ```text
//! @@ -12,6 +12,9 @@
//!  room
//! -DAY
//! +NIGHT
//! ```
//!
//! with every line body percent-encoded so embedded newlines survive.

use crate::constants::{DIFF_TIMEOUT_MS, PATCH_MARGIN};
use crate::error::SyncError;
use similar::{Algorithm, DiffTag, TextDiff};
use std::fmt::{self, Write as _};
use std::ops::Range;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffOp {
    Equal,
    Delete,
    Insert,
}

impl DiffOp {
    fn sign(self) -> char {
        match self {
            Self::Equal => ' ',
            Self::Delete => '-',
            Self::Insert => '+',
        }
    }

    fn from_sign(sign: char) -> Option<Self> {
        match sign {
            ' ' => Some(Self::Equal),
            '-' => Some(Self::Delete),
            '+' => Some(Self::Insert),
            _ => None,
        }
    }
}

/// One contiguous group of edits with surrounding context.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Hunk {
    pub start1: usize,
    pub length1: usize,
    pub start2: usize,
    pub length2: usize,
    pub diffs: Vec<(DiffOp, String)>,
}

impl Hunk {
    /// Text this hunk expects to find (context plus deletions).
    pub fn old_text(&self) -> String {
        self.collect(DiffOp::Delete)
    }

    /// Text this hunk leaves behind (context plus insertions).
    pub fn new_text(&self) -> String {
        self.collect(DiffOp::Insert)
    }

    fn collect(&self, side: DiffOp) -> String {
        self.diffs
            .iter()
            .filter(|(op, _)| *op == DiffOp::Equal || *op == side)
            .map(|(_, text)| text.as_str())
            .collect()
    }
}

fn coords(start: usize, length: usize) -> String {
    match length {
        0 => format!("{},0", start),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, length),
    }
}

fn parse_coords(text: &str) -> Result<(usize, usize), SyncError> {
    let invalid = || SyncError::InvalidPatch(format!("bad hunk coordinates '{}'", text));
    let (start, length) = match text.split_once(',') {
        Some((start, length)) => (
            start.parse::<usize>().map_err(|_| invalid())?,
            length.parse::<usize>().map_err(|_| invalid())?,
        ),
        None => (text.parse::<usize>().map_err(|_| invalid())?, 1),
    };
    if length == 0 {
        Ok((start, 0))
    } else {
        Ok((start.checked_sub(1).ok_or_else(invalid)?, length))
    }
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "@@ -{} +{} @@",
            coords(self.start1, self.length1),
            coords(self.start2, self.length2)
        )?;
        for (op, text) in &self.diffs {
            writeln!(f, "{}{}", op.sign(), encode_uri(text))?;
        }
        Ok(())
    }
}

fn is_uri_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b" -_.!~*'();/?:@&=+$,#".contains(&byte)
}

pub(crate) fn encode_uri(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        if is_uri_safe(byte) {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{:02X}", byte);
        }
    }
    out
}

pub(crate) fn decode_uri(text: &str) -> Result<String, SyncError> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' {
            let byte = text
                .get(index + 1..index + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| {
                    SyncError::InvalidPatch(format!("bad escape at byte {} of '{}'", index, text))
                })?;
            out.push(byte);
            index += 3;
        } else {
            out.push(bytes[index]);
            index += 1;
        }
    }
    Ok(String::from_utf8(out)?)
}

/// Parse the textual form of a hunk list.
pub fn parse_hunks(text: &str) -> Result<Vec<Hunk>, SyncError> {
    let mut hunks: Vec<Hunk> = Vec::new();
    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix("@@ -") {
            let body = header
                .strip_suffix(" @@")
                .ok_or_else(|| SyncError::InvalidPatch(format!("bad hunk header '{}'", line)))?;
            let (old, new) = body
                .split_once(" +")
                .ok_or_else(|| SyncError::InvalidPatch(format!("bad hunk header '{}'", line)))?;
            let (start1, length1) = parse_coords(old)?;
            let (start2, length2) = parse_coords(new)?;
            hunks.push(Hunk {
                start1,
                length1,
                start2,
                length2,
                diffs: Vec::new(),
            });
            continue;
        }
        let mut chars = line.chars();
        let op = chars
            .next()
            .and_then(DiffOp::from_sign)
            .ok_or_else(|| SyncError::InvalidPatch(format!("bad diff line '{}'", line)))?;
        let hunk = hunks
            .last_mut()
            .ok_or_else(|| SyncError::InvalidPatch("diff line before any hunk header".into()))?;
        hunk.diffs.push((op, decode_uri(chars.as_str())?));
    }
    Ok(hunks)
}

/// Diff `old` into `new` and group the edits into hunks with context.
pub fn make_hunks(old: &str, new: &str) -> Vec<Hunk> {
    if old == new {
        return Vec::new();
    }
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();
    let text = |chars: &[char], range: Range<usize>| chars[range].iter().collect::<String>();

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .timeout(Duration::from_millis(DIFF_TIMEOUT_MS))
        .diff_chars(old, new);

    let mut hunks = Vec::new();
    for group in diff.grouped_ops(PATCH_MARGIN) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let mut hunk = Hunk {
            start1: first.old_range().start,
            length1: last.old_range().end - first.old_range().start,
            start2: first.new_range().start,
            length2: last.new_range().end - first.new_range().start,
            diffs: Vec::with_capacity(group.len()),
        };
        for op in &group {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => hunk.diffs.push((DiffOp::Equal, text(&old_chars, old_range))),
                DiffTag::Delete => hunk.diffs.push((DiffOp::Delete, text(&old_chars, old_range))),
                DiffTag::Insert => hunk.diffs.push((DiffOp::Insert, text(&new_chars, new_range))),
                DiffTag::Replace => {
                    hunk.diffs.push((DiffOp::Delete, text(&old_chars, old_range)));
                    hunk.diffs.push((DiffOp::Insert, text(&new_chars, new_range)));
                }
            }
        }
        if hunk.diffs.iter().any(|(op, _)| *op != DiffOp::Equal) {
            hunks.push(hunk);
        }
    }
    hunks
}

/// Result of applying hunks to a text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    pub text: String,
    /// Char span touched by the hunks, in the input text.
    pub old_span: Option<Range<usize>>,
    /// Char span touched by the hunks, in the output text.
    pub new_span: Option<Range<usize>>,
}

fn locate(haystack: &[char], needle: &[char], expected: usize) -> Option<usize> {
    let expected = expected.min(haystack.len());
    if needle.is_empty() {
        return Some(expected);
    }
    if haystack.get(expected..expected + needle.len()) == Some(needle) {
        return Some(expected);
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle)
        .map(|(index, _)| index)
        .min_by_key(|index| index.abs_diff(expected))
}

fn widen(span: &mut Option<Range<usize>>, start: usize, end: usize) {
    *span = Some(match span.take() {
        Some(current) => current.start.min(start)..current.end.max(end),
        None => start..end,
    });
}

/// Apply `hunks` in order. Every hunk must match exactly, or nothing is
/// returned.
///
/// # Errors
/// [`SyncError::PatchMismatch`] naming the first hunk whose context was not
/// found.
pub fn apply_hunks(hunks: &[Hunk], text: &str) -> Result<Applied, SyncError> {
    let mut chars: Vec<char> = text.chars().collect();
    let mut drift = 0isize;
    let mut shift = 0isize;
    let mut old_span = None;
    let mut new_span = None;

    for (index, hunk) in hunks.iter().enumerate() {
        let old: Vec<char> = hunk.old_text().chars().collect();
        let new: Vec<char> = hunk.new_text().chars().collect();
        let expected = hunk.start2.saturating_add_signed(drift);
        let found =
            locate(&chars, &old, expected).ok_or(SyncError::PatchMismatch { hunk: index })?;
        drift = found as isize - hunk.start2 as isize;

        let old_start = found.saturating_add_signed(-shift);
        widen(&mut old_span, old_start, old_start + old.len());
        widen(&mut new_span, found, found + new.len());
        shift += new.len() as isize - old.len() as isize;

        chars.splice(found..found + old.len(), new);
    }

    Ok(Applied {
        text: chars.into_iter().collect(),
        old_span,
        new_span,
    })
}
