//! XML codec between the flat document and the canonical script XML.
//!
//! Serialization is canonical: the same document always yields the same
//! bytes, which is what makes content hashes and text patches meaningful.

mod reader;
mod writer;

use crate::document::{marks, Block, BlockType, ContentsChange, FragmentBlock, ScriptDocument};
use crate::error::SyncError;
use std::ops::Range;

use self::writer::ScriptWriter;

/// One parsed unit (block) of script XML.
#[derive(Clone, Debug, PartialEq)]
pub struct XmlUnit {
    /// Kind, heading info, reviews and bookmark carried by the unit.
    pub block: Block,
    pub text: String,
    /// Byte span of the whole element in the source XML.
    pub span: Range<usize>,
}

impl XmlUnit {
    /// Source text of the element.
    pub fn raw<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.span.clone()).unwrap_or_default()
    }
}

/// Serialize `doc`, or the part of it inside `range` (document positions).
///
/// Decorations are skipped; review marks are clipped to the range.
pub fn serialize(doc: &ScriptDocument, range: Option<Range<usize>>) -> Result<String, SyncError> {
    let (start, end) = match range {
        Some(range) => {
            let end = range.end.min(doc.len_chars());
            (range.start.min(end), end)
        }
        None => (0, doc.len_chars()),
    };
    let first = doc.block_index_at(start);
    let last = doc.block_index_at(end);

    let mut writer = ScriptWriter::begin()?;
    for index in first..=last {
        let Some(block) = doc.block(index).filter(|block| block.is_content()) else {
            continue;
        };
        let range = doc.block_range(index);
        let content_end = range.end - block.suffix_len().min(range.len());
        let from = start.clamp(range.start, content_end);
        let to = end.clamp(from, content_end);
        let text = doc.slice(from..to);
        let reviews = marks::clip(&block.reviews, from - range.start, to - range.start);
        writer.unit(block, &reviews, &text)?;
    }
    writer.finish()
}

/// Parse `xml` and insert its units into `doc` at `insert_at`.
///
/// With `rebuild_uuids`, every heading gets a fresh uuid (paste); otherwise
/// stored uuids are kept (load, patch replay).
///
/// # Errors
/// Malformed XML leaves the document untouched.
pub fn deserialize(
    doc: &mut ScriptDocument,
    xml: &str,
    insert_at: usize,
    rebuild_uuids: bool,
) -> Result<ContentsChange, SyncError> {
    let units = parse_units(xml)?;
    Ok(insert_units(doc, units, insert_at, rebuild_uuids))
}

/// Insert already-parsed units; see [`deserialize`].
pub fn insert_units(
    doc: &mut ScriptDocument,
    units: Vec<XmlUnit>,
    insert_at: usize,
    rebuild_uuids: bool,
) -> ContentsChange {
    let fragment = units
        .into_iter()
        .map(|unit| {
            let mut block = unit.block;
            if rebuild_uuids {
                if let Some(info) = block.info_mut() {
                    info.rebuild_uuid();
                }
            }
            FragmentBlock {
                block,
                text: unit.text,
            }
        })
        .collect();
    doc.insert_fragment(insert_at, fragment)
}

/// Parse every unit of `xml` with its source span.
pub fn parse_units(xml: &str) -> Result<Vec<XmlUnit>, SyncError> {
    reader::parse(xml)
}

/// Write units as a standalone script XML fragment.
pub fn write_units(units: &[XmlUnit]) -> Result<String, SyncError> {
    let mut writer = ScriptWriter::begin()?;
    for unit in units {
        writer.unit(&unit.block, &unit.block.reviews, &unit.text)?;
    }
    writer.finish()
}

/// XML of an empty script: a single empty scene heading.
pub fn default_script_xml() -> Result<String, SyncError> {
    let mut writer = ScriptWriter::begin()?;
    writer.unit(&Block::new(BlockType::SceneHeading), &[], "")?;
    writer.finish()
}
