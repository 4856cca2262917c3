//! Streaming parse of script XML into units with their source spans.

use super::XmlUnit;
use crate::constants::{REVIEWS_TAG, REVIEW_COMMENT_TAG, REVIEW_TAG, SCRIPT_TAG, VALUE_TAG};
use crate::document::{Block, BlockType, Bookmark, ReviewComment, ReviewMark};
use crate::error::SyncError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

fn malformed(message: impl Into<String>) -> SyncError {
    SyncError::MalformedXml(message.into())
}

fn attributes(element: &BytesStart) -> Result<Vec<(Vec<u8>, String)>, SyncError> {
    let mut out = Vec::new();
    for attr in element.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.into_owned();
        out.push((attr.key.as_ref().to_vec(), value));
    }
    Ok(out)
}

fn parse_number<T: std::str::FromStr>(key: &[u8], value: &str) -> Result<T, SyncError> {
    value.trim().parse().map_err(|_| {
        malformed(format!(
            "attribute {} has invalid value '{}'",
            String::from_utf8_lossy(key),
            value
        ))
    })
}

fn unit_block(element: &BytesStart) -> Result<Block, SyncError> {
    let name = element.name();
    let kind = BlockType::from_tag(name.as_ref()).ok_or_else(|| {
        malformed(format!(
            "unknown element <{}>",
            String::from_utf8_lossy(name.as_ref())
        ))
    })?;
    let mut block = Block::new(kind);
    let mut info = block.info().cloned();
    let mut bookmark: Option<Bookmark> = None;
    for (key, value) in attributes(element)? {
        match (key.as_slice(), info.as_mut()) {
            (b"uuid", Some(info)) if !value.is_empty() => info.uuid = value,
            (b"colors", Some(info)) => info.colors = value,
            (b"title", Some(info)) => info.title = value,
            (b"description", Some(info)) => info.description = value,
            (b"stamp", Some(info)) => info.stamp = value,
            (b"number", Some(info)) => info.number = value,
            (b"fixed", Some(info)) => info.fixed = value == "true",
            (b"fix_nesting", Some(info)) => info.fix_nesting = parse_number(&key, &value)?,
            (b"number_suffix", Some(info)) => info.number_suffix = parse_number(&key, &value)?,
            (b"bookmark", _) => bookmark.get_or_insert_with(Bookmark::default).text = value,
            (b"bookmark_color", _) => {
                bookmark.get_or_insert_with(Bookmark::default).color = value
            }
            _ => {}
        }
    }
    if let Some(info) = info {
        block.set_info(info);
    }
    block.bookmark = bookmark;
    Ok(block)
}

fn review_mark(element: &BytesStart) -> Result<ReviewMark, SyncError> {
    let mut mark = ReviewMark::default();
    for (key, value) in attributes(element)? {
        match key.as_slice() {
            b"from" => mark.start = parse_number(&key, &value)?,
            b"length" => mark.length = parse_number(&key, &value)?,
            b"color" => mark.color = value,
            b"done" => mark.done = value == "true",
            _ => {}
        }
    }
    Ok(mark)
}

fn review_comment(element: &BytesStart) -> Result<ReviewComment, SyncError> {
    let mut comment = ReviewComment::default();
    for (key, value) in attributes(element)? {
        match key.as_slice() {
            b"author" => comment.author = value,
            b"date" => comment.date = value,
            b"text" => comment.text = value,
            _ => {}
        }
    }
    Ok(comment)
}

struct OpenUnit {
    block: Block,
    text: String,
    start: usize,
}

/// Parse every unit of `xml`.
///
/// # Errors
/// Returns [`SyncError::MalformedXml`] (or the underlying XML error) for a
/// missing root, unknown unit element, bad attribute, or broken nesting.
pub(crate) fn parse(xml: &str) -> Result<Vec<XmlUnit>, SyncError> {
    let mut reader = Reader::from_str(xml);
    let mut units = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut in_value = false;
    let mut in_reviews = false;
    let mut open: Option<OpenUnit> = None;

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader.read_event()?;
        let end = reader.buffer_position() as usize;
        match event {
            Event::Start(element) => {
                let name = element.name();
                let tag = name.as_ref();
                match depth {
                    0 if tag == SCRIPT_TAG.as_bytes() && !seen_root => seen_root = true,
                    0 => return Err(malformed("expected a single <scenario> root")),
                    1 => {
                        open = Some(OpenUnit {
                            block: unit_block(&element)?,
                            text: String::new(),
                            start,
                        })
                    }
                    2 if tag == VALUE_TAG.as_bytes() => in_value = true,
                    2 if tag == REVIEWS_TAG.as_bytes() => in_reviews = true,
                    3 if in_reviews && tag == REVIEW_TAG.as_bytes() => {
                        if let Some(unit) = open.as_mut() {
                            unit.block.reviews.push(review_mark(&element)?);
                        }
                    }
                    _ => {}
                }
                depth += 1;
            }
            Event::Empty(element) => {
                let name = element.name();
                let tag = name.as_ref();
                match depth {
                    0 if tag == SCRIPT_TAG.as_bytes() && !seen_root => seen_root = true,
                    0 => return Err(malformed("expected a single <scenario> root")),
                    1 => units.push(XmlUnit {
                        block: unit_block(&element)?,
                        text: String::new(),
                        span: start..end,
                    }),
                    3 if in_reviews && tag == REVIEW_TAG.as_bytes() => {
                        if let Some(unit) = open.as_mut() {
                            unit.block.reviews.push(review_mark(&element)?);
                        }
                    }
                    4 if in_reviews && tag == REVIEW_COMMENT_TAG.as_bytes() => {
                        let comment = review_comment(&element)?;
                        if let Some(mark) = open
                            .as_mut()
                            .and_then(|unit| unit.block.reviews.last_mut())
                        {
                            mark.comments.push(comment);
                        }
                    }
                    _ => {}
                }
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| malformed("unexpected closing tag"))?;
                match depth {
                    1 => {
                        if let Some(unit) = open.take() {
                            units.push(XmlUnit {
                                block: unit.block,
                                text: unit.text,
                                span: unit.start..end,
                            });
                        }
                    }
                    2 => {
                        in_value = false;
                        in_reviews = false;
                    }
                    _ => {}
                }
            }
            Event::CData(data) if in_value && depth == 3 => {
                let chunk = std::str::from_utf8(&data)
                    .map_err(|err| malformed(format!("unit text is not UTF-8: {}", err)))?;
                if let Some(unit) = open.as_mut() {
                    unit.text.push_str(chunk);
                }
            }
            Event::Text(data) if in_value && depth == 3 => {
                let chunk = std::str::from_utf8(&data)
                    .map_err(|err| malformed(format!("unit text is not UTF-8: {}", err)))?;
                if let Some(unit) = open.as_mut() {
                    unit.text.push_str(chunk);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(malformed("missing <scenario> root"));
    }
    if depth != 0 {
        return Err(malformed("unclosed element at end of input"));
    }
    Ok(units)
}
