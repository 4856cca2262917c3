//! Canonical XML output: one unit per line, text in CDATA, attributes in a
//! fixed order and only when non-default.

use crate::constants::{
    REVIEWS_TAG, REVIEW_COMMENT_TAG, REVIEW_TAG, SCRIPT_TAG, SCRIPT_XML_VERSION, VALUE_TAG,
};
use crate::document::{Block, ReviewMark};
use crate::error::SyncError;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

pub(crate) struct ScriptWriter {
    writer: Writer<Vec<u8>>,
}

fn bool_attr(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

impl ScriptWriter {
    /// Start a document: declaration and the opening root element.
    pub(crate) fn begin() -> Result<Self, SyncError> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
        writer.write_event(Event::Text(BytesText::new("\n")))?;
        let mut root = BytesStart::new(SCRIPT_TAG);
        root.push_attribute(("version", SCRIPT_XML_VERSION));
        writer.write_event(Event::Start(root))?;
        writer.write_event(Event::Text(BytesText::new("\n")))?;
        Ok(Self { writer })
    }

    pub(crate) fn unit(
        &mut self,
        block: &Block,
        reviews: &[ReviewMark],
        text: &str,
    ) -> Result<(), SyncError> {
        let tag = block.kind().tag();
        let mut start = BytesStart::new(tag);
        if let Some(info) = block.info() {
            start.push_attribute(("uuid", info.uuid.as_str()));
            for (key, value) in [
                ("colors", info.colors.as_str()),
                ("title", info.title.as_str()),
                ("description", info.description.as_str()),
                ("stamp", info.stamp.as_str()),
                ("number", info.number.as_str()),
            ] {
                if !value.is_empty() {
                    start.push_attribute((key, value));
                }
            }
            if info.fixed {
                start.push_attribute(("fixed", "true"));
            }
            if info.fix_nesting > 0 {
                start.push_attribute(("fix_nesting", info.fix_nesting.to_string().as_str()));
            }
            if info.number_suffix > 0 {
                start.push_attribute(("number_suffix", info.number_suffix.to_string().as_str()));
            }
        }
        if let Some(bookmark) = &block.bookmark {
            start.push_attribute(("bookmark", bookmark.text.as_str()));
            start.push_attribute(("bookmark_color", bookmark.color.as_str()));
        }
        self.writer.write_event(Event::Start(start))?;

        self.writer.write_event(Event::Start(BytesStart::new(VALUE_TAG)))?;
        self.cdata(text)?;
        self.writer.write_event(Event::End(BytesEnd::new(VALUE_TAG)))?;

        if !reviews.is_empty() {
            self.reviews(reviews)?;
        }

        self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
        self.writer.write_event(Event::Text(BytesText::new("\n")))?;
        Ok(())
    }

    /// CDATA cannot contain `]]>`, so split around every occurrence.
    fn cdata(&mut self, text: &str) -> Result<(), SyncError> {
        let parts: Vec<&str> = text.split("]]>").collect();
        let last = parts.len() - 1;
        for (index, part) in parts.iter().enumerate() {
            let mut chunk = String::with_capacity(part.len() + 3);
            if index > 0 {
                chunk.push('>');
            }
            chunk.push_str(part);
            if index < last {
                chunk.push_str("]]");
            }
            self.writer
                .write_event(Event::CData(BytesCData::new(chunk)))?;
        }
        Ok(())
    }

    fn reviews(&mut self, reviews: &[ReviewMark]) -> Result<(), SyncError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(REVIEWS_TAG)))?;
        for mark in reviews {
            let mut element = BytesStart::new(REVIEW_TAG);
            element.push_attribute(("from", mark.start.to_string().as_str()));
            element.push_attribute(("length", mark.length.to_string().as_str()));
            element.push_attribute(("color", mark.color.as_str()));
            element.push_attribute(("done", bool_attr(mark.done)));
            if mark.comments.is_empty() {
                self.writer.write_event(Event::Empty(element))?;
                continue;
            }
            self.writer.write_event(Event::Start(element))?;
            for comment in &mark.comments {
                let mut entry = BytesStart::new(REVIEW_COMMENT_TAG);
                entry.push_attribute(("author", comment.author.as_str()));
                entry.push_attribute(("date", comment.date.as_str()));
                entry.push_attribute(("text", comment.text.as_str()));
                self.writer.write_event(Event::Empty(entry))?;
            }
            self.writer
                .write_event(Event::End(BytesEnd::new(REVIEW_TAG)))?;
        }
        self.writer
            .write_event(Event::End(BytesEnd::new(REVIEWS_TAG)))?;
        Ok(())
    }

    /// Close the root element and return the document.
    pub(crate) fn finish(mut self) -> Result<String, SyncError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(SCRIPT_TAG)))?;
        self.writer.write_event(Event::Text(BytesText::new("\n")))?;
        Ok(String::from_utf8(self.writer.into_inner())?)
    }
}
