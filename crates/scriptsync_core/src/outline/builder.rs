//! Derive the outline from the document, fully or for a single scene.

use super::{Counter, ElementKind, NodeId, OutlineNode, OutlineTree};
use crate::config::Chronometry;
use crate::constants::OUTLINE_SHORT_TEXT_CHARS;
use crate::document::{BlockType, ContentsChange, ScriptDocument, SceneInfo};
use std::ops::Range;

/// Scene numbering with locked (fixed) numbers.
///
/// Unlocked scenes are numbered sequentially. A fixed scene keeps its stored
/// number; unlocked scenes after it get letter suffixes (`12A`, `12B`, ...)
/// until the next fixed scene.
#[derive(Debug, Default)]
pub struct SceneNumbering {
    next: u64,
    anchor: Option<(String, u32)>,
}

fn suffix_letters(mut index: u32) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let rem = ((index - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn leading_number(number: &str) -> Option<u64> {
    let digits: String = number.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

impl SceneNumbering {
    pub fn new() -> Self {
        Self {
            next: 1,
            anchor: None,
        }
    }

    /// Number for the next scene, with its letter-suffix index (0 for none).
    pub fn next_number(&mut self, info: Option<&SceneInfo>) -> (String, u32) {
        if let Some(info) = info.filter(|info| info.fixed && !info.number.is_empty()) {
            if let Some(value) = leading_number(&info.number) {
                self.next = value.saturating_add(1);
            }
            self.anchor = Some((info.number.clone(), 0));
            return (info.number.clone(), 0);
        }
        if let Some((base, suffix)) = self.anchor.as_mut() {
            *suffix += 1;
            return (format!("{}{}", base, suffix_letters(*suffix)), *suffix);
        }
        let number = self.next.to_string();
        self.next = self.next.saturating_add(1);
        (number, 0)
    }
}

fn closes_scene(kind: BlockType) -> bool {
    matches!(
        kind,
        BlockType::SceneHeading | BlockType::FolderHeader | BlockType::FolderFooter
    )
}

/// Block indices belonging to the scene headed by `heading`.
fn scene_extent(doc: &ScriptDocument, heading: usize) -> Range<usize> {
    let end = (heading + 1..doc.block_count())
        .find(|index| {
            doc.block(*index)
                .is_some_and(|block| block.is_content() && closes_scene(block.kind()))
        })
        .unwrap_or(doc.block_count());
    heading..end
}

/// Document end of the last content block in `blocks`.
fn content_end(doc: &ScriptDocument, blocks: Range<usize>) -> usize {
    blocks
        .rev()
        .find(|index| doc.block(*index).is_some_and(|block| block.is_content()))
        .map_or(0, |index| doc.block_range(index).end)
}

fn fill_scene(
    tree: &mut OutlineTree,
    doc: &ScriptDocument,
    id: NodeId,
    heading: usize,
    chronometry: &Chronometry,
) {
    let extent = scene_extent(doc, heading);
    let position = doc.block_start(heading);
    let end = content_end(doc, extent.clone()).max(position);
    let header = doc.block_content(heading);

    let mut counter = Counter::from_text(&header);
    let mut body = Vec::new();
    let mut has_note = false;
    for index in extent.start + 1..extent.end {
        let Some(block) = doc.block(index).filter(|block| block.is_content()) else {
            continue;
        };
        let content = doc.block_content(index);
        counter += Counter::from_text(&content);
        has_note |= block.kind() == BlockType::Note;
        body.push(content);
    }
    let full_text = body.join("\n");
    let short: String = body
        .join(" ")
        .chars()
        .take(OUTLINE_SHORT_TEXT_CHARS)
        .collect();
    let info = doc
        .block(heading)
        .and_then(|block| block.info())
        .cloned()
        .unwrap_or_default();

    if let Some(node) = tree.node_mut(id) {
        node.set_kind(ElementKind::Scene);
        node.set_uuid(info.uuid);
        node.set_position(position);
        node.set_length(end - position);
        node.set_header(header);
        node.set_name(info.title);
        node.set_description(info.description);
        node.set_colors(info.colors);
        node.set_stamp(info.stamp);
        node.set_fixed(info.fixed);
        node.set_fix_nesting(info.fix_nesting);
        node.set_text(short);
        node.set_full_text(full_text);
        node.set_has_note(has_note);
    }
    tree.set_counter(id, counter);
    tree.set_duration(id, chronometry.duration_for(counter.characters_with_spaces));
}

/// Rebuild the whole tree from `doc`.
///
/// Scenes nest inside the innermost open folder; a folder footer closes the
/// innermost folder. Text before the first heading belongs to no scene.
pub fn rebuild(tree: &mut OutlineTree, doc: &ScriptDocument, chronometry: &Chronometry) {
    tree.clear();
    let root = tree.root();
    if let Some(node) = tree.node_mut(root) {
        node.set_position(0);
        node.set_length(doc.len_chars());
    }

    let mut numbering = SceneNumbering::new();
    let mut folders: Vec<NodeId> = Vec::new();
    for index in 0..doc.block_count() {
        let Some(block) = doc.block(index).filter(|block| block.is_content()) else {
            continue;
        };
        let parent = folders.last().copied().unwrap_or(root);
        match block.kind() {
            BlockType::SceneHeading => {
                let (number, suffix) = numbering.next_number(block.info());
                let mut node = OutlineNode::new(ElementKind::Scene);
                node.set_scene_number(number);
                node.set_number_suffix(suffix);
                if let Some(id) = tree.append(parent, node) {
                    fill_scene(tree, doc, id, index, chronometry);
                }
            }
            BlockType::FolderHeader => {
                let info = block.info().cloned().unwrap_or_default();
                let mut node = OutlineNode::new(ElementKind::Folder);
                node.set_uuid(info.uuid);
                node.set_header(doc.block_content(index));
                node.set_name(info.title);
                node.set_description(info.description);
                node.set_colors(info.colors);
                node.set_stamp(info.stamp);
                let start = doc.block_start(index);
                node.set_position(start);
                node.set_length(doc.block_range(index).end - start);
                if let Some(id) = tree.append(parent, node) {
                    folders.push(id);
                }
            }
            BlockType::FolderFooter => {
                if let Some(folder) = folders.pop() {
                    let end = doc.block_range(index).end;
                    let footer = doc.block_content(index);
                    if let Some(node) = tree.node_mut(folder) {
                        node.set_footer(footer);
                        let start = node.position();
                        node.set_length(end - start);
                    }
                }
            }
            _ => {}
        }
    }

    // Unterminated folders run to the end of their last child.
    for folder in folders {
        let end = tree
            .children(folder)
            .last()
            .and_then(|child| tree.get(*child))
            .map(OutlineNode::end_position);
        if let (Some(end), Some(node)) = (end, tree.node_mut(folder)) {
            let start = node.position();
            node.set_length(end.max(start) - start);
        }
    }
}

/// Apply a single-block, non-structural change without a rebuild.
///
/// # Returns
/// `false` when the change cannot be handled incrementally; the caller must
/// rebuild.
pub fn sync_incremental(
    tree: &mut OutlineTree,
    doc: &ScriptDocument,
    change: ContentsChange,
    chronometry: &Chronometry,
) -> bool {
    let index = doc.block_index_at(change.position);
    let Some(block) = doc.block(index) else {
        return false;
    };
    if closes_scene(block.kind()) || !block.is_content() {
        return false;
    }

    tree.shift(change.position, change.delta());

    let id = tree.innermost_at(change.position);
    let Some(node) = tree.get(id) else {
        return false;
    };
    if node.kind() != ElementKind::Scene {
        // Text outside any scene only moves positions.
        return matches!(node.kind(), ElementKind::Scenario | ElementKind::Folder);
    }
    let heading = doc.block_index_at(node.position());
    let matches_heading = doc.block(heading).is_some_and(|block| {
        block.kind() == BlockType::SceneHeading
            && block.info().map(|info| info.uuid.as_str()) == Some(node.uuid())
    });
    if !matches_heading {
        return false;
    }
    fill_scene(tree, doc, id, heading, chronometry);
    true
}
