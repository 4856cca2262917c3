use super::*;

fn document_with(lines: &[(BlockType, &str)]) -> ScriptDocument {
    let mut doc = ScriptDocument::new();
    let units = lines
        .iter()
        .map(|(kind, text)| FragmentBlock {
            block: Block::new(*kind),
            text: text.to_string(),
        })
        .collect();
    doc.insert_fragment(0, units);
    doc.take_change();
    doc
}

fn kinds(doc: &ScriptDocument) -> Vec<BlockType> {
    doc.blocks().iter().map(Block::kind).collect()
}

#[test]
fn new_document_has_one_empty_block() {
    let doc = ScriptDocument::new();
    assert!(doc.is_empty());
    assert_eq!(doc.block_count(), 1);
    assert_eq!(doc.plain_text(), "");
}

#[test]
fn fragment_into_empty_document_adopts_first_unit() {
    let doc = document_with(&[
        (BlockType::SceneHeading, "INT. ROOM - DAY"),
        (BlockType::Action, "Rain."),
    ]);
    assert_eq!(doc.text(), "INT. ROOM - DAY\nRain.");
    assert_eq!(kinds(&doc), vec![BlockType::SceneHeading, BlockType::Action]);
    assert!(doc.block(0).and_then(Block::info).is_some());
}

#[test]
fn newline_insert_splits_block_and_inherits_kind() {
    let mut doc = document_with(&[(BlockType::Action, "hello world")]);
    let change = doc.insert_text(5, "\nthere\n");
    assert_eq!(change, ContentsChange::new(5, 0, 7));
    assert_eq!(doc.text(), "hello\nthere\n world");
    assert_eq!(doc.block_count(), 3);
    assert!(kinds(&doc).iter().all(|kind| *kind == BlockType::Action));
    let outcome = doc.take_change().expect("change recorded");
    assert!(outcome.structural);
}

#[test]
fn carriage_returns_are_normalized() {
    let mut doc = ScriptDocument::new();
    doc.insert_text(0, "a\r\nb\rc");
    assert_eq!(doc.text(), "a\nb\nc");
    assert_eq!(doc.block_count(), 3);
}

#[test]
fn removal_across_blocks_keeps_first_block_attributes() {
    let mut doc = document_with(&[
        (BlockType::Character, "BOB"),
        (BlockType::Dialogue, "Hi there"),
    ]);
    doc.remove_text(2, 5);
    assert_eq!(doc.text(), "BOthere");
    assert_eq!(kinds(&doc), vec![BlockType::Character]);
}

#[test]
fn review_marks_follow_split_and_merge() {
    let mut doc = document_with(&[(BlockType::Action, "abcdefgh")]);
    assert!(doc.add_review_mark(
        0,
        ReviewMark {
            start: 5,
            length: 2,
            color: "#00ff00".to_string(),
            ..ReviewMark::default()
        }
    ));
    doc.insert_text(3, "\n");
    assert!(doc.block(0).expect("head").reviews.is_empty());
    let tail = &doc.block(1).expect("tail").reviews;
    assert_eq!((tail[0].start, tail[0].length), (2, 2));

    doc.remove_text(3, 1);
    let merged = &doc.block(0).expect("merged").reviews;
    assert_eq!((merged[0].start, merged[0].length), (5, 2));
}

#[test]
fn edit_block_coalesces_changes() {
    let mut doc = document_with(&[(BlockType::Action, "abcdef")]);
    doc.begin_edit_block();
    doc.insert_text(4, "XY");
    doc.begin_edit_block();
    doc.remove_text(1, 2);
    assert!(doc.end_edit_block().is_none());
    let outcome = doc.end_edit_block().expect("outer close reports");
    assert_eq!(outcome.change, ContentsChange::new(1, 3, 3));
    assert!(!outcome.structural);
    assert_eq!(doc.text(), "adXYef");
}

#[test]
fn fragment_splits_block_and_moves_tail() {
    let mut doc = document_with(&[(BlockType::Action, "startend")]);
    doc.insert_fragment(
        5,
        vec![
            FragmentBlock {
                block: Block::new(BlockType::Character),
                text: "-mid".to_string(),
            },
            FragmentBlock {
                block: Block::new(BlockType::Dialogue),
                text: "line".to_string(),
            },
        ],
    );
    assert_eq!(doc.text(), "start-mid\nlineend");
    assert_eq!(kinds(&doc), vec![BlockType::Action, BlockType::Dialogue]);
}

#[test]
fn decorations_are_excluded_from_plain_text() {
    let mut doc = document_with(&[
        (BlockType::Character, "BOB"),
        (BlockType::Dialogue, "Hi."),
        (BlockType::Character, "BOB"),
    ]);
    doc.set_suffix(2, " (CONT'D)");
    doc.insert_padding(2);
    assert_eq!(doc.text(), "BOB\nHi.\n\nBOB (CONT'D)");
    assert_eq!(doc.plain_text(), "BOB\nHi.\nBOB");
    assert_eq!(doc.plain_len(), doc.plain_text().chars().count());
    assert_eq!(doc.decoration_spans(), vec![(8, 1), (12, 9)]);
    assert!(doc.take_change().is_none(), "decorations are not edits");

    doc.remove_padding(2);
    doc.set_suffix(2, "");
    assert_eq!(doc.text(), "BOB\nHi.\nBOB");
    assert!(doc.decoration_spans().is_empty());
}

#[test]
fn fragment_never_lands_inside_a_suffix() {
    let mut doc = document_with(&[(BlockType::Character, "BOB")]);
    doc.set_suffix(0, " (CONT'D)");
    doc.insert_fragment(
        7,
        vec![FragmentBlock {
            block: Block::new(BlockType::Character),
            text: "BY".to_string(),
        }],
    );
    assert_eq!(doc.text(), "BOBBY (CONT'D)");
    assert_eq!(doc.block(0).expect("block").suffix_len(), 9);
}

#[test]
fn bookmark_changes_alter_fingerprint() {
    let mut doc = document_with(&[(BlockType::Action, "text")]);
    let before = doc.annotation_fingerprint();
    assert!(doc.set_bookmark(
        0,
        Some(Bookmark {
            text: "look".to_string(),
            color: "#123456".to_string(),
        })
    ));
    let after = doc.annotation_fingerprint();
    assert_eq!(before.reviews, after.reviews);
    assert_ne!(before.bookmarks, after.bookmarks);
    assert!(!doc.set_bookmark(0, doc.block(0).and_then(|b| b.bookmark.clone())));
}
