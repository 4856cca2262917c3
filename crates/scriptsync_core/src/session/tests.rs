use super::*;
use crate::document::{BlockType, Bookmark, ReviewMark};
use crate::history::{HistoryRecord, MemoryChangeStore, RedbChangeStore};
use crate::test_support::{setup_temp_store, TWO_SCENES_XML};
use std::cell::RefCell;
use std::rc::Rc;

fn session() -> ScriptSession {
    ScriptSession::new(Arc::new(MemoryChangeStore::new()), SessionOptions::default())
        .expect("session")
}

fn loaded(xml: &str) -> ScriptSession {
    let mut session = session();
    session.load(xml).expect("load");
    session
}

fn rewrite_block(session: &mut ScriptSession, index: usize, text: &str) {
    let start = session.document().block_start(index);
    let len = session.document().block_len(index);
    session.begin_edit_block();
    session.remove_text(start, len);
    session.insert_text(start, text);
    session.end_edit_block();
}

fn xml_of(session: &mut ScriptSession) -> String {
    session.update_snapshot().expect("snapshot");
    session.snapshot().xml.clone()
}

#[test]
fn new_session_holds_one_empty_heading() {
    let mut session = session();
    let doc = session.document();
    assert_eq!(doc.block_count(), 1);
    assert_eq!(doc.block(0).map(|b| b.kind()), Some(BlockType::SceneHeading));
    assert!(doc.text().is_empty());
    assert!(!session.has_unsaved_changes().expect("dirty"));
    assert!(!session.is_undo_available());
    assert_eq!(session.outline().child_count(session.outline().root()), 1);
}

#[test]
fn load_keeps_uuids_and_rejects_malformed_input() {
    let mut session = loaded(TWO_SCENES_XML);
    assert_eq!(xml_of(&mut session), TWO_SCENES_XML);
    assert!(session
        .outline()
        .find_by_uuid("22222222-2222-4222-8222-222222222222")
        .is_some());

    let err = session
        .load("<scenario><bogus/></scenario>")
        .expect_err("unknown unit");
    assert!(matches!(err, SyncError::MalformedXml(_)));
    assert_eq!(xml_of(&mut session), TWO_SCENES_XML);
}

#[test]
fn save_is_idempotent() {
    let mut session = session();
    session.insert_text(0, "INT. ROOM - DAY");
    assert!(session.has_unsaved_changes().expect("dirty"));

    assert!(session.save_changes().expect("first save").is_some());
    assert!(session.save_changes().expect("second save").is_none());
    assert_eq!(session.history().store().len().expect("len"), 1);
    assert!(!session.has_unsaved_changes().expect("clean"));
}

#[test]
fn insert_save_undo_redo_scenario() {
    let (store, _dir) = setup_temp_store();
    let store: Arc<RedbChangeStore> = Arc::new(store);
    let mut session =
        ScriptSession::new(store.clone(), SessionOptions::default()).expect("session");
    session.load("").expect("load empty");
    let empty_hash = session.snapshot().hash;

    session.insert_text(0, "INT. ROOM - DAY");
    session.save_changes().expect("save").expect("record");
    let scene_hash = session.snapshot().hash;
    assert_eq!(store.len().expect("len"), 1);
    assert_eq!(session.history().stack().undo_len(), 1);

    assert_eq!(session.undo().expect("undo"), Some(0));
    assert_eq!(session.document().text(), "");
    assert_eq!(session.snapshot().hash, empty_hash);
    assert_eq!(session.history().stack().redo_len(), 1);
    assert_eq!(session.history().stack().undo_len(), 0);
    assert_eq!(store.len().expect("len"), 2);

    assert_eq!(session.redo().expect("redo"), Some(0));
    assert_eq!(session.document().text(), "INT. ROOM - DAY");
    assert_eq!(session.snapshot().hash, scene_hash);
    assert_eq!(session.history().stack().undo_len(), 1);
    assert_eq!(session.history().stack().redo_len(), 0);
    assert_eq!(store.len().expect("len"), 3);
}

#[test]
fn n_undos_and_redos_restore_hashes() {
    let mut session = loaded(TWO_SCENES_XML);
    let start = session.snapshot().hash;

    rewrite_block(&mut session, 1, "The kettle whistles.");
    session.save_changes().expect("save 1");
    let end = session.document().len_chars();
    session.insert_block(end, BlockType::Transition);
    let end = session.document().len_chars();
    session.insert_text(end, "CUT TO:");
    session.save_changes().expect("save 2");
    session.set_block_type(2, BlockType::Note);
    session.save_changes().expect("save 3");
    let start_of_second = session.document().block_start(4);
    session.remove_text(start_of_second, session.document().block_len(4) + 1);
    session.save_changes().expect("save 4");
    let finished = session.snapshot().hash;

    for _ in 0..4 {
        assert!(session.undo().expect("undo").is_some());
    }
    assert_eq!(session.snapshot().hash, start);
    assert_eq!(xml_of(&mut session), TWO_SCENES_XML);
    assert_eq!(session.undo().expect("empty undo"), None);

    for _ in 0..4 {
        assert!(session.redo().expect("redo").is_some());
    }
    assert_eq!(session.snapshot().hash, finished);
    assert_eq!(session.redo().expect("empty redo"), None);
}

#[test]
fn redo_after_new_edit_is_a_no_op() {
    let mut session = session();
    session.insert_text(0, "EXT. PIER");
    session.save_changes().expect("save");
    session.undo().expect("undo");
    assert!(session.is_redo_available());

    session.insert_text(0, "INT. BOAT");
    assert_eq!(session.redo().expect("redo"), None);
    assert!(!session.is_redo_available());
    assert_eq!(session.document().text(), "INT. BOAT");
}

#[test]
fn patch_from_another_session_replays_exactly() {
    let mut author = loaded(TWO_SCENES_XML);
    let mut reader = loaded(TWO_SCENES_XML);

    rewrite_block(&mut author, 5, "Snow on the grass.");
    let record = author.save_changes().expect("save").expect("record");

    let caret = reader.apply_patch(&record.redo_patch).expect("apply");
    assert_eq!(caret, reader.document().block_start(5));
    assert_eq!(xml_of(&mut reader), xml_of(&mut author));
    assert_eq!(reader.document().block_text(5), "Snow on the grass.");
    assert_eq!(reader.state(), PatchState::Idle);
    assert!(!reader.has_unsaved_changes().expect("clean"));
}

#[test]
fn mismatched_patch_leaves_document_alone() {
    let mut author = loaded(TWO_SCENES_XML);
    rewrite_block(&mut author, 5, "Snow on the grass.");
    let record = author.save_changes().expect("save").expect("record");

    let mut other = session();
    other.insert_text(0, "INT. ELSEWHERE");
    let before = xml_of(&mut other);
    let err = other
        .apply_patch(&record.redo_patch)
        .expect_err("context is absent");
    assert!(matches!(err, SyncError::PatchMismatch { .. }));
    assert_eq!(xml_of(&mut other), before);
    assert_eq!(other.state(), PatchState::Idle);
    assert!(other.is_undo_available());

    assert!(other.apply_patch("not base64 !").is_err());
    assert_eq!(xml_of(&mut other), before);
}

#[test]
fn batch_replay_reports_progress_and_matches_source() {
    let mut author = loaded(TWO_SCENES_XML);
    let mut records = Vec::new();
    rewrite_block(&mut author, 3, "Not again!");
    records.push(author.save_changes().expect("save").expect("record"));
    rewrite_block(&mut author, 0, "INT. KITCHEN - LATER");
    records.push(author.save_changes().expect("save").expect("record"));
    let end = author.document().len_chars();
    author.insert_text(end, "\nShe leaves.");
    records.push(author.save_changes().expect("save").expect("record"));

    let mut reader = loaded(TWO_SCENES_XML);
    let patches: Vec<String> = records.iter().map(|r| r.redo_patch.clone()).collect();
    let mut seen = Vec::new();
    reader
        .apply_patches_with_progress(&patches, |done, total| seen.push((done, total)))
        .expect("batch");
    assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(xml_of(&mut reader), xml_of(&mut author));
}

#[test]
fn remote_records_apply_once() {
    let mut author = loaded(TWO_SCENES_XML);
    rewrite_block(&mut author, 1, "Steam everywhere.");
    let first = author.save_changes().expect("save").expect("record");
    rewrite_block(&mut author, 4, "EXT. GARDEN - DUSK");
    let second = author.save_changes().expect("save").expect("record");

    let mut reader = loaded(TWO_SCENES_XML);
    let records = vec![first, second];
    assert_eq!(reader.apply_remote_changes(&records).expect("remote"), 2);
    assert_eq!(xml_of(&mut reader), xml_of(&mut author));
    assert_eq!(reader.history().store().len().expect("len"), 2);

    assert_eq!(reader.apply_remote_changes(&records).expect("again"), 0);
    assert_eq!(xml_of(&mut reader), xml_of(&mut author));
}

#[test]
fn failed_remote_batch_stores_nothing_and_can_be_retried() {
    let mut author = loaded(TWO_SCENES_XML);
    rewrite_block(&mut author, 1, "The kettle sighs.");
    let good = author.save_changes().expect("save").expect("record");
    let broken = HistoryRecord::new("mallory", String::new(), "not base64 !".to_string(), false);

    let mut reader = loaded(TWO_SCENES_XML);
    assert!(reader
        .apply_remote_changes(&[good.clone(), broken])
        .is_err());
    assert!(reader.history().store().is_empty().expect("empty"));
    assert_eq!(xml_of(&mut reader), TWO_SCENES_XML);

    let mut elsewhere = session();
    let err = elsewhere
        .apply_remote_changes(std::slice::from_ref(&good))
        .expect_err("wrong base");
    assert!(matches!(err, SyncError::PatchMismatch { .. }));
    assert!(!elsewhere
        .history()
        .store()
        .contains(&good.uuid)
        .expect("contains"));

    elsewhere.load(TWO_SCENES_XML).expect("load");
    assert_eq!(
        elsewhere
            .apply_remote_changes(std::slice::from_ref(&good))
            .expect("retry"),
        1
    );
    assert_eq!(xml_of(&mut elsewhere), xml_of(&mut author));
    assert!(elsewhere
        .history()
        .store()
        .contains(&good.uuid)
        .expect("contains"));
}

#[test]
fn mime_copy_paste_assigns_fresh_uuids() {
    let mut session = loaded(TWO_SCENES_XML);
    let second_scene = session.document().block_start(4);
    let end = session.document().len_chars();
    let copied = session.mime_from_selection(end, second_scene).expect("copy");
    assert_eq!(
        copied,
        session.mime_from_selection(second_scene, end).expect("copy")
    );
    assert!(copied.contains("22222222-2222-4222-8222-222222222222"));

    session.insert_block(end, BlockType::Action);
    let end = session.document().len_chars();
    session.insert_from_mime(end, &copied).expect("paste");

    let doc = session.document();
    assert_eq!(doc.block_count(), 8);
    assert_eq!(doc.block_text(6), "EXT. GARDEN - DAWN");
    let pasted = doc.block(6).and_then(|b| b.info()).expect("heading info");
    assert_ne!(pasted.uuid, "22222222-2222-4222-8222-222222222222");
    assert_eq!(session.outline().child_count(session.outline().root()), 3);

    assert!(session.insert_from_mime(0, "<scenario>").is_err());
    assert_eq!(session.document().block_count(), 8);
}

struct Events(Rc<RefCell<Vec<&'static str>>>);

impl DocumentObserver for Events {
    fn on_review_changed(&self) {
        self.0.borrow_mut().push("review");
    }

    fn on_bookmarks_changed(&self) {
        self.0.borrow_mut().push("bookmark");
    }
}

#[test]
fn annotation_changes_notify_observers() {
    let mut author = loaded(TWO_SCENES_XML);
    let mut reader = loaded(TWO_SCENES_XML);
    let events = Rc::new(RefCell::new(Vec::new()));
    reader.add_observer(Box::new(Events(events.clone())));

    reader.add_review_mark(
        1,
        ReviewMark {
            start: 4,
            length: 6,
            color: "#ffcc00".to_string(),
            ..ReviewMark::default()
        },
    );
    assert_eq!(events.borrow().as_slice(), &["review"]);
    reader.clear_review_marks(1);
    assert_eq!(events.borrow().as_slice(), &["review", "review"]);

    author.set_bookmark(
        2,
        Some(Bookmark {
            text: "first line".to_string(),
            color: "#00aaff".to_string(),
        }),
    );
    let record = author.save_changes().expect("save").expect("record");
    reader.apply_patch(&record.redo_patch).expect("apply");
    assert_eq!(events.borrow().as_slice(), &["review", "review", "bookmark"]);
    assert_eq!(
        reader.document().block(2).and_then(|b| b.bookmark.clone()),
        author.document().block(2).and_then(|b| b.bookmark.clone())
    );
}

const REPEATED_SPEAKER_XML: &str = r#"<?xml version="1.0"?>
<scenario version="1.0">
<scene_heading uuid="33333333-3333-4333-8333-333333333333"><v><![CDATA[INT. ROOM]]></v></scene_heading>
<character><v><![CDATA[MAYA]]></v></character>
<dialogue><v><![CDATA[Hi.]]></v></dialogue>
<character><v><![CDATA[MAYA]]></v></character>
<dialogue><v><![CDATA[Bye.]]></v></dialogue>
</scenario>
"#;

#[test]
fn decorations_stay_out_of_snapshots_and_patches() {
    let mut author = loaded(REPEATED_SPEAKER_XML);
    let mut reader = loaded(REPEATED_SPEAKER_XML);
    reader.set_correction_options(CorrectionOptions {
        character_names: true,
        ..CorrectionOptions::default()
    });
    assert_eq!(reader.document().block_text(3), "MAYA (CONT'D)");
    assert!(!reader.has_unsaved_changes().expect("decorations are not edits"));
    assert_eq!(xml_of(&mut reader), REPEATED_SPEAKER_XML);

    rewrite_block(&mut author, 4, "Later.");
    let record = author.save_changes().expect("save").expect("record");
    let caret = reader.apply_patch(&record.redo_patch).expect("apply");

    assert_eq!(caret, reader.document().block_start(4));
    assert_eq!(xml_of(&mut reader), xml_of(&mut author));
    assert_eq!(reader.document().block_text(3), "MAYA (CONT'D)");
    assert_eq!(reader.document().block_text(4), "Later.");
}

#[test]
fn outline_follows_edits() {
    let mut session = loaded(TWO_SCENES_XML);
    let root = session.outline().root();
    let before = session.outline().get(root).map(|n| n.counter()).expect("root");

    let end = session.document().len_chars();
    session.insert_text(end, " Birds flee.");
    let after = session.outline().get(root).map(|n| n.counter()).expect("root");
    assert_eq!(after.words, before.words + 2);

    let second = session.outline().child_at(root, 1).expect("second scene");
    let node = session.outline().get(second).expect("node");
    assert_eq!(node.end_position(), session.document().len_chars());
}

#[test]
fn load_accepts_the_largest_fixed_scene_number() {
    let xml = r#"<?xml version="1.0"?>
<scenario version="1.0">
<scene_heading uuid="44444444-4444-4444-8444-444444444444" number="18446744073709551615" fixed="true"><v><![CDATA[INT. VAULT]]></v></scene_heading>
<scene_heading uuid="55555555-5555-4555-8555-555555555555"><v><![CDATA[INT. HALL]]></v></scene_heading>
</scenario>
"#;
    let session = loaded(xml);
    let outline = session.outline();
    let number = |uuid: &str| {
        outline
            .find_by_uuid(uuid)
            .and_then(|id| outline.get(id))
            .map(|node| node.scene_number().to_string())
    };
    assert_eq!(
        number("44444444-4444-4444-8444-444444444444").as_deref(),
        Some("18446744073709551615")
    );
    assert_eq!(
        number("55555555-5555-4555-8555-555555555555").as_deref(),
        Some("18446744073709551615A")
    );
}

const PAGINATED_XML: &str = r#"<?xml version="1.0"?>
<scenario version="1.0">
<scene_heading uuid="66666666-6666-4666-8666-666666666666"><v><![CDATA[INT. ROOM]]></v></scene_heading>
<character><v><![CDATA[MAYA]]></v></character>
<dialogue><v><![CDATA[Hi.]]></v></dialogue>
<character><v><![CDATA[MAYA]]></v></character>
<dialogue><v><![CDATA[Bye.]]></v></dialogue>
<action><v><![CDATA[The door shuts.]]></v></action>
<scene_heading uuid="77777777-7777-4777-8777-777777777777"><v><![CDATA[EXT. YARD]]></v></scene_heading>
<character><v><![CDATA[OREN]]></v></character>
<dialogue><v><![CDATA[Gone.]]></v></dialogue>
<character><v><![CDATA[OREN]]></v></character>
</scenario>
"#;

#[test]
fn decorated_replay_keeps_the_trimmed_fast_path() {
    let corrections = CorrectionOptions {
        character_names: true,
        page_breaks: true,
        lines_per_page: 4,
    };
    let mut reader = ScriptSession::new(
        Arc::new(MemoryChangeStore::new()),
        SessionOptions {
            corrections,
            ..SessionOptions::default()
        },
    )
    .expect("session");
    reader.load(PAGINATED_XML).expect("load");
    assert!(reader.document().block_count() > 10);
    assert!(!reader.corrector().decorations().is_empty());
    let mut author = loaded(PAGINATED_XML);

    let edits: [&dyn Fn(&mut ScriptSession); 4] = [
        &|s: &mut ScriptSession| rewrite_block(s, 3, "MAYA (V.O.)"),
        &|s: &mut ScriptSession| rewrite_block(s, 2, "Hello there."),
        &|s: &mut ScriptSession| {
            let start = s.document().block_start(2) + s.document().block_len(2);
            let end = s.document().block_start(4) + s.document().block_len(4);
            s.remove_text(start, end - start);
        },
        &|s: &mut ScriptSession| {
            let end = s.document().len_chars();
            s.begin_edit_block();
            s.insert_block(end, BlockType::Character);
            let end = s.document().len_chars();
            s.insert_text(end, "OREN");
            s.end_edit_block();
        },
    ];
    for edit in edits {
        edit(&mut author);
        let record = author.save_changes().expect("save").expect("record");
        reader.apply_patch(&record.redo_patch).expect("apply");

        assert_eq!(xml_of(&mut reader), xml_of(&mut author));
        assert_eq!(reader.document().plain_text(), author.document().plain_text());
        let table: Vec<(usize, usize)> = reader
            .corrector()
            .decorations()
            .iter()
            .map(|d| (d.position, d.length))
            .collect();
        assert_eq!(table, reader.document().decoration_spans());
    }
    assert_eq!(reader.fallback_rebuilds(), 0);
    assert_eq!(reader.state(), PatchState::Idle);
}
