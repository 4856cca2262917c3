use super::*;
use crate::test_support::setup_temp_store;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn record(label: &str) -> HistoryRecord {
    HistoryRecord::new("tester", format!("undo-{}", label), format!("redo-{}", label), false)
}

#[test]
fn redb_store_appends_in_order_and_rejects_duplicates() {
    let (store, _dir) = setup_temp_store();
    assert!(store.is_empty().expect("empty"));

    let records: Vec<HistoryRecord> = (0..5).map(|i| record(&i.to_string())).collect();
    for entry in &records {
        store.append(entry).expect("append");
    }

    let err = store.append(&records[2]).expect_err("duplicate uuid");
    assert!(err.to_string().contains("already exists"));

    assert_eq!(store.len().expect("len"), 5);
    assert_eq!(store.all().expect("all"), records);
    assert_eq!(
        store.uuids().expect("uuids"),
        records.iter().map(|r| r.uuid.clone()).collect::<Vec<_>>()
    );
    assert_eq!(store.last(2).expect("last"), records[3..].to_vec());
    assert!(store.last(0).expect("last zero").is_empty());
    assert!(store.contains(&records[0].uuid).expect("contains"));
    assert_eq!(store.get("missing").expect("get"), None);
}

#[test]
fn redb_store_survives_reopen() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let path = dir.path().join("nested").join("history.redb");
    let entry = record("persisted");
    {
        let store = RedbChangeStore::new(&path).expect("create");
        store.append(&entry).expect("append");
    }
    let reopened = RedbChangeStore::new(&path).expect("reopen");
    assert_eq!(reopened.get(&entry.uuid).expect("get"), Some(entry));
}

#[test]
fn memory_store_matches_trait_contract() {
    let store = MemoryChangeStore::new();
    let first = record("a");
    let second = record("b");
    store.append(&first).expect("append");
    store.append(&second).expect("append");
    assert!(store.append(&first).is_err());
    assert_eq!(store.last(1).expect("last"), vec![second.clone()]);
    assert_eq!(store.last(10).expect("last").len(), 2);
    assert_eq!(store.len().expect("len"), 2);
}

#[test]
fn stack_evicts_oldest_past_limit() {
    let mut stack = UndoRedoStack::new(3);
    let records: Vec<HistoryRecord> = (0..5).map(|i| record(&i.to_string())).collect();
    let mut evicted = Vec::new();
    for entry in &records {
        if let Some(old) = stack.push_edit(entry.clone()) {
            evicted.push(old.uuid);
        }
    }
    assert_eq!(stack.undo_len(), 3);
    assert_eq!(evicted, vec![records[0].uuid.clone(), records[1].uuid.clone()]);
    assert_eq!(
        stack.undo_entries().map(|r| r.uuid.as_str()).collect::<Vec<_>>(),
        records[2..].iter().map(|r| r.uuid.as_str()).collect::<Vec<_>>()
    );
}

#[test]
fn fresh_edit_clears_redo() {
    let mut stack = UndoRedoStack::default();
    stack.push_redo(record("r"));
    stack.push_undo(record("u"));
    assert_eq!(stack.redo_len(), 1);
    stack.push_edit(record("e"));
    assert_eq!(stack.redo_len(), 0);
    assert_eq!(stack.undo_len(), 2);
    assert_eq!(stack.limit(), 50);
}

struct Recorder {
    events: Rc<RefCell<Vec<(&'static str, bool)>>>,
}

impl HistoryObserver for Recorder {
    fn on_undo_available_changed(&self, available: bool) {
        self.events.borrow_mut().push(("undo", available));
    }

    fn on_redo_available_changed(&self, available: bool) {
        self.events.borrow_mut().push(("redo", available));
    }
}

#[test]
fn manager_persists_commits_and_replays() {
    let store = Arc::new(MemoryChangeStore::new());
    let mut history = HistoryManager::new(store.clone(), "ann", 50);
    let events = Rc::new(RefCell::new(Vec::new()));
    history.add_observer(Box::new(Recorder {
        events: events.clone(),
    }));

    let committed = history
        .commit("undo-1".to_string(), "redo-1".to_string())
        .expect("commit");
    assert_eq!(committed.author, "ann");
    assert!(history.is_undo_available());
    assert_eq!(events.borrow().as_slice(), &[("undo", true)]);

    let taken = history.take_undo().expect("undo entry");
    assert_eq!(taken, committed);
    let inverse = history
        .record_replay(&taken, StackSide::Undo)
        .expect("replay");
    assert_eq!(inverse.undo_patch, "redo-1");
    assert_eq!(inverse.redo_patch, "undo-1");
    assert_ne!(inverse.uuid, taken.uuid);

    assert_eq!(store.len().expect("len"), 2);
    assert!(!history.is_undo_available());
    assert!(history.is_redo_available());
    assert_eq!(
        events.borrow().as_slice(),
        &[("undo", true), ("undo", false), ("redo", true)]
    );
}

#[test]
fn draft_flag_flows_into_records_and_inverses() {
    let store = Arc::new(MemoryChangeStore::new());
    let mut history = HistoryManager::new(store, "bob", 50);
    history.set_draft_mode(true);
    let committed = history
        .commit("u".to_string(), "r".to_string())
        .expect("commit");
    assert!(committed.is_draft);

    history.set_draft_mode(false);
    let inverse = history
        .record_replay(&committed, StackSide::Undo)
        .expect("replay");
    assert!(inverse.is_draft);
}

struct FailingStore;

impl ChangeStore for FailingStore {
    fn append(&self, _record: &HistoryRecord) -> Result<(), SyncError> {
        Err(SyncError::StorageMessage("disk full".to_string()))
    }

    fn get(&self, _uuid: &str) -> Result<Option<HistoryRecord>, SyncError> {
        Ok(None)
    }

    fn uuids(&self) -> Result<Vec<String>, SyncError> {
        Ok(Vec::new())
    }

    fn all(&self) -> Result<Vec<HistoryRecord>, SyncError> {
        Ok(Vec::new())
    }
}

#[test]
fn failed_append_leaves_stacks_untouched() {
    let mut history = HistoryManager::new(Arc::new(FailingStore), "cy", 50);
    let events = Rc::new(RefCell::new(Vec::new()));
    history.add_observer(Box::new(Recorder {
        events: events.clone(),
    }));

    let err = history
        .commit("u".to_string(), "r".to_string())
        .expect_err("store refuses");
    assert!(err.to_string().contains("disk full"));
    assert!(!history.is_undo_available());
    assert!(events.borrow().is_empty());
}

/// Accepts a fixed number of appends, then fails.
struct LimitedStore {
    inner: MemoryChangeStore,
    remaining: Cell<usize>,
}

impl ChangeStore for LimitedStore {
    fn append(&self, record: &HistoryRecord) -> Result<(), SyncError> {
        if self.remaining.get() == 0 {
            return Err(SyncError::StorageMessage("quota reached".to_string()));
        }
        self.remaining.set(self.remaining.get() - 1);
        self.inner.append(record)
    }

    fn get(&self, uuid: &str) -> Result<Option<HistoryRecord>, SyncError> {
        self.inner.get(uuid)
    }

    fn uuids(&self) -> Result<Vec<String>, SyncError> {
        self.inner.uuids()
    }

    fn all(&self) -> Result<Vec<HistoryRecord>, SyncError> {
        self.inner.all()
    }
}

#[test]
fn failed_replay_append_keeps_the_inverse_on_its_stack() {
    let store = Arc::new(LimitedStore {
        inner: MemoryChangeStore::new(),
        remaining: Cell::new(1),
    });
    let mut history = HistoryManager::new(store.clone(), "dee", 50);
    history
        .commit("undo-1".to_string(), "redo-1".to_string())
        .expect("commit");
    let taken = history.take_undo().expect("undo entry");

    let err = history
        .record_replay(&taken, StackSide::Undo)
        .expect_err("store refuses");
    assert!(err.to_string().contains("quota reached"));
    assert!(history.is_redo_available());
    let kept = history.stack().redo_entries().next().expect("inverse");
    assert_eq!(kept.undo_patch, "redo-1");
    assert_eq!(store.len().expect("len"), 1);
}
