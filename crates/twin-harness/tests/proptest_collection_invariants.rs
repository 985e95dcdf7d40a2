//! Property-based invariant tests for collection tracking.
//!
//! Drives a twin's collection through arbitrary operation sequences and
//! checks:
//!
//! 1. `current` never shares a twin with `deleted` or `to_destroy`
//! 2. `added` only holds twins that were current at some point
//! 3. `reorder` keeps the element set and tracking lists unchanged
//! 4. After save, `destroyed == to_destroy` and each destroy ran once
//! 5. A second save destroys nothing new

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use twin_core::ModelHandle;
use twin_core::prelude::*;
use twin_harness::fixtures::{album, album_schema, song};
use twin_harness::{Journal, Record};

// ── Helpers ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Append,
    Insert(usize),
    Delete(usize),
    Destroy(usize),
    Replace(usize),
    Reorder(usize, usize),
    Restore(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Append),
        any::<usize>().prop_map(Op::Insert),
        any::<usize>().prop_map(Op::Delete),
        any::<usize>().prop_map(Op::Destroy),
        any::<usize>().prop_map(Op::Replace),
        (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Reorder(a, b)),
        any::<usize>().prop_map(Op::Restore),
    ]
}

struct Harness {
    journal: Journal,
    twin: Twin,
    songs: Collection,
    records: Vec<Rc<RefCell<Record>>>,
    counter: usize,
}

impl Harness {
    fn new(seeded: usize) -> Self {
        let journal = Journal::new();
        let seeds: Vec<_> = (0..seeded)
            .map(|i| song(&format!("seed-{i}"), i as i64, &journal))
            .collect();
        let (_, model) = album(
            "Nice Try",
            seeds.iter().map(|(_, m)| m.clone()).collect(),
            &journal,
        );
        let twin = Twin::from_model(album_schema(), model).unwrap();
        let songs = twin.collection("songs").unwrap();
        let records = seeds.into_iter().map(|(record, _)| record).collect();
        Self {
            journal,
            twin,
            songs,
            records,
            counter: 0,
        }
    }

    fn fresh(&mut self) -> ModelHandle {
        self.counter += 1;
        let (record, model) = song(&format!("new-{}", self.counter), 0, &self.journal);
        self.records.push(record);
        model
    }

    fn record_for(&self, twin: &Twin) -> Option<Rc<RefCell<Record>>> {
        let model = twin.model()?;
        self.records
            .iter()
            .find(|record| ModelHandle::from(Rc::clone(record)) == model)
            .cloned()
    }

    fn apply(&mut self, op: &Op, ever_current: &mut Vec<Twin>) {
        let len = self.songs.len();
        match *op {
            Op::Append => {
                let model = self.fresh();
                ever_current.push(self.songs.append(model).unwrap());
            }
            Op::Insert(i) => {
                let model = self.fresh();
                ever_current.push(self.songs.insert(i % (len + 1), model).unwrap());
            }
            Op::Delete(i) if len > 0 => {
                let twin = self.songs.get(i % len).unwrap();
                assert!(self.songs.delete(&twin));
            }
            Op::Destroy(i) if len > 0 => {
                let twin = self.songs.get(i % len).unwrap();
                assert!(self.songs.destroy(&twin));
            }
            Op::Replace(i) if len > 0 => {
                let model = self.fresh();
                ever_current.push(self.songs.replace(i % len, model).unwrap());
            }
            Op::Reorder(a, b) if len > 0 => {
                let before_added = self.songs.added().len();
                self.songs.reorder(a % len, b % len).unwrap();
                assert_eq!(self.songs.len(), len);
                assert_eq!(self.songs.added().len(), before_added);
            }
            Op::Restore(i) => {
                let deleted = self.songs.deleted();
                if !deleted.is_empty() {
                    let twin = deleted[i % deleted.len()].clone();
                    ever_current.push(self.songs.append(&twin).unwrap());
                }
            }
            _ => {}
        }
    }
}

fn contains(list: &[Twin], twin: &Twin) -> bool {
    list.iter().any(|t| t.ptr_eq(twin))
}

// ═════════════════════════════════════════════════════════════════════════
// 1-3. Tracking invariants hold after every operation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn tracking_lists_stay_consistent(
        seeded in 0usize..4,
        ops in proptest::collection::vec(arb_op(), 0..40),
    ) {
        let mut harness = Harness::new(seeded);
        let mut ever_current = harness.songs.to_vec();

        for op in &ops {
            harness.apply(op, &mut ever_current);

            let current = harness.songs.to_vec();
            for twin in &current {
                prop_assert!(!harness.songs.is_deleted(twin), "{op:?}: current twin in deleted");
                prop_assert!(!contains(&harness.songs.to_destroy(), twin), "{op:?}: current twin in to_destroy");
            }
            for twin in harness.songs.added() {
                prop_assert!(contains(&ever_current, &twin), "{op:?}: added twin never current");
            }
            for twin in harness.songs.to_destroy() {
                prop_assert!(harness.songs.is_deleted(&twin), "{op:?}: destroyed twin not deleted");
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4-5. Save finalizes destroys exactly once
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn save_destroys_each_pending_twin_once(
        seeded in 0usize..4,
        ops in proptest::collection::vec(arb_op(), 0..30),
    ) {
        let mut harness = Harness::new(seeded);
        let mut ever_current = harness.songs.to_vec();
        for op in &ops {
            harness.apply(op, &mut ever_current);
        }

        let pending = harness.songs.to_destroy();
        harness.twin.save().unwrap();
        harness.twin.save().unwrap();

        let destroyed = harness.songs.destroyed();
        prop_assert_eq!(destroyed.len(), pending.len());
        for twin in &pending {
            prop_assert!(contains(&destroyed, twin));
            let record = harness.record_for(twin).unwrap();
            prop_assert_eq!(record.borrow().destroys(), 1);
        }
        prop_assert_eq!(harness.journal.of("destroy").len(), pending.len());
    }
}
