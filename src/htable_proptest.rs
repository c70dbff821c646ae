#![cfg(test)]

// Property tests for HTable kept inside the crate so they can assert the
// structural invariants through `validate`.

use crate::compare::{Comparator, KeyBytes};
use crate::config::TableConfig;
use crate::htable::{HTable, Handle};
use core::cmp::Ordering;
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
struct Item {
    key: Vec<u8>,
    val: i32,
}

impl KeyBytes for Item {
    fn key_bytes(&self) -> &[u8] {
        &self.key
    }
}

#[derive(Clone, Copy, Default)]
struct ItemCmp;

impl Comparator<Item> for ItemCmp {
    type KeyData = ();
    fn compare(&self, stored: &Item, probe: &Item, _: Option<&()>) -> Ordering {
        stored.key.cmp(&probe.key)
    }
}

impl Comparator<Item, [u8]> for ItemCmp {
    type KeyData = ();
    fn compare(&self, stored: &Item, probe: &[u8], _: Option<&()>) -> Ordering {
        stored.key.as_slice().cmp(probe)
    }
}

// Pool-indexed operations so shrinking moves toward earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    Replace(usize, i32),
    Remove(usize),
    RemoveOldest(usize),
    Get(usize),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Vec<u8>>, Vec<Op>)> {
    proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..6), 1..=90).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Replace(i, v)),
            3 => idx.clone().prop_map(Op::Remove),
            1 => idx.clone().prop_map(Op::RemoveOldest),
            2 => idx.clone().prop_map(Op::Get),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..400).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn values(t: &HTable<Item, ItemCmp>, key: &[u8]) -> Vec<i32> {
    match t.get(key, None) {
        Some(h) => t.duplicates(h).map(|(_, e)| e.val).collect(),
        None => Vec::new(),
    }
}

// Property: state-machine equivalence against a HashMap of value stacks.
// Invariants exercised across random operation sequences:
// - Duplicates come back most-recent-first via get/get_next.
// - remove takes the most recent value; remove_handle takes exactly one.
// - replace swaps the most recent value and reports it.
// - Both iterators agree with the model: bucket order sees every value,
//   insertion order sees one representative per populated bucket.
// - validate() holds after every step, across grows and shrinks.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let config = TableConfig::builder().resize_bits(1).build().unwrap();
        let mut sut: HTable<Item, ItemCmp> = HTable::with_config(ItemCmp, config);
        // Values per key, oldest first.
        let mut model: HashMap<Vec<u8>, Vec<i32>> = HashMap::new();

        for op in ops {
            match op {
                Op::Put(i, v) => {
                    let key = pool[i].clone();
                    sut.put(Item { key: key.clone(), val: v });
                    model.entry(key).or_default().push(v);
                }
                Op::Replace(i, v) => {
                    let key = pool[i].clone();
                    let old = sut.replace(Item { key: key.clone(), val: v });
                    let stack = model.entry(key.clone()).or_default();
                    let expected = stack.pop();
                    stack.push(v);
                    prop_assert_eq!(old.map(|e| e.val), expected);
                }
                Op::Remove(i) => {
                    let key = &pool[i];
                    let got = sut.remove(key.as_slice(), None).map(|e| e.val);
                    let expected = model.get_mut(key).and_then(|s| s.pop());
                    prop_assert_eq!(got, expected);
                }
                Op::RemoveOldest(i) => {
                    let key = &pool[i];
                    let oldest: Option<Handle> = sut
                        .get(key.as_slice(), None)
                        .and_then(|h| sut.duplicates(h).last().map(|(h, _)| h));
                    let expected = model.get_mut(key).and_then(|s| {
                        if s.is_empty() { None } else { Some(s.remove(0)) }
                    });
                    let got = oldest.and_then(|h| sut.remove_handle(h)).map(|e| e.val);
                    prop_assert_eq!(got, expected);
                }
                Op::Get(i) => {
                    let key = &pool[i];
                    let mut expected = model.get(key).cloned().unwrap_or_default();
                    expected.reverse();
                    prop_assert_eq!(values(&sut, key), expected);
                }
                Op::Iterate => {
                    let mut seen: Vec<(Vec<u8>, i32)> =
                        sut.iter().map(|(_, e)| (e.key.clone(), e.val)).collect();
                    let mut all: Vec<(Vec<u8>, i32)> = model
                        .iter()
                        .flat_map(|(k, vs)| vs.iter().map(move |v| (k.clone(), *v)))
                        .collect();
                    seen.sort();
                    all.sort();
                    prop_assert_eq!(seen, all);

                    let reps = sut.iter_ordered().count();
                    let populated = (0..sut.capacity()).filter(|&b| sut.buckets[b].is_some()).count();
                    prop_assert_eq!(reps, populated);
                }
            }

            sut.validate();
            let live: usize = model.values().map(Vec::len).sum();
            prop_assert_eq!(sut.len(), live);
            prop_assert_eq!(sut.is_empty(), live == 0);
        }

        // Every surviving key still resolves to its full value stack.
        for (key, stack) in &model {
            let mut expected = stack.clone();
            expected.reverse();
            prop_assert_eq!(values(&sut, key), expected);
        }
    }
}

// Property: bucket-order iteration visits each entry exactly once, and the
// table never leaves its power-of-two geometry, whatever the insert volume.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_bulk_insert_then_drain(n in 0usize..600, dup_every in 1usize..8) {
        let mut t: HTable<Item, ItemCmp> = HTable::new(ItemCmp);
        for i in 0..n {
            let key = format!("k{}", i / dup_every).into_bytes();
            t.put(Item { key, val: i as i32 });
        }
        prop_assert_eq!(t.iter().count(), n);
        prop_assert!(t.capacity().is_power_of_two());
        t.validate();

        let mut removed = 0;
        for i in 0..n {
            let key = format!("k{}", i / dup_every).into_bytes();
            if t.remove(key.as_slice(), None).is_some() {
                removed += 1;
            }
        }
        prop_assert_eq!(removed, n);
        prop_assert!(t.is_empty());
        prop_assert_eq!(t.capacity(), 64);
        prop_assert_eq!(t.order_head(), None);
        t.validate();
    }
}
