mod common;

use chained_htable::{bufhash, Comparator, HTable, Handle, KeyBytes};
use std::cell::Cell;
use std::cmp::Ordering;
use std::rc::Rc;

/// A payload the way a document walker would store it: key, kind tag and
/// a value it owns.
#[derive(Debug)]
struct Node {
    name: String,
    kind: Kind,
    text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Text,
    Object,
}

impl KeyBytes for Node {
    fn key_bytes(&self) -> &[u8] {
        self.name.as_bytes()
    }
}

fn node(name: &str, kind: Kind, text: Option<&str>) -> Node {
    Node {
        name: name.to_string(),
        kind,
        text: text.map(str::to_string),
    }
}

/// Compares by name; counts calls so tests can see when it runs.
struct ByName {
    calls: Rc<Cell<usize>>,
}

impl Comparator<Node> for ByName {
    type KeyData = ();
    fn compare(&self, stored: &Node, probe: &Node, _: Option<&()>) -> Ordering {
        self.calls.set(self.calls.get() + 1);
        stored.name.cmp(&probe.name)
    }
}

impl Comparator<Node, str> for ByName {
    type KeyData = Kind;
    /// With key data, only entries of that kind match.
    fn compare(&self, stored: &Node, probe: &str, kind: Option<&Kind>) -> Ordering {
        self.calls.set(self.calls.get() + 1);
        match kind {
            Some(k) if *k != stored.kind => Ordering::Less,
            _ => stored.name.as_str().cmp(probe),
        }
    }
}

fn table() -> (HTable<Node, ByName>, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let t = HTable::new(ByName {
        calls: Rc::clone(&calls),
    });
    (t, calls)
}

#[test]
fn key_data_filters_by_kind() {
    common::init_logger();
    let (mut t, _) = table();
    t.put(node("item", Kind::Text, Some("a")));
    t.put(node("item", Kind::Object, None));

    let any = t.get("item", None).unwrap();
    assert_eq!(any.payload(&t).unwrap().kind, Kind::Object);
    let text = t.get("item", Some(&Kind::Text)).unwrap();
    assert_eq!(text.payload(&t).unwrap().text.as_deref(), Some("a"));

    let removed = t.remove("item", Some(&Kind::Text)).unwrap();
    assert_eq!(removed.kind, Kind::Text);
    assert!(t.get("item", Some(&Kind::Text)).is_none());
    assert_eq!(t.len(), 1);
}

#[test]
fn rehash_never_calls_the_comparator() {
    common::init_logger();
    let (mut t, calls) = table();
    for i in 0..500 {
        t.put(node(&format!("n{i}"), Kind::Text, None));
    }
    // Distinct keys, no lookups: only growth ran, and it must not compare.
    assert_eq!(calls.get(), 0);
    assert!(t.capacity() >= 1024);
}

#[test]
fn get_next_walks_same_key_only() {
    let (mut t, _) = table();
    let size = t.capacity();
    let target = bufhash(b"a") as usize & (size - 1);
    let neighbour = (0..)
        .map(|i| format!("c{i}"))
        .find(|k| bufhash(k.as_bytes()) as usize & (size - 1) == target)
        .unwrap();

    let first = t.put(node("a", Kind::Text, Some("1")));
    t.put(node(&neighbour, Kind::Text, None));
    let second = t.put(node("a", Kind::Text, Some("2")));

    assert_eq!(t.get("a", None), Some(second));
    assert_eq!(t.get_next(second), Some(first));
    assert_eq!(t.get_next(first), None);
    assert_eq!(t.chain_count(first), Some(3));
    assert_eq!(t.bucket_of(first), t.bucket_of(second));
}

#[test]
fn replace_hands_back_previous_entry() {
    let (mut t, _) = table();
    assert!(t.replace(node("cfg", Kind::Text, Some("old"))).is_none());
    let old = t.replace(node("cfg", Kind::Text, Some("new"))).unwrap();
    assert_eq!(old.text.as_deref(), Some("old"));
    let h = t.get("cfg", None).unwrap();
    assert_eq!(h.payload(&t).unwrap().text.as_deref(), Some("new"));
    assert_eq!(t.len(), 1);
}

#[test]
fn handles_survive_growth() {
    let (mut t, _) = table();
    let handles: Vec<Handle> = (0..300)
        .map(|i| t.put(node(&format!("h{i}"), Kind::Object, None)))
        .collect();
    for (i, h) in handles.iter().enumerate() {
        assert_eq!(h.payload(&t).unwrap().name, format!("h{i}"));
        assert_eq!(t.get(format!("h{i}").as_str(), None), Some(*h));
    }
}

#[test]
fn teardown_without_release_returns_entries() {
    let (mut t, _) = table();
    for i in 0..10 {
        t.put(node(&format!("t{i}"), Kind::Text, Some("x")));
    }
    let h = t.get("t3", None).unwrap();
    let back = t.teardown(false);
    assert_eq!(back.len(), 10);
    assert!(back.iter().any(|n| n.name == "t3"));
    assert!(t.is_empty());
    assert!(h.payload(&t).is_none());
    assert_eq!(t.iter().count(), 0);
}

#[test]
fn teardown_with_release_drops_entries() {
    struct Tracked {
        key: Vec<u8>,
        drops: Rc<Cell<usize>>,
    }
    impl KeyBytes for Tracked {
        fn key_bytes(&self) -> &[u8] {
            &self.key
        }
    }
    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    let drops = Rc::new(Cell::new(0));
    let mut t = HTable::new(|a: &Tracked, b: &Tracked| a.key.cmp(&b.key));
    for i in 0..20u8 {
        t.put(Tracked {
            key: vec![i],
            drops: Rc::clone(&drops),
        });
    }
    assert!(t.teardown(true).is_empty());
    assert_eq!(drops.get(), 20);
    assert!(t.is_empty());
    assert_eq!(t.iter_ordered().count(), 0);

    // The table is reusable afterwards.
    t.put(Tracked {
        key: b"again".to_vec(),
        drops: Rc::clone(&drops),
    });
    assert_eq!(t.len(), 1);
    drop(t);
    assert_eq!(drops.get(), 21);
}
