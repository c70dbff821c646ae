//! ByteMap: owned byte keys mapped to values, duplicates allowed.
//!
//! The layer every consumer of `HTable` ends up writing: an entry holding a
//! copy of its key and a value, compared by raw key bytes.

use crate::compare::{ByteOrder, KeyBytes};
use crate::config::TableConfig;
use crate::htable::{Handle, HTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedEntry<V> {
    key: Box<[u8]>,
    value: V,
}

impl<V> KeyedEntry<V> {
    pub fn new(key: &[u8], value: V) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }
    pub fn value(&self) -> &V {
        &self.value
    }
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }
    pub fn into_parts(self) -> (Box<[u8]>, V) {
        (self.key, self.value)
    }
}

impl<V> KeyBytes for KeyedEntry<V> {
    #[inline]
    fn key_bytes(&self) -> &[u8] {
        &self.key
    }
}

pub struct ByteMap<V> {
    table: HTable<KeyedEntry<V>, ByteOrder>,
}

impl<V> Default for ByteMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ByteMap<V> {
    pub fn new() -> Self {
        Self {
            table: HTable::new(ByteOrder),
        }
    }

    pub fn with_size_hint(size_hint: usize) -> Self {
        Self {
            table: HTable::with_size_hint(ByteOrder, size_hint),
        }
    }

    pub fn with_config(config: TableConfig) -> Self {
        Self {
            table: HTable::with_config(ByteOrder, config),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The underlying table, for handle-level access.
    pub fn table(&self) -> &HTable<KeyedEntry<V>, ByteOrder> {
        &self.table
    }

    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.table.contains(key.as_ref(), None)
    }

    /// Most recently inserted value for `key`.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&V> {
        let h = self.table.get(key.as_ref(), None)?;
        self.table.payload(h).map(KeyedEntry::value)
    }

    pub fn get_mut(&mut self, key: impl AsRef<[u8]>) -> Option<&mut V> {
        let h = self.table.get(key.as_ref(), None)?;
        self.table.payload_mut(h).map(KeyedEntry::value_mut)
    }

    /// Every value stored under `key`, most recent first.
    pub fn get_all(&self, key: impl AsRef<[u8]>) -> Vec<&V> {
        match self.table.get(key.as_ref(), None) {
            Some(h) => self.table.duplicates(h).map(|(_, e)| e.value()).collect(),
            None => Vec::new(),
        }
    }

    /// Add a value under `key`, keeping any values already there.
    pub fn put(&mut self, key: impl AsRef<[u8]>, value: V) -> Handle {
        self.table.put(KeyedEntry::new(key.as_ref(), value))
    }

    /// Store `value` in place of the most recent value under `key`.
    pub fn replace(&mut self, key: impl AsRef<[u8]>, value: V) -> Option<V> {
        self.table
            .replace(KeyedEntry::new(key.as_ref(), value))
            .map(|old| old.value)
    }

    /// Remove the most recent value under `key`.
    pub fn remove(&mut self, key: impl AsRef<[u8]>) -> Option<V> {
        self.table.remove(key.as_ref(), None).map(|e| e.value)
    }

    /// All entries in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &V)> + '_ {
        self.table.iter().map(|(_, e)| (e.key(), e.value()))
    }

    /// The most recent entry of each bucket, in the order buckets filled up.
    pub fn iter_ordered(&self) -> impl Iterator<Item = (&[u8], &V)> + '_ {
        self.table.iter_ordered().map(|(_, e)| (e.key(), e.value()))
    }

    /// Like [`iter_ordered`](Self::iter_ordered), but each representative is
    /// followed by the older values stored under the same key.
    pub fn iter_ordered_grouped(&self) -> impl Iterator<Item = (&[u8], &V)> + '_ {
        self.table.iter_ordered().flat_map(move |(h, _)| {
            self.table
                .duplicates(h)
                .map(|(_, e)| (e.key(), e.value()))
        })
    }

    /// Empty the map, handing back every `(key, value)` in bucket order.
    pub fn into_entries(mut self) -> Vec<(Box<[u8]>, V)> {
        self.table
            .teardown(false)
            .into_iter()
            .map(KeyedEntry::into_parts)
            .collect()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.table.teardown(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: values come back by key; missing keys are absent.
    #[test]
    fn put_get_remove() {
        let mut m = ByteMap::new();
        m.put("foo", 1);
        m.put(b"bar", 2);
        assert_eq!(m.get("foo"), Some(&1));
        assert_eq!(m.get(b"bar".to_vec()), Some(&2));
        assert_eq!(m.get("baz"), None);
        assert_eq!(m.remove("foo"), Some(1));
        assert!(!m.contains_key("foo"));
        assert_eq!(m.len(), 1);
    }

    /// Invariant: `get_all` lists duplicates most recent first.
    #[test]
    fn get_all_most_recent_first() {
        let mut m = ByteMap::new();
        m.put("k", "v1");
        m.put("other", "x");
        m.put("k", "v2");
        assert_eq!(m.get_all("k"), [&"v2", &"v1"]);
        assert!(m.get_all("missing").is_empty());
    }

    /// Invariant: `replace` keeps a single value per key.
    #[test]
    fn replace_keeps_one_value() {
        let mut m = ByteMap::new();
        assert_eq!(m.replace("k", 1), None);
        assert_eq!(m.replace("k", 2), Some(1));
        assert_eq!(m.get_all("k"), [&2]);
    }

    #[test]
    fn get_mut_updates_latest() {
        let mut m = ByteMap::new();
        m.put("k", 1);
        m.put("k", 2);
        *m.get_mut("k").unwrap() += 40;
        assert_eq!(m.get_all("k"), [&42, &1]);
    }

    /// Invariant: keys are arbitrary bytes, including empty and non-UTF-8.
    #[test]
    fn binary_keys() {
        let mut m = ByteMap::new();
        m.put(b"", "empty");
        m.put([0xffu8, 0x00], "raw");
        assert_eq!(m.get(b""), Some(&"empty"));
        assert_eq!(m.get([0xffu8, 0x00]), Some(&"raw"));
        assert_eq!(m.get([0xffu8]), None);
    }

    /// Invariant: `into_entries` returns every stored pair; `clear` drops all.
    #[test]
    fn into_entries_and_clear() {
        let mut m = ByteMap::new();
        m.put("a", 1);
        m.put("a", 2);
        m.put("b", 3);
        let mut entries = m.into_entries();
        entries.sort();
        assert_eq!(
            entries,
            vec![
                (b"a".to_vec().into_boxed_slice(), 1),
                (b"a".to_vec().into_boxed_slice(), 2),
                (b"b".to_vec().into_boxed_slice(), 3),
            ]
        );

        let mut m = ByteMap::new();
        m.put("a", 1);
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.get("a"), None);
    }
}
