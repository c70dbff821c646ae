//! HTable: chained buckets over a handle arena, with duplicate keys.
//!
//! Entries live in a `SlotMap`; the bucket array holds the handle of each
//! chain's head and every entry links to the next one in its chain. The
//! most recently inserted entry of a bucket is its head, so duplicates come
//! back most-recent-first.
//!
//! The head of each chain also carries the bucket's bookkeeping: its links
//! in the insertion-order list (see `order.rs`) and the number of entries in
//! the chain. A push onto an occupied bucket copies that bookkeeping from the
//! old head; a removal of the head hands it to the next entry.

use crate::bufhash::bufhash;
use crate::compare::{Comparator, KeyBytes};
use crate::config::TableConfig;
use crate::reentrancy::DebugReentrancy;
use core::cmp::Ordering;
use slotmap::{DefaultKey, SlotMap};

/// Stable reference to an entry. Stays valid across resizes and unrelated
/// removals; resolves to `None` once its entry is removed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Handle(k)
    }
    pub(crate) fn raw_handle(&self) -> DefaultKey {
        self.0
    }

    pub fn payload<'a, T, C>(&self, table: &'a HTable<T, C>) -> Option<&'a T> {
        table.payload(*self)
    }

    pub fn payload_mut<'a, T, C>(&self, table: &'a mut HTable<T, C>) -> Option<&'a mut T> {
        table.payload_mut(*self)
    }
}

#[derive(Debug)]
pub(crate) struct Entry<T> {
    pub(crate) payload: T,
    pub(crate) hash: u32,
    pub(crate) chain_next: Option<DefaultKey>,
    // Bucket bookkeeping; authoritative on the chain head only.
    pub(crate) order_prev: Option<usize>,
    pub(crate) order_next: Option<usize>,
    pub(crate) count: u32,
}

impl<T> Entry<T> {
    fn new(payload: T, hash: u32) -> Self {
        Self {
            payload,
            hash,
            chain_next: None,
            order_prev: None,
            order_next: None,
            count: 0,
        }
    }
}

/// Single-threaded chained hash table keyed by byte sequences.
///
/// Iterators borrow the table, so it cannot be mutated while one is alive.
pub struct HTable<T, C> {
    pub(crate) cmp: C,
    pub(crate) slots: SlotMap<DefaultKey, Entry<T>>,
    pub(crate) buckets: Vec<Option<DefaultKey>>,
    pub(crate) config: TableConfig,
    pub(crate) initial_size: usize,
    pub(crate) grow_mark: usize,
    pub(crate) shrink_mark: usize,
    pub(crate) order_head: Option<usize>,
    pub(crate) order_tail: Option<usize>,
    pub(crate) reentrancy: DebugReentrancy,
}

impl<T, C> HTable<T, C> {
    /// Table with the default geometry (64 buckets).
    pub fn new(cmp: C) -> Self {
        Self::with_config(cmp, TableConfig::default())
    }

    /// Table sized so that `size_hint` entries fit under the grow threshold.
    pub fn with_size_hint(cmp: C, size_hint: usize) -> Self {
        Self::with_config(cmp, TableConfig::with_size_hint(size_hint))
    }

    pub fn with_config(cmp: C, config: TableConfig) -> Self {
        let initial_size = config.initial_size();
        let mut table = Self {
            cmp,
            slots: SlotMap::with_key(),
            buckets: Vec::new(),
            config,
            initial_size,
            grow_mark: 0,
            shrink_mark: 0,
            order_head: None,
            order_tail: None,
            reentrancy: DebugReentrancy::new(),
        };
        table.alloc_buckets(initial_size);
        table
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of buckets; always a power of two.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }
    pub fn grow_mark(&self) -> usize {
        self.grow_mark
    }
    pub fn shrink_mark(&self) -> usize {
        self.shrink_mark
    }
    pub fn config(&self) -> &TableConfig {
        &self.config
    }
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// First bucket of the insertion-order list, `None` when empty.
    pub fn order_head(&self) -> Option<usize> {
        self.order_head
    }
    /// Last bucket of the insertion-order list, `None` when empty.
    pub fn order_tail(&self) -> Option<usize> {
        self.order_tail
    }

    #[inline]
    pub(crate) fn bucket(&self, hash: u32) -> usize {
        hash as usize & (self.buckets.len() - 1)
    }

    pub fn payload(&self, h: Handle) -> Option<&T> {
        self.slots.get(h.raw_handle()).map(|e| &e.payload)
    }

    pub fn payload_mut(&mut self, h: Handle) -> Option<&mut T> {
        self.slots.get_mut(h.raw_handle()).map(|e| &mut e.payload)
    }

    /// Digest stored for the entry at insertion.
    pub fn hash_of(&self, h: Handle) -> Option<u32> {
        self.slots.get(h.raw_handle()).map(|e| e.hash)
    }

    /// Bucket the entry currently lives in.
    pub fn bucket_of(&self, h: Handle) -> Option<usize> {
        self.hash_of(h).map(|hash| self.bucket(hash))
    }

    /// Number of entries chained in the entry's bucket, whatever their keys.
    pub fn chain_count(&self, h: Handle) -> Option<u32> {
        self.bucket_head(h).map(|e| e.count)
    }

    /// `(prev, next)` buckets around the entry's bucket in insertion order.
    pub fn order_links(&self, h: Handle) -> Option<(Option<usize>, Option<usize>)> {
        self.bucket_head(h).map(|e| (e.order_prev, e.order_next))
    }

    fn bucket_head(&self, h: Handle) -> Option<&Entry<T>> {
        let b = self.bucket_of(h)?;
        self.buckets[b].map(|k| &self.slots[k])
    }

    /// Link `k` (already in the arena) in as the head of its bucket.
    pub(crate) fn chain_in(&mut self, k: DefaultKey) {
        let b = self.bucket(self.slots[k].hash);
        let occupied = self.buckets[b];
        let (prev, next, count) = match occupied {
            Some(head) => {
                let head = &self.slots[head];
                (head.order_prev, head.order_next, head.count)
            }
            None => (None, None, 0),
        };
        let e = &mut self.slots[k];
        e.chain_next = occupied;
        e.order_prev = prev;
        e.order_next = next;
        e.count = count + 1;
        self.buckets[b] = Some(k);
        if occupied.is_none() {
            self.link_bucket(b);
        }
    }

    /// Unlink `k` from bucket `b`, where `prev` is its chain predecessor.
    fn unchain(&mut self, b: usize, prev: Option<DefaultKey>, k: DefaultKey) -> Option<T> {
        let entry = self.slots.remove(k)?;
        match prev {
            Some(p) => {
                self.slots[p].chain_next = entry.chain_next;
                if let Some(head) = self.buckets[b] {
                    self.slots[head].count -= 1;
                }
            }
            None => {
                self.buckets[b] = entry.chain_next;
                match entry.chain_next {
                    Some(n) => {
                        let heir = &mut self.slots[n];
                        heir.order_prev = entry.order_prev;
                        heir.order_next = entry.order_next;
                        heir.count = entry.count - 1;
                    }
                    None => self.unlink_bucket(entry.order_prev, entry.order_next),
                }
            }
        }
        Some(entry.payload)
    }

    /// Remove exactly the entry behind `h`, leaving its duplicates in place.
    pub fn remove_handle(&mut self, h: Handle) -> Option<T> {
        let _g = self.reentrancy.enter("remove_handle");
        let k = h.raw_handle();
        let b = self.bucket(self.slots.get(k)?.hash);
        let mut prev = None;
        let mut cur = self.buckets[b];
        while let Some(c) = cur {
            if c == k {
                let payload = self.unchain(b, prev, k);
                self.after_remove();
                return payload;
            }
            prev = cur;
            cur = self.slots[c].chain_next;
        }
        None
    }

    /// Drop every entry and return to the initial geometry. With
    /// `release_entries == false` the resident payloads are handed back in
    /// bucket order; otherwise they are dropped and the result is empty.
    pub fn teardown(&mut self, release_entries: bool) -> Vec<T> {
        let _g = self.reentrancy.enter("teardown");
        let mut kept = Vec::new();
        if !release_entries {
            kept.reserve(self.slots.len());
            for b in 0..self.buckets.len() {
                let mut cur = self.buckets[b];
                while let Some(k) = cur {
                    cur = self.slots[k].chain_next;
                    if let Some(e) = self.slots.remove(k) {
                        kept.push(e.payload);
                    }
                }
            }
        }
        self.slots.clear();
        self.order_head = None;
        self.order_tail = None;
        self.alloc_buckets(self.initial_size);
        kept
    }
}

impl<T, C> HTable<T, C>
where
    T: KeyBytes,
{
    /// Insert unconditionally; an entry with an equal key may already exist.
    pub fn put(&mut self, payload: T) -> Handle {
        let _g = self.reentrancy.enter("put");
        let hash = bufhash(payload.key_bytes());
        let k = self.slots.insert(Entry::new(payload, hash));
        self.chain_in(k);
        self.after_insert();
        Handle::new(k)
    }
}

impl<T, C> HTable<T, C> {
    /// Equality: same hash, then the comparator. In debug builds an entry
    /// the comparator calls equal despite a different hash panics.
    ///
    /// A probe is never matched by address: it may borrow from a stored
    /// payload without carrying that payload's key.
    #[inline]
    fn entry_matches<Q>(&self, e: &Entry<T>, hash: u32, probe: &Q, kdata: Option<&C::KeyData>) -> bool
    where
        C: Comparator<T, Q>,
        Q: ?Sized,
    {
        if e.hash != hash {
            debug_assert!(
                self.cmp.compare(&e.payload, probe, kdata) != Ordering::Equal,
                "comparator reports equal keys whose hashes differ ({:#010x} vs {:#010x})",
                e.hash,
                hash
            );
            return false;
        }
        self.cmp.compare(&e.payload, probe, kdata) == Ordering::Equal
    }

    /// First chain entry of bucket `b` equal to the probe, with its predecessor.
    fn locate<Q>(
        &self,
        b: usize,
        hash: u32,
        probe: &Q,
        kdata: Option<&C::KeyData>,
    ) -> Option<(Option<DefaultKey>, DefaultKey)>
    where
        C: Comparator<T, Q>,
        Q: ?Sized,
    {
        let mut prev = None;
        let mut cur = self.buckets[b];
        while let Some(k) = cur {
            let e = &self.slots[k];
            if self.entry_matches(e, hash, probe, kdata) {
                return Some((prev, k));
            }
            prev = cur;
            cur = e.chain_next;
        }
        None
    }

    /// Most recently inserted entry equal to `probe`.
    pub fn get<Q>(&self, probe: &Q, kdata: Option<&C::KeyData>) -> Option<Handle>
    where
        C: Comparator<T, Q>,
        Q: ?Sized + KeyBytes,
    {
        let _g = self.reentrancy.enter("get");
        let hash = bufhash(probe.key_bytes());
        self.locate(self.bucket(hash), hash, probe, kdata)
            .map(|(_, k)| Handle::new(k))
    }

    pub fn contains<Q>(&self, probe: &Q, kdata: Option<&C::KeyData>) -> bool
    where
        C: Comparator<T, Q>,
        Q: ?Sized + KeyBytes,
    {
        self.get(probe, kdata).is_some()
    }

    /// Remove the most recently inserted entry equal to `probe`.
    pub fn remove<Q>(&mut self, probe: &Q, kdata: Option<&C::KeyData>) -> Option<T>
    where
        C: Comparator<T, Q>,
        Q: ?Sized + KeyBytes,
    {
        let _g = self.reentrancy.enter("remove");
        let hash = bufhash(probe.key_bytes());
        let b = self.bucket(hash);
        let (prev, k) = self.locate(b, hash, probe, kdata)?;
        let payload = self.unchain(b, prev, k);
        self.after_remove();
        payload
    }
}

impl<T, C> HTable<T, C>
where
    C: Comparator<T>,
{
    /// Next entry after `h` in its chain with a key equal to `h`'s.
    pub fn get_next(&self, h: Handle) -> Option<Handle> {
        let _g = self.reentrancy.enter("get_next");
        let start = self.slots.get(h.raw_handle())?;
        let mut cur = start.chain_next;
        while let Some(k) = cur {
            let e = &self.slots[k];
            // Two resident entries are identical exactly when their slot keys are.
            if k == h.raw_handle() || self.entry_matches(e, start.hash, &start.payload, None) {
                return Some(Handle::new(k));
            }
            cur = e.chain_next;
        }
        None
    }
}

impl<T, C> HTable<T, C>
where
    T: KeyBytes,
    C: Comparator<T>,
{
    /// Remove the entry equal to `payload`, if any, then insert `payload`.
    /// Returns the removed payload.
    pub fn replace(&mut self, payload: T) -> Option<T> {
        let _g = self.reentrancy.enter("replace");
        let hash = bufhash(payload.key_bytes());
        let b = self.bucket(hash);
        let old = match self.locate(b, hash, &payload, None) {
            Some((prev, k)) => {
                let old = self.unchain(b, prev, k);
                self.after_remove();
                old
            }
            None => None,
        };
        let k = self.slots.insert(Entry::new(payload, hash));
        self.chain_in(k);
        self.after_insert();
        old
    }
}

#[cfg(test)]
impl<T, C> HTable<T, C> {
    /// Panics unless every structural invariant holds.
    pub(crate) fn validate(&self) {
        use std::collections::HashSet;

        let size = self.buckets.len();
        assert!(size.is_power_of_two(), "bucket count {size} not a power of two");

        let mut live = 0usize;
        let mut populated = 0usize;
        for (b, head) in self.buckets.iter().enumerate() {
            let Some(head) = *head else { continue };
            populated += 1;
            let mut chain = 0u32;
            let mut cur = Some(head);
            while let Some(k) = cur {
                let e = &self.slots[k];
                assert_eq!(self.bucket(e.hash), b, "entry chained in the wrong bucket");
                chain += 1;
                cur = e.chain_next;
            }
            assert_eq!(self.slots[head].count, chain, "head count disagrees with chain length");
            live += chain as usize;
        }
        assert_eq!(live, self.slots.len(), "arena holds unchained entries");

        let mut seen = HashSet::new();
        let mut prev = None;
        let mut pos = self.order_head;
        while let Some(b) = pos {
            assert!(seen.insert(b), "order list revisits bucket {b}");
            let head = self.buckets[b].expect("order list names an empty bucket");
            let e = &self.slots[head];
            assert_eq!(e.order_prev, prev, "order_prev mismatch at bucket {b}");
            prev = Some(b);
            pos = e.order_next;
        }
        assert_eq!(prev, self.order_tail, "order tail mismatch");
        assert_eq!(seen.len(), populated, "order list misses populated buckets");
    }
}
