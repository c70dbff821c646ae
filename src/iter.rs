//! Bucket-order, insertion-order and duplicate iterators over `HTable`.

use crate::compare::Comparator;
use crate::htable::{Handle, HTable};
use core::iter::FusedIterator;
use slotmap::DefaultKey;

/// Every entry, bucket by bucket, each chain head to tail.
pub struct Iter<'a, T, C> {
    table: &'a HTable<T, C>,
    pos: usize,
    next: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, T, C> Iterator for Iter<'a, T, C> {
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(k) = self.next {
                let e = &self.table.slots[k];
                self.next = e.chain_next;
                self.remaining -= 1;
                return Some((Handle::new(k), &e.payload));
            }
            if self.pos >= self.table.buckets.len() {
                return None;
            }
            self.next = self.table.buckets[self.pos];
            self.pos += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, C> ExactSizeIterator for Iter<'_, T, C> {}
impl<T, C> FusedIterator for Iter<'_, T, C> {}

/// One representative per populated bucket, in the order buckets were
/// first populated. The representative is the bucket's most recent entry;
/// reach the others with [`HTable::get_next`] or [`HTable::duplicates`].
pub struct OrderedIter<'a, T, C> {
    table: &'a HTable<T, C>,
    pos: Option<usize>,
}

impl<'a, T, C> Iterator for OrderedIter<'a, T, C> {
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let b = self.pos?;
        let Some(k) = self.table.buckets[b] else {
            self.pos = None;
            return None;
        };
        let e = &self.table.slots[k];
        self.pos = e.order_next;
        Some((Handle::new(k), &e.payload))
    }
}

impl<T, C> FusedIterator for OrderedIter<'_, T, C> {}

/// An entry followed by each later duplicate of its key.
pub struct Duplicates<'a, T, C> {
    table: &'a HTable<T, C>,
    next: Option<Handle>,
}

impl<'a, T, C> Iterator for Duplicates<'a, T, C>
where
    C: Comparator<T>,
{
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let h = self.next?;
        let table = self.table;
        let payload = table.payload(h)?;
        self.next = table.get_next(h);
        Some((h, payload))
    }
}

impl<T, C> FusedIterator for Duplicates<'_, T, C> where C: Comparator<T> {}

impl<T, C> HTable<T, C> {
    /// Iterate all entries in bucket order.
    pub fn iter(&self) -> Iter<'_, T, C> {
        Iter {
            table: self,
            pos: 0,
            next: None,
            remaining: self.len(),
        }
    }

    /// Iterate one representative per bucket in insertion order.
    pub fn iter_ordered(&self) -> OrderedIter<'_, T, C> {
        OrderedIter {
            table: self,
            pos: self.order_head,
        }
    }

    /// `h` itself, then every later entry with the same key, most recent first.
    pub fn duplicates(&self, h: Handle) -> Duplicates<'_, T, C> {
        Duplicates {
            table: self,
            next: Some(h),
        }
    }
}

impl<'a, T, C> IntoIterator for &'a HTable<T, C> {
    type Item = (Handle, &'a T);
    type IntoIter = Iter<'a, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
