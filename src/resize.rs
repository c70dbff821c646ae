//! Grow/shrink policy and full rehash.
//!
//! Both directions rebuild the bucket array at the new size and re-chain
//! every entry from its stored hash; no comparator or `KeyBytes` call is
//! made. Buckets are replayed in their old insertion order and each chain
//! oldest-first, so duplicates stay most-recent-first and each new bucket
//! is ranked by the old bucket its first re-chained entry came from.

use crate::config::ResizeTrigger;
use crate::htable::HTable;
use log::debug;
use slotmap::DefaultKey;

impl<T, C> HTable<T, C> {
    /// Install an empty bucket array of `size` slots and recompute the marks.
    pub(crate) fn alloc_buckets(&mut self, size: usize) {
        debug_assert!(size.is_power_of_two());
        self.buckets = vec![None; size];
        self.grow_mark = self.config.grow_mark(size);
        self.shrink_mark = self.config.shrink_mark(size, self.initial_size);
    }

    pub(crate) fn after_insert(&mut self) {
        let count = self.len();
        let grow = match self.config.resize_trigger() {
            ResizeTrigger::OverGrowMark => count > self.grow_mark,
            ResizeTrigger::Legacy => count < self.shrink_mark,
        };
        if grow {
            if let Some(size) = self.capacity().checked_mul(self.step()) {
                self.rehash(size);
            }
        }
    }

    pub(crate) fn after_remove(&mut self) {
        if self.len() < self.shrink_mark {
            let size = (self.capacity() / self.step()).max(self.initial_size);
            self.rehash(size);
        }
    }

    fn step(&self) -> usize {
        1usize << self.config.resize_bits()
    }

    pub(crate) fn rehash(&mut self, new_size: usize) {
        let old_size = self.capacity();
        debug!(
            "rehash: {} -> {} buckets ({}) with {} entries",
            old_size,
            new_size,
            if new_size > old_size { "grow" } else { "shrink" },
            self.len()
        );

        let old = std::mem::take(&mut self.buckets);
        let mut pos = self.order_head.take();
        self.order_tail = None;
        self.alloc_buckets(new_size);

        let mut chain: Vec<DefaultKey> = Vec::new();
        while let Some(b) = pos {
            let Some(head) = old[b] else { break };
            pos = self.slots[head].order_next;

            chain.clear();
            let mut cur = Some(head);
            while let Some(k) = cur {
                chain.push(k);
                cur = self.slots[k].chain_next;
            }
            for &k in chain.iter().rev() {
                self.chain_in(k);
            }
        }
        debug_assert_eq!(
            self.iter().count(),
            self.len(),
            "rehash lost entries off the order list"
        );
    }
}
