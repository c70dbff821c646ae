//! Insertion-order list threaded through the bucket array.
//!
//! Nodes are bucket indices, not entries: a bucket joins the list when its
//! chain goes from empty to populated and leaves it when the chain empties
//! again. Links live on the chain head, so piling collisions or duplicates
//! into a bucket costs nothing here.

use crate::htable::{Entry, HTable};
use log::trace;

impl<T, C> HTable<T, C> {
    fn head_mut(&mut self, b: usize) -> Option<&mut Entry<T>> {
        let k = self.buckets[b]?;
        self.slots.get_mut(k)
    }

    /// Append bucket `b`, whose chain was just populated, at the tail.
    pub(crate) fn link_bucket(&mut self, b: usize) {
        let tail = self.order_tail;
        if let Some(head) = self.head_mut(b) {
            head.order_prev = tail;
            head.order_next = None;
        }
        match tail {
            Some(t) => {
                if let Some(last) = self.head_mut(t) {
                    last.order_next = Some(b);
                }
            }
            None => self.order_head = Some(b),
        }
        self.order_tail = Some(b);
        trace!("order: linked bucket {b} after {tail:?}");
    }

    /// Splice out a bucket whose chain just emptied, given its old links.
    pub(crate) fn unlink_bucket(&mut self, prev: Option<usize>, next: Option<usize>) {
        match prev {
            Some(p) => {
                if let Some(e) = self.head_mut(p) {
                    e.order_next = next;
                }
            }
            None => self.order_head = next,
        }
        match next {
            Some(n) => {
                if let Some(e) = self.head_mut(n) {
                    e.order_prev = prev;
                }
            }
            None => self.order_tail = prev,
        }
        trace!("order: unlinked bucket between {prev:?} and {next:?}");
    }
}

#[cfg(test)]
mod tests {
    use crate::bufhash::bufhash;
    use crate::compare::ByteOrder;
    use crate::htable::HTable;

    fn bucket_of(key: &str) -> usize {
        bufhash(key.as_bytes()) as usize & 63
    }

    fn ordered_keys(t: &HTable<String, ByteOrder>) -> Vec<String> {
        t.iter_ordered().map(|(_, k)| k.clone()).collect()
    }

    /// Invariant: buckets appear in the order they were first populated,
    /// unaffected by later collisions in an earlier bucket.
    #[test]
    fn first_population_order() {
        let mut t = HTable::new(ByteOrder);
        for k in ["foo", "bar", "partha"] {
            t.put(k.to_string());
        }
        t.put("foo".to_string());
        assert_eq!(ordered_keys(&t), ["foo", "bar", "partha"]);
        assert_eq!(t.order_head(), Some(bucket_of("foo")));
        assert_eq!(t.order_tail(), Some(bucket_of("partha")));
        t.validate();
    }

    /// Invariant: chaining a different key into the first bucket leaves the
    /// order of buckets unchanged.
    #[test]
    fn collision_in_first_bucket_keeps_order() {
        let foo = bucket_of("foo");
        let other = (0..)
            .map(|i| format!("c{i}"))
            .find(|k| bucket_of(k) == foo)
            .unwrap();
        assert_ne!(bufhash(other.as_bytes()), bufhash(b"foo"));

        let mut t = HTable::new(ByteOrder);
        for k in ["foo", "bar", "partha"] {
            t.put(k.to_string());
        }
        t.put(other.clone());
        let buckets: Vec<usize> = t
            .iter_ordered()
            .map(|(h, _)| t.bucket_of(h).unwrap())
            .collect();
        assert_eq!(buckets, [foo, bucket_of("bar"), bucket_of("partha")]);
        // The colliding key now represents the first bucket.
        assert_eq!(ordered_keys(&t), [other.as_str(), "bar", "partha"]);
        let h = t.get("foo", None).unwrap();
        assert_eq!(t.chain_count(h), Some(2));
        assert_eq!(t.order_links(h), Some((None, Some(bucket_of("bar")))));
        t.validate();
    }

    /// Invariant: emptying the middle, head, and tail buckets splices them
    /// out and keeps head/tail accurate.
    #[test]
    fn unlink_middle_head_and_tail() {
        let mut t = HTable::new(ByteOrder);
        for k in ["foo", "bar", "partha", "norah"] {
            t.put(k.to_string());
        }

        t.remove("bar", None).unwrap();
        assert_eq!(ordered_keys(&t), ["foo", "partha", "norah"]);
        t.validate();

        t.remove("foo", None).unwrap();
        assert_eq!(ordered_keys(&t), ["partha", "norah"]);
        assert_eq!(t.order_head(), Some(bucket_of("partha")));
        t.validate();

        t.remove("norah", None).unwrap();
        assert_eq!(ordered_keys(&t), ["partha"]);
        assert_eq!(t.order_tail(), Some(bucket_of("partha")));
        t.validate();

        // A re-populated bucket rejoins at the tail.
        t.put("foo".to_string());
        assert_eq!(ordered_keys(&t), ["partha", "foo"]);
        t.validate();
    }

    /// Invariant: removing a chain head with survivors keeps the bucket's
    /// place in the order list.
    #[test]
    fn head_removal_keeps_position() {
        let mut t = HTable::new(ByteOrder);
        t.put("foo".to_string());
        t.put("bar".to_string());
        t.put("foo".to_string());
        t.remove("foo", None).unwrap();
        assert_eq!(ordered_keys(&t), ["foo", "bar"]);
        let h = t.get("foo", None).unwrap();
        assert_eq!(t.order_links(h), Some((None, Some(bucket_of("bar")))));
        t.validate();
    }
}
