//! chained-htable: a single-threaded chained hash table over byte keys,
//! with duplicate keys and two iteration orders.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: an embeddable associative container whose callers pick the
//!   equality predicate, may store several entries under one key, and can
//!   walk entries either by bucket or by the order buckets were populated.
//! - Layers:
//!   - `bufhash`: 32-bit FNV-1 digest of a byte buffer.
//!   - HTable<T, C>: bucket array of collision chains over a `SlotMap`
//!     arena, addressed by stable `Handle`s. Owns the insertion-order list
//!     (threaded through buckets, not entries) and the grow/shrink policy.
//!   - ByteMap<V>: owned byte keys plus values, compared by raw bytes.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync`, no locking.
//! - Resizes run synchronously inside `put`/`remove`/`replace` and cost
//!   one full rehash; there is no incremental resizing.
//! - Each entry's hash is computed once at insertion; rehashing never calls
//!   back into `KeyBytes` or the comparator.
//! - Iterators borrow the table, so mutating mid-iteration does not
//!   compile. Handles outlive mutation and resolve to `None` once their
//!   entry is removed.
//!
//! Key invariants
//! - The bucket count is a power of two and every entry sits in bucket
//!   `hash & (size - 1)`.
//! - A comparator returning `Equal` implies the key bytes hash alike. Debug
//!   builds panic on a violation seen during a chain walk.
//! - The head of each chain carries the bucket's order links and the
//!   number of entries chained there. Pushing onto a bucket copies them from
//!   the previous head; removing the head hands them to its successor.
//! - The order list holds exactly the populated buckets, oldest first.
//!
//! Resize policy
//! - Grow by `1 << resize_bits` once the live count exceeds `grow_mark`
//!   (80% of the bucket count by default).
//! - Shrink by the same factor once it drops below
//!   `grow_mark / ((1 << resize_bits) + 1)`, never below the initial size.
//! - `ResizeTrigger::Legacy` restores the historical insertion check
//!   (grow while the count is *below* `shrink_mark`). It reproduces the
//!   historical table geometry only for tables built without a size hint.
//!
//! Errors
//! - Absence is `None`; nothing on the table path returns `Result`.
//! - Allocation failure aborts the process.
//! - Configuration is validated by `TableConfig::builder`, which reports a
//!   `ConfigError`.
//!
//! Reentrancy
//! - Comparators run while chains are being walked or relinked. A
//!   comparator that calls back into its own table panics in debug builds.

pub mod bufhash;
mod byte_map;
pub mod compare;
pub mod config;
pub mod htable;
mod htable_proptest;
pub mod iter;
mod order;
mod reentrancy;
mod resize;

// Public surface
pub use bufhash::{bufhash, BufHasher, BuildBufHasher};
pub use byte_map::{ByteMap, KeyedEntry};
pub use compare::{ByteOrder, Comparator, KeyBytes};
pub use config::{ConfigError, ResizeTrigger, TableConfig, TableConfigBuilder};
pub use htable::{HTable, Handle};
pub use iter::{Duplicates, Iter, OrderedIter};
