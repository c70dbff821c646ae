//! Debug-only guard against re-entering a table from inside a comparator.
//!
//! Table operations call user comparators while a chain is being walked or
//! relinked. A comparator that reaches back into the same table would
//! observe half-updated links, so debug builds panic on the nested entry
//! and name both operations. Release builds compile the guard away.

use core::marker::PhantomData;
#[cfg(debug_assertions)]
use core::cell::Cell;
#[cfg(debug_assertions)]
use std::rc::Rc;

/// Live guards share the flag through an `Rc` and hold no borrow of the table.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Rc<Cell<Option<&'static str>>>,
    // Single-threaded: keep the owner !Send + !Sync.
    _nosend: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub(crate) fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Rc::new(Cell::new(None)),
            _nosend: PhantomData,
        }
    }

    /// Mark `op` as running until the returned guard drops.
    #[inline]
    #[cfg_attr(not(debug_assertions), allow(unused_variables))]
    pub(crate) fn enter(&self, op: &'static str) -> ReentrancyGuard {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("table re-entered by `{op}` while `{outer}` was running");
            }
            self.active.set(Some(op));
            ReentrancyGuard {
                active: Rc::clone(&self.active),
                _nosend: PhantomData,
            }
        }

        #[cfg(not(debug_assertions))]
        {
            ReentrancyGuard {
                _nosend: PhantomData,
            }
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct ReentrancyGuard {
    #[cfg(debug_assertions)]
    active: Rc<Cell<Option<&'static str>>>,
    _nosend: PhantomData<*mut ()>,
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.active.set(None);
    }
}
