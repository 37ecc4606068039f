//! Per-receiver recursion depth.
//!
//! Interceptors that call their captured original often re-enter the same
//! patched entry point (a lookup that falls back to itself, a setter that
//! notifies and re-reads). [`RecursionTracker::count`] tells the block how
//! deep it currently is for a `(receiver, key)` pair so it can act only on
//! the outermost call.

use std::sync::{Mutex, PoisonError};

use ahash::AHashMap;

use crate::object::ObjectId;

type DepthKey = (ObjectId, String);

#[derive(Debug, Default)]
pub struct RecursionTracker {
    depths: Mutex<AHashMap<DepthKey, usize>>,
}

impl RecursionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `block` with the depth of enclosing calls for `(receiver, key)`.
    ///
    /// The outermost call sees `0`. The counter is restored when `block`
    /// returns or unwinds. The lock is not held while `block` runs.
    pub fn count<R>(&self, receiver: ObjectId, key: &str, block: impl FnOnce(usize) -> R) -> R {
        let key = (receiver, key.to_string());
        let depth = {
            let mut depths = self.depths.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = depths.entry(key.clone()).or_insert(0);
            *slot += 1;
            *slot - 1
        };
        let _guard = DepthGuard { tracker: self, key };
        block(depth)
    }

    /// Number of calls currently in flight for `(receiver, key)`.
    pub fn depth(&self, receiver: ObjectId, key: &str) -> usize {
        self.depths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(receiver, key.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn leave(&self, key: &DepthKey) {
        let mut depths = self.depths.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = depths.get_mut(key) {
            *slot -= 1;
            if *slot == 0 {
                depths.remove(key);
            }
        }
    }
}

struct DepthGuard<'a> {
    tracker: &'a RecursionTracker,
    key: DepthKey,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.tracker.leave(&self.key);
    }
}
