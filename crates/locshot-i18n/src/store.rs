#![forbid(unsafe_code)]

//! Ordered, consumable queue of localization records.
//!
//! The localization layer publishes a record the moment a string is
//! resolved; annotation passes later consume the records they can place on
//! screen. Records nobody matched stay queued for the next pass.
//!
//! | Operation | Side | Effect |
//! |-----------|------|--------|
//! | [`RecordStore::publish`] | producer | append, or add to the system set |
//! | [`RecordStore::mark_system_origin`] | producer | add to the system set, purge queued copies |
//! | [`RecordStore::drain_matching`] | engine | remove every match, in order |
//! | [`RecordStore::take_best_match`] | engine | remove the single best match |
//! | [`RecordStore::end_pass`] | engine | age unmatched records, expire old ones |
//!
//! # Retention
//!
//! The queue is bounded by [`StoreConfig::capacity`]; on overflow the oldest
//! record is dropped. With [`StoreConfig::expire_after_passes`] set, a
//! record that survives that many passes unmatched is discarded.
//!
//! # Locking
//!
//! Each structure sits behind its own `Mutex`, held only for the duration of
//! one operation. The only nesting is `publish` reading the system set under
//! the queue lock; nothing takes them in the other order. Predicates and
//! scorers run under the queue lock and must not call back into the store.

use std::collections::VecDeque;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use ahash::AHashSet;
use tracing::{debug, warn};

use crate::record::{LocalizationRecord, RecordIdentity};

/// Default bound on queued records.
pub const DEFAULT_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum number of queued records; the oldest is dropped beyond it.
    pub capacity: usize,
    /// Discard records left unmatched after this many passes.
    pub expire_after_passes: Option<u32>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            expire_after_passes: None,
        }
    }
}

/// A queued record with its publish order and how many passes it survived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecord {
    pub sequence: u64,
    pub age: u32,
    pub record: LocalizationRecord,
}

#[derive(Debug, Default)]
pub struct RecordStore {
    config: StoreConfig,
    pending: Mutex<VecDeque<PendingRecord>>,
    system: Mutex<AHashSet<RecordIdentity>>,
    matched: Mutex<Vec<LocalizationRecord>>,
    next_sequence: AtomicU64,
    dropped: AtomicU64,
    expired: AtomicU64,
    passes: AtomicU64,
}

impl RecordStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    // -- producer side -----------------------------------------------------

    /// Record a resolved string.
    ///
    /// System-origin records (flagged, or already in the system set) are
    /// added to the system set and never queued. Returns whether the record
    /// was queued.
    pub fn publish(&self, record: LocalizationRecord) -> bool {
        if record.is_system_origin {
            self.mark_system_origin(&record);
            return false;
        }

        let mut pending = self.pending();
        // Checked under the queue lock; `mark_system_origin` purges the queue
        // only after its insert, so a record is either rejected here or purged.
        if self.is_system_origin(&record) {
            return false;
        }
        // Assigned under the lock so queue order and sequence order agree.
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        pending.push_back(PendingRecord {
            sequence,
            age: 0,
            record,
        });
        while pending.len() > self.config.capacity.max(1) {
            if let Some(evicted) = pending.pop_front() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    key = %evicted.record.key,
                    capacity = self.config.capacity,
                    "record queue full, dropping oldest"
                );
            }
        }
        true
    }

    /// Treat `record` as framework chrome from now on. Append-only.
    ///
    /// Queued copies of the record are removed. Returns how many were.
    pub fn mark_system_origin(&self, record: &LocalizationRecord) -> usize {
        let identity = record.identity();
        if !self.system().insert(identity.clone()) {
            return 0;
        }
        let mut pending = self.pending();
        let before = pending.len();
        pending.retain(|entry| entry.record.identity() != identity);
        let purged = before - pending.len();
        debug!(key = %record.key, table = %record.table, purged, "system-origin record");
        purged
    }

    pub fn is_system_origin(&self, record: &LocalizationRecord) -> bool {
        self.system().contains(&record.identity())
    }

    // -- engine side -------------------------------------------------------

    /// Remove and return every queued record satisfying `predicate`, in
    /// publish order. Non-matching records keep their place.
    pub fn drain_matching<P>(&self, mut predicate: P) -> Vec<LocalizationRecord>
    where
        P: FnMut(&LocalizationRecord) -> bool,
    {
        let mut pending = self.pending();
        let mut drained = Vec::new();
        for entry in mem::take(&mut *pending) {
            if predicate(&entry.record) {
                drained.push(entry.record);
            } else {
                pending.push_back(entry);
            }
        }
        drained
    }

    /// Remove and return the queued record with the highest score.
    ///
    /// Records for which `score` returns `None` are ineligible. Among equal
    /// scores the oldest record wins.
    pub fn take_best_match<S, F>(&self, mut score: F) -> Option<LocalizationRecord>
    where
        S: Ord,
        F: FnMut(&LocalizationRecord) -> Option<S>,
    {
        let mut pending = self.pending();
        let mut best: Option<(usize, S)> = None;
        for (index, entry) in pending.iter().enumerate() {
            let Some(s) = score(&entry.record) else {
                continue;
            };
            if best.as_ref().is_none_or(|(_, top)| s > *top) {
                best = Some((index, s));
            }
        }
        let (index, _) = best?;
        pending.remove(index).map(|entry| entry.record)
    }

    /// Remember a record that an annotation pass placed on screen.
    pub fn note_matched(&self, record: LocalizationRecord) {
        self.matched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Records placed so far, in match order.
    pub fn matched(&self) -> Vec<LocalizationRecord> {
        self.matched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Finish an annotation pass: age every unmatched record and discard
    /// those past the expiry limit. Returns how many were discarded.
    pub fn end_pass(&self) -> usize {
        self.passes.fetch_add(1, Ordering::Relaxed);
        let mut pending = self.pending();
        for entry in pending.iter_mut() {
            entry.age = entry.age.saturating_add(1);
        }
        let Some(limit) = self.config.expire_after_passes else {
            return 0;
        };
        let before = pending.len();
        pending.retain(|entry| entry.age < limit);
        let expired = before - pending.len();
        if expired > 0 {
            self.expired.fetch_add(expired as u64, Ordering::Relaxed);
            debug!(expired, limit, "unmatched records expired");
        }
        expired
    }

    // -- inspection --------------------------------------------------------

    pub fn pending_len(&self) -> usize {
        self.pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending_len() == 0
    }

    /// Copy of the queue, oldest first.
    pub fn snapshot(&self) -> Vec<PendingRecord> {
        self.pending().iter().cloned().collect()
    }

    /// Remove and return everything still queued, oldest first.
    pub fn clear(&self) -> Vec<LocalizationRecord> {
        mem::take(&mut *self.pending())
            .into_iter()
            .map(|entry| entry.record)
            .collect()
    }

    pub fn system_len(&self) -> usize {
        self.system().len()
    }

    /// Records evicted because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Records discarded by the pass-based expiry.
    pub fn expired_count(&self) -> u64 {
        self.expired.load(Ordering::Relaxed)
    }

    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    fn pending(&self) -> MutexGuard<'_, VecDeque<PendingRecord>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn system(&self) -> MutexGuard<'_, AHashSet<RecordIdentity>> {
        self.system.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn rec(key: &str, result: &str) -> LocalizationRecord {
        LocalizationRecord::new(key, format!("dev:{key}"), "Main", result)
    }

    fn keys(records: &[LocalizationRecord]) -> Vec<&str> {
        records.iter().map(|r| r.key.as_str()).collect()
    }

    #[test]
    fn drain_keeps_publish_order_and_leaves_the_rest() {
        let store = RecordStore::default();
        for (k, r) in [("a", "x1"), ("b", "y"), ("c", "x2"), ("d", "y")] {
            store.publish(rec(k, r));
        }
        let drained = store.drain_matching(|r| r.result_string.starts_with('x'));
        assert_eq!(keys(&drained), ["a", "c"]);
        let rest: Vec<_> = store.snapshot().into_iter().map(|p| p.record.key).collect();
        assert_eq!(rest, ["b", "d"]);
    }

    #[test]
    fn drain_with_nothing_matching_is_empty() {
        let store = RecordStore::default();
        assert!(store.drain_matching(|_| true).is_empty());
        store.publish(rec("a", "x"));
        assert!(store.drain_matching(|_| false).is_empty());
        assert_eq!(store.pending_len(), 1);
    }

    #[test]
    fn best_match_prefers_score_then_age() {
        let store = RecordStore::default();
        store.publish(rec("short-old", "ab"));
        store.publish(rec("long", "abcd"));
        store.publish(rec("short-new", "ab"));
        let by_len = |r: &LocalizationRecord| Some(r.result_string.len());
        assert_eq!(store.take_best_match(by_len).unwrap().key, "long");
        assert_eq!(store.take_best_match(by_len).unwrap().key, "short-old");
        assert_eq!(store.take_best_match(by_len).unwrap().key, "short-new");
        assert!(store.take_best_match(by_len).is_none());
    }

    #[test]
    fn ineligible_records_stay_queued() {
        let store = RecordStore::default();
        store.publish(rec("a", "x"));
        assert!(store.take_best_match(|_| None::<u8>).is_none());
        assert_eq!(store.pending_len(), 1);
    }

    #[test]
    fn system_records_are_never_queued() {
        let store = RecordStore::default();
        assert!(!store.publish(rec("ok", "OK").system_origin(true)));
        assert!(store.is_system_origin(&rec("ok", "OK")));
        // Once known as system, the same record is diverted even unflagged.
        assert!(!store.publish(rec("ok", "OK")));
        assert!(store.publish(rec("save", "Save")));
        assert_eq!(store.pending_len(), 1);
        assert_eq!(store.system_len(), 1);
    }

    #[test]
    fn mark_system_origin_is_idempotent() {
        let store = RecordStore::default();
        store.mark_system_origin(&rec("ok", "OK"));
        store.mark_system_origin(&rec("ok", "OK").system_origin(true));
        assert_eq!(store.system_len(), 1);
    }

    #[test]
    fn marking_after_publish_purges_queued_copies() {
        let store = RecordStore::default();
        store.publish(rec("ok", "Okay"));
        store.publish(rec("cancel", "Abbrechen"));
        store.publish(rec("ok", "Okay"));

        assert_eq!(store.mark_system_origin(&rec("ok", "Okay")), 2);
        assert!(store.is_system_origin(&rec("ok", "Okay")));
        let rest: Vec<_> = store.snapshot().into_iter().map(|p| p.record.key).collect();
        assert_eq!(rest, ["cancel"]);

        assert!(!store.publish(rec("ok", "Okay")));
        assert_eq!(store.pending_len(), 1);
        assert_eq!(store.mark_system_origin(&rec("ok", "Okay")), 0);
    }

    #[test]
    fn capacity_drops_oldest() {
        let store = RecordStore::new(StoreConfig {
            capacity: 2,
            expire_after_passes: None,
        });
        for k in ["a", "b", "c"] {
            store.publish(rec(k, k));
        }
        assert_eq!(keys(&store.clear()), ["b", "c"]);
        assert_eq!(store.dropped_count(), 1);
    }

    #[test]
    fn expiry_after_passes() {
        let store = RecordStore::new(StoreConfig {
            capacity: 16,
            expire_after_passes: Some(2),
        });
        store.publish(rec("old", "x"));
        assert_eq!(store.end_pass(), 0);
        store.publish(rec("new", "y"));
        assert_eq!(store.end_pass(), 1);
        assert_eq!(keys(&store.clear()), ["new"]);
        assert_eq!(store.expired_count(), 1);
        assert_eq!(store.passes(), 2);
    }

    #[test]
    fn without_expiry_records_only_age() {
        let store = RecordStore::default();
        store.publish(rec("a", "x"));
        for _ in 0..10 {
            assert_eq!(store.end_pass(), 0);
        }
        assert_eq!(store.snapshot()[0].age, 10);
    }

    #[test]
    fn matched_side_channel_records_in_order() {
        let store = RecordStore::default();
        store.note_matched(rec("a", "x"));
        store.note_matched(rec("b", "y"));
        assert_eq!(keys(&store.matched()), ["a", "b"]);
    }

    #[test]
    fn concurrent_publishers_lose_nothing() {
        let store = Arc::new(RecordStore::default());
        let barrier = Arc::new(Barrier::new(4));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let s = Arc::clone(&store);
                let b = Arc::clone(&barrier);
                thread::spawn(move || {
                    b.wait();
                    for i in 0..200 {
                        s.publish(rec(&format!("{t}-{i}"), "x"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 800);
        assert!(snapshot.windows(2).all(|w| w[0].sequence < w[1].sequence));
    }
}
