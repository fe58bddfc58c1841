// Copyright 2025 the Mapgrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pending transitions keyed by item identity.
//!
//! When a batch adds items under a transition that must wait for the sink to
//! materialize them, each added identity is registered here. A later
//! materialization report takes the entry (one-shot) and tells the driver
//! which batch, and therefore which transition, the item belongs to.
//!
//! Items are counted per instance: two added items with the same identity
//! hold two registrations, each taken by its own materialization report.
//!
//! Entries that are never reported are dropped when their batch falls out of
//! the bounded window of live batches, when the item is removed again, or
//! when the table is cleared.

use alloc::collections::VecDeque;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::sink::{BatchId, Fade};

/// Transition to run once an item is materialized.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PendingTransition {
    /// Fade the item in.
    FadeIn(Fade),
    /// Hand the item to [`DeltaSink::settle_custom`](crate::DeltaSink::settle_custom).
    Custom,
}

/// A registration taken out of a [`CorrelationTable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pending {
    /// The batch that added the item.
    pub batch: BatchId,
    /// What to do now that it is materialized.
    pub transition: PendingTransition,
}

/// Bounded map from item identity to pending transitions.
pub struct CorrelationTable<K> {
    // Registrations per identity, oldest batch first.
    entries: HashMap<K, SmallVec<[Pending; 1]>>,
    // Batches with live registrations, oldest first, with their counts.
    batches: VecDeque<(BatchId, usize)>,
    batch_limit: usize,
    len: usize,
}

impl<K> Debug for CorrelationTable<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CorrelationTable")
            .field("len", &self.len)
            .field("keys", &self.entries.len())
            .field("batches", &self.batches.len())
            .field("batch_limit", &self.batch_limit)
            .finish()
    }
}

impl<K: Hash + Eq> CorrelationTable<K> {
    /// Create an empty table keeping entries for at most `batch_limit` batches
    /// (at least one).
    pub fn new(batch_limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            batches: VecDeque::new(),
            batch_limit: batch_limit.max(1),
            len: 0,
        }
    }

    /// Number of pending items, counting duplicates.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of batches that still have pending items.
    pub fn pending_batches(&self) -> usize {
        self.batches.len()
    }

    /// Whether `key` has a pending transition.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of pending registrations of `key`.
    pub fn count(&self, key: &K) -> usize {
        self.entries.get(key).map_or(0, SmallVec::len)
    }

    /// Register one pending item per element of `keys` as added by `batch`.
    ///
    /// A key that appears more than once is registered once per occurrence.
    /// Batches must be registered in increasing order. If this pushes the
    /// number of live batches over the limit, the oldest batches are evicted
    /// with all their entries.
    pub fn register<I>(&mut self, batch: BatchId, keys: I, transition: PendingTransition)
    where
        I: IntoIterator<Item = K>,
    {
        let mut count = 0;
        for key in keys {
            self.entries
                .entry(key)
                .or_default()
                .push(Pending { batch, transition });
            count += 1;
        }
        if count == 0 {
            return;
        }
        self.len += count;
        if let Some(last) = self.batches.back_mut()
            && last.0 == batch
        {
            last.1 += count;
        } else {
            self.batches.push_back((batch, count));
        }
        while self.batches.len() > self.batch_limit {
            let Some((evicted, remaining)) = self.batches.pop_front() else {
                break;
            };
            self.entries.retain(|_, pending| {
                pending.retain(|p| p.batch != evicted);
                !pending.is_empty()
            });
            self.len -= remaining;
            tracing::debug!(
                batch = evicted.get(),
                dropped = remaining,
                "evicted unmaterialized transitions"
            );
        }
    }

    /// Take the oldest pending registration of `key`, if any. Each
    /// registration is handed out once.
    pub fn take(&mut self, key: &K) -> Option<Pending> {
        self.remove_one(key, |pending| (!pending.is_empty()).then(|| pending.remove(0)))
    }

    /// Forget the newest pending registration of `key` without running its
    /// transition.
    pub fn cancel(&mut self, key: &K) -> bool {
        self.remove_one(key, SmallVec::pop).is_some()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.batches.clear();
        self.len = 0;
    }

    fn remove_one(
        &mut self,
        key: &K,
        pick: impl FnOnce(&mut SmallVec<[Pending; 1]>) -> Option<Pending>,
    ) -> Option<Pending> {
        let list = self.entries.get_mut(key)?;
        let pending = pick(list)?;
        if list.is_empty() {
            self.entries.remove(key);
        }
        self.len -= 1;
        self.release(pending.batch);
        Some(pending)
    }

    fn release(&mut self, batch: BatchId) {
        let Some(pos) = self.batches.iter().position(|(b, _)| *b == batch) else {
            return;
        };
        let slot = &mut self.batches[pos].1;
        *slot -= 1;
        if *slot == 0 {
            self.batches.remove(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FADE: PendingTransition = PendingTransition::FadeIn(Fade::DEFAULT);

    #[test]
    fn take_is_one_shot() {
        let mut table = CorrelationTable::new(4);
        table.register(BatchId::new(0), ["a", "b"], FADE);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.take(&"a"),
            Some(Pending {
                batch: BatchId::new(0),
                transition: FADE
            })
        );
        assert_eq!(table.take(&"a"), None);
        assert_eq!(table.pending_batches(), 1);
        assert!(table.cancel(&"b"));
        assert!(table.is_empty());
        assert_eq!(table.pending_batches(), 0);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut table: CorrelationTable<u32> = CorrelationTable::new(4);
        assert_eq!(table.take(&7), None);
        assert!(!table.cancel(&7));
    }

    #[test]
    fn duplicate_keys_register_per_instance() {
        let mut table = CorrelationTable::new(4);
        table.register(BatchId::new(0), ["a", "b", "a"], FADE);
        table.register(BatchId::new(1), ["a"], PendingTransition::Custom);
        assert_eq!(table.len(), 4);
        assert_eq!(table.count(&"a"), 3);
        assert_eq!(table.pending_batches(), 2);

        // Cancelling drops the newest registration, taking hands out the oldest.
        assert!(table.cancel(&"a"));
        assert_eq!(table.pending_batches(), 1);
        assert_eq!(table.take(&"a").map(|p| p.batch), Some(BatchId::new(0)));
        assert_eq!(table.count(&"a"), 1);
        assert!(table.contains(&"a"));
        assert_eq!(table.take(&"a").map(|p| p.transition), Some(FADE));
        assert!(!table.contains(&"a"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn eviction_keeps_newer_duplicates() {
        let mut table = CorrelationTable::new(1);
        table.register(BatchId::new(0), ['x', 'x'], FADE);
        table.register(BatchId::new(1), ['x'], FADE);
        assert_eq!(table.len(), 1);
        assert_eq!(table.take(&'x').map(|p| p.batch), Some(BatchId::new(1)));
        assert!(table.is_empty());
    }

    #[test]
    fn oldest_batches_are_evicted() {
        let mut table = CorrelationTable::new(2);
        table.register(BatchId::new(0), [1, 2], FADE);
        table.register(BatchId::new(1), [3], FADE);
        table.register(BatchId::new(2), [4, 5], FADE);
        assert_eq!(table.pending_batches(), 2);
        assert!(!table.contains(&1));
        assert!(!table.contains(&2));
        assert!(table.contains(&3));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn empty_registration_does_not_occupy_a_slot() {
        let mut table: CorrelationTable<u8> = CorrelationTable::new(1);
        table.register(BatchId::new(0), [9], FADE);
        table.register(BatchId::new(1), core::iter::empty(), FADE);
        assert!(table.contains(&9));
        assert_eq!(table.pending_batches(), 1);
    }

    #[test]
    fn zero_limit_is_clamped() {
        let mut table = CorrelationTable::new(0);
        table.register(BatchId::new(0), ['x'], FADE);
        assert!(table.contains(&'x'));
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.pending_batches(), 0);
    }
}
