// Copyright 2025 the Mapgrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sequencing snapshots into deltas against a running baseline.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::mem;

use smallvec::SmallVec;

use crate::correlation::{CorrelationTable, PendingTransition};
use crate::diff::{Delta, diff_indices_by_key};
use crate::sink::{BatchId, DeltaSink, Identity, Settle, Transition};

/// Driver configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DriverConfig {
    /// Transition requested for every batch.
    pub transition: Transition,
    /// How many batches may hold unmaterialized transitions at once. Older
    /// batches are forgotten first.
    pub pending_batch_limit: usize,
}

impl DriverConfig {
    /// Replace the transition.
    #[must_use]
    pub const fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = transition;
        self
    }

    /// Replace the pending batch limit; values below one are raised to one.
    #[must_use]
    pub fn with_pending_batch_limit(mut self, limit: usize) -> Self {
        self.pending_batch_limit = limit.max(1);
        self
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            transition: Transition::Immediate,
            pending_batch_limit: 8,
        }
    }
}

/// Turns a stream of desired-state snapshots into deltas applied to a sink.
///
/// The driver keeps the last snapshot as its baseline. Each call to
/// [`apply`](Self::apply) diffs the new snapshot against it, swaps the
/// baseline, and requests removals then additions from the sink. The first
/// snapshot is diffed against an empty baseline, so it is added whole.
///
/// Snapshots must arrive one at a time from a single producer; the driver
/// takes `&mut self` for every mutation, so two diffs can never race on the
/// same baseline.
pub struct ReconciliationDriver<T, I: Identity<T>> {
    identity: I,
    config: DriverConfig,
    baseline: Vec<T>,
    pending: CorrelationTable<I::Key>,
    next_batch: u64,
}

impl<T, I: Identity<T>> Debug for ReconciliationDriver<T, I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReconciliationDriver")
            .field("config", &self.config)
            .field("baseline", &self.baseline.len())
            .field("pending", &self.pending)
            .field("next_batch", &self.next_batch)
            .finish_non_exhaustive()
    }
}

impl<T: Clone, I: Identity<T>> ReconciliationDriver<T, I> {
    /// Create a driver with the default configuration.
    pub fn new(identity: I) -> Self {
        Self::with_config(identity, DriverConfig::default())
    }

    /// Create a driver with an explicit configuration.
    pub fn with_config(identity: I, config: DriverConfig) -> Self {
        Self {
            identity,
            config,
            baseline: Vec::new(),
            pending: CorrelationTable::new(config.pending_batch_limit),
            next_batch: 0,
        }
    }

    /// The active configuration.
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Change the transition used by subsequent batches. Pending
    /// registrations keep the transition they were made with.
    pub fn set_transition(&mut self, transition: Transition) {
        self.config.transition = transition;
    }

    /// The last applied snapshot.
    pub fn baseline(&self) -> &[T] {
        &self.baseline
    }

    /// Number of added items still waiting for a materialization report.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Diff `snapshot` against the baseline and make it the new baseline,
    /// without talking to a sink.
    ///
    /// Pending transitions of removed items are cancelled. Prefer
    /// [`apply`](Self::apply) unless the caller dispatches deltas itself.
    pub fn next_delta(&mut self, snapshot: Vec<T>) -> (BatchId, Delta<T>) {
        let batch = BatchId::new(self.next_batch);
        self.next_batch += 1;

        let index_delta =
            diff_indices_by_key(&self.baseline, &snapshot, |item| self.identity.key(item));
        let previous = mem::replace(&mut self.baseline, snapshot);

        let mut removed = Vec::with_capacity(index_delta.removed.len());
        let mut gone = index_delta.removed.iter().copied().peekable();
        for (i, item) in previous.into_iter().enumerate() {
            if gone.next_if_eq(&i).is_some() {
                removed.push(item);
            }
        }
        let added: Vec<T> = index_delta
            .added
            .iter()
            .map(|&j| self.baseline[j].clone())
            .collect();

        // One registration per removed instance, so a kept duplicate still
        // gets its transition.
        for item in &removed {
            self.pending.cancel(&self.identity.key(item));
        }

        let delta = Delta {
            removed,
            added,
            persisting: index_delta.matched.len(),
        };
        tracing::debug!(
            batch = batch.get(),
            removed = delta.removed.len(),
            added = delta.added.len(),
            persisting = delta.persisting,
            "reconciled snapshot"
        );
        (batch, delta)
    }

    /// Apply `snapshot`: diff, swap the baseline, and dispatch the delta to
    /// `sink` with the configured transition.
    ///
    /// Removals are always requested before additions. An empty delta makes no
    /// sink calls. Returns the id of the batch.
    pub fn apply<S>(&mut self, snapshot: Vec<T>, sink: &mut S) -> BatchId
    where
        S: DeltaSink<T> + ?Sized,
    {
        let (batch, delta) = self.next_delta(snapshot);
        if delta.is_empty() {
            return batch;
        }
        match self.config.transition {
            Transition::Immediate => {
                dispatch(sink, &delta, None);
            }
            Transition::Fade(fade) => {
                dispatch(sink, &delta, Some(fade));
                self.register(batch, &delta.added, PendingTransition::FadeIn(fade));
            }
            Transition::Custom => {
                if sink.apply_custom(batch, &delta) == Settle::AwaitMaterialized {
                    self.register(batch, &delta.added, PendingTransition::Custom);
                }
            }
        }
        batch
    }

    /// Report that the sink materialized `items`.
    ///
    /// Items added by a batch that is still waiting for them get that batch's
    /// transition, grouped per batch. Anything else (items already settled,
    /// items from evicted batches, or items never added) is ignored.
    pub fn materialized<S>(&mut self, items: &[T], sink: &mut S)
    where
        S: DeltaSink<T> + ?Sized,
    {
        let mut groups: SmallVec<[(BatchId, PendingTransition, Vec<T>); 2]> = SmallVec::new();
        for item in items {
            let Some(pending) = self.pending.take(&self.identity.key(item)) else {
                tracing::trace!("ignoring materialization with no pending transition");
                continue;
            };
            match groups.iter_mut().find(|(b, _, _)| *b == pending.batch) {
                Some((_, _, group)) => group.push(item.clone()),
                None => groups.push((pending.batch, pending.transition, alloc::vec![item.clone()])),
            }
        }
        for (batch, transition, group) in groups {
            match transition {
                PendingTransition::FadeIn(fade) => sink.fade_in(&group, fade),
                PendingTransition::Custom => sink.settle_custom(batch, &group),
            }
        }
    }

    /// Forget the baseline and every pending transition.
    ///
    /// The next snapshot is treated as the first one again.
    pub fn reset(&mut self) {
        self.baseline.clear();
        self.pending.clear();
    }

    fn register(&mut self, batch: BatchId, added: &[T], transition: PendingTransition) {
        let identity = &self.identity;
        self.pending
            .register(batch, added.iter().map(|item| identity.key(item)), transition);
    }
}

fn dispatch<T, S>(sink: &mut S, delta: &Delta<T>, fade: Option<crate::sink::Fade>)
where
    S: DeltaSink<T> + ?Sized,
{
    if !delta.removed.is_empty() {
        sink.remove_items(&delta.removed, fade);
    }
    if !delta.added.is_empty() {
        sink.add_items(&delta.added);
    }
}
