// Copyright 2025 the Mapgrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The presentation-side contract and transition policies.

use core::hash::Hash;
use core::time::Duration;

use crate::diff::Delta;

/// Monotonic id of a delta handed to a sink by a driver.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(u64);

impl BatchId {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw sequence number. The first batch of a driver is `0`.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A timed opacity ramp to or from fully transparent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fade {
    /// Length of the ramp.
    pub duration: Duration,
}

impl Fade {
    /// 200 ms.
    pub const DEFAULT: Self = Self::new(Duration::from_millis(200));

    /// Create a fade of the given length.
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Default for Fade {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Visual treatment requested when a delta is applied.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Remove and add right away.
    #[default]
    Immediate,
    /// Fade removed items out before removing them, and fade added items in
    /// once the sink reports them materialized.
    Fade(Fade),
    /// Let the sink decide through [`DeltaSink::apply_custom`] and
    /// [`DeltaSink::settle_custom`].
    Custom,
}

/// What the sink expects after [`DeltaSink::apply_custom`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Settle {
    /// The batch is visually settled; nothing to correlate.
    Done,
    /// Report [`DeltaSink::settle_custom`] for the added items once they are
    /// materialized.
    AwaitMaterialized,
}

/// The presentation layer a driver applies deltas to.
///
/// Implementations own the rendered objects. They are told *what* changed and
/// *which* transition to run, never how to render it. Within one batch the
/// driver always requests removals before additions.
pub trait DeltaSink<T> {
    /// Remove `items`. With `Some(fade)`, fade them out first and remove them
    /// when the ramp completes.
    fn remove_items(&mut self, items: &[T], fade_out: Option<Fade>);

    /// Add `items`. The sink may materialize them later and report back through
    /// [`ReconciliationDriver::materialized`](crate::ReconciliationDriver::materialized).
    fn add_items(&mut self, items: &[T]);

    /// Ramp `items`, which were just materialized, from transparent to opaque.
    fn fade_in(&mut self, items: &[T], fade: Fade) {
        let _ = (items, fade);
    }

    /// Apply a delta under [`Transition::Custom`].
    ///
    /// The default behaves like [`Transition::Immediate`].
    fn apply_custom(&mut self, batch: BatchId, delta: &Delta<T>) -> Settle {
        let _ = batch;
        if !delta.removed.is_empty() {
            self.remove_items(&delta.removed, None);
        }
        if !delta.added.is_empty() {
            self.add_items(&delta.added);
        }
        Settle::Done
    }

    /// Called with the materialized items of a batch whose
    /// [`apply_custom`](Self::apply_custom) returned [`Settle::AwaitMaterialized`].
    fn settle_custom(&mut self, batch: BatchId, items: &[T]) {
        let _ = (batch, items);
    }
}

impl<T, S: DeltaSink<T> + ?Sized> DeltaSink<T> for &mut S {
    fn remove_items(&mut self, items: &[T], fade_out: Option<Fade>) {
        (**self).remove_items(items, fade_out);
    }

    fn add_items(&mut self, items: &[T]) {
        (**self).add_items(items);
    }

    fn fade_in(&mut self, items: &[T], fade: Fade) {
        (**self).fade_in(items, fade);
    }

    fn apply_custom(&mut self, batch: BatchId, delta: &Delta<T>) -> Settle {
        (**self).apply_custom(batch, delta)
    }

    fn settle_custom(&mut self, batch: BatchId, items: &[T]) {
        (**self).settle_custom(batch, items);
    }
}

/// Stable identity of an item, used both to diff snapshots and to correlate
/// materialization reports back to the batch that added the item.
///
/// Implemented for any `Fn(&T) -> K` closure.
pub trait Identity<T> {
    /// The identity key.
    type Key: Hash + Eq + Clone;

    /// Identity of `item`.
    fn key(&self, item: &T) -> Self::Key;
}

impl<T, K, F> Identity<T> for F
where
    F: Fn(&T) -> K,
    K: Hash + Eq + Clone,
{
    type Key = K;

    fn key(&self, item: &T) -> K {
        self(item)
    }
}
