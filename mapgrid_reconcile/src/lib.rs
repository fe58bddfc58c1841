// Copyright 2025 the Mapgrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapgrid Reconcile: apply only what changed between two item snapshots.
//!
//! A presentation layer (a map view, a canvas, a list) is handed complete
//! *snapshots* of the items it should show. Rebuilding it on every snapshot is
//! wasteful and loses visual continuity, so this crate computes the minimal
//! delta and sequences it:
//!
//! - [`diff`] / [`diff_indices`]: the reference add/remove delta under a
//!   caller-supplied equivalence, deterministic even with duplicates.
//! - [`diff_by_key`] / [`diff_indices_by_key`]: the same result through a
//!   hashed index when equivalence is equality of a key.
//! - [`ReconciliationDriver`]: keeps the last applied snapshot, diffs each new
//!   one against it, and drives a [`DeltaSink`] with a [`Transition`].
//! - [`CorrelationTable`]: bounded, one-shot mapping from item identity to
//!   the batch whose transition should run when the sink reports the item as
//!   materialized.
//!
//! Identity is never object identity. Items are typically rebuilt for every
//! snapshot, so two items are "the same" when their [`Identity`] keys are
//! equal, for example their position via [`PositionKey`].
//!
//! # Example
//!
//! ```rust
//! use mapgrid_reconcile::{DeltaSink, DriverConfig, Fade, ReconciliationDriver, Transition};
//!
//! #[derive(Default)]
//! struct Log(Vec<String>);
//!
//! impl DeltaSink<&'static str> for Log {
//!     fn remove_items(&mut self, items: &[&'static str], fade_out: Option<Fade>) {
//!         self.0.push(format!("remove {items:?} fade={}", fade_out.is_some()));
//!     }
//!     fn add_items(&mut self, items: &[&'static str]) {
//!         self.0.push(format!("add {items:?}"));
//!     }
//!     fn fade_in(&mut self, items: &[&'static str], _fade: Fade) {
//!         self.0.push(format!("fade in {items:?}"));
//!     }
//! }
//!
//! let config = DriverConfig::default().with_transition(Transition::Fade(Fade::DEFAULT));
//! let mut driver = ReconciliationDriver::with_config(|s: &&'static str| *s, config);
//! let mut sink = Log::default();
//!
//! driver.apply(vec!["oslo", "bergen"], &mut sink);
//! driver.apply(vec!["bergen", "tromso"], &mut sink);
//! // The sink later reports which items now exist on screen.
//! driver.materialized(&["tromso", "bergen"], &mut sink);
//!
//! assert_eq!(sink.0, [
//!     r#"add ["oslo", "bergen"]"#,
//!     r#"remove ["oslo"] fade=true"#,
//!     r#"add ["tromso"]"#,
//!     r#"fade in ["tromso"]"#,
//!     r#"fade in ["bergen"]"#,
//! ]);
//! ```
//!
//! ## Ordering and concurrency
//!
//! Snapshots must be delivered one at a time from a single producer. Deltas
//! reach the sink in snapshot order, and within a delta removals are
//! requested before additions. Nothing blocks on the sink: a materialization
//! that is never reported simply never animates.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod correlation;
mod diff;
mod driver;
mod sink;

pub use correlation::{CorrelationTable, Pending, PendingTransition};
pub use diff::{
    Delta, IndexDelta, PositionKey, diff, diff_by_key, diff_indices, diff_indices_by_key,
};
pub use driver::{DriverConfig, ReconciliationDriver};
pub use sink::{BatchId, DeltaSink, Fade, Identity, Settle, Transition};
