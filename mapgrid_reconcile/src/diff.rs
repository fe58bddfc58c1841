// Copyright 2025 the Mapgrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Add/remove deltas between two snapshots.
//!
//! The reference algorithm treats `next` as a working multiset. Each element of
//! `previous`, in order, consumes the first remaining element of `next` that it
//! is equivalent to; if there is none it is *removed*. Whatever is left of
//! `next` afterwards is *added*, in its original order.
//!
//! That is quadratic in the snapshot size, which is fine for the dozens to low
//! hundreds of annotations a viewport shows. [`diff_by_key`] produces the same
//! output through a hashed index when equivalence is equality of a key.
//!
//! The equivalence predicate must be reflexive and deterministic. This is not
//! checked; an inconsistent predicate gives an unspecified (but memory-safe)
//! delta.

use alloc::vec;
use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashMap;
use kurbo::Point;
use smallvec::SmallVec;

/// A delta expressed as positions into the two snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexDelta {
    /// Positions in `previous` with no remaining equivalent in `next`, ascending.
    pub removed: Vec<usize>,
    /// Positions in `next` left unmatched, ascending.
    pub added: Vec<usize>,
    /// Matched `(previous, next)` pairs, in `previous` order.
    pub matched: Vec<(usize, usize)>,
}

impl IndexDelta {
    /// Whether the two snapshots were equivalent as multisets.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// The items to remove and to add to turn one snapshot into the next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delta<T> {
    /// Items of the previous snapshot that are gone, in previous order.
    pub removed: Vec<T>,
    /// Items of the next snapshot that are new, in next order.
    pub added: Vec<T>,
    /// Number of items present in both snapshots.
    pub persisting: usize,
}

impl<T> Delta<T> {
    /// Whether there is nothing to remove or add.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

impl<T> Default for Delta<T> {
    fn default() -> Self {
        Self {
            removed: Vec::new(),
            added: Vec::new(),
            persisting: 0,
        }
    }
}

/// Compute the delta between `previous` and `next` as positions.
///
/// `equivalent` is called as `equivalent(previous_item, next_item)`.
pub fn diff_indices<T, F>(previous: &[T], next: &[T], mut equivalent: F) -> IndexDelta
where
    F: FnMut(&T, &T) -> bool,
{
    let mut consumed = vec![false; next.len()];
    let mut delta = IndexDelta::default();
    for (i, item) in previous.iter().enumerate() {
        let found = next
            .iter()
            .enumerate()
            .position(|(j, candidate)| !consumed[j] && equivalent(item, candidate));
        match found {
            Some(j) => {
                consumed[j] = true;
                delta.matched.push((i, j));
            }
            None => delta.removed.push(i),
        }
    }
    delta.added = consumed
        .iter()
        .enumerate()
        .filter_map(|(j, &c)| (!c).then_some(j))
        .collect();
    delta
}

/// Compute the delta between `previous` and `next`, cloning the changed items.
///
/// ```
/// use mapgrid_reconcile::diff;
///
/// let delta = diff(&[1, 2, 2], &[2, 3], |a, b| a == b);
/// assert_eq!(delta.removed, [1, 2]);
/// assert_eq!(delta.added, [3]);
/// assert_eq!(delta.persisting, 1);
/// ```
pub fn diff<T, F>(previous: &[T], next: &[T], equivalent: F) -> Delta<T>
where
    T: Clone,
    F: FnMut(&T, &T) -> bool,
{
    materialize(previous, next, &diff_indices(previous, next, equivalent))
}

/// Positions variant of [`diff_by_key`].
pub fn diff_indices_by_key<T, K, F>(previous: &[T], next: &[T], mut key: F) -> IndexDelta
where
    K: Hash + Eq,
    F: FnMut(&T) -> K,
{
    // Positions of `next` per key, in order, with a cursor to the first unconsumed one.
    struct Bucket {
        cursor: usize,
        slots: SmallVec<[usize; 2]>,
    }

    let mut buckets: HashMap<K, Bucket> = HashMap::with_capacity(next.len());
    for (j, item) in next.iter().enumerate() {
        buckets
            .entry(key(item))
            .or_insert_with(|| Bucket {
                cursor: 0,
                slots: SmallVec::new(),
            })
            .slots
            .push(j);
    }

    let mut consumed = vec![false; next.len()];
    let mut delta = IndexDelta::default();
    for (i, item) in previous.iter().enumerate() {
        let found = buckets.get_mut(&key(item)).and_then(|bucket| {
            let j = bucket.slots.get(bucket.cursor).copied()?;
            bucket.cursor += 1;
            Some(j)
        });
        match found {
            Some(j) => {
                consumed[j] = true;
                delta.matched.push((i, j));
            }
            None => delta.removed.push(i),
        }
    }
    delta.added = consumed
        .iter()
        .enumerate()
        .filter_map(|(j, &c)| (!c).then_some(j))
        .collect();
    delta
}

/// Hashed variant of [`diff`] where two items are equivalent exactly when
/// their keys are equal.
///
/// Runs in expected linear time and returns the same delta, including the
/// tie-break between duplicate keys, as
/// `diff(previous, next, |a, b| key(a) == key(b))`.
///
/// Keys are compared with their `Eq` impl, which is reflexive. A predicate
/// written over the raw values may not be: `|a, b| a.x == b.x` never matches
/// a NaN coordinate, while [`PositionKey`] matches NaN with NaN. The two
/// diffs then disagree on such items: the value predicate removes and re-adds
/// them on every snapshot, the keyed diff keeps them.
pub fn diff_by_key<T, K, F>(previous: &[T], next: &[T], key: F) -> Delta<T>
where
    T: Clone,
    K: Hash + Eq,
    F: FnMut(&T) -> K,
{
    materialize(previous, next, &diff_indices_by_key(previous, next, key))
}

fn materialize<T: Clone>(previous: &[T], next: &[T], delta: &IndexDelta) -> Delta<T> {
    Delta {
        removed: delta.removed.iter().map(|&i| previous[i].clone()).collect(),
        added: delta.added.iter().map(|&j| next[j].clone()).collect(),
        persisting: delta.matched.len(),
    }
}

/// Hashable identity of a position, by exact coordinate value.
///
/// Two points map to the same key when both coordinates compare equal, which
/// also treats `-0.0` and `0.0` as the same. Unlike `f64` equality, every NaN
/// maps to one key, so a point with a NaN coordinate keeps its identity
/// across snapshots.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey(u64, u64);

impl PositionKey {
    /// Key of `point`.
    pub fn new(point: Point) -> Self {
        Self(canonical_bits(point.x), canonical_bits(point.y))
    }
}

impl From<Point> for PositionKey {
    fn from(point: Point) -> Self {
        Self::new(point)
    }
}

fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Pin {
        name: &'static str,
        at: Point,
    }

    fn pin(name: &'static str, x: f64, y: f64) -> Pin {
        Pin {
            name,
            at: Point::new(x, y),
        }
    }

    fn same_place(a: &Pin, b: &Pin) -> bool {
        a.at == b.at
    }

    #[test]
    fn positional_example() {
        let previous = [pin("A", 0.0, 0.0), pin("B", 1.0, 1.0)];
        let next = [pin("B", 1.0, 1.0), pin("C", 2.0, 2.0)];
        let delta = diff(&previous, &next, same_place);
        assert_eq!(delta.removed, [pin("A", 0.0, 0.0)]);
        assert_eq!(delta.added, [pin("C", 2.0, 2.0)]);
        assert_eq!(delta.persisting, 1);
    }

    #[test]
    fn initial_population() {
        let next = [pin("A", 0.0, 0.0), pin("B", 1.0, 1.0)];
        let delta = diff(&[], &next, same_place);
        assert!(delta.removed.is_empty());
        assert_eq!(delta.added, next);
    }

    #[test]
    fn value_equality_not_identity() {
        // Freshly constructed items with the same position persist, even if
        // other fields differ and order changes.
        let previous = [pin("A", 0.0, 0.0), pin("B", 5.0, 5.0)];
        let next = [pin("b2", 5.0, 5.0), pin("a2", 0.0, 0.0)];
        assert!(diff(&previous, &next, same_place).is_empty());
    }

    #[test]
    fn first_remaining_match_is_consumed() {
        let previous = [pin("p", 1.0, 1.0)];
        let next = [pin("x", 0.0, 0.0), pin("n1", 1.0, 1.0), pin("n2", 1.0, 1.0)];
        let delta = diff_indices(&previous, &next, same_place);
        assert_eq!(delta.matched, [(0, 1)]);
        assert_eq!(delta.added, [0, 2]);
        assert!(delta.removed.is_empty());
    }

    #[test]
    fn duplicates_are_counted_individually() {
        let delta = diff(&[7, 7, 7], &[7], |a, b| a == b);
        assert_eq!(delta.removed, [7, 7]);
        assert!(delta.added.is_empty());
        assert_eq!(delta.persisting, 1);

        let delta = diff(&[7], &[7, 7, 7], |a, b| a == b);
        assert!(delta.removed.is_empty());
        assert_eq!(delta.added, [7, 7]);
    }

    #[test]
    fn keyed_matches_linear() {
        let previous = [3, 1, 4, 1, 5, 9, 2, 6];
        let next = [2, 7, 1, 8, 2, 8, 1, 8];
        let linear = diff_indices(&previous, &next, |a, b| a == b);
        let keyed = diff_indices_by_key(&previous, &next, |v| *v);
        assert_eq!(linear, keyed);
        assert_eq!(linear.removed, [0, 2, 4, 5, 7]);
        assert_eq!(linear.added, [1, 3, 4, 5, 7]);
    }

    #[test]
    fn position_key_treats_signed_zero_as_equal() {
        assert_eq!(
            PositionKey::new(Point::new(0.0, 1.0)),
            PositionKey::new(Point::new(-0.0, 1.0))
        );
        assert_ne!(
            PositionKey::from(Point::new(0.5, 1.0)),
            PositionKey::from(Point::new(1.0, 0.5))
        );
    }

    #[test]
    fn position_key_gives_nan_a_stable_identity() {
        let quiet = Point::new(f64::NAN, 1.0);
        let negated = Point::new(-f64::NAN, 1.0);
        assert_eq!(PositionKey::from(quiet), PositionKey::from(negated));

        // Raw float equality never matches NaN; the keyed diff does.
        let points = [quiet, Point::new(2.0, 3.0)];
        let by_value = diff(&points, &points, |a, b| a.x == b.x && a.y == b.y);
        assert_eq!(by_value.persisting, 1);
        assert_eq!(by_value.removed.len(), 1);
        let by_key = diff_by_key(&points, &points, |p| PositionKey::new(*p));
        assert!(by_key.is_empty());
        assert_eq!(by_key.persisting, 2);
    }
}
