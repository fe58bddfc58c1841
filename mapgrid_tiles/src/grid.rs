// Copyright 2025 the Mapgrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazily materialized tile grid.
//!
//! [`SpatialTileGrid`] owns the set of tiles currently intersecting the most
//! recently queried region. On every region change, call [`crop`] *then*
//! [`fill`] (or [`update`], which does both in that order):
//!
//! - `crop` drops every tile that no longer intersects the region and hands
//!   the payloads back for teardown;
//! - `fill` creates each newly visible tile exactly once through a factory.
//!
//! Calling `fill` before `crop` would leave tiles that left the view alive
//! and skip recreating ones that came back within the same transition.
//!
//! [`crop`]: SpatialTileGrid::crop
//! [`fill`]: SpatialTileGrid::fill
//! [`update`]: SpatialTileGrid::update

use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::HashMap;
use kurbo::Point;

use crate::index::{GridIndex, TileIndex};
use crate::region::Region;

/// A tile removed from the grid, together with its payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile<T> {
    /// Grid position of the tile.
    pub index: TileIndex,
    /// Payload that was owned by the grid.
    pub payload: T,
}

/// A borrowed view of a materialized tile.
#[derive(Debug)]
pub struct TileRef<'a, T> {
    /// Grid position of the tile.
    pub index: TileIndex,
    /// Payload still owned by the grid.
    pub payload: &'a T,
}

impl<T> Clone for TileRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TileRef<'_, T> {}

/// Result of a combined [`SpatialTileGrid::update`].
#[derive(Clone, Debug, PartialEq)]
pub struct TileUpdate<T> {
    /// Tiles that left the region, ordered by index.
    pub removed: Vec<Tile<T>>,
    /// Indices that were materialized, ordered by index. Payloads stay in
    /// the grid; look them up with [`SpatialTileGrid::get`].
    pub added: Vec<TileIndex>,
}

impl<T> TileUpdate<T> {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// A mapping from [`TileIndex`] to payload over a fixed [`GridIndex`].
pub struct SpatialTileGrid<T> {
    index: GridIndex,
    tiles: HashMap<TileIndex, T>,
}

impl<T> Debug for SpatialTileGrid<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpatialTileGrid")
            .field("index", &self.index)
            .field("live_tiles", &self.tiles.len())
            .finish_non_exhaustive()
    }
}

impl<T> SpatialTileGrid<T> {
    /// Create an empty grid over `index`.
    pub fn new(index: GridIndex) -> Self {
        Self {
            index,
            tiles: HashMap::new(),
        }
    }

    /// The coordinate mapping of this grid.
    #[inline]
    pub const fn grid_index(&self) -> &GridIndex {
        &self.index
    }

    /// Bounds of the tile at `index`, materialized or not.
    #[inline]
    pub fn region(&self, index: TileIndex) -> Region {
        self.index.region_for(index)
    }

    /// Index of the tile that owns `point`.
    #[inline]
    pub fn index_for(&self, point: Point) -> TileIndex {
        self.index.index_for(point)
    }

    /// Number of materialized tiles.
    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether no tile is materialized.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Whether the tile at `index` is materialized.
    #[inline]
    pub fn contains(&self, index: TileIndex) -> bool {
        self.tiles.contains_key(&index)
    }

    /// Payload of a materialized tile.
    #[inline]
    pub fn get(&self, index: TileIndex) -> Option<&T> {
        self.tiles.get(&index)
    }

    /// Mutable payload of a materialized tile.
    #[inline]
    pub fn get_mut(&mut self, index: TileIndex) -> Option<&mut T> {
        self.tiles.get_mut(&index)
    }

    /// Materialize or replace a tile directly, returning the previous payload.
    ///
    /// Intended for grids used as a static bucket store. View grids should go
    /// through [`crop`](Self::crop) and [`fill`](Self::fill) instead.
    pub fn insert(&mut self, index: TileIndex, payload: T) -> Option<T> {
        self.tiles.insert(index, payload)
    }

    /// Remove a single tile.
    pub fn remove(&mut self, index: TileIndex) -> Option<T> {
        self.tiles.remove(&index)
    }

    /// Drop every tile.
    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    /// Iterate all materialized tiles in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = TileRef<'_, T>> + '_ {
        self.tiles
            .iter()
            .map(|(&index, payload)| TileRef { index, payload })
    }

    /// Materialized tiles whose index intersects `region`, ordered by index.
    pub fn tiles_in(&self, region: &Region) -> Vec<TileRef<'_, T>> {
        let range = self.index.indices_intersecting(region);
        let mut out: Vec<TileRef<'_, T>> = if range.len() <= self.tiles.len() {
            range
                .iter()
                .filter_map(|index| {
                    self.tiles
                        .get(&index)
                        .map(|payload| TileRef { index, payload })
                })
                .collect()
        } else {
            // Sparse store viewed through a large region: scan the live map.
            self.iter().filter(|t| range.contains(t.index)).collect()
        };
        out.sort_unstable_by_key(|t| t.index);
        out
    }

    /// Remove every tile that does not intersect `region`.
    ///
    /// Returns the removed tiles ordered by index; ownership of each payload
    /// moves to the caller. Tiles still intersecting the region are untouched.
    pub fn crop(&mut self, region: &Region) -> Vec<Tile<T>> {
        let range = self.index.indices_intersecting(region);
        let mut removed: Vec<Tile<T>> = self
            .tiles
            .extract_if(|index, _| !range.contains(*index))
            .map(|(index, payload)| Tile { index, payload })
            .collect();
        removed.sort_unstable_by_key(|t| t.index);
        removed
    }

    /// Materialize every tile intersecting `region` that is not live yet.
    ///
    /// `factory` runs exactly once per new index. It receives the grid as it
    /// was before this call, so it may read other live tiles but cannot see
    /// or mutate the ones being created. Returns the new tiles ordered by
    /// index.
    pub fn fill<F>(&mut self, region: &Region, factory: F) -> Vec<TileRef<'_, T>>
    where
        F: FnMut(TileIndex, &Self) -> T,
    {
        let added = self.materialize(region, factory);
        added
            .into_iter()
            .filter_map(|index| {
                self.tiles
                    .get(&index)
                    .map(|payload| TileRef { index, payload })
            })
            .collect()
    }

    /// Crop then fill to `region`, in that order.
    pub fn update<F>(&mut self, region: &Region, factory: F) -> TileUpdate<T>
    where
        F: FnMut(TileIndex, &Self) -> T,
    {
        let removed = self.crop(region);
        let added = self.materialize(region, factory);
        tracing::debug!(
            added = added.len(),
            removed = removed.len(),
            live = self.tiles.len(),
            "tile grid updated"
        );
        TileUpdate { removed, added }
    }

    /// Create and insert the missing tiles of `region`, returning their
    /// indices in order. Every payload is built before any is inserted.
    fn materialize<F>(&mut self, region: &Region, mut factory: F) -> Vec<TileIndex>
    where
        F: FnMut(TileIndex, &Self) -> T,
    {
        let before: &Self = self;
        // Range iteration is row-major, which is also `TileIndex` order.
        let created: Vec<(TileIndex, T)> = before
            .index
            .indices_intersecting(region)
            .iter()
            .filter(|index| !before.tiles.contains_key(index))
            .map(|index| (index, factory(index, before)))
            .collect();
        let added = created.iter().map(|(index, _)| *index).collect();
        self.tiles.extend(created);
        added
    }
}

impl<I> SpatialTileGrid<Vec<I>> {
    /// Bucket `item` into the tile owning `position`, materializing it if needed.
    pub fn push_at(&mut self, position: Point, item: I) {
        let index = self.index.index_for(position);
        self.tiles.entry(index).or_default().push(item);
    }

    /// Items of every bucket intersecting `region`, flattened in index order.
    ///
    /// This is a coarse query: buckets are selected by tile, so items near
    /// the region's edge may lie outside it.
    pub fn items_in(&self, region: &Region) -> impl Iterator<Item = &I> + '_ {
        self.tiles_in(region)
            .into_iter()
            .flat_map(|tile| tile.payload.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn grid<T>() -> SpatialTileGrid<T> {
        SpatialTileGrid::new(GridIndex::new(100.0).unwrap())
    }

    fn region(x0: f64, y0: f64, x1: f64, y1: f64) -> Region {
        Region::new(x0, y0, x1, y1).unwrap()
    }

    fn live<T>(g: &SpatialTileGrid<T>) -> Vec<TileIndex> {
        let mut v: Vec<_> = g.iter().map(|t| t.index).collect();
        v.sort();
        v
    }

    #[test]
    fn fill_materializes_each_index_once() {
        let mut g = grid::<u32>();
        let mut calls = 0;
        let added = g.fill(&region(0.0, 0.0, 250.0, 250.0), |_, _| {
            calls += 1;
            calls
        });
        assert_eq!(added.len(), 9);
        assert_eq!(calls, 9);
        assert_eq!(g.len(), 9);

        let again = g.fill(&region(0.0, 0.0, 250.0, 250.0), |_, _| unreachable!());
        assert!(again.is_empty());
    }

    #[test]
    fn crop_returns_only_tiles_leaving_view() {
        let mut g = grid::<TileIndex>();
        let first = region(0.0, 0.0, 250.0, 250.0);
        let _ = g.crop(&first);
        let _ = g.fill(&first, |i, _| i);

        let second = region(150.0, 0.0, 350.0, 50.0);
        let removed = g.crop(&second);
        assert_eq!(removed.len(), 7);
        for tile in &removed {
            assert_eq!(tile.index, tile.payload);
            assert!(!g.contains(tile.index));
        }
        assert_eq!(live(&g), vec![TileIndex::new(1, 0), TileIndex::new(2, 0)]);

        let added: Vec<_> = g.fill(&second, |i, _| i).iter().map(|t| t.index).collect();
        assert_eq!(added, vec![TileIndex::new(3, 0)]);
    }

    #[test]
    fn update_is_idempotent() {
        let mut g = grid::<()>();
        let r = region(-120.0, -30.0, 80.0, 310.0);
        let first = g.update(&r, |_, _| ());
        assert!(first.removed.is_empty());
        assert_eq!(first.added.len(), g.len());

        let second = g.update(&r, |_, _| ());
        assert!(second.is_empty());
    }

    #[test]
    fn update_matches_crop_then_fill() {
        let mut stepwise = grid::<TileIndex>();
        let mut combined = grid::<TileIndex>();
        for r in [
            region(0.0, 0.0, 250.0, 250.0),
            region(120.0, -40.0, 380.0, 90.0),
            region(5.0, 5.0, 5.0, 5.0),
            region(-310.0, 20.0, -20.0, 180.0),
        ] {
            let removed = stepwise.crop(&r);
            let added: Vec<TileIndex> = stepwise
                .fill(&r, |i, _| i)
                .iter()
                .map(|t| t.index)
                .collect();
            let update = combined.update(&r, |i, _| i);
            assert_eq!(update.removed, removed);
            assert_eq!(update.added, added);
            assert_eq!(live(&combined), live(&stepwise));
        }
    }

    #[test]
    fn degenerate_region_crops_everything_and_fills_nothing() {
        let mut g = grid::<()>();
        let _ = g.update(&region(0.0, 0.0, 250.0, 250.0), |_, _| ());
        let update = g.update(&region(10.0, 10.0, 10.0, 10.0), |_, _| ());
        assert_eq!(update.removed.len(), 9);
        assert!(update.added.is_empty());
        assert!(g.is_empty());
    }

    #[test]
    fn factory_reads_existing_tiles_only() {
        let mut g = grid::<usize>();
        let _ = g.update(&region(0.0, 0.0, 100.0, 100.0), |_, _| 0);
        let update = g.update(&region(0.0, 0.0, 300.0, 100.0), |_, grid| grid.len());
        // Both new tiles see the single tile that was live before the fill.
        assert_eq!(update.added, vec![TileIndex::new(1, 0), TileIndex::new(2, 0)]);
        assert_eq!(g.get(TileIndex::new(1, 0)), Some(&1));
        assert_eq!(g.get(TileIndex::new(2, 0)), Some(&1));
    }

    #[test]
    fn factory_can_compute_payload_from_own_region() {
        let mut g = grid::<Region>();
        let _ = g.update(&region(0.0, 0.0, 150.0, 50.0), |i, grid| grid.region(i));
        let r = g.get(TileIndex::new(1, 0)).unwrap();
        assert_eq!((r.min_x(), r.max_x()), (100.0, 200.0));
    }

    #[test]
    fn bucket_store_queries() {
        let mut store = SpatialTileGrid::<Vec<&str>>::new(GridIndex::new(10.0).unwrap());
        store.push_at(Point::new(1.0, 1.0), "a");
        store.push_at(Point::new(2.0, 3.0), "b");
        store.push_at(Point::new(15.0, 1.0), "c");
        store.push_at(Point::new(500.0, 500.0), "far");
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(TileIndex::new(0, 0)), Some(&vec!["a", "b"]));

        let near: Vec<_> = store.items_in(&region(0.0, 0.0, 20.0, 5.0)).copied().collect();
        assert_eq!(near, vec!["a", "b", "c"]);

        // Large region over a sparse store takes the map-scan path.
        let all: Vec<_> = store
            .items_in(&region(-1.0e6, -1.0e6, 1.0e6, 1.0e6))
            .copied()
            .collect();
        assert_eq!(all, vec!["a", "b", "c", "far"]);
    }

    #[test]
    fn direct_insert_and_remove() {
        let mut g = grid::<u8>();
        assert_eq!(g.insert(TileIndex::new(4, 4), 1), None);
        assert_eq!(g.insert(TileIndex::new(4, 4), 2), Some(1));
        if let Some(p) = g.get_mut(TileIndex::new(4, 4)) {
            *p += 1;
        }
        assert_eq!(g.remove(TileIndex::new(4, 4)), Some(3));
        assert!(g.is_empty());
        g.insert(TileIndex::new(0, 0), 0);
        g.clear();
        assert!(g.is_empty());
    }
}
