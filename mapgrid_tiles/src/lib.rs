// Copyright 2025 the Mapgrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapgrid Tiles: a lazily materialized 2D tile grid driven by a visible region.
//!
//! The unbounded coordinate plane is partitioned into fixed-size square tiles.
//! As the visible region (for example a map viewport) moves, the grid keeps
//! exactly the tiles that intersect it and reports the minimal change:
//!
//! - [`GridIndex`]: pure mapping between coordinates, [`TileIndex`] keys and tile
//!   [`Region`]s, with a configurable [`AxisScale`] and [`BoundaryRule`].
//! - [`SpatialTileGrid`]: owns materialized tiles and exposes
//!   [`crop`](SpatialTileGrid::crop) / [`fill`](SpatialTileGrid::fill), plus
//!   [`update`](SpatialTileGrid::update) which runs both in the required order.
//!
//! The same grid type doubles as a static bucket store: `SpatialTileGrid<Vec<I>>`
//! can bucket items by position and answer "everything near this region"
//! queries, which is how tile payloads are usually computed.
//!
//! # Example
//!
//! ```rust
//! use mapgrid_tiles::{GridIndex, Region, SpatialTileGrid, TileIndex};
//!
//! let mut grid: SpatialTileGrid<String> = SpatialTileGrid::new(GridIndex::new(100.0).unwrap());
//!
//! let view = Region::new(0.0, 0.0, 250.0, 250.0).unwrap();
//! let update = grid.update(&view, |index, _| format!("{},{}", index.col, index.row));
//! assert_eq!(update.added.len(), 9);
//! assert!(update.removed.is_empty());
//!
//! // Pan right by one tile: one column leaves, one column enters.
//! let view = Region::new(100.0, 0.0, 350.0, 250.0).unwrap();
//! let update = grid.update(&view, |index, _| format!("{},{}", index.col, index.row));
//! assert_eq!(update.removed.len(), 3);
//! assert_eq!(update.added.len(), 3);
//! assert!(grid.contains(TileIndex::new(3, 2)));
//! ```
//!
//! ## Edges
//!
//! A tile is visible when it shares positive area with the region; tiles that
//! only touch the region's edge are not materialized, and a zero-area region
//! empties the grid. A point exactly on a shared tile edge belongs to one tile
//! only, chosen by the grid's [`BoundaryRule`] (lower/left by default).
//!
//! ## Features
//!
//! - `std` *(default)*: enables `std` in `kurbo` and `tracing`.
//! - `libm`: floating-point rounding through `libm` for `no_std` builds.
//!
//! Region bounds are validated on construction; see [`GridError`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod error;
mod grid;
mod index;
mod region;

pub use error::{Axis, GridError};
pub use grid::{SpatialTileGrid, Tile, TileRef, TileUpdate};
pub use index::{
    AxisScale, BoundaryRule, GridIndex, METERS_PER_DEGREE, TileIndex, TileRange, TileRangeIter,
};
pub use region::Region;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use kurbo::Point;

    #[test]
    fn view_grid_fed_from_bucket_store() {
        // Fine buckets of points, coarse view tiles computed from them.
        let mut store = SpatialTileGrid::<Vec<Point>>::new(GridIndex::new(5.0).unwrap());
        for i in 0..40 {
            let p = Point::new(f64::from(i) * 2.5, 1.0);
            store.push_at(p, p);
        }

        let view_index = GridIndex::new(20.0).unwrap();
        let mut view = SpatialTileGrid::<Vec<Point>>::new(view_index);
        let region = Region::new(0.0, 0.0, 60.0, 10.0).unwrap();
        let update = view.update(&region, |index, grid| {
            store
                .items_in(&grid.region(index))
                .filter(|p| view_index.owns(index, **p))
                .copied()
                .collect()
        });
        assert_eq!(update.added.len(), 3);

        // Every point owned by a visible tile appears exactly once.
        let mut seen: Vec<Point> = view.iter().flat_map(|t| t.payload.iter().copied()).collect();
        seen.sort_by(|a, b| a.x.total_cmp(&b.x));
        let expected: Vec<Point> = (0..40)
            .map(|i| Point::new(f64::from(i) * 2.5, 1.0))
            .filter(|p| p.x > 0.0 && p.x <= 60.0)
            .collect();
        assert_eq!(seen, expected);
    }
}
