// Copyright 2025 the Mapgrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pure coordinate ↔ tile index mapping.
//!
//! A [`GridIndex`] partitions the unbounded plane into square tiles of a fixed
//! size, measured in *grid units*. A per-axis [`AxisScale`] converts
//! coordinates into grid units, so along each axis tile `k` spans
//! `k * tile_size / scale` to `(k + 1) * tile_size / scale` in coordinate
//! space. Those rounded edges are the only boundaries: ownership, tile
//! regions and intersection queries all compare against them. Tile indices
//! are `i32` per axis; values outside that range saturate.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Point;

use crate::error::GridError;
use crate::region::Region;

/// Integer key of a tile: column along x, row along y.
///
/// Ordered row-major (row first, then column), which is also the order in
/// which a [`TileRange`] is iterated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex {
    /// Row (y axis). Declared first so the derived ordering is row-major.
    pub row: i32,
    /// Column (x axis).
    pub col: i32,
}

impl TileIndex {
    /// Create a tile index from a column and a row.
    #[inline]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { row, col }
    }
}

/// Multipliers converting coordinates into grid units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisScale {
    /// Grid units per coordinate unit along x.
    pub x: f64,
    /// Grid units per coordinate unit along y.
    pub y: f64,
}

impl AxisScale {
    /// Coordinates already are grid units.
    pub const IDENTITY: Self = Self { x: 1.0, y: 1.0 };

    /// Degrees to metres.
    ///
    /// Equirectangular approximation: one degree is taken as 111 320 m on both
    /// axes regardless of latitude, so tiles are square in degrees and get
    /// narrower on the ground towards the poles. Good enough for bucketing map
    /// annotations, not for measuring distances.
    pub const GEOGRAPHIC: Self = Self {
        x: METERS_PER_DEGREE,
        y: METERS_PER_DEGREE,
    };

    /// Create a scale, rejecting zero, negative, and non-finite factors.
    pub fn new(x: f64, y: f64) -> Result<Self, GridError> {
        if x.is_finite() && y.is_finite() && x > 0.0 && y > 0.0 {
            Ok(Self { x, y })
        } else {
            Err(GridError::InvalidScale { x, y })
        }
    }
}

impl Default for AxisScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Metres per degree used by [`AxisScale::GEOGRAPHIC`].
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Which tile owns a point lying exactly on a shared edge.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoundaryRule {
    /// The lower/left tile wins: tiles own the half-open interval `(lo, hi]`.
    #[default]
    LowerLeft,
    /// The upper/right tile wins: tiles own the half-open interval `[lo, hi)`.
    UpperRight,
}

/// Stateless mapping between coordinates, tile indices, and tile regions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridIndex {
    tile_size: f64,
    scale: AxisScale,
    boundary: BoundaryRule,
}

impl GridIndex {
    /// Create a grid index with the given tile size, identity scale, and the
    /// [`BoundaryRule::LowerLeft`] edge convention.
    pub fn new(tile_size: f64) -> Result<Self, GridError> {
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(GridError::InvalidTileSize(tile_size));
        }
        Ok(Self {
            tile_size,
            scale: AxisScale::IDENTITY,
            boundary: BoundaryRule::default(),
        })
    }

    /// Create a grid over longitude/latitude degrees with tiles measured in
    /// metres (see [`AxisScale::GEOGRAPHIC`]).
    pub fn geographic(tile_size_meters: f64) -> Result<Self, GridError> {
        Ok(Self::new(tile_size_meters)?.with_scale(AxisScale::GEOGRAPHIC))
    }

    /// Replace the axis scale.
    #[must_use]
    pub const fn with_scale(mut self, scale: AxisScale) -> Self {
        self.scale = scale;
        self
    }

    /// Replace the edge-ownership rule.
    #[must_use]
    pub const fn with_boundary(mut self, boundary: BoundaryRule) -> Self {
        self.boundary = boundary;
        self
    }

    /// Tile size in grid units.
    #[inline]
    pub const fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Axis scale.
    #[inline]
    pub const fn scale(&self) -> AxisScale {
        self.scale
    }

    /// Edge-ownership rule.
    #[inline]
    pub const fn boundary(&self) -> BoundaryRule {
        self.boundary
    }

    /// Index of the tile owning `point`.
    pub fn index_for(&self, point: Point) -> TileIndex {
        let (w, h) = self.tile_extent();
        TileIndex::new(
            cell(point.x, w, self.boundary),
            cell(point.y, h, self.boundary),
        )
    }

    /// Whether `index` owns `point`. Useful to keep factories from inserting
    /// the same item into two neighbouring tiles.
    #[inline]
    pub fn owns(&self, index: TileIndex, point: Point) -> bool {
        self.index_for(point) == index
    }

    /// Exact bounds of a tile in coordinate space.
    ///
    /// The edges are the same values [`index_for`](Self::index_for) and
    /// [`indices_intersecting`](Self::indices_intersecting) compare against,
    /// so a tile's own region intersects only that tile and its corners are
    /// owned according to the [`BoundaryRule`].
    pub fn region_for(&self, index: TileIndex) -> Region {
        let (w, h) = self.tile_extent();
        Region::from_bounds_unchecked(
            edge(index.col, w),
            edge(index.row, h),
            edge_after(index.col, w),
            edge_after(index.row, h),
        )
    }

    /// Every tile index whose region shares positive area with `region`.
    ///
    /// Tiles that merely touch the region along an edge are excluded, and a
    /// zero-area region intersects nothing.
    pub fn indices_intersecting(&self, region: &Region) -> TileRange {
        if region.is_empty() {
            return TileRange::EMPTY;
        }
        let (w, h) = self.tile_extent();
        // First tile ending after `min`, last tile starting before `max`.
        TileRange::new(
            cell(region.min_x(), w, BoundaryRule::UpperRight),
            cell(region.max_x(), w, BoundaryRule::LowerLeft),
            cell(region.min_y(), h, BoundaryRule::UpperRight),
            cell(region.max_y(), h, BoundaryRule::LowerLeft),
        )
    }

    /// Tile width and height in coordinate units.
    fn tile_extent(&self) -> (f64, f64) {
        (self.tile_size / self.scale.x, self.tile_size / self.scale.y)
    }
}

/// Left edge of tile `k` along an axis with tiles `w` wide.
#[inline]
fn edge(k: i32, w: f64) -> f64 {
    f64::from(k) * w
}

/// Right edge of tile `k`; equal to `edge(k + 1, w)` without overflowing.
#[inline]
fn edge_after(k: i32, w: f64) -> f64 {
    (f64::from(k) + 1.0) * w
}

/// Tile along one axis owning coordinate `v`.
///
/// The division only gives a first guess; the result is settled against the
/// rounded edges themselves. `LowerLeft` tiles own `(edge, edge_after]`,
/// `UpperRight` tiles own `[edge, edge_after)`.
fn cell(v: f64, w: f64, rule: BoundaryRule) -> i32 {
    let mut k = saturate((v / w).floor());
    match rule {
        BoundaryRule::LowerLeft => {
            while k > i32::MIN && v <= edge(k, w) {
                k -= 1;
            }
            while k < i32::MAX && v > edge_after(k, w) {
                k += 1;
            }
        }
        BoundaryRule::UpperRight => {
            while k > i32::MIN && v < edge(k, w) {
                k -= 1;
            }
            while k < i32::MAX && v >= edge_after(k, w) {
                k += 1;
            }
        }
    }
    k
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Tile indices are intentionally i32; out-of-range values are saturated."
)]
#[inline]
fn saturate(v: f64) -> i32 {
    // `as` saturates at the i32 bounds for finite and infinite input.
    v as i32
}

/// Rectangular block of tile indices, used as a set.
///
/// Both spans are inclusive. An empty range contains nothing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileRange {
    min_col: i32,
    max_col: i32,
    min_row: i32,
    max_row: i32,
}

impl TileRange {
    /// The range containing no tiles.
    pub const EMPTY: Self = Self {
        min_col: 0,
        max_col: -1,
        min_row: 0,
        max_row: -1,
    };

    /// Create an inclusive range. Collapses to [`TileRange::EMPTY`] when either
    /// span is inverted.
    pub const fn new(min_col: i32, max_col: i32, min_row: i32, max_row: i32) -> Self {
        if min_col > max_col || min_row > max_row {
            Self::EMPTY
        } else {
            Self {
                min_col,
                max_col,
                min_row,
                max_row,
            }
        }
    }

    /// Whether the range contains no tiles.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.min_col > self.max_col || self.min_row > self.max_row
    }

    /// Whether `index` is part of the range.
    #[inline]
    pub const fn contains(&self, index: TileIndex) -> bool {
        self.min_col <= index.col
            && index.col <= self.max_col
            && self.min_row <= index.row
            && index.row <= self.max_row
    }

    /// Number of tiles in the range, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let cols = (i64::from(self.max_col) - i64::from(self.min_col) + 1).unsigned_abs();
        let rows = (i64::from(self.max_row) - i64::from(self.min_row) + 1).unsigned_abs();
        usize::try_from(cols.saturating_mul(rows)).unwrap_or(usize::MAX)
    }

    /// Iterate the indices in row-major order.
    pub fn iter(&self) -> TileRangeIter {
        TileRangeIter {
            range: *self,
            next: if self.is_empty() {
                None
            } else {
                Some(TileIndex::new(self.min_col, self.min_row))
            },
        }
    }
}

impl IntoIterator for TileRange {
    type Item = TileIndex;
    type IntoIter = TileRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Row-major iterator over a [`TileRange`].
#[derive(Clone, Debug)]
pub struct TileRangeIter {
    range: TileRange,
    next: Option<TileIndex>,
}

impl Iterator for TileRangeIter {
    type Item = TileIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = if current.col < self.range.max_col {
            Some(TileIndex::new(current.col + 1, current.row))
        } else if current.row < self.range.max_row {
            Some(TileIndex::new(self.range.min_col, current.row + 1))
        } else {
            None
        };
        Some(current)
    }
}
