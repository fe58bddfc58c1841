// Copyright 2025 the Mapgrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Boundary validation errors.

use thiserror::Error;

/// One of the two axes of the coordinate plane.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal axis (longitude / easting).
    X,
    /// Vertical axis (latitude / northing).
    Y,
}

/// Caller contract violations rejected at the grid boundary.
///
/// None of these are runtime conditions: they indicate a bug upstream of the
/// grid (a viewport computed with swapped corners, a zero tile size, ...).
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GridError {
    /// A region whose minimum exceeds its maximum on one axis.
    #[error("inverted region on the {axis:?} axis: min {min} > max {max}")]
    InvertedRegion {
        /// The offending axis.
        axis: Axis,
        /// Minimum bound that was supplied.
        min: f64,
        /// Maximum bound that was supplied.
        max: f64,
    },
    /// A region with a NaN or infinite bound.
    #[error("region bounds must be finite")]
    NonFiniteRegion,
    /// Tile size must be finite and strictly positive.
    #[error("invalid tile size {0}")]
    InvalidTileSize(f64),
    /// Axis scale factors must be finite and strictly positive.
    #[error("invalid axis scale ({x}, {y})")]
    InvalidScale {
        /// Horizontal factor.
        x: f64,
        /// Vertical factor.
        y: f64,
    },
}
