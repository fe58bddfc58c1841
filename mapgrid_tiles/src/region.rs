// Copyright 2025 the Mapgrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned regions of the coordinate plane.

use kurbo::{Point, Rect, Vec2};

use crate::error::{Axis, GridError};

/// Axis-aligned rectangle in coordinate space.
///
/// Used both as a viewport and as the bounds of a single tile. A `Region` is
/// always normalized (`min <= max` on both axes) and finite; the constructors
/// reject anything else.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Region {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Region {
    /// Create a region from min/max corners.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self, GridError> {
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return Err(GridError::NonFiniteRegion);
        }
        if min_x > max_x {
            return Err(GridError::InvertedRegion {
                axis: Axis::X,
                min: min_x,
                max: max_x,
            });
        }
        if min_y > max_y {
            return Err(GridError::InvertedRegion {
                axis: Axis::Y,
                min: min_y,
                max: max_y,
            });
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Create a region from a center and half extents, the way map viewports
    /// are usually described (center plus span).
    ///
    /// Negative half extents are rejected as an inverted region.
    pub fn from_center(center: Point, half_extent: Vec2) -> Result<Self, GridError> {
        Self::new(
            center.x - half_extent.x,
            center.y - half_extent.y,
            center.x + half_extent.x,
            center.y + half_extent.y,
        )
    }

    /// Create a region from a [`Rect`].
    ///
    /// Unlike [`Rect::abs`], an inverted rectangle is an error here.
    pub fn from_rect(rect: Rect) -> Result<Self, GridError> {
        Self::new(rect.x0, rect.y0, rect.x1, rect.y1)
    }

    /// Construct without validation. Callers guarantee normalized, finite bounds.
    pub(crate) const fn from_bounds_unchecked(
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Minimum x (left).
    #[inline]
    pub const fn min_x(&self) -> f64 {
        self.min_x
    }

    /// Minimum y (bottom).
    #[inline]
    pub const fn min_y(&self) -> f64 {
        self.min_y
    }

    /// Maximum x (right).
    #[inline]
    pub const fn max_x(&self) -> f64 {
        self.max_x
    }

    /// Maximum y (top).
    #[inline]
    pub const fn max_y(&self) -> f64 {
        self.max_y
    }

    /// Width of the region.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the region.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            0.5 * (self.min_x + self.max_x),
            0.5 * (self.min_y + self.max_y),
        )
    }

    /// Return true if the region has no area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max_x <= self.min_x || self.max_y <= self.min_y
    }

    /// Whether the closed region contains the point.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        self.min_x <= point.x
            && self.min_y <= point.y
            && point.x <= self.max_x
            && point.y <= self.max_y
    }

    /// Whether two regions share positive area.
    ///
    /// Regions that only touch along an edge or a corner do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// Scale the extents around the center by `factor`.
    ///
    /// A factor of `0.5` keeps only the middle of a viewport, which is a cheap
    /// way to see tiles being cropped and filled at the edge of the screen.
    /// Negative or non-finite factors are rejected.
    pub fn scaled_about_center(&self, factor: f64) -> Result<Self, GridError> {
        let c = self.center();
        let half = Vec2::new(0.5 * self.width() * factor, 0.5 * self.height() * factor);
        Self::from_center(c, half)
    }

    /// Convert to a [`Rect`].
    #[inline]
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

impl TryFrom<Rect> for Region {
    type Error = GridError;

    fn try_from(rect: Rect) -> Result<Self, Self::Error> {
        Self::from_rect(rect)
    }
}

impl From<Region> for Rect {
    fn from(region: Region) -> Self {
        region.to_rect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_and_non_finite() {
        assert_eq!(
            Region::new(10.0, 0.0, 0.0, 5.0),
            Err(GridError::InvertedRegion {
                axis: Axis::X,
                min: 10.0,
                max: 0.0
            })
        );
        assert!(matches!(
            Region::new(0.0, 5.0, 1.0, 4.0),
            Err(GridError::InvertedRegion { axis: Axis::Y, .. })
        ));
        assert_eq!(
            Region::new(0.0, 0.0, f64::NAN, 1.0),
            Err(GridError::NonFiniteRegion)
        );
        assert_eq!(
            Region::new(0.0, f64::NEG_INFINITY, 1.0, 1.0),
            Err(GridError::NonFiniteRegion)
        );
        assert!(Region::from_rect(Rect::new(5.0, 5.0, 0.0, 0.0)).is_err());
    }

    #[test]
    fn center_and_extents() {
        let r = Region::from_center(Point::new(10.0, 20.0), Vec2::new(5.0, 2.0)).unwrap();
        assert_eq!(r.min_x(), 5.0);
        assert_eq!(r.max_y(), 22.0);
        assert_eq!(r.center(), Point::new(10.0, 20.0));
        assert_eq!(r.width(), 10.0);
        assert_eq!(r.height(), 4.0);

        let half = r.scaled_about_center(0.5).unwrap();
        assert_eq!(half.center(), r.center());
        assert_eq!(half.width(), 5.0);
        assert_eq!(half.height(), 2.0);

        assert!(r.scaled_about_center(-1.0).is_err());
    }

    #[test]
    fn zero_area_is_empty() {
        let r = Region::new(3.0, 3.0, 3.0, 10.0).unwrap();
        assert!(r.is_empty());
        assert!(r.contains(Point::new(3.0, 5.0)));
    }

    #[test]
    fn touching_regions_do_not_overlap() {
        let a = Region::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let b = Region::new(10.0, 0.0, 20.0, 10.0).unwrap();
        let c = Region::new(9.0, 9.0, 20.0, 20.0).unwrap();
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn rect_conversion() {
        let rect = Rect::new(-1.0, -2.0, 3.0, 4.0);
        let r = Region::try_from(rect).unwrap();
        assert_eq!(Rect::from(r), rect);
    }
}
