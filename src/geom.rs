//! Coordinate types and axis-aligned boxes.
//!
//! Persistent geometry lives in integer document space ([`Coordi`]). Floating
//! working coordinates ([`Coordf`]) appear only where geometry meets the
//! renderer or the pointer.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A point in integer document space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordi {
    pub x: i64,
    pub y: i64,
}

impl Coordi {
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Convert to working space.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f(self) -> Coordf {
        Coordf::new(self.x as f64, self.y as f64)
    }
}

impl Add for Coordi {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Coordi {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A point in floating working space (document-derived or screen pixels).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordf {
    pub x: f64,
    pub y: f64,
}

impl Coordf {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared length of the vector.
    #[must_use]
    pub fn mag_sq(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    #[must_use]
    pub fn mag(self) -> f64 {
        self.mag_sq().sqrt()
    }

    /// 2-D cross product (z component).
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Round to the nearest document coordinate.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn round(self) -> Coordi {
        Coordi::new(self.x.round() as i64, self.y.round() as i64)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Coordf {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Coordf {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Coordf {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Coordf {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Coordf {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<Coordi> for Coordf {
    fn from(c: Coordi) -> Self {
        c.to_f()
    }
}

/// Axis-aligned bounding box in working space.
///
/// [`BBox::EMPTY`] is the neutral element of [`BBox::union`]: its minimum is
/// `+inf` and its maximum `-inf`, so folding any point into it yields that
/// point's degenerate box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Coordf,
    pub max: Coordf,
}

impl Default for BBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BBox {
    pub const EMPTY: Self = Self {
        min: Coordf::new(f64::INFINITY, f64::INFINITY),
        max: Coordf::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
    };

    /// Box spanning two corners given in any order.
    #[must_use]
    pub fn from_corners(a: Coordf, b: Coordf) -> Self {
        Self {
            min: Coordf::new(a.x.min(b.x), a.y.min(b.y)),
            max: Coordf::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Box centered on `center` with half-extents `half`.
    #[must_use]
    pub fn around(center: Coordf, half: f64) -> Self {
        Self {
            min: Coordf::new(center.x - half, center.y - half),
            max: Coordf::new(center.x + half, center.y + half),
        }
    }

    /// Smallest box containing every point of `points`.
    #[must_use]
    pub fn of_points<I: IntoIterator<Item = Coordf>>(points: I) -> Self {
        points.into_iter().fold(Self::EMPTY, Self::including)
    }

    /// Returns `true` if no point has been folded into the box.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    #[must_use]
    pub fn including(self, p: Coordf) -> Self {
        Self {
            min: Coordf::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            max: Coordf::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        }
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if other.is_empty() {
            return self;
        }
        self.including(other.min).including(other.max)
    }

    /// Grow the box by `d` on every side. Empty boxes stay empty.
    #[must_use]
    pub fn inflate(self, d: f64) -> Self {
        if self.is_empty() {
            return self;
        }
        Self {
            min: Coordf::new(self.min.x - d, self.min.y - d),
            max: Coordf::new(self.max.x + d, self.max.y + d),
        }
    }

    #[must_use]
    pub fn contains(&self, p: Coordf) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Returns `true` if `other` lies entirely inside this box.
    #[must_use]
    pub fn encloses(&self, other: &Self) -> bool {
        !other.is_empty() && self.contains(other.min) && self.contains(other.max)
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max.x - self.min.x }
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max.y - self.min.y }
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    #[must_use]
    pub fn center(&self) -> Coordf {
        Coordf::new((self.min.x + self.max.x) / 2.0, (self.min.y + self.max.y) / 2.0)
    }
}
