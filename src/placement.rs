//! Rigid placements (mirror, then rotate, then translate) and their composition.

#[cfg(test)]
#[path = "placement_test.rs"]
mod placement_test;

use serde::{Deserialize, Serialize};

use crate::geom::{BBox, Coordf, Coordi};

/// Position of a child object in its parent's frame.
///
/// Applying a placement to a point mirrors it about the y axis (if `mirror`),
/// rotates it counter-clockwise by `angle` degrees, then shifts it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Placement {
    pub shift: Coordi,
    /// Counter-clockwise rotation in degrees.
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub mirror: bool,
}

impl Placement {
    pub const IDENTITY: Self = Self { shift: Coordi::new(0, 0), angle: 0.0, mirror: false };

    #[must_use]
    pub fn new(shift: Coordi, angle: f64, mirror: bool) -> Self {
        Self { shift, angle: normalize_angle(angle), mirror }
    }

    /// Pure translation.
    #[must_use]
    pub fn at(x: i64, y: i64) -> Self {
        Self { shift: Coordi::new(x, y), ..Self::IDENTITY }
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Map a point from this placement's local frame into the parent frame.
    #[must_use]
    pub fn transform(&self, p: Coordf) -> Coordf {
        let x = if self.mirror { -p.x } else { p.x };
        let (x, y) = rotate(x, p.y, self.angle);
        Coordf::new(x + self.shift.to_f().x, y + self.shift.to_f().y)
    }

    /// [`transform`](Self::transform) for document coordinates, rounding the result.
    #[must_use]
    pub fn transform_i(&self, p: Coordi) -> Coordi {
        self.transform(p.to_f()).round()
    }

    /// Axis-aligned box around the transformed corners of `bbox`.
    #[must_use]
    pub fn transform_bbox(&self, bbox: &BBox) -> BBox {
        if bbox.is_empty() {
            return *bbox;
        }
        BBox::of_points([
            self.transform(bbox.min),
            self.transform(Coordf::new(bbox.max.x, bbox.min.y)),
            self.transform(bbox.max),
            self.transform(Coordf::new(bbox.min.x, bbox.max.y)),
        ])
    }

    /// Compose `self` (outer) with `child` (inner): the result maps child-local
    /// points straight into this placement's parent frame.
    #[must_use]
    pub fn accumulate(&self, child: &Self) -> Self {
        let angle = if self.mirror { self.angle - child.angle } else { self.angle + child.angle };
        Self {
            shift: self.transform_i(child.shift),
            angle: normalize_angle(angle),
            mirror: self.mirror ^ child.mirror,
        }
    }
}

fn normalize_angle(deg: f64) -> f64 {
    let a = deg.rem_euclid(360.0);
    if a >= 360.0 { 0.0 } else { a }
}

/// Rotate counter-clockwise, exact for quarter turns.
#[allow(clippy::float_cmp)]
fn rotate(x: f64, y: f64, deg: f64) -> (f64, f64) {
    let deg = normalize_angle(deg);
    if deg == 0.0 {
        (x, y)
    } else if deg == 90.0 {
        (-y, x)
    } else if deg == 180.0 {
        (-x, -y)
    } else if deg == 270.0 {
        (y, -x)
    } else {
        let (s, c) = deg.to_radians().sin_cos();
        (x * c - y * s, x * s + y * c)
    }
}
