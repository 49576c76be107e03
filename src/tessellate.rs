//! Geometry to triangle conversion.
//!
//! All functions are placement-independent: they work in whatever frame the
//! caller hands them points in, and return plain vertex triples. Attaching a
//! layer, colour and owner happens at emission time in [`crate::canvas`].
//!
//! Degenerate input (fewer than three distinct polygon points, zero-length
//! wide lines of zero width) yields no triangles rather than an error.

#[cfg(test)]
#[path = "tessellate_test.rs"]
mod tessellate_test;

use std::f64::consts::TAU;

use crate::consts::DEGENERATE_AREA_EPSILON;
use crate::geom::Coordf;

pub type Tri = [Coordf; 3];

/// Filled circle as a triangle fan.
#[must_use]
pub fn circle(center: Coordf, radius: f64, segments: usize) -> Vec<Tri> {
    if radius <= 0.0 {
        return Vec::new();
    }
    let rim = arc_points(center, radius, 0.0, TAU, segments.max(3));
    rim.windows(2).map(|w| [center, w[0], w[1]]).collect()
}

/// Points along an arc from `a0` to `a1` (radians, counter-clockwise).
///
/// The number of points scales with the swept angle; a full turn uses
/// `segments + 1` points with the last equal to the first.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn arc_points(center: Coordf, radius: f64, a0: f64, a1: f64, segments: usize) -> Vec<Coordf> {
    let mut sweep = a1 - a0;
    if sweep <= 0.0 {
        sweep += TAU;
    }
    let n = ((segments as f64 * (sweep / TAU)).ceil() as usize).max(2);
    (0..=n)
        .map(|i| {
            let a = a0 + sweep * (i as f64) / (n as f64);
            Coordf::new(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect()
}

/// Wide line with round caps. Zero or negative width produces nothing; the
/// caller emits a hairline instead.
#[must_use]
pub fn line(a: Coordf, b: Coordf, width: f64, segments: usize) -> Vec<Tri> {
    if width <= 0.0 {
        return Vec::new();
    }
    let half = width / 2.0;
    let d = b - a;
    let len = d.mag();
    if len <= f64::EPSILON {
        return circle(a, half, segments);
    }
    let n = Coordf::new(-d.y, d.x) * (half / len);
    let mut out = vec![[a + n, a - n, b - n], [a + n, b - n, b + n]];
    let base = n.y.atan2(n.x);
    out.extend(cap(a, half, base, segments));
    out.extend(cap(b, half, base + std::f64::consts::PI, segments));
    out
}

/// Half-disc cap at `center` sweeping half a turn from `start`.
fn cap(center: Coordf, radius: f64, start: f64, segments: usize) -> Vec<Tri> {
    let rim = arc_points(center, radius, start, start + std::f64::consts::PI, (segments / 2).max(2));
    rim.windows(2).map(|w| [center, w[0], w[1]]).collect()
}

/// Wide polyline: a round-capped segment per consecutive point pair.
#[must_use]
pub fn polyline(points: &[Coordf], width: f64, segments: usize) -> Vec<Tri> {
    points.windows(2).flat_map(|w| line(w[0], w[1], width, segments)).collect()
}

/// Axis-aligned rectangle centered on `center`.
#[must_use]
pub fn rect(center: Coordf, w: f64, h: f64) -> Vec<Tri> {
    let (hw, hh) = (w / 2.0, h / 2.0);
    polygon(&[
        Coordf::new(center.x - hw, center.y - hh),
        Coordf::new(center.x + hw, center.y - hh),
        Coordf::new(center.x + hw, center.y + hh),
        Coordf::new(center.x - hw, center.y + hh),
    ])
}

/// Signed area of a closed point ring (positive for counter-clockwise).
#[must_use]
pub fn signed_area(points: &[Coordf]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n).map(|i| points[i].cross(points[(i + 1) % n])).sum();
    twice / 2.0
}

/// Triangulate a simple polygon by ear clipping.
///
/// Accepts either winding and an optional repeated closing point. Collinear
/// and duplicate vertices are skipped. Self-intersecting input is triangulated
/// as far as ear clipping gets; the remainder is dropped.
#[must_use]
pub fn polygon(points: &[Coordf]) -> Vec<Tri> {
    let mut pts: Vec<Coordf> = Vec::with_capacity(points.len());
    for &p in points {
        if pts.last().is_none_or(|q| (p - *q).mag_sq() > DEGENERATE_AREA_EPSILON) {
            pts.push(p);
        }
    }
    while pts.len() > 1 && (pts[0] - pts[pts.len() - 1]).mag_sq() <= DEGENERATE_AREA_EPSILON {
        pts.pop();
    }
    if pts.len() < 3 {
        return Vec::new();
    }
    let area = signed_area(&pts);
    if area.abs() <= DEGENERATE_AREA_EPSILON {
        return Vec::new();
    }
    if area < 0.0 {
        pts.reverse();
    }

    let mut ring: Vec<usize> = (0..pts.len()).collect();
    let mut out = Vec::with_capacity(pts.len().saturating_sub(2));
    while ring.len() > 3 {
        let m = ring.len();
        let mut clipped = false;
        for i in 0..m {
            let (ia, ib, ic) = (ring[(i + m - 1) % m], ring[i], ring[(i + 1) % m]);
            let (a, b, c) = (pts[ia], pts[ib], pts[ic]);
            let turn = (b - a).cross(c - b);
            if turn.abs() <= DEGENERATE_AREA_EPSILON {
                ring.remove(i);
                clipped = true;
                break;
            }
            if turn < 0.0 {
                continue;
            }
            let blocked = ring.iter().any(|&j| {
                j != ia && j != ib && j != ic && {
                    let p = pts[j];
                    p != a && p != b && p != c && point_in_triangle(p, a, b, c)
                }
            });
            if blocked {
                continue;
            }
            out.push([a, b, c]);
            ring.remove(i);
            clipped = true;
            break;
        }
        if !clipped {
            break;
        }
    }
    if ring.len() == 3 {
        let tri = [pts[ring[0]], pts[ring[1]], pts[ring[2]]];
        if (tri[1] - tri[0]).cross(tri[2] - tri[0]).abs() > DEGENERATE_AREA_EPSILON {
            out.push(tri);
        }
    }
    out
}

/// Inclusive containment test for a counter-clockwise triangle.
fn point_in_triangle(p: Coordf, a: Coordf, b: Coordf, c: Coordf) -> bool {
    (b - a).cross(p - a) >= 0.0 && (c - b).cross(p - b) >= 0.0 && (a - c).cross(p - c) >= 0.0
}
