//! The renderable primitive stored in per-layer scene buffers.

#[cfg(test)]
#[path = "triangle_test.rs"]
mod triangle_test;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::consts::DEGENERATE_AREA_EPSILON;
use crate::geom::{BBox, Coordf};

/// Direct RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// Triangle colour: a palette slot resolved by the renderer, or a direct colour.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ColorP {
    /// Use the colour of the triangle's layer.
    #[default]
    FromLayer,
    Pin,
    Pad,
    Hole,
    Frame,
    Error,
    Annotation,
    Rgb(Color),
}

/// Type tag used by the renderer's visibility mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TriangleType {
    #[default]
    None = 0,
    Track = 1,
    Via = 2,
    Pad = 3,
    Polygon = 4,
    Silkscreen = 5,
    Text = 6,
    Outline = 7,
    Pin = 8,
    Annotation = 9,
}

impl TriangleType {
    /// Bit for this type inside a `types_visible` mask.
    #[must_use]
    pub fn mask(self) -> u32 {
        1 << (self as u8)
    }
}

bitflags! {
    /// Per-triangle flag bits read by the renderer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TriangleFlags: u8 {
        /// `p0`..`p1` is a hairline segment; `p2` is unused.
        const LINE      = 0b0000_0001;
        /// Drawn with the highlight colour.
        const HIGHLIGHT = 0b0000_0010;
        /// Drawn as outline only regardless of layer display mode.
        const OUTLINE   = 0b0000_0100;
        /// Drawn on top of its layer (selection markers, overlays).
        const TOP       = 0b0000_1000;
    }
}

/// Owner tag stored on every triangle: arena slot of the innermost object that
/// emitted it, plus that slot's generation at emission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerTag {
    pub slot: u32,
    pub generation: u32,
}

/// A renderable primitive in document-derived working space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub p0: Coordf,
    pub p1: Coordf,
    pub p2: Coordf,
    pub color: ColorP,
    pub kind: TriangleType,
    pub flags: TriangleFlags,
    pub owner: Option<OwnerTag>,
}

impl Triangle {
    #[must_use]
    pub fn new(p0: Coordf, p1: Coordf, p2: Coordf, color: ColorP, flags: TriangleFlags) -> Self {
        Self { p0, p1, p2, color, kind: TriangleType::None, flags, owner: None }
    }

    #[must_use]
    pub fn is_line(&self) -> bool {
        self.flags.contains(TriangleFlags::LINE)
    }

    /// Twice the signed area (positive for counter-clockwise winding).
    #[must_use]
    pub fn doubled_area(&self) -> f64 {
        (self.p1 - self.p0).cross(self.p2 - self.p0)
    }

    /// A triangle with non-finite vertices or no area, or a hairline of zero length.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        if !(self.p0.is_finite() && self.p1.is_finite() && self.p2.is_finite()) {
            return true;
        }
        if self.is_line() {
            return (self.p1 - self.p0).mag_sq() <= DEGENERATE_AREA_EPSILON;
        }
        self.doubled_area().abs() <= DEGENERATE_AREA_EPSILON
    }

    /// Points that contribute to the extents (hairlines ignore `p2`).
    #[must_use]
    pub fn bbox(&self) -> BBox {
        let b = BBox::EMPTY.including(self.p0).including(self.p1);
        if self.is_line() { b } else { b.including(self.p2) }
    }
}
