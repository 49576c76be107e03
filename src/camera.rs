#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use tracing::debug;

use crate::consts::{MAX_SCALE, MIN_SCALE};
use crate::geom::{BBox, Coordf, Coordi};

/// View state mapping document space to screen pixels.
///
/// `scale` is pixels per document unit. `offset` is the screen position of
/// the document origin. Document y grows upward, screen y downward, so the
/// y axis is inverted in both directions of the mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub scale: f64,
    pub offset: Coordf,
    /// Viewport width in pixels.
    pub width: f64,
    /// Viewport height in pixels.
    pub height: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { scale: 1.0, offset: Coordf::new(0.0, 0.0), width: 0.0, height: 0.0 }
    }
}

impl Camera {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, ..Self::default() }
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Convert a screen-space point (pixels) to document coordinates.
    #[must_use]
    pub fn screen2canvas(&self, p: Coordf) -> Coordf {
        Coordf::new((p.x - self.offset.x) / self.scale, (p.y - self.offset.y) / -self.scale)
    }

    /// Convert a document point to screen coordinates (pixels).
    #[must_use]
    pub fn canvas2screen(&self, p: Coordf) -> Coordf {
        Coordf::new(p.x * self.scale + self.offset.x, p.y * -self.scale + self.offset.y)
    }

    /// Convert a screen-space distance (pixels) to a document distance.
    #[must_use]
    pub fn screen_dist_to_canvas(&self, d: f64) -> f64 {
        d / self.scale
    }

    /// Put `center` in the middle of the viewport at `scale`.
    pub fn center_and_zoom(&mut self, center: Coordi, scale: f64) {
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        let c = center.to_f();
        self.offset = Coordf::new(-(c.x * self.scale - self.width / 2.0), -(c.y * -self.scale - self.height / 2.0));
        debug!(scale = self.scale, x = center.x, y = center.y, "view centered");
    }

    /// Fit `bbox` into the viewport. A zero-extent axis does not constrain
    /// the scale; a point or empty box keeps the current scale. Returns
    /// `false` for an empty box, which leaves the view unchanged.
    pub fn zoom_to_bbox(&mut self, bbox: &BBox) -> bool {
        if bbox.is_empty() {
            return false;
        }
        let sx = (bbox.width() > 0.0).then(|| self.width / bbox.width());
        let sy = (bbox.height() > 0.0).then(|| self.height / bbox.height());
        let scale = match (sx, sy) {
            (Some(a), Some(b)) => a.min(b),
            (Some(s), None) | (None, Some(s)) => s,
            (None, None) => self.scale,
        };
        self.center_and_zoom(bbox.center().round(), scale);
        true
    }

    /// Multiply the scale by `factor`, keeping the document point under
    /// `screen` in place.
    pub fn zoom_at(&mut self, screen: Coordf, factor: f64) {
        let anchor = self.screen2canvas(screen);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.offset = Coordf::new(screen.x - anchor.x * self.scale, screen.y + anchor.y * self.scale);
        debug!(scale = self.scale, "zoomed");
    }

    /// Shift the view by a screen-space delta.
    pub fn pan(&mut self, delta: Coordf) {
        self.offset = self.offset + delta;
    }
}
