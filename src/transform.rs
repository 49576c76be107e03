//! Transform stack used while rendering nested objects.
//!
//! The active transform is the composition of every placement entered so far
//! (board -> package -> pad). [`TransformStack::save`] remembers the active
//! transform and [`TransformStack::restore`] returns to it. Callers in this
//! crate never pair these by hand; they go through
//! [`Canvas::transform_scope`](crate::canvas::Canvas::transform_scope), whose
//! guard restores on drop.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use crate::geom::{Coordf, Coordi};
use crate::placement::Placement;

#[derive(Debug, Clone, Default)]
pub struct TransformStack {
    current: Placement,
    saved: Vec<Placement>,
}

impl TransformStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The active composed transform (identity when nothing was entered).
    #[must_use]
    pub fn current(&self) -> &Placement {
        &self.current
    }

    /// Push the active transform so a later [`restore`](Self::restore) returns to it.
    pub fn save(&mut self) {
        self.saved.push(self.current);
    }

    /// Pop the most recently saved transform. Restoring an empty stack resets to identity.
    pub fn restore(&mut self) {
        self.current = self.saved.pop().unwrap_or(Placement::IDENTITY);
    }

    /// Compose `placement` onto the active transform.
    pub fn accumulate(&mut self, placement: &Placement) {
        self.current = self.current.accumulate(placement);
    }

    /// Replace the active transform outright.
    pub fn set(&mut self, placement: Placement) {
        self.current = placement;
    }

    /// Number of saves without a matching restore.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Drop all saved state and return to identity.
    pub fn reset(&mut self) {
        self.saved.clear();
        self.current = Placement::IDENTITY;
    }

    #[must_use]
    pub fn apply(&self, p: Coordf) -> Coordf {
        self.current.transform(p)
    }

    #[must_use]
    pub fn apply_i(&self, p: Coordi) -> Coordf {
        self.current.transform(p.to_f())
    }

    /// Whether the active transform mirrors (a flipped package on a board).
    #[must_use]
    pub fn is_mirrored(&self) -> bool {
        self.current.mirror
    }
}
