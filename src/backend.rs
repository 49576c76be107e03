//! Seam to the external rendering backend.
//!
//! The core never talks to a GPU. Once per mutation it hands the backend an
//! owned [`SceneFrame`] (visible triangles per layer plus the display table),
//! and on every frame a [`ViewOverlay`] with the interactive state that does
//! not live in triangles: cursor, selection and prelight boxes, rubber band.

#[cfg(test)]
#[path = "backend_test.rs"]
mod backend_test;

use crate::camera::Camera;
use crate::geom::{BBox, Coordi};
use crate::layer::{LayerDisplay, LayerId};
use crate::triangle::{Color, Triangle};

/// Triangles and display state for one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerFrame {
    pub layer: LayerId,
    pub display: LayerDisplay,
    pub color: Color,
    pub triangles: Vec<Triangle>,
}

/// Snapshot of the scene at one generation, in draw order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneFrame {
    pub generation: u64,
    pub layers: Vec<LayerFrame>,
    pub flip_view: bool,
    pub work_layer: LayerId,
}

impl SceneFrame {
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.layers.iter().map(|l| l.triangles.len()).sum()
    }

    #[must_use]
    pub fn layer(&self, layer: LayerId) -> Option<&LayerFrame> {
        self.layers.iter().find(|l| l.layer == layer)
    }
}

/// Per-frame interaction state drawn on top of the scene.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewOverlay {
    pub cursor: Coordi,
    pub selected: Vec<BBox>,
    pub prelight: Option<BBox>,
    pub selection_box: Option<BBox>,
}

/// Implemented by the windowing/GPU layer.
pub trait RenderBackend {
    /// Upload a new scene. Called at most once per mutation, before `draw`.
    fn push(&mut self, frame: &SceneFrame);

    /// Draw the last pushed scene with the given view.
    fn draw(&mut self, camera: &Camera, overlay: &ViewOverlay);
}
