//! Layer ids, per-layer display state, colours, and overlay layer allocation.
//!
//! Layer ids are plain integers. Board layers come in top/bottom pairs that a
//! flipped package swaps via [`flip`]. Overlay layers are synthetic ids at or
//! above the configured first overlay id, handed out on demand for a
//! `(base layer, ignore_flip)` pair so the renderer can sort and hide them
//! like any other layer.

#[cfg(test)]
#[path = "layer_test.rs"]
mod layer_test;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::triangle::Color;

pub type LayerId = i32;

pub const TOP_SILKSCREEN: LayerId = 20;
pub const TOP_COPPER: LayerId = 0;
pub const BOTTOM_COPPER: LayerId = -100;
pub const BOTTOM_SILKSCREEN: LayerId = -120;
pub const HOLES: LayerId = 50;
pub const OUTLINE: LayerId = 100;
pub const SYMBOL: LayerId = 1000;
pub const ANNOTATION: LayerId = 10_000;

/// Map a sided board layer to its counterpart on the opposite side.
/// Layers without a counterpart map to themselves.
#[must_use]
pub fn flip(layer: LayerId) -> LayerId {
    match layer {
        TOP_SILKSCREEN | TOP_COPPER | BOTTOM_COPPER | BOTTOM_SILKSCREEN => -100 - layer,
        other => other,
    }
}

#[must_use]
pub fn is_copper(layer: LayerId) -> bool {
    layer == TOP_COPPER || layer == BOTTOM_COPPER
}

/// How the triangles of a layer are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayMode {
    #[default]
    Fill,
    Outline,
    Hatch,
}

/// Display state of one layer as handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerDisplay {
    pub visible: bool,
    pub mode: DisplayMode,
    pub opacity: f32,
    /// Overrides the layer colour when present.
    pub color: Option<Color>,
}

impl Default for LayerDisplay {
    fn default() -> Self {
        Self { visible: true, mode: DisplayMode::Fill, opacity: 1.0, color: None }
    }
}

/// Colour used for a layer that has never been assigned one.
#[must_use]
pub fn default_layer_color(layer: LayerId) -> Color {
    match layer {
        TOP_COPPER => Color::new(0.8, 0.1, 0.1),
        BOTTOM_COPPER => Color::new(0.1, 0.2, 0.8),
        TOP_SILKSCREEN | BOTTOM_SILKSCREEN => Color::new(0.9, 0.9, 0.9),
        HOLES => Color::new(0.5, 0.5, 0.5),
        OUTLINE => Color::new(0.9, 0.9, 0.2),
        SYMBOL => Color::new(0.0, 0.6, 0.0),
        _ => Color::new(1.0, 1.0, 1.0),
    }
}

/// Display table, colour table, and overlay allocator.
#[derive(Debug, Clone)]
pub struct LayerModel {
    display: BTreeMap<LayerId, LayerDisplay>,
    colors: BTreeMap<LayerId, Color>,
    overlay_layers: HashMap<(LayerId, bool), LayerId>,
    overlay_source: HashMap<LayerId, (LayerId, bool)>,
    first_overlay: LayerId,
    overlay_current: LayerId,
}

impl LayerModel {
    #[must_use]
    pub fn new(first_overlay: LayerId) -> Self {
        Self {
            display: BTreeMap::new(),
            colors: BTreeMap::new(),
            overlay_layers: HashMap::new(),
            overlay_source: HashMap::new(),
            first_overlay,
            overlay_current: first_overlay,
        }
    }

    #[must_use]
    pub fn first_overlay_layer(&self) -> LayerId {
        self.first_overlay
    }

    /// Stable overlay id for `(layer, ignore_flip)`, allocated on first use.
    pub fn get_overlay_layer(&mut self, layer: LayerId, ignore_flip: bool) -> LayerId {
        let key = (layer, ignore_flip);
        if let Some(&id) = self.overlay_layers.get(&key) {
            return id;
        }
        let id = self.overlay_current;
        self.overlay_current += 1;
        self.overlay_layers.insert(key, id);
        self.overlay_source.insert(id, key);
        debug!(base = layer, ignore_flip, overlay = id, "allocated overlay layer");
        id
    }

    /// The `(base layer, ignore_flip)` pair an overlay id was allocated for.
    #[must_use]
    pub fn overlay_source(&self, overlay: LayerId) -> Option<(LayerId, bool)> {
        self.overlay_source.get(&overlay).copied()
    }

    #[must_use]
    pub fn is_overlay(&self, layer: LayerId) -> bool {
        self.overlay_source.contains_key(&layer)
    }

    /// Display state of `layer`.
    ///
    /// Overlays without their own entry follow their base layer. Unknown layers
    /// get the default display, which is visible.
    #[must_use]
    pub fn display(&self, layer: LayerId) -> LayerDisplay {
        if let Some(ld) = self.display.get(&layer) {
            return *ld;
        }
        if let Some((base, _)) = self.overlay_source(layer) {
            return self.display(base);
        }
        trace!(layer, "no display entry for layer; using default");
        LayerDisplay::default()
    }

    pub fn set_display(&mut self, layer: LayerId, ld: LayerDisplay) {
        self.display.insert(layer, ld);
    }

    #[must_use]
    pub fn is_visible(&self, layer: LayerId) -> bool {
        self.display(layer).visible
    }

    pub fn set_color(&mut self, layer: LayerId, color: Color) {
        self.colors.insert(layer, color);
    }

    /// Effective colour: display override, then assigned colour, then the default palette.
    /// Overlays resolve through their base layer.
    #[must_use]
    pub fn color(&self, layer: LayerId) -> Color {
        if let Some(c) = self.display.get(&layer).and_then(|ld| ld.color) {
            return c;
        }
        if let Some(c) = self.colors.get(&layer) {
            return *c;
        }
        if let Some((base, _)) = self.overlay_source(layer) {
            return self.color(base);
        }
        default_layer_color(layer)
    }

    /// Explicitly configured display entries, in layer order.
    pub fn displays(&self) -> impl Iterator<Item = (LayerId, LayerDisplay)> + '_ {
        self.display.iter().map(|(k, v)| (*k, *v))
    }
}
