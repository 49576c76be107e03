//! Canvas configuration parsed from environment variables.

use crate::consts::{
    CIRCLE_SEGMENTS, COMPACT_MIN_DEAD, DEFAULT_GRID_SPACING, DEFAULT_SCALE, FINE_GRID_DIVISOR, FIRST_OVERLAY_LAYER,
    PICK_RADIUS_PX,
};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    /// Screen-space radius in pixels within which a target captures the cursor.
    pub pick_radius_px: f64,
    /// Grid spacing in document units.
    pub grid_spacing: i64,
    /// Divisor applied to the grid while the fine-grid modifier is held.
    pub fine_grid_divisor: i64,
    /// Scale used by `center_and_zoom`.
    pub default_scale: f64,
    /// First id handed out for overlay layers.
    pub first_overlay_layer: i32,
    /// Segments used for a full circle.
    pub circle_segments: usize,
    /// Dead triangles tolerated before automatic compaction is considered.
    pub compact_min_dead: usize,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            pick_radius_px: PICK_RADIUS_PX,
            grid_spacing: DEFAULT_GRID_SPACING,
            fine_grid_divisor: FINE_GRID_DIVISOR,
            default_scale: DEFAULT_SCALE,
            first_overlay_layer: FIRST_OVERLAY_LAYER,
            circle_segments: CIRCLE_SEGMENTS,
            compact_min_dead: COMPACT_MIN_DEAD,
        }
    }
}

impl CanvasConfig {
    /// Build typed canvas config from environment variables.
    ///
    /// All optional:
    /// - `CANVAS_PICK_RADIUS_PX`: default 30
    /// - `CANVAS_GRID_SPACING`: default 1250000
    /// - `CANVAS_FINE_GRID_DIVISOR`: default 10
    /// - `CANVAS_DEFAULT_SCALE`: default 7.6e-5
    /// - `CANVAS_FIRST_OVERLAY_LAYER`: default 30000
    /// - `CANVAS_CIRCLE_SEGMENTS`: default 24
    /// - `CANVAS_COMPACT_MIN_DEAD`: default 4096
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is set but does not
    /// parse or is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(v) => Some(v),
            Err(_) => None,
        })
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unparseable or out-of-range values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let d = Self::default();
        let cfg = Self {
            pick_radius_px: parse_or(&lookup, "CANVAS_PICK_RADIUS_PX", d.pick_radius_px)?,
            grid_spacing: parse_or(&lookup, "CANVAS_GRID_SPACING", d.grid_spacing)?,
            fine_grid_divisor: parse_or(&lookup, "CANVAS_FINE_GRID_DIVISOR", d.fine_grid_divisor)?,
            default_scale: parse_or(&lookup, "CANVAS_DEFAULT_SCALE", d.default_scale)?,
            first_overlay_layer: parse_or(&lookup, "CANVAS_FIRST_OVERLAY_LAYER", d.first_overlay_layer)?,
            circle_segments: parse_or(&lookup, "CANVAS_CIRCLE_SEGMENTS", d.circle_segments)?,
            compact_min_dead: parse_or(&lookup, "CANVAS_COMPACT_MIN_DEAD", d.compact_min_dead)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pick_radius_px.is_finite() && self.pick_radius_px > 0.0) {
            return Err(invalid("CANVAS_PICK_RADIUS_PX", self.pick_radius_px, "must be a positive number"));
        }
        if self.grid_spacing <= 0 {
            return Err(invalid("CANVAS_GRID_SPACING", self.grid_spacing, "must be positive"));
        }
        if self.fine_grid_divisor <= 0 {
            return Err(invalid("CANVAS_FINE_GRID_DIVISOR", self.fine_grid_divisor, "must be positive"));
        }
        if !(self.default_scale.is_finite() && self.default_scale > 0.0) {
            return Err(invalid("CANVAS_DEFAULT_SCALE", self.default_scale, "must be a positive number"));
        }
        if self.circle_segments < 3 {
            return Err(invalid("CANVAS_CIRCLE_SEGMENTS", self.circle_segments, "must be at least 3"));
        }
        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            var: var.to_string(),
            value: raw.clone(),
            reason: "not a number".to_string(),
        }),
    }
}

fn invalid(var: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::Invalid { var: var.to_string(), value: value.to_string(), reason: reason.to_string() }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
