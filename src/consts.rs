//! Shared numeric constants for the canvas crate.

// ── Picking ─────────────────────────────────────────────────────

/// Screen-space radius in pixels within which a snap target captures the cursor.
pub const PICK_RADIUS_PX: f64 = 30.0;

/// Screen-space slop in pixels for hover prelight and click picking.
pub const HOVER_SLOP_PX: f64 = 3.0;

/// A drag shorter than this many pixels is a click, not a box selection.
pub const BOX_SELECT_MIN_PX: f64 = 4.0;

/// Divisor applied to the grid spacing while the fine-grid modifier is held.
pub const FINE_GRID_DIVISOR: i64 = 10;

/// Default grid spacing in document units (1.25 mm at 1 nm per unit).
pub const DEFAULT_GRID_SPACING: i64 = 1_250_000;

// ── View ────────────────────────────────────────────────────────

/// Scale applied by `center_and_zoom` (screen pixels per document unit).
pub const DEFAULT_SCALE: f64 = 7.6e-5;

/// Multiplicative zoom step for one wheel notch.
pub const ZOOM_STEP: f64 = 1.25;

/// Smallest and largest scale the camera accepts.
pub const MIN_SCALE: f64 = 1e-9;
pub const MAX_SCALE: f64 = 1e3;

// ── Layers ──────────────────────────────────────────────────────

/// First synthetic id handed out by overlay layer allocation.
pub const FIRST_OVERLAY_LAYER: i32 = 30_000;

// ── Tessellation ────────────────────────────────────────────────

/// Segments used to approximate a full circle.
pub const CIRCLE_SEGMENTS: usize = 24;

/// Triangles with an absolute doubled area below this are dropped.
pub const DEGENERATE_AREA_EPSILON: f64 = 1e-6;

/// Dead triangles tolerated before automatic compaction is considered.
pub const COMPACT_MIN_DEAD: usize = 4096;

/// Height-to-advance ratio of the placeholder glyph cells used for text extents.
pub const TEXT_ADVANCE_RATIO: f64 = 0.7;
