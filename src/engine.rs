use tracing::trace;

use crate::backend::{RenderBackend, ViewOverlay};
use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::config::CanvasConfig;
use crate::consts::{BOX_SELECT_MIN_PX, HOVER_SLOP_PX, ZOOM_STEP};
use crate::doc::{DomainObject, Item};
use crate::error::SceneError;
use crate::geom::{BBox, Coordf, Coordi};
use crate::input::{Button, CursorState, InputState, Modifiers, WheelDelta};
use crate::selectables::{SelectableFlags, SelectableRef};
use crate::target::{Target, nearest_target, snap_to_grid, target_at};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The snapped cursor position changed.
    CursorMoved(Coordi),
    SelectionChanged(Vec<SelectableRef>),
    RenderNeeded,
}

/// Interactive state on top of a [`Canvas`]: camera, cursor, targeting,
/// selection and prelight. Input handlers return the [`Action`]s the host
/// should react to.
pub struct Engine {
    pub canvas: Canvas,
    pub camera: Camera,
    pub input: InputState,
    cursor: CursorState,
    grid_spacing: i64,
    selection_allowed: bool,
    target_current: Option<Target>,
    prelight: Option<SelectableRef>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl Engine {
    #[must_use]
    pub fn new(config: CanvasConfig) -> Self {
        Self::with_canvas(Canvas::new(config))
    }

    #[must_use]
    pub fn with_canvas(canvas: Canvas) -> Self {
        Self {
            grid_spacing: canvas.config().grid_spacing,
            canvas,
            camera: Camera::default(),
            input: InputState::default(),
            cursor: CursorState::default(),
            selection_allowed: true,
            target_current: None,
            prelight: None,
        }
    }

    // --- Document ---

    /// Rebuild the scene from `obj`, keeping whatever part of the selection
    /// still exists afterwards.
    ///
    /// # Errors
    ///
    /// Propagates [`SceneError`] from [`Canvas::update`].
    pub fn update(&mut self, obj: DomainObject<'_>) -> Result<Vec<Action>, SceneError> {
        self.rebuild(|canvas| canvas.update(obj))
    }

    /// Re-render one item; see [`Canvas::update_item`].
    ///
    /// # Errors
    ///
    /// Propagates [`SceneError`] from [`Canvas::update_item`].
    pub fn update_item(&mut self, item: Item<'_>) -> Result<Vec<Action>, SceneError> {
        self.rebuild(|canvas| canvas.update_item(item))
    }

    fn rebuild(&mut self, f: impl FnOnce(&mut Canvas) -> Result<(), SceneError>) -> Result<Vec<Action>, SceneError> {
        let selection = self.get_selection();
        self.target_current = None;
        let result = f(&mut self.canvas);
        let mut actions = self.set_selection(&selection, false);
        result?;
        let kept = self.get_selection();
        if kept.len() != selection.len() {
            actions.push(Action::SelectionChanged(kept));
        }
        Ok(actions)
    }

    // --- Viewport ---

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.camera.set_size(width, height);
    }

    /// Centre the view on `center` at the configured default scale.
    pub fn center_and_zoom(&mut self, center: Coordi) {
        self.camera.center_and_zoom(center, self.canvas.config().default_scale);
    }

    /// Fit the visible scene into the viewport. `false` for an empty scene.
    pub fn zoom_to_fit(&mut self) -> bool {
        self.camera.zoom_to_bbox(&self.canvas.get_bbox(true))
    }

    pub fn zoom_to_bbox(&mut self, bbox: &BBox) -> bool {
        self.camera.zoom_to_bbox(bbox)
    }

    #[must_use]
    pub fn screen2canvas(&self, p: Coordf) -> Coordf {
        self.camera.screen2canvas(p)
    }

    // --- Input events ---

    /// Resolve the cursor: the nearest target within the pick radius, else
    /// the grid point (reporting a target lying exactly on it).
    ///
    /// An external cursor follows the pointer unsnapped.
    pub fn on_cursor_move(&mut self, screen: Coordf, modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        self.cursor.screen = screen;
        let raw = self.camera.screen2canvas(screen);
        if self.cursor.external {
            let before = self.cursor.raw.round();
            self.cursor.raw = raw;
            if raw.round() != before {
                actions.push(Action::CursorMoved(raw.round()));
            }
            return actions;
        }
        self.cursor.raw = raw;

        let grid = snap_to_grid(raw, self.active_grid(modifiers));
        let targets = self.canvas.targets();
        let radius = self.camera.screen_dist_to_canvas(self.canvas.config().pick_radius_px);
        let nearest = nearest_target(targets, raw, self.canvas.selectables(), self.selection_allowed)
            .filter(|&(_, d)| d < radius)
            .map(|(i, _)| i);
        let pos = nearest.map_or(grid, |i| targets[i].p);
        self.target_current = nearest.or_else(|| target_at(targets, grid)).map(|i| targets[i].clone());
        if pos != self.cursor.pos {
            self.cursor.pos = pos;
            actions.push(Action::CursorMoved(pos));
        }

        self.update_prelight(raw, &mut actions);
        if let InputState::BoxSelecting { start, .. } = self.input {
            self.input = InputState::BoxSelecting { start, current: raw };
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    pub fn on_pointer_down(&mut self, screen: Coordf, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        match button {
            Button::Middle => self.input = InputState::Panning { last_screen: screen },
            Button::Primary if self.selection_allowed => {
                let p = self.camera.screen2canvas(screen);
                self.input = InputState::BoxSelecting { start: p, current: p };
            }
            Button::Primary | Button::Secondary => {}
        }
        Vec::new()
    }

    pub fn on_pointer_move(&mut self, screen: Coordf, modifiers: Modifiers) -> Vec<Action> {
        if let InputState::Panning { last_screen } = self.input {
            self.camera.pan(screen - last_screen);
            self.input = InputState::Panning { last_screen: screen };
            return vec![Action::RenderNeeded];
        }
        self.on_cursor_move(screen, modifiers)
    }

    /// Finish a gesture. A primary release within a few pixels of the press
    /// picks the innermost selectable; a longer drag selects everything
    /// enclosed by the rubber band. Shift or Ctrl toggles into the existing
    /// selection instead of replacing it.
    pub fn on_pointer_up(&mut self, screen: Coordf, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let state = std::mem::take(&mut self.input);
        let InputState::BoxSelecting { start, .. } = state else {
            return Vec::new();
        };
        if button != Button::Primary {
            return Vec::new();
        }
        let end = self.camera.screen2canvas(screen);
        let dragged_px = (self.camera.canvas2screen(start) - screen).mag();
        let filter = self.canvas.selection_filter();
        let hits: Vec<SelectableRef> = if dragged_px < BOX_SELECT_MIN_PX {
            let slop = self.camera.screen_dist_to_canvas(HOVER_SLOP_PX);
            self.canvas.selectables().pick(end, slop, filter).into_iter().collect()
        } else {
            let area = BBox::from_corners(start, end);
            self.canvas.selectables().query_enclosed(&area).into_iter().filter(|k| filter.allows(k.kind)).collect()
        };

        let selection = if modifiers.extends_selection() {
            let mut selection = self.get_selection();
            for key in hits {
                match selection.iter().position(|k| *k == key) {
                    Some(i) => {
                        selection.remove(i);
                    }
                    None => selection.push(key),
                }
            }
            selection
        } else {
            hits
        };
        self.set_selection(&selection, true)
    }

    /// Wheel up zooms in around the pointer.
    pub fn on_wheel(&mut self, screen: Coordf, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        let factor = if delta.dy < 0.0 {
            ZOOM_STEP
        } else if delta.dy > 0.0 {
            1.0 / ZOOM_STEP
        } else {
            return Vec::new();
        };
        self.camera.zoom_at(screen, factor);
        let mut actions = self.on_cursor_move(screen, modifiers);
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Cursor ---

    /// Snapped cursor position; the raw rounded position while the cursor
    /// is driven externally.
    #[must_use]
    pub fn get_cursor_pos(&self) -> Coordi {
        if self.cursor.external { self.cursor.raw.round() } else { self.cursor.pos }
    }

    /// Cursor position in screen pixels.
    #[must_use]
    pub fn get_cursor_pos_win(&self) -> Coordf {
        self.camera.canvas2screen(self.get_cursor_pos().to_f())
    }

    pub fn set_cursor_external(&mut self, external: bool) {
        self.cursor.external = external;
    }

    /// Drive an external cursor (keyboard nudging, tool placement). Ignored
    /// while the pointer drives the cursor.
    pub fn set_cursor_pos(&mut self, pos: Coordi) -> Vec<Action> {
        if !self.cursor.external {
            return Vec::new();
        }
        let before = self.cursor.raw.round();
        self.cursor.raw = pos.to_f();
        if pos == before {
            return Vec::new();
        }
        vec![Action::CursorMoved(pos)]
    }

    /// The target the cursor is snapped to, if any.
    #[must_use]
    pub fn get_current_target(&self) -> Option<&Target> {
        self.target_current.as_ref()
    }

    pub fn set_grid_spacing(&mut self, spacing: i64) {
        self.grid_spacing = spacing;
    }

    fn active_grid(&self, modifiers: Modifiers) -> i64 {
        if modifiers.fine_grid() {
            self.grid_spacing / self.canvas.config().fine_grid_divisor.max(1)
        } else {
            self.grid_spacing
        }
    }

    // --- Selection ---

    /// With selection locked, selected objects are skipped by targeting and
    /// clicks do not select.
    pub fn set_selection_allowed(&mut self, allowed: bool) {
        self.selection_allowed = allowed;
    }

    #[must_use]
    pub fn selection_allowed(&self) -> bool {
        self.selection_allowed
    }

    #[must_use]
    pub fn get_selection(&self) -> Vec<SelectableRef> {
        self.canvas.selectables().with_flag(SelectableFlags::SELECTED)
    }

    /// Replace the selection. Keys not in the scene are skipped. Clears
    /// prelight as well.
    pub fn set_selection(&mut self, keys: &[SelectableRef], emit: bool) -> Vec<Action> {
        let selectables = self.canvas.selectables_mut();
        selectables.clear_flags(SelectableFlags::SELECTED | SelectableFlags::PRELIGHT);
        for key in keys {
            if !selectables.set_flag(key, SelectableFlags::SELECTED, true) {
                trace!(%key, "selection key not in scene");
            }
        }
        self.prelight = None;
        let mut actions = vec![Action::RenderNeeded];
        if emit {
            actions.push(Action::SelectionChanged(self.get_selection()));
        }
        actions
    }

    #[must_use]
    pub fn prelight(&self) -> Option<SelectableRef> {
        self.prelight
    }

    fn update_prelight(&mut self, p: Coordf, actions: &mut Vec<Action>) {
        let hit = if self.selection_allowed {
            let slop = self.camera.screen_dist_to_canvas(HOVER_SLOP_PX);
            self.canvas.selectables().pick(p, slop, self.canvas.selection_filter())
        } else {
            None
        };
        if hit == self.prelight {
            return;
        }
        let selectables = self.canvas.selectables_mut();
        if let Some(old) = self.prelight {
            selectables.set_flag(&old, SelectableFlags::PRELIGHT, false);
        }
        if let Some(new) = hit {
            selectables.set_flag(&new, SelectableFlags::PRELIGHT, true);
        }
        self.prelight = hit;
        actions.push(Action::RenderNeeded);
    }

    // --- Render ---

    /// Per-frame state drawn over the scene.
    #[must_use]
    pub fn overlay(&self) -> ViewOverlay {
        let selectables = self.canvas.selectables();
        ViewOverlay {
            cursor: self.get_cursor_pos(),
            selected: self
                .get_selection()
                .iter()
                .filter_map(|k| selectables.get(k).map(|s| s.bbox))
                .collect(),
            prelight: self.prelight.and_then(|k| selectables.get(&k).map(|s| s.bbox)),
            selection_box: self.input.selection_box(),
        }
    }

    /// Push the scene if it changed since the last frame, then draw.
    pub fn render(&mut self, backend: &mut impl RenderBackend) {
        if self.canvas.take_push() {
            backend.push(&self.canvas.snapshot());
        }
        backend.draw(&self.camera, &self.overlay());
    }
}
