//! Input model: modifier keys, mouse buttons, cursor state, and the gesture
//! state tracked between pointer-down and pointer-up.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::geom::{BBox, Coordf, Coordi};

/// Keyboard modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    /// Alt switches the cursor to the fine grid.
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Snap to the grid divided by the fine-grid divisor.
    #[must_use]
    pub fn fine_grid(self) -> bool {
        self.alt
    }

    /// Clicks and box selections add to or toggle the selection.
    #[must_use]
    pub fn extends_selection(self) -> bool {
        self.shift || self.ctrl
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
}

/// Wheel / trackpad scroll delta in pixels (positive `dy` scrolls down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelDelta {
    pub dx: f64,
    pub dy: f64,
}

/// Where the cursor is, before and after snapping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CursorState {
    /// Unsnapped document position.
    pub raw: Coordf,
    /// Snapped document position reported to the UI.
    pub pos: Coordi,
    /// Last screen position seen.
    pub screen: Coordf,
    /// Cursor position is driven by `set_cursor_pos` rather than the pointer.
    pub external: bool,
}

/// Active gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum InputState {
    #[default]
    Idle,
    /// Dragging the view with the middle button.
    Panning { last_screen: Coordf },
    /// Rubber-band selection; corners in document space.
    BoxSelecting { start: Coordf, current: Coordf },
}

impl InputState {
    /// The rubber band while box selecting.
    #[must_use]
    pub fn selection_box(&self) -> Option<BBox> {
        match *self {
            Self::BoxSelecting { start, current } => Some(BBox::from_corners(start, current)),
            _ => None,
        }
    }
}
