//! Per-tick pointer input snapshot.
//!
//! The engine samples the mouse once per frame and hands the simulation a
//! [`PointerInput`]. Edges (`just_pressed` / `just_released`) are true only
//! on the frame the transition happened.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// State of one mouse button for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonState {
    /// Went down this frame.
    pub just_pressed: bool,
    /// Currently down (includes the press frame).
    pub pressed: bool,
    /// Went up this frame.
    pub just_released: bool,
}

impl ButtonState {
    /// Button went down this frame.
    pub const PRESS: Self = Self {
        just_pressed: true,
        pressed: true,
        just_released: false,
    };

    /// Button is being held.
    pub const HOLD: Self = Self {
        just_pressed: false,
        pressed: true,
        just_released: false,
    };

    /// Button went up this frame.
    pub const RELEASE: Self = Self {
        just_pressed: false,
        pressed: false,
        just_released: true,
    };
}

/// Everything the selection and order systems read from the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerInput {
    /// Cursor position in screen pixels.
    pub position: Vec2,
    /// Left (select) button.
    pub left: ButtonState,
    /// Right (order) button went down this frame.
    pub right_just_pressed: bool,
    /// Either shift key is held.
    pub shift_held: bool,
    /// The cursor is over a UI widget; world interaction is suppressed.
    pub over_ui: bool,
}

impl PointerInput {
    /// Idle pointer at `position`.
    #[must_use]
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Set the left button state.
    #[must_use]
    pub fn with_left(mut self, left: ButtonState) -> Self {
        self.left = left;
        self
    }

    /// Mark a right-button press.
    #[must_use]
    pub fn with_right_click(mut self) -> Self {
        self.right_just_pressed = true;
        self
    }

    /// Hold shift.
    #[must_use]
    pub fn with_shift(mut self) -> Self {
        self.shift_held = true;
        self
    }

    /// Mark the cursor as over UI.
    #[must_use]
    pub fn over_ui(mut self) -> Self {
        self.over_ui = true;
        self
    }
}
