//! Pointer and keyboard input fed into the drag engine.

use crate::dragging::HoverContext;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state. Passed through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// A pointer sample in global canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerInput {
    pub position: Point,
    #[serde(default)]
    pub button: MouseButton,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl PointerInput {
    /// Pointer sample at `(x, y)` with no modifiers.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            ..Self::default()
        }
    }

    /// Attach modifier state.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Keyboard event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

impl KeyEvent {
    /// Whether this is a press of the Escape key.
    pub fn is_escape(&self) -> bool {
        matches!(self, KeyEvent::Pressed(key) if key.eq_ignore_ascii_case("escape"))
    }
}

/// Input the canvas routes to an active gesture when not in manual mode.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasInput {
    PointerMove(PointerInput),
    PointerUp(PointerInput),
    /// Pointer entered the graphics of an element.
    Hover(HoverContext),
    /// Pointer left the hovered element.
    Out,
    Key(KeyEvent),
}
