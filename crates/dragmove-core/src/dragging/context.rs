//! State owned by a single gesture.

use crate::elements::ElementId;
use crate::input::PointerInput;
use crate::registry::GfxHandle;
use kurbo::{Point, Vec2};
use serde_json::{Map, Value};

/// Lifecycle of the gesture state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// `start` ran, no pointer movement yet.
    Initialized,
    /// First movement established the baseline.
    Active,
    /// `end` is being dispatched.
    Ended,
    /// `cancel` is being dispatched.
    Cancelled,
}

impl GestureState {
    /// End and cancel are dispatched at most once per gesture.
    pub fn is_terminal(self) -> bool {
        matches!(self, GestureState::Ended | GestureState::Cancelled)
    }
}

/// What the pointer is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverContext {
    pub element: ElementId,
    pub gfx: GfxHandle,
}

/// Caller supplied payload merged into every emitted event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragData {
    /// The element(s) the gesture originates from.
    pub elements: Vec<ElementId>,
    /// Arbitrary caller context.
    pub context: Map<String, Value>,
}

impl DragData {
    pub fn new(elements: Vec<ElementId>, context: Map<String, Value>) -> Self {
        Self { elements, context }
    }
}

/// The active gesture.
#[derive(Debug, Clone)]
pub struct DragContext {
    /// Distinguishes gestures across restarts.
    pub(crate) gesture: u64,
    /// Event namespace, e.g. `element.move`.
    pub prefix: String,
    pub data: DragData,
    /// Pointer position at initiation.
    pub anchor: Point,
    /// Reported position at zero delta. Defaults to the anchor.
    pub relative_to: Option<Point>,
    pub hover: Option<HoverContext>,
    /// Set once, by the first movement.
    pub activated: bool,
    /// Most recent pointer sample.
    pub last_input: Option<PointerInput>,
    pub state: GestureState,
}

impl DragContext {
    pub(crate) fn new(
        gesture: u64,
        prefix: String,
        input: &PointerInput,
        relative_to: Option<Point>,
        data: DragData,
    ) -> Self {
        Self {
            gesture,
            prefix,
            data,
            anchor: input.position,
            relative_to,
            hover: None,
            activated: false,
            last_input: None,
            state: GestureState::Initialized,
        }
    }

    /// Reported position and delta for a cursor position.
    ///
    /// The delta is always taken against the anchor, never accumulated.
    pub fn locate(&self, cursor: Point) -> (Point, Vec2) {
        let delta = cursor - self.anchor;
        (self.baseline() + delta, delta)
    }

    /// Reported position at zero delta.
    pub fn baseline(&self) -> Point {
        self.relative_to.unwrap_or(self.anchor)
    }
}
