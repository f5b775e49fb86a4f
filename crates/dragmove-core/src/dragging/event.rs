//! Events emitted over the lifetime of a gesture.

use super::context::{DragContext, HoverContext};
use crate::elements::ElementId;
use crate::input::PointerInput;
use kurbo::{Point, Vec2};
use serde_json::{Map, Value};

/// Lifecycle event kinds, emitted as `<prefix>.<suffix>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragEventKind {
    Init,
    Start,
    Move,
    Hover,
    Out,
    End,
    Cancel,
    Cleanup,
}

impl DragEventKind {
    pub const ALL: [DragEventKind; 8] = [
        DragEventKind::Init,
        DragEventKind::Start,
        DragEventKind::Move,
        DragEventKind::Hover,
        DragEventKind::Out,
        DragEventKind::End,
        DragEventKind::Cancel,
        DragEventKind::Cleanup,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            DragEventKind::Init => "init",
            DragEventKind::Start => "start",
            DragEventKind::Move => "move",
            DragEventKind::Hover => "hover",
            DragEventKind::Out => "out",
            DragEventKind::End => "end",
            DragEventKind::Cancel => "cancel",
            DragEventKind::Cleanup => "cleanup",
        }
    }

    /// Full event name under a prefix.
    pub fn event_name(self, prefix: &str) -> String {
        format!("{}.{}", prefix, self.suffix())
    }
}

/// Payload of every gesture event.
///
/// Position fields stay empty until the gesture has been activated by the
/// first movement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragEvent {
    pub position: Option<Point>,
    pub delta: Option<Vec2>,
    pub elements: Vec<ElementId>,
    /// Caller context; listeners may extend it for later events.
    pub context: Map<String, Value>,
    pub hover: Option<HoverContext>,
    /// Pointer sample that triggered the event, if any.
    pub original: Option<PointerInput>,
}

impl DragEvent {
    pub(crate) fn from_context(ctx: &DragContext) -> Self {
        let mut event = Self {
            position: None,
            delta: None,
            elements: ctx.data.elements.clone(),
            context: ctx.data.context.clone(),
            hover: ctx.hover.clone(),
            original: ctx.last_input,
        };
        if ctx.activated {
            if let Some(input) = ctx.last_input {
                let (position, delta) = ctx.locate(input.position);
                event.position = Some(position);
                event.delta = Some(delta);
            }
        }
        event
    }

    pub fn x(&self) -> Option<f64> {
        self.position.map(|p| p.x)
    }

    pub fn y(&self) -> Option<f64> {
        self.position.map(|p| p.y)
    }

    pub fn dx(&self) -> Option<f64> {
        self.delta.map(|d| d.x)
    }

    pub fn dy(&self) -> Option<f64> {
        self.delta.map(|d| d.y)
    }
}
