//! Editor session: wires the canvas, rules, modeling and interaction services.

use crate::canvas::{Canvas, SharedCanvas};
use crate::config::EditorConfig;
use crate::dragging::{DragEvent, Dragging, HoverContext};
use crate::elements::ElementId;
use crate::error::DragResult;
use crate::event_bus::EventBus;
use crate::input::{CanvasInput, KeyEvent, PointerInput};
use crate::modeling::Modeling;
use crate::moving::MoveFeature;
use crate::registry::GraphicsRegistry;
use crate::rules::Rules;
use serde_json::{Map, Value};
use std::rc::Rc;

/// One editing session. Every collaborator exists once per editor.
pub struct Editor {
    config: EditorConfig,
    bus: EventBus<DragEvent>,
    canvas: SharedCanvas,
    rules: Rc<Rules>,
    modeling: Rc<Modeling>,
    dragging: Dragging,
    moving: MoveFeature,
}

impl Editor {
    /// Create an editor over an empty canvas.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_canvas(config, Canvas::new())
    }

    /// Create an editor over an existing canvas.
    pub fn with_canvas(config: EditorConfig, canvas: Canvas) -> Self {
        let canvas = canvas.shared();
        let bus = EventBus::new();
        let rules = Rc::new(Rules::new());
        let modeling = Rc::new(Modeling::new(canvas.clone()));

        let dragging = Dragging::new(bus.clone());
        dragging.set_options(config.dragging);

        let moving = MoveFeature::new(
            dragging.clone(),
            canvas.clone(),
            canvas.clone(),
            rules.clone(),
            modeling.clone(),
            &config.moving,
        );

        log::debug!(
            "Editor ready (manual={}, prefix={})",
            config.dragging.manual,
            config.moving.event_prefix
        );

        Self {
            config,
            bus,
            canvas,
            rules,
            modeling,
            dragging,
            moving,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus<DragEvent> {
        &self.bus
    }

    pub fn canvas(&self) -> &SharedCanvas {
        &self.canvas
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn modeling(&self) -> &Modeling {
        &self.modeling
    }

    pub fn dragging(&self) -> &Dragging {
        &self.dragging
    }

    pub fn moving(&self) -> &MoveFeature {
        &self.moving
    }

    /// Start moving `elements`, grabbed at `input`.
    pub fn start_move(
        &self,
        input: &PointerInput,
        elements: Vec<ElementId>,
        context: Option<Map<String, Value>>,
    ) -> DragResult<bool> {
        self.moving.start(input, elements, context)
    }

    /// Pointer moved over the canvas.
    ///
    /// Routes the move, then resolves the hover target under the pointer and
    /// emits `out`/`hover` when it changed. Does nothing in manual mode.
    pub fn pointer_moved(&self, input: PointerInput) -> DragResult<bool> {
        let next = self.hover_target(&input);
        if !self
            .dragging
            .handle_input(CanvasInput::PointerMove(input))?
        {
            return Ok(false);
        }

        let current = self.dragging.context().and_then(|ctx| ctx.hover);
        if current.as_ref().map(|h| &h.element) != next.as_ref().map(|h| &h.element) {
            if current.is_some() {
                self.dragging.handle_input(CanvasInput::Out)?;
            }
            if let Some(hover) = next {
                self.dragging.handle_input(CanvasInput::Hover(hover))?;
            }
        }
        Ok(true)
    }

    /// Pointer released.
    pub fn pointer_up(&self, input: PointerInput) -> DragResult<bool> {
        self.dragging.handle_input(CanvasInput::PointerUp(input))
    }

    /// Keyboard input. Escape cancels the gesture.
    pub fn key(&self, key: KeyEvent) -> DragResult<bool> {
        self.dragging.handle_input(CanvasInput::Key(key))
    }

    /// Undo the last committed change. Ignored while a gesture is active.
    pub fn undo(&self) -> bool {
        !self.dragging.is_active() && self.modeling.undo()
    }

    /// Redo the last undone change. Ignored while a gesture is active.
    pub fn redo(&self) -> bool {
        !self.dragging.is_active() && self.modeling.redo()
    }

    /// Topmost shape under the pointer that is not being moved, or the root
    /// when the pointer is over empty canvas.
    fn hover_target(&self, input: &PointerInput) -> Option<HoverContext> {
        let moved = self.moving.elements();
        let element = {
            let canvas = self.canvas.borrow();
            canvas
                .elements_at_point(input.position, self.config.moving.hit_tolerance)
                .into_iter()
                .filter(|id| canvas.get(id).is_some_and(|e| !e.is_connection()))
                .find(|id| {
                    !moved
                        .iter()
                        .any(|m| m == id || canvas.is_ancestor(m, id))
                })
                .or_else(|| canvas.root().cloned())
        }?;
        let gfx = self.canvas.graphics(&element)?;
        Some(HoverContext { element, gfx })
    }
}
