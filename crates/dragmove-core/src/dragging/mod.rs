//! Generic pointer gesture state machine.
//!
//! A gesture moves through `Idle → Initialized → Active → Ended | Cancelled
//! → Idle` and announces every step on the event bus under a caller chosen
//! prefix:
//!
//! - `init` on [`Dragging::start`], without position fields
//! - `start` once, right before the first `move`, at zero delta
//! - `move` on every [`Dragging::move_to`]
//! - `hover` / `out` on hover notifications
//! - `end` or `cancel`, then always `cleanup`
//!
//! Cleanup runs on every exit path, including a failing listener.

mod context;
mod event;

pub use context::{DragContext, DragData, GestureState, HoverContext};
pub use event::{DragEvent, DragEventKind};

use crate::error::DragResult;
use crate::event_bus::{EventBus, Outcome};
use crate::input::{CanvasInput, PointerInput};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Service wide options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraggingOptions {
    /// Ignore canvas input; gestures are driven by explicit calls only.
    pub manual: bool,
}

#[derive(Debug, Default)]
struct DraggingState {
    context: Option<DragContext>,
    options: DraggingOptions,
    next_gesture: u64,
}

/// The dragging service. Clones share the same gesture.
#[derive(Debug, Clone)]
pub struct Dragging {
    bus: EventBus<DragEvent>,
    state: Rc<RefCell<DraggingState>>,
}

impl Dragging {
    /// Create a service emitting on `bus`.
    pub fn new(bus: EventBus<DragEvent>) -> Self {
        Self {
            bus,
            state: Rc::new(RefCell::new(DraggingState::default())),
        }
    }

    /// The bus gesture events are emitted on.
    pub fn bus(&self) -> &EventBus<DragEvent> {
        &self.bus
    }

    pub fn set_options(&self, options: DraggingOptions) {
        self.state.borrow_mut().options = options;
    }

    pub fn options(&self) -> DraggingOptions {
        self.state.borrow().options
    }

    /// Snapshot of the active gesture, if any.
    pub fn context(&self) -> Option<DragContext> {
        self.state.borrow().context.clone()
    }

    pub fn state(&self) -> GestureState {
        self.state
            .borrow()
            .context
            .as_ref()
            .map_or(GestureState::Idle, |ctx| ctx.state)
    }

    /// Whether a gesture is in progress.
    pub fn is_active(&self) -> bool {
        self.state.borrow().context.is_some()
    }

    /// Begin a gesture at `input`.
    ///
    /// Positions are reported relative to `relative_to` when given, otherwise
    /// relative to the pointer. A gesture already in progress is cancelled
    /// first; if that does not go through cleanly nothing happens.
    ///
    /// Returns whether the new gesture is in progress once `init` went out.
    pub fn start(
        &self,
        input: &PointerInput,
        prefix: &str,
        relative_to: Option<Point>,
        data: DragData,
    ) -> DragResult<bool> {
        if self.is_active() {
            log::debug!("Cancelling active gesture before starting `{}`", prefix);
            if let Err(err) = self.cancel() {
                log::warn!("Previous gesture failed to cancel, not starting `{}`: {}", prefix, err);
                return Ok(false);
            }
            if self.is_active() {
                log::warn!("Previous gesture still active, not starting `{}`", prefix);
                return Ok(false);
            }
        }

        let gesture = {
            let mut state = self.state.borrow_mut();
            state.next_gesture += 1;
            let gesture = state.next_gesture;
            state.context = Some(DragContext::new(
                gesture,
                prefix.to_string(),
                input,
                relative_to,
                data,
            ));
            gesture
        };

        log::debug!("Gesture {} initialized as `{}`", gesture, prefix);
        self.emit(gesture, DragEventKind::Init, |_| {})?;
        Ok(self.is_current(gesture))
    }

    /// Feed a pointer position into the gesture.
    ///
    /// The first call activates the gesture and emits `start` at zero delta
    /// before the regular `move`.
    pub fn move_to(&self, input: &PointerInput) -> DragResult<()> {
        let Some((gesture, activating)) = self.with_live(|ctx| {
            ctx.last_input = Some(*input);
            let activating = !ctx.activated;
            if activating {
                ctx.activated = true;
                ctx.state = GestureState::Active;
            }
            activating
        }) else {
            return Ok(());
        };

        if activating {
            log::debug!("Gesture {} activated", gesture);
            self.emit(gesture, DragEventKind::Start, |event| {
                event.delta = Some(Vec2::ZERO);
            })?;
            if !self.is_current(gesture) {
                return Ok(());
            }
        }

        self.emit(gesture, DragEventKind::Move, |_| {})?;
        Ok(())
    }

    /// The pointer entered an element.
    pub fn hover(&self, hover: HoverContext) -> DragResult<()> {
        let Some((gesture, ())) = self.with_live(|ctx| ctx.hover = Some(hover)) else {
            return Ok(());
        };
        self.emit(gesture, DragEventKind::Hover, |_| {})?;
        Ok(())
    }

    /// The pointer left the hovered element.
    ///
    /// The `out` event still carries the element being left.
    pub fn out(&self) -> DragResult<()> {
        let Some((gesture, ())) = self.with_live(|_| ()) else {
            return Ok(());
        };
        self.emit(gesture, DragEventKind::Out, |_| {})?;
        self.with_gesture(gesture, |ctx| ctx.hover = None);
        Ok(())
    }

    /// Finish the gesture.
    ///
    /// Returns `Ok(true)` when the gesture completed, `Ok(false)` when there
    /// was nothing to end or a listener rejected it. A rejected end is
    /// followed by `cancel`; `cleanup` follows either way. A gesture that was
    /// never activated is cancelled instead.
    pub fn end(&self) -> DragResult<bool> {
        let Some((gesture, activated)) = self.with_live(|ctx| ctx.activated) else {
            return Ok(false);
        };

        if !activated {
            log::debug!("Gesture {} ended before activation, cancelling", gesture);
            self.cancel()?;
            return Ok(false);
        }

        self.with_gesture(gesture, |ctx| ctx.state = GestureState::Ended);
        let outcome = self.emit(gesture, DragEventKind::End, |_| {})?;
        if !self.is_current(gesture) {
            return Ok(false);
        }

        let rejected = outcome == Some(Outcome::Reject);
        if rejected {
            log::debug!("Gesture {} rejected on end", gesture);
            self.with_gesture(gesture, |ctx| ctx.state = GestureState::Cancelled);
            self.emit(gesture, DragEventKind::Cancel, |_| {})?;
        }

        self.cleanup(gesture)?;
        Ok(!rejected)
    }

    /// Abort the gesture. No-op when idle or already finishing.
    pub fn cancel(&self) -> DragResult<()> {
        let Some((gesture, ())) = self.with_live(|ctx| ctx.state = GestureState::Cancelled) else {
            return Ok(());
        };
        log::debug!("Gesture {} cancelled", gesture);
        self.emit(gesture, DragEventKind::Cancel, |_| {})?;
        self.cleanup(gesture)
    }

    /// Route canvas input to the active gesture.
    ///
    /// Returns `Ok(false)` when the input was not consumed: in manual mode,
    /// while idle, or for keys other than Escape.
    pub fn handle_input(&self, input: CanvasInput) -> DragResult<bool> {
        if self.options().manual || !self.is_active() {
            return Ok(false);
        }

        match input {
            CanvasInput::PointerMove(pointer) => self.move_to(&pointer)?,
            CanvasInput::PointerUp(pointer) => {
                let moved = self
                    .context()
                    .and_then(|ctx| ctx.last_input)
                    .is_none_or(|last| last.position != pointer.position);
                if moved {
                    self.move_to(&pointer)?;
                }
                self.end()?;
            }
            CanvasInput::Hover(hover) => self.hover(hover)?,
            CanvasInput::Out => self.out()?,
            CanvasInput::Key(key) if key.is_escape() => self.cancel()?,
            CanvasInput::Key(_) => return Ok(false),
        }
        Ok(true)
    }

    fn is_current(&self, gesture: u64) -> bool {
        self.state
            .borrow()
            .context
            .as_ref()
            .is_some_and(|ctx| ctx.gesture == gesture)
    }

    /// Run `f` on the context unless idle or already finishing.
    fn with_live<R>(&self, f: impl FnOnce(&mut DragContext) -> R) -> Option<(u64, R)> {
        let mut state = self.state.borrow_mut();
        let ctx = state.context.as_mut()?;
        if ctx.state.is_terminal() {
            return None;
        }
        let gesture = ctx.gesture;
        Some((gesture, f(ctx)))
    }

    /// Run `f` on the context if it still belongs to `gesture`.
    fn with_gesture<R>(&self, gesture: u64, f: impl FnOnce(&mut DragContext) -> R) -> Option<R> {
        let mut state = self.state.borrow_mut();
        let ctx = state.context.as_mut().filter(|ctx| ctx.gesture == gesture)?;
        Some(f(ctx))
    }

    /// Build and fire an event for `gesture`.
    ///
    /// Context changes made by listeners are kept. A failing listener aborts
    /// the gesture: cleanup runs before the error is returned.
    fn emit(
        &self,
        gesture: u64,
        kind: DragEventKind,
        customize: impl FnOnce(&mut DragEvent),
    ) -> DragResult<Option<Outcome>> {
        let Some((name, mut event)) = self.with_gesture(gesture, |ctx| {
            let mut event = DragEvent::from_context(ctx);
            if kind == DragEventKind::Start {
                event.position = Some(ctx.baseline());
            }
            (kind.event_name(&ctx.prefix), event)
        }) else {
            return Ok(None);
        };
        customize(&mut event);

        match self.bus.fire(&name, &mut event) {
            Ok(outcome) => {
                self.with_gesture(gesture, |ctx| ctx.data.context = event.context);
                Ok(outcome)
            }
            Err(err) => {
                log::debug!("Listener failed during `{}`, cleaning up", name);
                if let Err(cleanup_err) = self.cleanup(gesture) {
                    log::warn!("Cleanup after failure also failed: {}", cleanup_err);
                }
                Err(err.into())
            }
        }
    }

    /// Emit `cleanup` and release the context.
    fn cleanup(&self, gesture: u64) -> DragResult<()> {
        let Some((name, mut event)) = self.with_gesture(gesture, |ctx| {
            (
                DragEventKind::Cleanup.event_name(&ctx.prefix),
                DragEvent::from_context(ctx),
            )
        }) else {
            return Ok(());
        };

        let result = self.bus.fire(&name, &mut event);

        let mut state = self.state.borrow_mut();
        if state.context.as_ref().is_some_and(|ctx| ctx.gesture == gesture) {
            state.context = None;
        }
        drop(state);
        log::debug!("Gesture {} cleaned up", gesture);

        result.map(|_| ()).map_err(Into::into)
    }
}
