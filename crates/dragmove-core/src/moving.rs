//! Element move: diagram semantics on top of the dragging service.
//!
//! Positions are reported relative to the center of the grabbed element.
//! Hovered elements become the candidate new parent. On `end` the delta is
//! rounded to whole pixels, checked against the rules and committed through
//! the mutation command.

use crate::canvas::SharedCanvas;
use crate::config::MoveConfig;
use crate::dragging::{DragData, DragEvent, DragEventKind, Dragging};
use crate::elements::{Element, ElementId};
use crate::error::{DragError, DragResult, ListenerError};
use crate::event_bus::{ListenerResult, Outcome};
use crate::input::PointerInput;
use crate::modeling::{MoveHints, MutationCommand};
use crate::registry::GraphicsRegistry;
use crate::rules::{ELEMENTS_MOVE, RuleContext, RuleProvider};
use kurbo::Vec2;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Runs before default-priority `end` listeners so a veto hides `end`.
const VETO_PRIORITY: i32 = 1500;
/// Runs after default-priority `end` listeners had their chance to reject.
const COMMIT_PRIORITY: i32 = 250;
/// Session setup must precede any other `init` listener.
const SESSION_PRIORITY: i32 = 2000;

/// Round to the nearest integer, halves going up.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Round a delta to whole pixels.
pub fn round_delta(delta: Vec2) -> Vec2 {
    Vec2::new(round_half_up(delta.x), round_half_up(delta.y))
}

/// Per-gesture move state.
#[derive(Debug, Clone, Default)]
struct MoveSession {
    elements: Vec<ElementId>,
    /// Candidate new parent.
    target: Option<ElementId>,
    /// Rounded delta approved on `end`.
    approved: Option<Vec2>,
}

struct MoveInner {
    dragging: Dragging,
    canvas: SharedCanvas,
    graphics: Rc<dyn GraphicsRegistry>,
    rules: Rc<dyn RuleProvider>,
    modeling: Rc<dyn MutationCommand>,
    prefix: String,
    session: RefCell<Option<MoveSession>>,
}

/// The move feature. Clones share state.
#[derive(Clone)]
pub struct MoveFeature {
    inner: Rc<MoveInner>,
}

impl MoveFeature {
    /// Create the feature and hook it into the dragging service's bus.
    pub fn new(
        dragging: Dragging,
        canvas: SharedCanvas,
        graphics: Rc<dyn GraphicsRegistry>,
        rules: Rc<dyn RuleProvider>,
        modeling: Rc<dyn MutationCommand>,
        config: &MoveConfig,
    ) -> Self {
        let inner = Rc::new(MoveInner {
            dragging,
            canvas,
            graphics,
            rules,
            modeling,
            prefix: config.event_prefix.clone(),
            session: RefCell::new(None),
        });
        register_listeners(&inner);
        Self { inner }
    }

    /// Event namespace of this feature.
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// Begin moving `elements`, grabbed at `input`.
    ///
    /// Every element shares one delta, so positions are reported relative to
    /// the center of the first element, the one the user grabbed. It is also
    /// forwarded to the mutation command as [`MoveHints::primary`].
    ///
    /// Returns `Ok(false)` without emitting anything when the rules (or the
    /// default policy) do not allow the elements to be moved, and also when
    /// the gesture could not begin because an earlier one is still finishing.
    pub fn start(
        &self,
        input: &PointerInput,
        elements: Vec<ElementId>,
        context: Option<Map<String, Value>>,
    ) -> DragResult<bool> {
        let inner = &self.inner;
        let Some(primary) = elements.first() else {
            return Ok(false);
        };

        let center = {
            let canvas = inner.canvas.borrow();
            if let Some(missing) = elements.iter().find(|id| !canvas.contains(id)) {
                return Err(DragError::UnknownElement(missing.clone()));
            }
            canvas.get(primary).map(Element::center)
        };

        let rule_context = RuleContext {
            elements: elements.clone(),
            delta: None,
            target: None,
        };
        let allowed = inner
            .rules
            .evaluate(ELEMENTS_MOVE, &rule_context)
            .or_default_policy(|| inner.default_policy(&rule_context));
        if !allowed {
            log::debug!("Move of {:?} not allowed", elements);
            return Ok(false);
        }

        let data = DragData::new(elements, context.unwrap_or_default());
        inner.dragging.start(input, &inner.prefix, center, data)
    }

    /// Whether a move gesture is in progress.
    pub fn is_moving(&self) -> bool {
        self.inner.session.borrow().is_some()
    }

    /// Elements being moved.
    pub fn elements(&self) -> Vec<ElementId> {
        self.inner
            .session
            .borrow()
            .as_ref()
            .map(|s| s.elements.clone())
            .unwrap_or_default()
    }

    /// Candidate new parent of the current move.
    pub fn target(&self) -> Option<ElementId> {
        self.inner
            .session
            .borrow()
            .as_ref()
            .and_then(|s| s.target.clone())
    }
}

impl MoveInner {
    /// Fallback used when no rule has an opinion: roots and connections
    /// stay put, and elements cannot be dropped into themselves.
    fn default_policy(&self, context: &RuleContext) -> bool {
        let canvas = self.canvas.borrow();
        let movable = context.elements.iter().all(|id| {
            canvas
                .get(id)
                .is_some_and(|e| !e.is_root() && !e.is_connection())
        });
        if !movable {
            return false;
        }
        let Some(target) = &context.target else {
            return true;
        };
        let valid_parent = canvas.get(target).is_some_and(|e| !e.is_connection());
        valid_parent
            && !context
                .elements
                .iter()
                .any(|id| id == target || canvas.is_ancestor(id, target))
    }

    fn with_session<R>(&self, f: impl FnOnce(&mut MoveSession) -> R) -> Option<R> {
        self.session.borrow_mut().as_mut().map(f)
    }

    fn on_init(&self, event: &mut DragEvent) -> ListenerResult {
        *self.session.borrow_mut() = Some(MoveSession {
            elements: event.elements.clone(),
            ..MoveSession::default()
        });
        Ok(None)
    }

    fn on_hover(&self, event: &mut DragEvent) -> ListenerResult {
        let target = event
            .hover
            .as_ref()
            .and_then(|hover| self.graphics.element(hover.gfx));
        log::debug!("Move target candidate: {:?}", target);
        self.with_session(|s| s.target = target);
        Ok(None)
    }

    fn on_out(&self, _event: &mut DragEvent) -> ListenerResult {
        self.with_session(|s| s.target = None);
        Ok(None)
    }

    fn on_end_check(&self, event: &mut DragEvent) -> ListenerResult {
        let Some(session) = self.session.borrow().clone() else {
            return Ok(None);
        };
        let delta = round_delta(event.delta.unwrap_or(Vec2::ZERO));
        let rule_context = RuleContext {
            elements: session.elements,
            delta: Some(delta),
            target: session.target,
        };
        let allowed = self
            .rules
            .evaluate(ELEMENTS_MOVE, &rule_context)
            .or_default_policy(|| self.default_policy(&rule_context));
        if !allowed {
            log::debug!(
                "Move of {:?} by ({}, {}) into {:?} rejected",
                rule_context.elements,
                delta.x,
                delta.y,
                rule_context.target
            );
            return Ok(Some(Outcome::Reject));
        }
        self.with_session(|s| s.approved = Some(delta));
        Ok(None)
    }

    fn on_end_commit(&self, _event: &mut DragEvent) -> ListenerResult {
        let Some(session) = self.session.borrow().clone() else {
            return Ok(None);
        };
        let Some(delta) = session.approved else {
            return Ok(None);
        };
        if delta == Vec2::ZERO {
            log::debug!("Move of {:?} has no delta, skipping", session.elements);
            return Ok(None);
        }
        let hints = MoveHints {
            primary: session.elements.first().cloned(),
        };
        self.modeling
            .move_elements(&session.elements, delta, session.target.as_ref(), &hints)
            .map_err(ListenerError::from)?;
        Ok(None)
    }

    fn on_cleanup(&self, _event: &mut DragEvent) -> ListenerResult {
        self.session.borrow_mut().take();
        Ok(None)
    }
}

fn register_listeners(inner: &Rc<MoveInner>) {
    type Handler = fn(&MoveInner, &mut DragEvent) -> ListenerResult;

    let bus = inner.dragging.bus().clone();
    let listeners: [(DragEventKind, i32, Handler); 6] = [
        (DragEventKind::Init, SESSION_PRIORITY, MoveInner::on_init),
        (DragEventKind::Hover, SESSION_PRIORITY, MoveInner::on_hover),
        (DragEventKind::Out, SESSION_PRIORITY, MoveInner::on_out),
        (DragEventKind::End, VETO_PRIORITY, MoveInner::on_end_check),
        (DragEventKind::End, COMMIT_PRIORITY, MoveInner::on_end_commit),
        (DragEventKind::Cleanup, SESSION_PRIORITY, MoveInner::on_cleanup),
    ];

    for (kind, priority, handler) in listeners {
        let weak: Weak<MoveInner> = Rc::downgrade(inner);
        bus.on_with_priority(&kind.event_name(&inner.prefix), priority, move |event| {
            match weak.upgrade() {
                Some(inner) => handler(&inner, event),
                None => Ok(None),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::dragging::{DraggingOptions, HoverContext};
    use crate::elements::{Connection, Root, Shape};
    use crate::error::ModelingResult;
    use crate::event_bus::EventBus;
    use crate::modeling::Modeling;
    use crate::rules::{RuleVerdict, Rules};
    use kurbo::Point;
    use serde_json::json;

    type Calls = RefCell<Vec<(Vec<ElementId>, Vec2, Option<ElementId>)>>;

    /// Records calls before delegating to the real modeling.
    struct SpyModeling {
        inner: Modeling,
        calls: Calls,
    }

    impl MutationCommand for SpyModeling {
        fn move_elements(
            &self,
            elements: &[ElementId],
            delta: Vec2,
            new_parent: Option<&ElementId>,
            hints: &MoveHints,
        ) -> ModelingResult<()> {
            self.calls
                .borrow_mut()
                .push((elements.to_vec(), delta, new_parent.cloned()));
            self.inner.move_elements(elements, delta, new_parent, hints)
        }
    }

    struct Fixture {
        canvas: SharedCanvas,
        dragging: Dragging,
        rules: Rc<Rules>,
        modeling: Rc<SpyModeling>,
        moving: MoveFeature,
    }

    fn id(s: &str) -> ElementId {
        ElementId::new(s)
    }

    fn fixture() -> Fixture {
        let mut canvas = Canvas::new();
        canvas.set_root(Root::new("root"));
        canvas
            .add_shape(Shape::new("parent", 100.0, 100.0, 300.0, 300.0), &id("root"))
            .unwrap();
        canvas
            .add_shape(Shape::new("child", 110.0, 110.0, 100.0, 100.0), &id("parent"))
            .unwrap();
        canvas
            .add_shape(Shape::new("child2", 200.0, 110.0, 100.0, 100.0), &id("parent"))
            .unwrap();
        canvas
            .add_shape(
                Shape::new("immovable-disallow", 200.0, 250.0, 30.0, 30.0),
                &id("parent"),
            )
            .unwrap();
        canvas
            .add_connection(
                Connection::new(
                    "connection",
                    vec![
                        Point::new(150.0, 150.0),
                        Point::new(150.0, 200.0),
                        Point::new(350.0, 150.0),
                    ],
                    "child",
                    "child2",
                ),
                &id("parent"),
            )
            .unwrap();
        let canvas = canvas.shared();

        let rules = Rc::new(Rules::new());
        rules.add_rule(ELEMENTS_MOVE, 1000, |ctx| {
            if ctx
                .elements
                .iter()
                .any(|e| e.as_str().ends_with("-disallow"))
            {
                RuleVerdict::Deny
            } else {
                RuleVerdict::NoOpinion
            }
        });

        let modeling = Rc::new(SpyModeling {
            inner: Modeling::new(canvas.clone()),
            calls: RefCell::new(Vec::new()),
        });

        let dragging = Dragging::new(EventBus::new());
        dragging.set_options(DraggingOptions { manual: true });

        let moving = MoveFeature::new(
            dragging.clone(),
            canvas.clone(),
            canvas.clone(),
            rules.clone(),
            modeling.clone(),
            &MoveConfig::default(),
        );

        Fixture {
            canvas,
            dragging,
            rules,
            modeling,
            moving,
        }
    }

    type Recorded = Rc<RefCell<Vec<(&'static str, DragEvent)>>>;

    fn record_events(dragging: &Dragging) -> Recorded {
        let events: Recorded = Rc::new(RefCell::new(Vec::new()));
        for kind in DragEventKind::ALL {
            let events = Rc::clone(&events);
            dragging
                .bus()
                .on(&kind.event_name("element.move"), move |event| {
                    events.borrow_mut().push((kind.suffix(), event.clone()));
                    Ok(None)
                });
        }
        events
    }

    fn names(events: &Recorded) -> Vec<&'static str> {
        events.borrow().iter().map(|(name, _)| *name).collect()
    }

    fn hover(f: &Fixture, element: &str) {
        let gfx = f.canvas.graphics(&id(element)).unwrap();
        f.dragging
            .hover(HoverContext {
                element: id(element),
                gfx,
            })
            .unwrap();
    }

    fn position(f: &Fixture, element: &str) -> Point {
        f.canvas.borrow().shape(&id(element)).unwrap().position()
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(30.4), 30.0);
        assert_eq!(round_half_up(99.7), 100.0);
        assert_eq!(round_half_up(0.5), 1.0);
        assert_eq!(round_half_up(-0.5), 0.0);
        assert_eq!(round_half_up(-1.6), -2.0);
    }

    #[test]
    fn test_events_relative_to_shape_center() {
        let f = fixture();
        let events = record_events(&f.dragging);

        assert!(f
            .moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child")], None)
            .unwrap());
        f.dragging.move_to(&PointerInput::at(20.0, 20.0)).unwrap();

        let events = events.borrow();
        let positions: Vec<_> = events
            .iter()
            .map(|(_, e)| (e.x(), e.y(), e.dx(), e.dy()))
            .collect();
        assert_eq!(
            positions,
            vec![
                (None, None, None, None),
                (Some(160.0), Some(160.0), Some(0.0), Some(0.0)),
                (Some(180.0), Some(180.0), Some(20.0), Some(20.0)),
            ]
        );
        assert_eq!(events[0].0, "init");
        assert_eq!(events[1].0, "start");
        assert_eq!(events[2].0, "move");
    }

    #[test]
    fn test_several_elements_relative_to_first() {
        let f = fixture();
        let events = record_events(&f.dragging);

        assert!(f
            .moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child2"), id("child")], None)
            .unwrap());
        f.dragging.move_to(&PointerInput::at(10.0, 0.0)).unwrap();

        let events = events.borrow();
        assert_eq!(events[1].1.x(), Some(250.0));
        assert_eq!(events[1].1.y(), Some(160.0));
        assert_eq!(events[2].1.x(), Some(260.0));
    }

    #[test]
    fn test_live_delta_not_rounded() {
        let f = fixture();
        let events = record_events(&f.dragging);
        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child")], None)
            .unwrap();
        f.dragging.move_to(&PointerInput::at(30.4, 99.7)).unwrap();

        let events = events.borrow();
        let last = &events.last().unwrap().1;
        assert_eq!(last.delta, Some(Vec2::new(30.4, 99.7)));
    }

    #[test]
    fn test_round_movement_to_pixels() {
        let f = fixture();
        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child")], None)
            .unwrap();

        f.dragging.move_to(&PointerInput::at(20.0, 20.0)).unwrap();
        hover(&f, "parent");
        f.dragging.move_to(&PointerInput::at(30.4, 99.7)).unwrap();
        assert!(f.dragging.end().unwrap());

        assert_eq!(position(&f, "child"), Point::new(140.0, 210.0));
        let calls = f.modeling.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, Vec2::new(30.0, 100.0));
        assert_eq!(calls[0].2, Some(id("parent")));
        assert!(!f.moving.is_moving());
    }

    #[test]
    fn test_accept_context() {
        let f = fixture();
        let events = record_events(&f.dragging);
        let mut context = Map::new();
        context.insert("foo".to_string(), json!("foo"));

        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child")], Some(context.clone()))
            .unwrap();
        f.dragging.move_to(&PointerInput::at(5.0, 5.0)).unwrap();
        hover(&f, "child2");
        f.dragging.out().unwrap();
        f.dragging.end().unwrap();

        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child")], Some(context))
            .unwrap();
        f.dragging.cancel().unwrap();

        for (_, event) in events.borrow().iter() {
            assert_eq!(event.context.get("foo"), Some(&json!("foo")));
        }
        assert_eq!(
            names(&events),
            vec![
                "init", "start", "move", "hover", "out", "end", "cleanup", "init", "cancel",
                "cleanup"
            ]
        );
    }

    #[test]
    fn test_context_stored_on_drag_context() {
        let f = fixture();
        let mut context = Map::new();
        context.insert("foo".to_string(), json!("foo"));

        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child")], Some(context))
            .unwrap();

        let ctx = f.dragging.context().unwrap();
        assert_eq!(ctx.data.context.get("foo"), Some(&json!("foo")));
        assert_eq!(ctx.data.elements, vec![id("child")]);
        assert_eq!(f.moving.elements(), vec![id("child")]);
    }

    #[test]
    fn test_no_move_without_delta() {
        let f = fixture();
        let events = record_events(&f.dragging);
        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child")], None)
            .unwrap();

        f.dragging.move_to(&PointerInput::at(20.0, 20.0)).unwrap();
        hover(&f, "parent");
        f.dragging.move_to(&PointerInput::at(0.0, 0.0)).unwrap();
        assert!(f.dragging.end().unwrap());

        assert!(f.modeling.calls.borrow().is_empty());
        assert_eq!(position(&f, "child"), Point::new(110.0, 110.0));
        assert_eq!(names(&events).last(), Some(&"cleanup"));
        assert!(names(&events).contains(&"end"));
    }

    #[test]
    fn test_sub_pixel_delta_rounds_to_zero() {
        let f = fixture();
        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child")], None)
            .unwrap();
        f.dragging.move_to(&PointerInput::at(0.4, -0.3)).unwrap();
        f.dragging.end().unwrap();
        assert!(f.modeling.calls.borrow().is_empty());
    }

    fn assert_not_started(element: &str) {
        let f = fixture();
        let events = record_events(&f.dragging);

        let started = f
            .moving
            .start(&PointerInput::at(0.0, 0.0), vec![id(element)], None)
            .unwrap();

        assert!(!started);
        assert!(events.borrow().is_empty());
        assert!(!f.dragging.is_active());
    }

    #[test]
    fn test_rules_disallow_start() {
        assert_not_started("immovable-disallow");
    }

    #[test]
    fn test_root_not_movable_by_default() {
        assert_not_started("root");
    }

    #[test]
    fn test_connection_not_movable_by_default() {
        assert_not_started("connection");
    }

    #[test]
    fn test_rule_can_allow_connection() {
        let f = fixture();
        f.rules.add_rule(ELEMENTS_MOVE, 2000, |ctx| {
            if ctx.elements == vec![ElementId::new("connection")] {
                RuleVerdict::Allow
            } else {
                RuleVerdict::NoOpinion
            }
        });

        assert!(f
            .moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("connection")], None)
            .unwrap());
        f.dragging.move_to(&PointerInput::at(10.0, 0.0)).unwrap();
        assert!(f.dragging.end().unwrap());

        let canvas = f.canvas.borrow();
        let connection = canvas.get(&id("connection")).unwrap().as_connection().unwrap();
        assert_eq!(connection.waypoints[0], Point::new(160.0, 150.0));
    }

    #[test]
    fn test_unknown_element() {
        let f = fixture();
        let err = f
            .moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("ghost")], None)
            .unwrap_err();
        assert_eq!(err, DragError::UnknownElement(id("ghost")));
    }

    #[test]
    fn test_end_rule_veto_cancels() {
        let f = fixture();
        f.rules.add_rule(ELEMENTS_MOVE, 1500, |ctx| {
            if ctx.target.as_ref().is_some_and(|t| t.as_str() == "child2") {
                RuleVerdict::Deny
            } else {
                RuleVerdict::NoOpinion
            }
        });
        let events = record_events(&f.dragging);

        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child")], None)
            .unwrap();
        f.dragging.move_to(&PointerInput::at(50.0, 0.0)).unwrap();
        hover(&f, "child2");
        assert!(!f.dragging.end().unwrap());

        assert_eq!(
            names(&events),
            vec!["init", "start", "move", "hover", "cancel", "cleanup"]
        );
        assert!(f.modeling.calls.borrow().is_empty());
        assert_eq!(position(&f, "child"), Point::new(110.0, 110.0));
    }

    #[test]
    fn test_default_policy_rejects_drop_into_self() {
        let f = fixture();
        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("parent")], None)
            .unwrap();
        f.dragging.move_to(&PointerInput::at(5.0, 5.0)).unwrap();
        hover(&f, "child");
        assert!(!f.dragging.end().unwrap());
        assert!(f.modeling.calls.borrow().is_empty());
    }

    #[test]
    fn test_out_clears_target() {
        let f = fixture();
        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child")], None)
            .unwrap();
        f.dragging.move_to(&PointerInput::at(5.0, 5.0)).unwrap();
        hover(&f, "child2");
        assert_eq!(f.moving.target(), Some(id("child2")));
        f.dragging.out().unwrap();
        assert_eq!(f.moving.target(), None);
        f.dragging.end().unwrap();

        let calls = f.modeling.calls.borrow();
        assert_eq!(calls[0].2, None);
        assert_eq!(
            f.canvas.borrow().shape(&id("child")).unwrap().parent,
            Some(id("parent"))
        );
    }

    #[test]
    fn test_late_listener_rejection_skips_commit() {
        let f = fixture();
        f.dragging
            .bus()
            .on("element.move.end", |_| Ok(Some(Outcome::Reject)));

        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child")], None)
            .unwrap();
        f.dragging.move_to(&PointerInput::at(5.0, 5.0)).unwrap();
        assert!(!f.dragging.end().unwrap());
        assert!(f.modeling.calls.borrow().is_empty());
    }

    #[test]
    fn test_accepting_observer_does_not_skip_commit() {
        let f = fixture();
        f.dragging
            .bus()
            .on("element.move.end", |_| Ok(Some(Outcome::Accept)));

        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child")], None)
            .unwrap();
        f.dragging.move_to(&PointerInput::at(20.0, 20.0)).unwrap();
        assert!(f.dragging.end().unwrap());

        assert_eq!(f.modeling.calls.borrow().len(), 1);
        assert_eq!(position(&f, "child"), Point::new(130.0, 130.0));
    }

    #[test]
    fn test_half_pixel_delta_rounds_up_on_commit() {
        let f = fixture();
        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child")], None)
            .unwrap();
        f.dragging.move_to(&PointerInput::at(0.5, -0.5)).unwrap();
        assert!(f.dragging.end().unwrap());

        assert_eq!(f.modeling.calls.borrow()[0].1, Vec2::new(1.0, 0.0));
        assert_eq!(position(&f, "child"), Point::new(111.0, 110.0));
    }

    #[test]
    fn test_start_while_finishing_reports_not_started() {
        let f = fixture();
        let restarted: Rc<RefCell<Option<DragResult<bool>>>> = Rc::new(RefCell::new(None));
        let moving = f.moving.clone();
        let result = Rc::clone(&restarted);
        f.dragging.bus().on("element.move.end", move |_| {
            let started = moving.start(&PointerInput::at(0.0, 0.0), vec![id("child2")], None);
            *result.borrow_mut() = Some(started);
            Ok(None)
        });

        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child")], None)
            .unwrap();
        f.dragging.move_to(&PointerInput::at(10.0, 0.0)).unwrap();
        assert!(f.dragging.end().unwrap());

        assert_eq!(*restarted.borrow(), Some(Ok(false)));
        assert!(!f.dragging.is_active());
        assert!(!f.moving.is_moving());
        assert_eq!(position(&f, "child"), Point::new(120.0, 110.0));
        assert_eq!(position(&f, "child2"), Point::new(200.0, 110.0));
    }

    #[test]
    fn test_restart_cancels_previous_move() {
        let f = fixture();
        let events = record_events(&f.dragging);

        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child")], None)
            .unwrap();
        f.dragging.move_to(&PointerInput::at(5.0, 5.0)).unwrap();
        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child2")], None)
            .unwrap();

        assert_eq!(
            names(&events),
            vec!["init", "start", "move", "cancel", "cleanup", "init"]
        );
        assert_eq!(f.moving.elements(), vec![id("child2")]);

        f.dragging.move_to(&PointerInput::at(10.0, 0.0)).unwrap();
        f.dragging.end().unwrap();
        assert_eq!(position(&f, "child"), Point::new(110.0, 110.0));
        assert_eq!(position(&f, "child2"), Point::new(210.0, 110.0));
    }

    #[test]
    fn test_commit_failure_propagates_and_cleans_up() {
        let f = fixture();
        // Explicitly allowed, but the model refuses a connection as parent.
        f.rules
            .add_rule(ELEMENTS_MOVE, 2000, |ctx| match &ctx.target {
                Some(t) if t.as_str() == "connection" => RuleVerdict::Allow,
                _ => RuleVerdict::NoOpinion,
            });
        let events = record_events(&f.dragging);

        f.moving
            .start(&PointerInput::at(0.0, 0.0), vec![id("child2")], None)
            .unwrap();
        f.dragging.move_to(&PointerInput::at(5.0, 5.0)).unwrap();
        hover(&f, "connection");

        let err = f.dragging.end().unwrap_err();
        assert!(matches!(err, DragError::Listener(_)));
        assert!(!f.dragging.is_active());
        assert!(!f.moving.is_moving());
        assert_eq!(names(&events).last(), Some(&"cleanup"));
    }
}
