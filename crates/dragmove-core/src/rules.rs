//! Rule provider: decides whether an action may happen.
//!
//! Answers are three-valued. `NoOpinion` means the caller applies its own
//! default policy.

use crate::elements::ElementId;
use crate::event_bus::EventBus;
use kurbo::Vec2;

/// Action evaluated before and at the end of an element move.
pub const ELEMENTS_MOVE: &str = "elements.move";

/// Tri-state rule answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleVerdict {
    Allow,
    Deny,
    #[default]
    NoOpinion,
}

impl RuleVerdict {
    /// Resolve to a decision, falling back to `default` without an opinion.
    pub fn or_default_policy(self, default: impl FnOnce() -> bool) -> bool {
        match self {
            RuleVerdict::Allow => true,
            RuleVerdict::Deny => false,
            RuleVerdict::NoOpinion => default(),
        }
    }
}

impl From<bool> for RuleVerdict {
    fn from(allowed: bool) -> Self {
        if allowed {
            RuleVerdict::Allow
        } else {
            RuleVerdict::Deny
        }
    }
}

/// What a rule is asked about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleContext {
    pub elements: Vec<ElementId>,
    /// Rounded movement, absent for the up-front check.
    pub delta: Option<Vec2>,
    /// Candidate new parent.
    pub target: Option<ElementId>,
}

/// Source of rule verdicts.
pub trait RuleProvider {
    fn evaluate(&self, action: &str, context: &RuleContext) -> RuleVerdict;
}

/// Payload dispatched to rule listeners. The first opinion sticks.
#[derive(Debug)]
struct RuleQuery {
    context: RuleContext,
    verdict: RuleVerdict,
}

/// Rules registered per action, evaluated by descending priority until one
/// has an opinion.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    bus: EventBus<RuleQuery>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule for `action`.
    pub fn add_rule<F>(&self, action: &str, priority: i32, rule: F)
    where
        F: Fn(&RuleContext) -> RuleVerdict + 'static,
    {
        self.bus.on_with_priority(action, priority, move |query| {
            if query.verdict == RuleVerdict::NoOpinion {
                query.verdict = rule(&query.context);
            }
            Ok(None)
        });
    }
}

impl RuleProvider for Rules {
    fn evaluate(&self, action: &str, context: &RuleContext) -> RuleVerdict {
        let mut query = RuleQuery {
            context: context.clone(),
            verdict: RuleVerdict::NoOpinion,
        };
        // Rule listeners never fail or stop dispatch; the verdict is in the query.
        if let Err(err) = self.bus.fire(action, &mut query) {
            log::warn!("Rule dispatch for `{}` failed: {}", action, err);
        }
        log::debug!(
            "Rule `{}` on {:?}: {:?}",
            action,
            query.context.elements,
            query.verdict
        );
        query.verdict
    }
}
