//! Connection between two elements, drawn through waypoints.

use super::{ElementId, ElementTrait};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// An ordered polyline joining a source and a target element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Generated when missing from the serialized form.
    #[serde(default = "ElementId::generate")]
    pub id: ElementId,
    pub waypoints: Vec<Point>,
    pub source: ElementId,
    pub target: ElementId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ElementId>,
}

impl Connection {
    /// Create a new connection without a parent.
    pub fn new(
        id: impl Into<ElementId>,
        waypoints: Vec<Point>,
        source: impl Into<ElementId>,
        target: impl Into<ElementId>,
    ) -> Self {
        Self {
            id: id.into(),
            waypoints,
            source: source.into(),
            target: target.into(),
            parent: None,
        }
    }

    /// Move the first waypoint, the one docked at the source.
    pub fn translate_start(&mut self, delta: Vec2) {
        if let Some(first) = self.waypoints.first_mut() {
            *first += delta;
        }
    }

    /// Move the last waypoint, the one docked at the target.
    pub fn translate_end(&mut self, delta: Vec2) {
        if let Some(last) = self.waypoints.last_mut() {
            *last += delta;
        }
    }
}

/// Distance from a point to a line segment (a→b).
fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    (point - (a + seg * t)).hypot()
}

impl ElementTrait for Connection {
    fn id(&self) -> &ElementId {
        &self.id
    }

    fn bounds(&self) -> Rect {
        let mut points = self.waypoints.iter();
        let Some(first) = points.next() else {
            return Rect::ZERO;
        };
        points.fold(Rect::from_points(*first, *first), |rect, p| {
            rect.union_pt(*p)
        })
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.waypoints
            .windows(2)
            .any(|w| point_to_segment_dist(point, w[0], w[1]) <= tolerance)
    }

    fn translate(&mut self, delta: Vec2) {
        for p in &mut self.waypoints {
            *p += delta;
        }
    }
}
