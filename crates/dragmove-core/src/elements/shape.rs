//! Positioned rectangular shape.

use super::{ElementId, ElementTrait};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A positioned rectangle nested in a parent element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Generated when missing from the serialized form.
    #[serde(default = "ElementId::generate")]
    pub id: ElementId,
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Containing element, `None` until the shape is added to a canvas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ElementId>,
}

impl Shape {
    /// Create a new shape without a parent.
    pub fn new(id: impl Into<ElementId>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            parent: None,
        }
    }

    /// Top-left corner.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Get the shape as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

impl ElementTrait for Shape {
    fn id(&self) -> &ElementId {
        &self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.as_rect().inflate(tolerance, tolerance).contains(point)
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}
