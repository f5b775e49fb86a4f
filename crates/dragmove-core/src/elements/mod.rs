//! Diagram elements: the root, positioned shapes and connections.

mod connection;
mod shape;

pub use connection::Connection;
pub use shape::Shape;

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Common behavior of all diagram elements.
pub trait ElementTrait {
    /// Get the unique identifier.
    fn id(&self) -> &ElementId;

    /// Get the bounding box in global coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a point (in global coordinates) hits this element.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Translate the element by a delta.
    fn translate(&mut self, delta: Vec2);
}

/// The kind of an element, used by default move policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Root,
    Shape,
    Connection,
}

/// The root of a diagram; has no geometry and no parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub id: ElementId,
}

impl Root {
    pub fn new(id: impl Into<ElementId>) -> Self {
        Self { id: id.into() }
    }
}

/// Enum wrapper for all element types (for serialization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Root(Root),
    Shape(Shape),
    Connection(Connection),
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Root(_) => ElementKind::Root,
            Element::Shape(_) => ElementKind::Shape,
            Element::Connection(_) => ElementKind::Connection,
        }
    }

    /// The element this one is nested in. Always `None` for the root.
    pub fn parent(&self) -> Option<&ElementId> {
        match self {
            Element::Root(_) => None,
            Element::Shape(s) => s.parent.as_ref(),
            Element::Connection(c) => c.parent.as_ref(),
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ElementId>) {
        match self {
            Element::Root(_) => {}
            Element::Shape(s) => s.parent = parent,
            Element::Connection(c) => c.parent = parent,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Element::Root(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Element::Connection(_))
    }

    pub fn as_shape(&self) -> Option<&Shape> {
        match self {
            Element::Shape(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_connection(&self) -> Option<&Connection> {
        match self {
            Element::Connection(c) => Some(c),
            _ => None,
        }
    }

    /// Visual center of the element's bounds.
    pub fn center(&self) -> Point {
        self.bounds().center()
    }
}

impl ElementTrait for Element {
    fn id(&self) -> &ElementId {
        match self {
            Element::Root(r) => &r.id,
            Element::Shape(s) => s.id(),
            Element::Connection(c) => c.id(),
        }
    }

    fn bounds(&self) -> Rect {
        match self {
            Element::Root(_) => Rect::ZERO,
            Element::Shape(s) => s.bounds(),
            Element::Connection(c) => c.bounds(),
        }
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        match self {
            Element::Root(_) => false,
            Element::Shape(s) => s.hit_test(point, tolerance),
            Element::Connection(c) => c.hit_test(point, tolerance),
        }
    }

    fn translate(&mut self, delta: Vec2) {
        match self {
            Element::Root(_) => {}
            Element::Shape(s) => s.translate(delta),
            Element::Connection(c) => c.translate(delta),
        }
    }
}

impl From<Shape> for Element {
    fn from(shape: Shape) -> Self {
        Element::Shape(shape)
    }
}

impl From<Connection> for Element {
    fn from(connection: Connection) -> Self {
        Element::Connection(connection)
    }
}

impl From<Root> for Element {
    fn from(root: Root) -> Self {
        Element::Root(root)
    }
}
