//! Canvas document: the element tree and its history.

use crate::elements::{Connection, Element, ElementId, ElementTrait, Root, Shape};
use crate::error::{ModelingError, ModelingResult};
use crate::registry::{ElementRegistry, GfxHandle, GraphicsRegistry};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Maximum number of undo states to keep.
const MAX_UNDO_HISTORY: usize = 50;

/// Canvas shared between the modeling command and interaction features.
pub type SharedCanvas = Rc<RefCell<Canvas>>;

/// A snapshot of document state for undo/redo.
#[derive(Debug, Clone)]
struct DocumentSnapshot {
    elements: HashMap<ElementId, Element>,
    z_order: Vec<ElementId>,
}

/// A diagram: one root plus shapes and connections nested beneath it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Canvas {
    /// Root element, if one has been set.
    root: Option<ElementId>,
    /// All elements, keyed by ID.
    elements: HashMap<ElementId, Element>,
    /// Paint order (back to front).
    z_order: Vec<ElementId>,
    #[serde(skip)]
    registry: ElementRegistry,
    #[serde(skip)]
    undo_stack: Vec<DocumentSnapshot>,
    #[serde(skip)]
    redo_stack: Vec<DocumentSnapshot>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create an empty canvas.
    pub fn new() -> Self {
        Self {
            root: None,
            elements: HashMap::new(),
            z_order: Vec::new(),
            registry: ElementRegistry::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Wrap the canvas for sharing.
    pub fn shared(self) -> SharedCanvas {
        Rc::new(RefCell::new(self))
    }

    /// Replace the root element. Existing children of the old root are kept.
    pub fn set_root(&mut self, root: Root) -> GfxHandle {
        if let Some(old) = self.root.take() {
            self.elements.remove(&old);
            self.registry.unregister(&old);
        }
        let id = root.id.clone();
        let gfx = self.registry.register(&id);
        self.elements.insert(id.clone(), Element::Root(root));
        self.root = Some(id);
        gfx
    }

    /// The root element ID.
    pub fn root(&self) -> Option<&ElementId> {
        self.root.as_ref()
    }

    /// Add a shape beneath a parent.
    pub fn add_shape(&mut self, mut shape: Shape, parent: &ElementId) -> ModelingResult<GfxHandle> {
        self.check_parent(parent)?;
        shape.parent = Some(parent.clone());
        Ok(self.insert(Element::Shape(shape)))
    }

    /// Add a connection beneath a parent. Both endpoints must already exist.
    pub fn add_connection(
        &mut self,
        mut connection: Connection,
        parent: &ElementId,
    ) -> ModelingResult<GfxHandle> {
        self.check_parent(parent)?;
        for end in [&connection.source, &connection.target] {
            if !self.elements.contains_key(end) {
                return Err(ModelingError::UnknownElement(end.clone()));
            }
        }
        connection.parent = Some(parent.clone());
        Ok(self.insert(Element::Connection(connection)))
    }

    fn check_parent(&self, parent: &ElementId) -> ModelingResult<()> {
        match self.elements.get(parent) {
            None => Err(ModelingError::UnknownElement(parent.clone())),
            Some(Element::Connection(_)) => Err(ModelingError::InvalidParent {
                parent: parent.clone(),
            }),
            Some(_) => Ok(()),
        }
    }

    fn insert(&mut self, element: Element) -> GfxHandle {
        let id = element.id().clone();
        let gfx = self.registry.register(&id);
        if !self.z_order.contains(&id) {
            self.z_order.push(id.clone());
        }
        self.elements.insert(id, element);
        gfx
    }

    /// Get an element by ID.
    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Get a mutable reference to an element by ID.
    pub fn get_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    /// Get the shape with the given ID, if it is a shape.
    pub fn shape(&self, id: &ElementId) -> Option<&Shape> {
        self.elements.get(id).and_then(Element::as_shape)
    }

    /// Direct children of an element, in paint order.
    pub fn children(&self, id: &ElementId) -> Vec<ElementId> {
        self.z_order
            .iter()
            .filter(|z| {
                self.elements
                    .get(*z)
                    .and_then(Element::parent)
                    .is_some_and(|p| p == id)
            })
            .cloned()
            .collect()
    }

    /// All elements nested (at any depth) in an element.
    pub fn descendants(&self, id: &ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            for child in self.children(&current) {
                result.push(child.clone());
                stack.push(child);
            }
        }
        result
    }

    /// Check whether `ancestor` is a (transitive) parent of `id`.
    pub fn is_ancestor(&self, ancestor: &ElementId, id: &ElementId) -> bool {
        let mut current = self.elements.get(id).and_then(Element::parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.elements.get(parent).and_then(Element::parent);
        }
        false
    }

    /// Connections whose source or target is in `ids`.
    pub fn attached_connections(&self, ids: &HashSet<ElementId>) -> Vec<ElementId> {
        self.z_order
            .iter()
            .filter(|z| {
                self.elements
                    .get(*z)
                    .and_then(Element::as_connection)
                    .is_some_and(|c| ids.contains(&c.source) || ids.contains(&c.target))
            })
            .cloned()
            .collect()
    }

    /// Find elements at a point, front to back. The root is never hit.
    pub fn elements_at_point(&self, point: Point, tolerance: f64) -> Vec<ElementId> {
        self.z_order
            .iter()
            .rev()
            .filter(|id| {
                self.elements
                    .get(*id)
                    .is_some_and(|e| e.hit_test(point, tolerance))
            })
            .cloned()
            .collect()
    }

    /// Non-root elements in paint order (back to front).
    pub fn z_order(&self) -> &[ElementId] {
        &self.z_order
    }

    /// The graphics registry of this canvas.
    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    /// Check if the canvas holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Get the number of elements, root included.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            elements: self.elements.clone(),
            z_order: self.z_order.clone(),
        }
    }

    /// Push current state to undo stack (call before making changes).
    pub fn push_undo(&mut self) {
        let snapshot = self.snapshot();
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();

        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the last change. Returns false if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.redo_stack.push(current);
        self.restore(snapshot);
        true
    }

    /// Redo the last undone change. Returns false if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.undo_stack.push(current);
        self.restore(snapshot);
        true
    }

    fn restore(&mut self, snapshot: DocumentSnapshot) {
        self.elements = snapshot.elements;
        self.z_order = snapshot.z_order;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a document from JSON, assigning fresh graphics.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut canvas: Canvas = serde_json::from_str(json)?;
        canvas.rebuild_registry();
        Ok(canvas)
    }

    fn rebuild_registry(&mut self) {
        self.registry = ElementRegistry::new();
        if let Some(root) = &self.root {
            self.registry.register(root);
        }
        for id in &self.z_order {
            self.registry.register(id);
        }
    }
}

impl GraphicsRegistry for RefCell<Canvas> {
    fn graphics(&self, element: &ElementId) -> Option<GfxHandle> {
        self.borrow().registry.graphics(element)
    }

    fn element(&self, gfx: GfxHandle) -> Option<ElementId> {
        self.borrow().registry.element(gfx)
    }
}
