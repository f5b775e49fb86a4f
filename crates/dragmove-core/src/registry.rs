//! Mapping between logical elements and their on-screen handles.

use crate::elements::ElementId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque handle of an element's graphical representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GfxHandle(pub u64);

/// Correlates elements and graphics in both directions.
pub trait GraphicsRegistry {
    /// Graphics of an element.
    fn graphics(&self, element: &ElementId) -> Option<GfxHandle>;

    /// Element drawn by a graphics handle.
    fn element(&self, gfx: GfxHandle) -> Option<ElementId>;
}

/// Tracks the graphics handle assigned to every element on a canvas.
#[derive(Debug, Clone)]
pub struct ElementRegistry {
    by_element: HashMap<ElementId, GfxHandle>,
    by_gfx: HashMap<GfxHandle, ElementId>,
    next_handle: u64,
}

impl ElementRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            by_element: HashMap::new(),
            by_gfx: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Assign graphics to an element, reusing its handle if already known.
    pub fn register(&mut self, element: &ElementId) -> GfxHandle {
        if let Some(gfx) = self.by_element.get(element) {
            return *gfx;
        }
        let gfx = GfxHandle(self.next_handle);
        self.next_handle += 1;
        self.by_element.insert(element.clone(), gfx);
        self.by_gfx.insert(gfx, element.clone());
        gfx
    }

    /// Drop the graphics of an element.
    pub fn unregister(&mut self, element: &ElementId) -> Option<GfxHandle> {
        let gfx = self.by_element.remove(element)?;
        self.by_gfx.remove(&gfx);
        Some(gfx)
    }

    pub fn len(&self) -> usize {
        self.by_element.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_element.is_empty()
    }
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsRegistry for ElementRegistry {
    fn graphics(&self, element: &ElementId) -> Option<GfxHandle> {
        self.by_element.get(element).copied()
    }

    fn element(&self, gfx: GfxHandle) -> Option<ElementId> {
        self.by_gfx.get(&gfx).cloned()
    }
}
