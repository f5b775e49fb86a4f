//! Modeling: the single write path into the diagram.

use crate::canvas::SharedCanvas;
use crate::elements::{Element, ElementId, ElementTrait};
use crate::error::{ModelingError, ModelingResult};
use kurbo::Vec2;
use std::collections::HashSet;

/// Extra information forwarded with a move.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveHints {
    /// The element the user grabbed.
    pub primary: Option<ElementId>,
}

/// Applies element moves to the diagram.
pub trait MutationCommand {
    fn move_elements(
        &self,
        elements: &[ElementId],
        delta: Vec2,
        new_parent: Option<&ElementId>,
        hints: &MoveHints,
    ) -> ModelingResult<()>;
}

/// Mutation command operating on a shared canvas, with undo support.
#[derive(Debug, Clone)]
pub struct Modeling {
    canvas: SharedCanvas,
}

impl Modeling {
    pub fn new(canvas: SharedCanvas) -> Self {
        Self { canvas }
    }

    /// Undo the last change. Returns false if there is nothing to undo.
    pub fn undo(&self) -> bool {
        self.canvas.borrow_mut().undo()
    }

    /// Redo the last undone change.
    pub fn redo(&self) -> bool {
        self.canvas.borrow_mut().redo()
    }
}

impl MutationCommand for Modeling {
    fn move_elements(
        &self,
        elements: &[ElementId],
        delta: Vec2,
        new_parent: Option<&ElementId>,
        hints: &MoveHints,
    ) -> ModelingResult<()> {
        let mut canvas = self.canvas.borrow_mut();

        for id in elements {
            if !canvas.contains(id) {
                return Err(ModelingError::UnknownElement(id.clone()));
            }
        }

        // Drop elements whose ancestor moves anyway.
        let top_level: Vec<ElementId> = elements
            .iter()
            .filter(|id| !elements.iter().any(|other| canvas.is_ancestor(other, id)))
            .filter(|id| canvas.get(id).is_some_and(|e| !e.is_root()))
            .cloned()
            .collect();
        if top_level.is_empty() {
            return Err(ModelingError::NothingToMove);
        }

        let mut closure: HashSet<ElementId> = HashSet::new();
        for id in &top_level {
            closure.insert(id.clone());
            closure.extend(canvas.descendants(id));
        }

        if let Some(parent) = new_parent {
            let valid = match canvas.get(parent) {
                None => return Err(ModelingError::UnknownElement(parent.clone())),
                Some(element) => !element.is_connection() && !closure.contains(parent),
            };
            if !valid {
                return Err(ModelingError::InvalidParent {
                    parent: parent.clone(),
                });
            }
        }

        canvas.push_undo();
        log::debug!(
            "Moving {} element(s) by ({}, {}) primary={:?}",
            closure.len(),
            delta.x,
            delta.y,
            hints.primary
        );

        for id in &closure {
            if let Some(element) = canvas.get_mut(id) {
                element.translate(delta);
            }
        }

        // Connections docked to exactly one moved element follow at that end.
        for id in canvas.attached_connections(&closure) {
            if closure.contains(&id) {
                continue;
            }
            if let Some(Element::Connection(connection)) = canvas.get_mut(&id) {
                let source_moved = closure.contains(&connection.source);
                let target_moved = closure.contains(&connection.target);
                if source_moved && target_moved {
                    connection.translate(delta);
                } else if source_moved {
                    connection.translate_start(delta);
                } else if target_moved {
                    connection.translate_end(delta);
                }
            }
        }

        if let Some(parent) = new_parent {
            for id in &top_level {
                if let Some(element) = canvas.get_mut(id) {
                    if element.parent() != Some(parent) {
                        log::debug!("Re-parenting {} to {}", id, parent);
                        element.set_parent(Some(parent.clone()));
                    }
                }
            }
        }

        Ok(())
    }
}
