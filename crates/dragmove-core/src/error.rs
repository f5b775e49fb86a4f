//! Error types shared across the drag and move layers.

use crate::elements::ElementId;
use thiserror::Error;

/// Failure raised by an event bus listener.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("listener on `{}` failed: {message}", .event.as_deref().unwrap_or("<unknown>"))]
pub struct ListenerError {
    /// Name of the event being dispatched, filled in by the bus.
    pub event: Option<String>,
    /// Human readable reason.
    pub message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            event: None,
            message: message.into(),
        }
    }

    pub(crate) fn on_event(mut self, event: &str) -> Self {
        if self.event.is_none() {
            self.event = Some(event.to_string());
        }
        self
    }
}

impl From<ModelingError> for ListenerError {
    fn from(err: ModelingError) -> Self {
        ListenerError::new(err.to_string())
    }
}

/// Errors returned by dragging and move operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DragError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error("Unknown element: {0}")]
    UnknownElement(ElementId),
}

/// Errors returned by the mutation command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelingError {
    #[error("Unknown element: {0}")]
    UnknownElement(ElementId),
    #[error("Invalid parent {parent} for moved elements")]
    InvalidParent { parent: ElementId },
    #[error("Nothing to move")]
    NothingToMove,
}

/// Errors raised while loading configuration or scenarios.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for drag operations.
pub type DragResult<T> = Result<T, DragError>;

/// Result type for model mutations.
pub type ModelingResult<T> = Result<T, ModelingError>;
