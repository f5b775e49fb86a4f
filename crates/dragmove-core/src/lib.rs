//! dragmove core library
//!
//! Pointer drag gestures and rule-gated element moves for a hierarchical
//! diagram canvas.

pub mod canvas;
pub mod config;
pub mod dragging;
pub mod editor;
pub mod elements;
pub mod error;
pub mod event_bus;
pub mod input;
pub mod modeling;
pub mod moving;
pub mod registry;
pub mod rules;

pub use canvas::{Canvas, SharedCanvas};
pub use config::{EditorConfig, MoveConfig};
pub use dragging::{
    DragContext, DragData, DragEvent, DragEventKind, Dragging, DraggingOptions, GestureState,
    HoverContext,
};
pub use editor::Editor;
pub use elements::{Connection, Element, ElementId, ElementKind, ElementTrait, Root, Shape};
pub use error::{ConfigError, DragError, DragResult, ListenerError, ModelingError, ModelingResult};
pub use event_bus::{DEFAULT_PRIORITY, EventBus, ListenerId, ListenerResult, Outcome};
pub use input::{CanvasInput, KeyEvent, Modifiers, MouseButton, PointerInput};
pub use modeling::{Modeling, MoveHints, MutationCommand};
pub use moving::{MoveFeature, round_delta, round_half_up};
pub use registry::{ElementRegistry, GfxHandle, GraphicsRegistry};
pub use rules::{ELEMENTS_MOVE, RuleContext, RuleProvider, RuleVerdict, Rules};
