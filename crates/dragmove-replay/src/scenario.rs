//! Scripted gesture scenarios and their replay.

use dragmove_core::{
    Canvas, ConfigError, DragError, DragEvent, DragEventKind, Editor, EditorConfig, Element,
    ElementId, ElementTrait, GraphicsRegistry, HoverContext, ModelingError, PointerInput,
};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Modeling(#[from] ModelingError),
    #[error("Scenario has no root element")]
    MissingRoot,
    #[error("Unknown element in step {step}: {element}")]
    UnknownElement { step: usize, element: ElementId },
}

/// One scripted interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Start {
        x: f64,
        y: f64,
        elements: Vec<ElementId>,
        #[serde(default)]
        context: Map<String, Value>,
    },
    Move {
        x: f64,
        y: f64,
    },
    Hover {
        element: ElementId,
    },
    Out,
    End,
    Cancel,
    Undo,
}

/// A diagram plus the gesture to replay over it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: EditorConfig,
    pub elements: Vec<Element>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Build the canvas. Elements without a parent land under the root.
    fn canvas(&self) -> Result<Canvas, ReplayError> {
        let mut canvas = Canvas::new();
        for element in &self.elements {
            if let Element::Root(root) = element {
                canvas.set_root(root.clone());
            }
        }
        let root = canvas.root().cloned().ok_or(ReplayError::MissingRoot)?;

        for element in &self.elements {
            let parent = element.parent().cloned().unwrap_or_else(|| root.clone());
            match element {
                Element::Root(_) => {}
                Element::Shape(shape) => {
                    canvas.add_shape(shape.clone(), &parent)?;
                }
                Element::Connection(connection) => {
                    canvas.add_connection(connection.clone(), &parent)?;
                }
            }
        }
        Ok(canvas)
    }
}

/// One line of replay output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayLine {
    Event {
        name: String,
        position: Option<Point>,
        delta: Option<Vec2>,
    },
    Rejected {
        step: usize,
    },
    Error {
        step: usize,
        message: String,
    },
}

fn fmt_coord(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl fmt::Display for ReplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayLine::Event {
                name,
                position,
                delta,
            } => write!(
                f,
                "{} {} {} {} {}",
                name,
                fmt_coord(position.map(|p| p.x)),
                fmt_coord(position.map(|p| p.y)),
                fmt_coord(delta.map(|d| d.x)),
                fmt_coord(delta.map(|d| d.y)),
            ),
            ReplayLine::Rejected { step } => write!(f, "step {} rejected", step),
            ReplayLine::Error { step, message } => write!(f, "step {} failed: {}", step, message),
        }
    }
}

/// Final geometry of one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementBounds {
    pub id: ElementId,
    pub parent: Option<ElementId>,
    pub bounds: Rect,
}

impl fmt::Display for ElementBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.id,
            self.bounds.x0,
            self.bounds.y0,
            self.bounds.width(),
            self.bounds.height()
        )?;
        if let Some(parent) = &self.parent {
            write!(f, " in {}", parent)?;
        }
        Ok(())
    }
}

/// Result of a replay.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Replay {
    pub lines: Vec<ReplayLine>,
    pub elements: Vec<ElementBounds>,
}

#[cfg(test)]
impl Replay {
    /// Names of the emitted events, in order.
    pub fn event_names(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                ReplayLine::Event { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn bounds(&self, id: &str) -> Option<&ElementBounds> {
        self.elements.iter().find(|e| e.id.as_str() == id)
    }
}

/// Replay `scenario` through a manual-mode editor.
pub fn run(scenario: &Scenario) -> Result<Replay, ReplayError> {
    let mut config = scenario.config.clone();
    config.dragging.manual = true;
    let editor = Editor::with_canvas(config, scenario.canvas()?);

    let lines: Rc<RefCell<Vec<ReplayLine>>> = Rc::new(RefCell::new(Vec::new()));
    let prefix = editor.moving().prefix().to_string();
    for kind in DragEventKind::ALL {
        let lines = Rc::clone(&lines);
        let event_name = kind.event_name(&prefix);
        let name = event_name.clone();
        editor.bus().on(&event_name, move |event: &mut DragEvent| {
            lines.borrow_mut().push(ReplayLine::Event {
                name: name.clone(),
                position: event.position,
                delta: event.delta,
            });
            Ok(None)
        });
    }

    for (index, step) in scenario.steps.iter().enumerate() {
        log::debug!("Step {}: {:?}", index, step);
        match apply(&editor, index, step) {
            Ok(true) => {}
            Ok(false) => lines.borrow_mut().push(ReplayLine::Rejected { step: index }),
            Err(StepError::Drag(err)) => lines.borrow_mut().push(ReplayLine::Error {
                step: index,
                message: err.to_string(),
            }),
            Err(StepError::Replay(err)) => return Err(err),
        }
    }

    let canvas = editor.canvas().borrow();
    let elements = canvas
        .z_order()
        .iter()
        .filter_map(|id| canvas.get(id))
        .map(|element| ElementBounds {
            id: element.id().clone(),
            parent: element.parent().cloned(),
            bounds: element.bounds(),
        })
        .collect();

    let lines = lines.borrow().clone();
    Ok(Replay { lines, elements })
}

enum StepError {
    Drag(DragError),
    Replay(ReplayError),
}

impl From<DragError> for StepError {
    fn from(err: DragError) -> Self {
        StepError::Drag(err)
    }
}

/// Apply one step. `Ok(false)` marks a step the editor refused.
fn apply(editor: &Editor, index: usize, step: &Step) -> Result<bool, StepError> {
    let dragging = editor.dragging();
    match step {
        Step::Start {
            x,
            y,
            elements,
            context,
        } => Ok(editor.start_move(
            &PointerInput::at(*x, *y),
            elements.clone(),
            Some(context.clone()),
        )?),
        Step::Move { x, y } => {
            dragging.move_to(&PointerInput::at(*x, *y))?;
            Ok(true)
        }
        Step::Hover { element } => {
            let gfx = editor.canvas().graphics(element).ok_or_else(|| {
                StepError::Replay(ReplayError::UnknownElement {
                    step: index,
                    element: element.clone(),
                })
            })?;
            dragging.hover(HoverContext {
                element: element.clone(),
                gfx,
            })?;
            Ok(true)
        }
        Step::Out => {
            dragging.out()?;
            Ok(true)
        }
        Step::End => Ok(dragging.end()?),
        Step::Cancel => {
            dragging.cancel()?;
            Ok(true)
        }
        Step::Undo => Ok(editor.undo()),
    }
}
