//! Editor configuration.

use crate::dragging::DraggingOptions;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Event namespace of element moves.
pub const DEFAULT_MOVE_PREFIX: &str = "element.move";

/// Move feature settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveConfig {
    /// Prefix of the emitted gesture events.
    pub event_prefix: String,
    /// Hit tolerance in canvas units when resolving hover targets.
    pub hit_tolerance: f64,
}

impl Default for MoveConfig {
    fn default() -> Self {
        Self {
            event_prefix: DEFAULT_MOVE_PREFIX.to_string(),
            hit_tolerance: 0.0,
        }
    }
}

/// Configuration for an editor session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub dragging: DraggingOptions,
    #[serde(rename = "move")]
    pub moving: MoveConfig,
}

impl EditorConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
