use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::shape::ShapeType;

/// Top-level configuration structure for the application.
///
/// Sections mirror the on-screen settings drawer. Every field has a
/// default, so a partial JSON file is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tempo: TempoConfig,
    pub visual: VisualConfig,
    /// Name of the active built-in palette.
    pub palette: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tempo: TempoConfig::default(),
            visual: VisualConfig::default(),
            palette: "Cyberpunk".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads a JSON settings file, filling anything missing with defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Tempo section: where beats come from and how fast they arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    pub bpm: f32,
    /// Pins the beat interval to one second regardless of bpm.
    pub clock_mode: bool,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            clock_mode: false,
        }
    }
}

/// Visual section: tunnel shape and the metronome toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    pub shape: ShapeType,
    pub metronome: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            shape: ShapeType::Hexagon,
            metronome: false,
        }
    }
}
