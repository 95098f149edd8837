//! Engine settings.
//!
//! Every knob has a default matching the viewer's behaviour, so an empty
//! JSON object (or no settings at all) is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::geo::ViewportSettings;
use crate::style::{HighlightSettings, LegendSettings, RasterSettings, StyleError};

/// All settings consumed by the style engine and camera fitting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub raster: RasterSettings,
    pub highlight: HighlightSettings,
    pub viewport: ViewportSettings,
    pub legend: LegendSettings,
}

impl EngineSettings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses settings, rejecting malformed input.
    pub fn try_from_json(json: &str) -> Result<Self, StyleError> {
        serde_json::from_str(json).map_err(|e| StyleError::Parse(e.to_string()))
    }

    /// Parses settings, falling back to defaults on malformed input.
    pub fn from_json(json: &str) -> Self {
        match Self::try_from_json(json) {
            Ok(settings) => {
                log::info!("Loaded engine settings");
                settings
            }
            Err(e) => {
                log::warn!("Failed to parse engine settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, StyleError> {
        serde_json::to_string(self).map_err(|e| StyleError::Parse(e.to_string()))
    }
}
