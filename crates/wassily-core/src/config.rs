//! Surface configuration.

use crate::error::{DrawError, Result};
use crate::style::Style;
use serde::{Deserialize, Serialize};

/// Dimensions and defaults for a drawing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Canvas width in pixels.
    pub width: f64,
    /// Canvas height in pixels.
    pub height: f64,
    /// Tolerance for degenerate geometry checks.
    pub epsilon: f64,
    /// Style of the root frame, inherited by everything created on it.
    pub default_style: Style,
    /// Text box height as a multiple of the measured glyph height.
    pub text_padding: f64,
    /// First value of the element name counter.
    pub name_counter_start: u64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            epsilon: 1e-6,
            default_style: Style::default(),
            text_padding: 1.5,
            name_counter_start: 0,
        }
    }
}

impl SurfaceConfig {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| DrawError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(DrawError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.epsilon > 0.0) {
            return Err(DrawError::InvalidConfig(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}
