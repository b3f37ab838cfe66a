//! Engine settings.
//!
//! Every field has a default, so a partial (or empty) JSON file is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::element::{StrokeStyle, TextStyle};
use crate::geometry::ZoomLimits;
use crate::{CanvasError, CanvasResult};

/// Settings for text boxes inserted by the text tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Font and fill.
    #[serde(flatten)]
    pub style: TextStyle,
    /// Box width.
    pub width: f64,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            style: TextStyle::default(),
            width: 200.0,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Minimum zoom factor.
    pub min_zoom: f64,
    /// Maximum zoom factor.
    pub max_zoom: f64,
    /// Initial pen brush.
    pub brush: StrokeStyle,
    /// Text tool defaults.
    pub text: TextConfig,
    /// Maximum number of undo snapshots kept.
    pub history_limit: usize,
    /// Raster scale used when sending the scene to OCR.
    pub ocr_multiplier: f64,
    /// Style applied to synthesized handwriting.
    pub synthesized_stroke: StrokeStyle,
    /// Document identifier passed to OCR and storage.
    pub document_id: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_zoom: 1.0,
            max_zoom: 20.0,
            brush: StrokeStyle::default(),
            text: TextConfig::default(),
            history_limit: 500,
            ocr_multiplier: 0.2,
            synthesized_stroke: StrokeStyle {
                color: "#000000".to_string(),
                width: 1.0,
            },
            document_id: "0".to_string(),
        }
    }
}

impl CanvasConfig {
    /// Parse from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the zoom range is empty.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| CanvasError::Config(e.to_string()))?;
        config.validated()
    }

    /// Read a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> CanvasResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CanvasError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&contents)
    }

    /// Zoom range.
    #[must_use]
    pub fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits {
            min: self.min_zoom,
            max: self.max_zoom,
        }
    }

    /// Check the zoom range and OCR multiplier.
    ///
    /// For hosts that embed this config in a larger document.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Config`] if a value is out of range.
    pub fn validated(self) -> CanvasResult<Self> {
        let ok = self.min_zoom.is_finite()
            && self.max_zoom.is_finite()
            && self.min_zoom > 0.0
            && self.min_zoom <= self.max_zoom;
        if !ok {
            return Err(CanvasError::Config(format!(
                "invalid zoom range {}..{}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.ocr_multiplier.is_finite() && self.ocr_multiplier > 0.0) {
            return Err(CanvasError::Config(format!(
                "invalid ocr_multiplier {}",
                self.ocr_multiplier
            )));
        }
        Ok(self)
    }
}
