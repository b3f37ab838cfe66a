//! Export seam between the engine and format encoders.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CanvasResult, Scene};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
    /// SVG vector graphics.
    Svg,
    /// PDF document with the scene fitted onto one page.
    Pdf,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
        }
    }

    /// MIME type of the output.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Svg => "image/svg+xml",
            Self::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "svg" => Ok(Self::Svg),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown export format '{other}'")),
        }
    }
}

/// Encodes scenes. Implementations honor `scene.viewport()`.
pub trait SceneEncoder {
    /// Encode the scene in `format`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CanvasError::Export`] if encoding fails.
    fn encode(&self, scene: &Scene, format: ExportFormat) -> CanvasResult<Vec<u8>>;

    /// Rasterize to PNG at `multiplier` times the canvas size.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CanvasError::Export`] if rendering fails.
    fn rasterize_png(&self, scene: &Scene, multiplier: f64) -> CanvasResult<Vec<u8>>;
}

/// An encoded export ready to be written or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// `name.ext`.
    pub filename: String,
    /// Output format.
    pub format: ExportFormat,
    /// Encoded bytes.
    pub bytes: Vec<u8>,
}

/// `name` with the format's extension appended unless already present.
#[must_use]
pub fn filename_for(name: &str, format: ExportFormat) -> String {
    let ext = format.extension();
    let name = if name.trim().is_empty() { "canvas" } else { name };
    if name
        .rsplit_once('.')
        .is_some_and(|(_, e)| e.eq_ignore_ascii_case(ext))
    {
        name.to_string()
    } else {
        format!("{name}.{ext}")
    }
}
