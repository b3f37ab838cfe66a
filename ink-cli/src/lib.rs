//! # Inkboard CLI
//!
//! Command-line host for persisted scene blobs.
//!
//! ## Usage
//!
//! ```bash
//! inkboard inspect sketch.json
//! inkboard export sketch.json --format pdf --output handout
//! INKBOARD_CONFIG=inkboard.json inkboard export sketch.json --format png
//! ```
//!
//! The optional config file holds two sections, both partial:
//!
//! ```json
//! { "canvas": { "history_limit": 100 }, "export": { "jpeg_quality": 70 } }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use ink_core::{Canvas, CanvasConfig, ExportFormat, Rect, SceneBlob, Size, Viewport};
use ink_renderer::{ExportConfig, SceneExporter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Canvas size assumed for blobs that carry no viewport.
pub const FALLBACK_CANVAS_SIZE: Size = Size {
    width: 800.0,
    height: 600.0,
};

/// Command-line arguments for inkboard.
#[derive(Debug, Clone, Parser)]
#[command(name = "inkboard")]
#[command(about = "Inspect and export Saorsa Inkboard scenes")]
#[command(version)]
pub struct CliArgs {
    /// JSON config file with `canvas` and `export` sections
    #[arg(long, global = true, env = "INKBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Summarize a scene blob
    Inspect {
        /// Scene blob file
        blob: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encode a scene blob as an image or document
    Export {
        /// Scene blob file
        blob: PathBuf,

        /// Output format: png, jpeg, svg or pdf
        #[arg(long, short, default_value = "png")]
        format: ExportFormat,

        /// Output name; the extension is added when missing (defaults to the blob's stem)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// Host configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Engine settings.
    pub canvas: CanvasConfig,
    /// Encoder settings.
    pub export: ExportConfig,
}

impl HostConfig {
    /// Read a config file, or use defaults when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        let canvas = config.canvas.validated()?;
        debug!(path = %path.display(), "config loaded");
        Ok(Self { canvas, ..config })
    }
}

/// What `inspect` reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSummary {
    /// Total object count.
    pub objects: usize,
    /// Object count per kind (`stroke`, `textbox`, `image`).
    pub by_kind: BTreeMap<&'static str, usize>,
    /// Canvas size in screen pixels.
    pub canvas: Size,
    /// Persisted viewport.
    pub viewport: Viewport,
    /// Union of all bounding boxes, absent for an empty scene.
    pub bounds: Option<Rect>,
}

impl fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "objects: {}", self.objects)?;
        for (kind, count) in &self.by_kind {
            writeln!(f, "  {kind}: {count}")?;
        }
        writeln!(f, "canvas: {} x {}", self.canvas.width, self.canvas.height)?;
        writeln!(
            f,
            "viewport: zoom {} pan ({}, {})",
            self.viewport.zoom, self.viewport.pan_x, self.viewport.pan_y
        )?;
        match &self.bounds {
            Some(b) => write!(
                f,
                "bounds: ({:.1}, {:.1}) {:.1} x {:.1}",
                b.x, b.y, b.width, b.height
            ),
            None => write!(f, "bounds: empty"),
        }
    }
}

/// Load a blob file into a fresh canvas.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the blob is rejected.
pub fn open_canvas(blob: &Path, config: &HostConfig) -> anyhow::Result<Canvas> {
    let bytes =
        std::fs::read(blob).with_context(|| format!("Failed to read {}", blob.display()))?;
    let mut canvas = Canvas::new(config.canvas.clone(), FALLBACK_CANVAS_SIZE)?;
    canvas
        .load(&SceneBlob::from_bytes(bytes))
        .with_context(|| format!("Failed to load scene from {}", blob.display()))?;
    Ok(canvas)
}

/// Summarize a blob file.
///
/// # Errors
///
/// Returns an error if the blob cannot be loaded.
pub fn inspect(blob: &Path, config: &HostConfig) -> anyhow::Result<SceneSummary> {
    let canvas = open_canvas(blob, config)?;
    let scene = canvas.get_scene();

    let mut by_kind = BTreeMap::new();
    for object in scene.objects() {
        *by_kind.entry(object.kind.name()).or_insert(0) += 1;
    }

    Ok(SceneSummary {
        objects: scene.len(),
        by_kind,
        canvas: scene.size(),
        viewport: scene.viewport(),
        bounds: scene.content_bounds(),
    })
}

/// Export a blob file and return the path written.
///
/// # Errors
///
/// Returns an error if loading, encoding or writing fails.
pub fn export(
    blob: &Path,
    format: ExportFormat,
    output: Option<&Path>,
    config: &HostConfig,
) -> anyhow::Result<PathBuf> {
    let mut canvas = open_canvas(blob, config)?;
    let exporter = SceneExporter::new(config.export.clone());

    let name = match output {
        Some(path) => path.to_string_lossy().into_owned(),
        None => blob
            .file_stem()
            .map_or_else(|| "canvas".to_string(), |s| s.to_string_lossy().into_owned()),
    };
    let artifact = canvas.export_as(format, &name, &exporter)?;

    let path = PathBuf::from(&artifact.filename);
    std::fs::write(&path, &artifact.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), %format, bytes = artifact.bytes.len(), "export written");
    Ok(path)
}

/// Execute parsed arguments.
///
/// # Errors
///
/// Returns the failing command's error.
pub fn run(args: &CliArgs) -> anyhow::Result<()> {
    let config = HostConfig::load(args.config.as_deref())?;
    match &args.command {
        Command::Inspect { blob, json } => {
            let summary = inspect(blob, &config)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{summary}");
            }
        }
        Command::Export {
            blob,
            format,
            output,
        } => {
            let path = export(blob, *format, output.as_deref(), &config)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export_args() {
        let args = CliArgs::try_parse_from([
            "inkboard", "export", "scene.json", "--format", "JPG", "-o", "out/pic",
        ])
        .expect("parse");
        match args.command {
            Command::Export {
                blob,
                format,
                output,
            } => {
                assert_eq!(blob, PathBuf::from("scene.json"));
                assert_eq!(format, ExportFormat::Jpeg);
                assert_eq!(output, Some(PathBuf::from("out/pic")));
            }
            Command::Inspect { .. } => panic!("expected export"),
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        let err = CliArgs::try_parse_from(["inkboard", "export", "s.json", "--format", "gif"])
            .unwrap_err();
        assert!(err.to_string().contains("gif"));
    }

    #[test]
    fn test_default_format_is_png() {
        let args = CliArgs::try_parse_from(["inkboard", "export", "s.json"]).expect("parse");
        assert!(matches!(
            args.command,
            Command::Export {
                format: ExportFormat::Png,
                ..
            }
        ));
    }

    #[test]
    fn test_summary_display() {
        let summary = SceneSummary {
            objects: 2,
            by_kind: BTreeMap::from([("stroke", 1), ("textbox", 1)]),
            canvas: FALLBACK_CANVAS_SIZE,
            viewport: Viewport::default(),
            bounds: None,
        };
        let text = summary.to_string();
        assert!(text.contains("objects: 2"));
        assert!(text.contains("  stroke: 1"));
        assert!(text.contains("bounds: empty"));
    }
}
