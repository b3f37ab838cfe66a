//! # Saorsa Inkboard Renderer
//!
//! Export encoders for inkboard scenes.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            Scene (ink-core)                 │
//! ├─────────────────────────────────────────────┤
//! │            SVG writer                       │
//! ├─────────────┬─────────────┬─────────────────┤
//! │ SVG bytes   │ resvg raster│ printpdf page   │
//! │             │ (PNG, JPEG) │ (PNG, fitted)   │
//! └─────────────┴─────────────┴─────────────────┘
//! ```
//!
//! [`SceneExporter`] implements [`ink_core::SceneEncoder`], so it plugs
//! straight into `Canvas::export_as` and `Canvas::extract_text`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod svg;

pub use error::{RenderError, RenderResult};
pub use export::{fit_to_page, ExportConfig, PageFit, SceneExporter};
pub use ink_core::ExportFormat;
