//! Scene export to image/document formats.
//!
//! Renders a [`Scene`] to PNG, JPEG, SVG or PDF using an SVG intermediate
//! representation and the resvg/tiny-skia rasterization pipeline.

use std::sync::Arc;

use image::ImageEncoder;
use ink_core::export::{ExportFormat, SceneEncoder};
use ink_core::geometry::Size;
use ink_core::{CanvasError, CanvasResult, Scene};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::svg;

/// Configuration for scene export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Background color as RGBA bytes.
    pub background: [u8; 4],
    /// JPEG quality 1-100 (default: 85).
    pub jpeg_quality: u8,
    /// Scale factor (e.g. 2.0 for retina).
    pub scale: f64,
    /// DPI of the raster embedded in PDFs (default: 96.0).
    pub dpi: f32,
    /// PDF page width in millimetres (default: A4).
    pub page_width_mm: f32,
    /// PDF page height in millimetres (default: A4).
    pub page_height_mm: f32,
    /// Load installed fonts so text boxes show up in raster output.
    pub system_fonts: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            background: [255, 255, 255, 255],
            jpeg_quality: 85,
            scale: 1.0,
            dpi: 96.0,
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            system_fonts: true,
        }
    }
}

/// Placement of content on a page: uniform scale to fit, centered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFit {
    /// Content units to page units.
    pub scale: f64,
    /// Left margin in page units.
    pub offset_x: f64,
    /// Top margin in page units.
    pub offset_y: f64,
    /// Placed width in page units.
    pub width: f64,
    /// Placed height in page units.
    pub height: f64,
}

/// Scale `content` uniformly to the largest size that fits the page and
/// center it.
#[must_use]
pub fn fit_to_page(content: Size, page_width: f64, page_height: f64) -> PageFit {
    let scale = (page_width / content.width).min(page_height / content.height);
    let width = content.width * scale;
    let height = content.height * scale;
    PageFit {
        scale,
        offset_x: (page_width - width) / 2.0,
        offset_y: (page_height - height) / 2.0,
        width,
        height,
    }
}

/// Exports a [`Scene`] to various image and document formats.
///
/// The scene is rendered exactly as its viewport dictates; callers wanting
/// true scene coordinates (as `Canvas::export_as` does) reset the viewport
/// first.
pub struct SceneExporter {
    config: ExportConfig,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for SceneExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneExporter")
            .field("config", &self.config)
            .field("font_faces", &self.fontdb.len())
            .finish()
    }
}

impl SceneExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        if config.system_fonts {
            fontdb.load_system_fonts();
            debug!(faces = fontdb.len(), "loaded system fonts");
        }
        Self {
            config,
            fontdb: Arc::new(fontdb),
        }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export a scene to the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene cannot be rendered or encoded.
    pub fn export(&self, scene: &Scene, format: ExportFormat) -> RenderResult<Vec<u8>> {
        debug!(%format, objects = scene.len(), "exporting scene");
        match format {
            ExportFormat::Png => self.render_to_png(scene),
            ExportFormat::Jpeg => self.render_to_jpeg(scene),
            ExportFormat::Svg => Ok(self.render_to_svg(scene).into_bytes()),
            ExportFormat::Pdf => self.render_to_pdf(scene),
        }
    }

    /// Export the scene to an SVG string.
    #[must_use]
    pub fn render_to_svg(&self, scene: &Scene) -> String {
        svg::write_svg(scene, self.config.background, self.config.scale)
    }

    /// Export the scene to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn render_to_png(&self, scene: &Scene) -> RenderResult<Vec<u8>> {
        self.rasterize(scene, self.config.scale)
    }

    /// Rasterize to PNG at `scale` times the canvas size, ignoring the
    /// configured scale.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn rasterize(&self, scene: &Scene, scale: f64) -> RenderResult<Vec<u8>> {
        let svg_string = svg::write_svg(scene, self.config.background, scale);
        let pixmap = self.rasterize_svg(&svg_string)?;

        pixmap
            .encode_png()
            .map_err(|e| RenderError::encode("PNG", e))
    }

    /// Export the scene to JPEG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render_to_jpeg(&self, scene: &Scene) -> RenderResult<Vec<u8>> {
        let svg_string = self.render_to_svg(scene);
        let pixmap = self.rasterize_svg(&svg_string)?;

        // JPEG has no alpha: composite over the background
        let (width, height) = (pixmap.width(), pixmap.height());
        let bg = &self.config.background;
        let mut rgb_data = Vec::with_capacity((width * height * 3) as usize);
        for pixel in pixmap.pixels() {
            let c = pixel.demultiply();
            let alpha = f32::from(c.alpha()) / 255.0;
            let inv = 1.0 - alpha;
            rgb_data.push(f32::from(c.red()).mul_add(alpha, f32::from(bg[0]) * inv) as u8);
            rgb_data.push(f32::from(c.green()).mul_add(alpha, f32::from(bg[1]) * inv) as u8);
            rgb_data.push(f32::from(c.blue()).mul_add(alpha, f32::from(bg[2]) * inv) as u8);
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        let quality = self.config.jpeg_quality.clamp(1, 100);
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
        encoder
            .write_image(&rgb_data, width, height, image::ColorType::Rgb8.into())
            .map_err(|e| RenderError::encode("JPEG", e))?;

        Ok(buf.into_inner())
    }

    /// Export the scene to PDF bytes.
    ///
    /// Renders the scene as a raster image and places it on a single page,
    /// scaled uniformly to fit and centered.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or PDF generation fails.
    #[allow(clippy::cast_possible_truncation)]
    pub fn render_to_pdf(&self, scene: &Scene) -> RenderResult<Vec<u8>> {
        let png_data = self.render_to_png(scene)?;
        let page_w = f64::from(self.config.page_width_mm);
        let page_h = f64::from(self.config.page_height_mm);
        let fit = fit_to_page(scene.size(), page_w, page_h);

        let (doc, page1, layer1) = printpdf::PdfDocument::new(
            "Inkboard Export",
            printpdf::Mm(self.config.page_width_mm),
            printpdf::Mm(self.config.page_height_mm),
            "Layer 1",
        );
        let current_layer = doc.get_page(page1).get_layer(layer1);

        // Decode PNG using printpdf's bundled image crate for compatibility
        let dynamic_image = printpdf::image_crate::load_from_memory(&png_data)
            .map_err(|e| RenderError::Pdf(format!("failed to decode page image: {e}")))?;
        let (px_width, _) = svg::output_dimensions(scene, self.config.scale);
        let pdf_image = printpdf::Image::from_dynamic_image(&dynamic_image);

        // Natural size at the configured DPI, then scaled to the fitted width
        let dpi = f64::from(self.config.dpi);
        let natural_mm = f64::from(px_width) / dpi * 25.4;
        let factor = fit.width / natural_mm;

        // PDF y axis points up; the fit is centered so the margins match
        let transform = printpdf::ImageTransform {
            translate_x: Some(printpdf::Mm(fit.offset_x as f32)),
            translate_y: Some(printpdf::Mm(fit.offset_y as f32)),
            scale_x: Some(factor as f32),
            scale_y: Some(factor as f32),
            dpi: Some(self.config.dpi),
            ..Default::default()
        };
        pdf_image.add_to_layer(current_layer, transform);

        doc.save_to_bytes()
            .map_err(|e| RenderError::Pdf(format!("save failed: {e}")))
    }

    /// Rasterize an SVG string to a tiny-skia Pixmap.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize_svg(&self, svg_string: &str) -> RenderResult<tiny_skia::Pixmap> {
        let opt = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(svg_string, &opt)
            .map_err(|e| RenderError::Svg(e.to_string()))?;

        let px_w = tree.size().width().round() as u32;
        let px_h = tree.size().height().round() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Raster(format!("cannot allocate {px_w}x{px_h} pixmap")))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap)
    }
}

impl SceneEncoder for SceneExporter {
    fn encode(&self, scene: &Scene, format: ExportFormat) -> CanvasResult<Vec<u8>> {
        self.export(scene, format).map_err(CanvasError::from)
    }

    fn rasterize_png(&self, scene: &Scene, multiplier: f64) -> CanvasResult<Vec<u8>> {
        self.rasterize(scene, multiplier).map_err(CanvasError::from)
    }
}
