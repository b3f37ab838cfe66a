//! Scene to SVG.
//!
//! The SVG is both an export format and the intermediate representation the
//! raster encoders feed through resvg.

use std::fmt::Write;

use ink_core::element::TEXT_LINE_HEIGHT;
use ink_core::geometry::Affine;
use ink_core::path;
use ink_core::{ObjectKind, Scene, SceneObject};
use tracing::debug;

/// Pixel dimensions of the output at `scale` times the canvas size.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn output_dimensions(scene: &Scene, scale: f64) -> (u32, u32) {
    let size = scene.size();
    let scale = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    };
    let w = (size.width * scale).round().max(1.0) as u32;
    let h = (size.height * scale).round().max(1.0) as u32;
    (w, h)
}

/// Write the scene as a standalone SVG document.
///
/// The viewBox covers the canvas in screen units; the scene's viewport is
/// applied as the outermost group transform.
#[must_use]
pub fn write_svg(scene: &Scene, background: [u8; 4], scale: f64) -> String {
    let (out_w, out_h) = output_dimensions(scene, scale);
    let size = scene.size();

    let mut svg = String::with_capacity(4096);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {} {}\">",
        size.width, size.height,
    );

    // Background
    let bg_alpha = f32::from(background[3]) / 255.0;
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"rgba({},{},{},{bg_alpha})\"/>",
        background[0], background[1], background[2],
    );

    let viewport = scene.viewport();
    let grouped = !viewport.is_identity();
    if grouped {
        let _ = write!(svg, "<g transform=\"{}\">", matrix_attr(&viewport.matrix()));
    }
    for object in scene.objects() {
        write_object(&mut svg, object);
    }
    if grouped {
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}

fn matrix_attr(m: &Affine) -> String {
    let [a, b, c, d, e, f] = m.0;
    format!("matrix({a} {b} {c} {d} {e} {f})")
}

/// Render a single object inside its own transform group.
fn write_object(svg: &mut String, object: &SceneObject) {
    let _ = write!(
        svg,
        "<g transform=\"{}\"",
        matrix_attr(&object.transform.matrix())
    );
    if object.opacity < 1.0 {
        let _ = write!(svg, " opacity=\"{}\"", object.opacity);
    }
    svg.push('>');

    match &object.kind {
        ObjectKind::Stroke { path, stroke } => {
            if !path.is_empty() {
                let _ = write!(
                    svg,
                    "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>",
                    path::to_svg_data(path),
                    escape_xml(&stroke.color),
                    stroke.width,
                );
            }
        }

        ObjectKind::Textbox { content, style, .. } => {
            if !content.is_empty() {
                let local = object.local_bounds();
                let line_height = style.font_size * TEXT_LINE_HEIGHT;
                let _ = write!(
                    svg,
                    "<text font-family=\"{}\" font-size=\"{}\" fill=\"{}\" xml:space=\"preserve\">",
                    escape_xml(&style.font_family),
                    style.font_size,
                    escape_xml(&style.fill),
                );
                let mut baseline = local.y + style.font_size;
                for line in content.split('\n') {
                    let _ = write!(
                        svg,
                        "<tspan x=\"{}\" y=\"{baseline}\">{}</tspan>",
                        local.x,
                        escape_xml(line),
                    );
                    baseline += line_height;
                }
                svg.push_str("</text>");
            }
        }

        ObjectKind::Image { src, width, height } => {
            // Only embedded payloads; never resolve paths or URLs
            if src.starts_with("data:") {
                let _ = write!(
                    svg,
                    "<image x=\"{}\" y=\"{}\" width=\"{width}\" height=\"{height}\" href=\"{}\"/>",
                    -width / 2.0,
                    -height / 2.0,
                    escape_xml(src),
                );
            } else {
                debug!(id = %object.id, "skipping image with non-embedded source");
            }
        }
    }

    svg.push_str("</g>");
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
