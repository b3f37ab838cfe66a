//! Scene objects - strokes, text boxes and images.
//!
//! Every object keeps its geometry in a local frame centered on the origin;
//! [`Transform`] places that frame in the scene by its center, so moving,
//! rotating or replacing an object never shifts its visual centroid.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Affine, Point, Rect, Viewport};
use crate::path::{self, PathCommand};

/// Line height multiplier applied to text boxes.
pub const TEXT_LINE_HEIGHT: f64 = 1.16;

/// Unique identifier for a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Create a new unique object ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse from the hyphenated string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outline style for ink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeStyle {
    /// CSS color string.
    pub color: String,
    /// Line width in scene units.
    pub width: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            width: 3.0,
        }
    }
}

/// Font and fill for text boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Font family name.
    pub font_family: String,
    /// Font size in scene units.
    pub font_size: f64,
    /// CSS fill color.
    pub fill: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Verdana".to_string(),
            font_size: 24.0,
            fill: "#000000".to_string(),
        }
    }
}

/// The drawable content of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectKind {
    /// Free-hand or synthesized ink.
    Stroke {
        /// Path in local coordinates.
        path: Vec<PathCommand>,
        /// Outline style.
        stroke: StrokeStyle,
    },
    /// Editable text.
    Textbox {
        /// Text content; lines separated by `\n`.
        content: String,
        /// Box width in local units.
        width: f64,
        /// Font metadata.
        style: TextStyle,
    },
    /// Raster image.
    Image {
        /// `data:` URL holding the encoded image.
        src: String,
        /// Natural width in pixels.
        width: f64,
        /// Natural height in pixels.
        height: f64,
    },
}

impl ObjectKind {
    /// Short lowercase name of the variant.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stroke { .. } => "stroke",
            Self::Textbox { .. } => "textbox",
            Self::Image { .. } => "image",
        }
    }
}

/// Placement of an object's local frame in the scene.
///
/// `x`/`y` is where the local origin (the object's center) lands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Center X in scene coordinates.
    pub x: f64,
    /// Center Y in scene coordinates.
    pub y: f64,
    /// Horizontal scale.
    #[serde(default = "Transform::unit")]
    pub scale_x: f64,
    /// Vertical scale.
    #[serde(default = "Transform::unit")]
    pub scale_y: f64,
    /// Rotation in degrees.
    #[serde(default)]
    pub angle: f64,
    /// Mirror horizontally.
    #[serde(default)]
    pub flip_x: bool,
    /// Mirror vertically.
    #[serde(default)]
    pub flip_y: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Point::default())
    }
}

impl Transform {
    const fn unit() -> f64 {
        1.0
    }

    /// Identity placement centered on `center`.
    #[must_use]
    pub const fn at(center: Point) -> Self {
        Self {
            x: center.x,
            y: center.y,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            flip_x: false,
            flip_y: false,
        }
    }

    /// Center position.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Local-to-scene matrix: scale and flip, then rotate, then translate.
    #[must_use]
    pub fn matrix(&self) -> Affine {
        let sx = if self.flip_x { -self.scale_x } else { self.scale_x };
        let sy = if self.flip_y { -self.scale_y } else { self.scale_y };
        Affine::translate(self.x, self.y)
            .then_after(&Affine::rotate_degrees(self.angle))
            .then_after(&Affine::scale(sx, sy))
    }
}

/// The "convert" affordance drawn at an object's top-right corner.
///
/// Runtime only; re-attached whenever objects are (re)loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertControl {
    /// Screen-space horizontal offset from the corner.
    pub offset_x: f64,
    /// Screen-space vertical offset from the corner.
    pub offset_y: f64,
    /// Hit square edge length in screen pixels.
    pub size: f64,
}

impl Default for ConvertControl {
    fn default() -> Self {
        Self {
            offset_x: 16.0,
            offset_y: -16.0,
            size: 24.0,
        }
    }
}

impl ConvertControl {
    /// Screen rectangle of the control for `object` under `viewport`.
    #[must_use]
    pub fn screen_rect(&self, object: &SceneObject, viewport: &Viewport) -> Rect {
        let local = object.local_bounds();
        let corner = object
            .transform
            .matrix()
            .apply(Point::new(local.right(), local.y));
        let anchor = viewport
            .scene_to_screen(corner)
            .offset(self.offset_x, self.offset_y);
        Rect::centered(anchor, self.size, self.size)
    }
}

/// A drawable object in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Stable identifier.
    pub id: ObjectId,
    /// Content.
    #[serde(flatten)]
    pub kind: ObjectKind,
    /// Placement.
    pub transform: Transform,
    /// Opacity between 0 and 1.
    #[serde(default = "SceneObject::default_opacity")]
    pub opacity: f64,
    /// Whether the object can currently be selected (mode-derived).
    #[serde(skip, default = "SceneObject::interactive")]
    pub selectable: bool,
    /// Whether the object currently receives pointer events (mode-derived).
    #[serde(skip, default = "SceneObject::interactive")]
    pub evented: bool,
    /// Attached convert control, if any.
    #[serde(skip)]
    pub control: Option<ConvertControl>,
}

impl SceneObject {
    const fn default_opacity() -> f64 {
        1.0
    }

    const fn interactive() -> bool {
        true
    }

    /// Create an object with an identity transform at the origin.
    #[must_use]
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            id: ObjectId::new(),
            kind,
            transform: Transform::default(),
            opacity: 1.0,
            selectable: true,
            evented: true,
            control: None,
        }
    }

    /// Ink from a path given in scene coordinates.
    ///
    /// The path is re-expressed around its own center, which becomes the
    /// object's position.
    #[must_use]
    pub fn stroke(scene_path: &[PathCommand], stroke: StrokeStyle) -> Self {
        let (local, center) = path::center_on_origin(scene_path);
        Self::new(ObjectKind::Stroke {
            path: local,
            stroke,
        })
        .with_transform(Transform::at(center))
    }

    /// Text box whose top-left corner sits at `top_left`.
    #[must_use]
    pub fn textbox(content: &str, top_left: Point, width: f64, style: TextStyle) -> Self {
        let height = text_height(content, style.font_size);
        let center = top_left.offset(width / 2.0, height / 2.0);
        Self::new(ObjectKind::Textbox {
            content: content.to_string(),
            width,
            style,
        })
        .with_transform(Transform::at(center))
    }

    /// Image centered on `center`.
    #[must_use]
    pub fn image(src: String, width: f64, height: f64, center: Point) -> Self {
        Self::new(ObjectKind::Image { src, width, height })
            .with_transform(Transform::at(center))
    }

    /// Set the identifier.
    #[must_use]
    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = id;
        self
    }

    /// Set the transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the opacity.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Whether this kind offers a conversion to ink.
    #[must_use]
    pub fn is_convertible(&self) -> bool {
        matches!(
            self.kind,
            ObjectKind::Textbox { .. } | ObjectKind::Image { .. }
        )
    }

    /// Bounds of the untransformed geometry, centered near the origin.
    #[must_use]
    pub fn local_bounds(&self) -> Rect {
        match &self.kind {
            ObjectKind::Stroke { path, .. } => {
                path::bounds(path).unwrap_or_else(|| Rect::centered(Point::default(), 0.0, 0.0))
            }
            ObjectKind::Textbox { content, width, style } => Rect::centered(
                Point::default(),
                *width,
                text_height(content, style.font_size),
            ),
            ObjectKind::Image { width, height, .. } => {
                Rect::centered(Point::default(), *width, *height)
            }
        }
    }

    /// Axis-aligned bounds in scene coordinates.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        self.transform.matrix().transform_rect(&self.local_bounds())
    }

    /// Check if a scene point hits this object.
    ///
    /// Strokes get half their line width as tolerance.
    #[must_use]
    pub fn contains_point(&self, p: Point) -> bool {
        let Some(inv) = self.transform.matrix().invert() else {
            return false;
        };
        let tolerance = match &self.kind {
            ObjectKind::Stroke { stroke, .. } => stroke.width / 2.0,
            _ => 0.0,
        };
        self.local_bounds().inflate(tolerance).contains(inv.apply(p))
    }
}

/// Rendered height of a text box.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn text_height(content: &str, font_size: f64) -> f64 {
    let lines = content.split('\n').count().max(1);
    lines as f64 * font_size * TEXT_LINE_HEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_is_centered_on_its_bounds() {
        let obj = SceneObject::stroke(
            &[
                PathCommand::MoveTo(Point::new(100.0, 100.0)),
                PathCommand::LineTo(Point::new(140.0, 120.0)),
            ],
            StrokeStyle::default(),
        );
        assert_eq!(obj.transform.center(), Point::new(120.0, 110.0));
        let bbox = obj.bounding_box();
        assert_eq!(bbox, Rect::new(100.0, 100.0, 40.0, 20.0));
    }

    #[test]
    fn test_textbox_anchored_at_top_left() {
        let obj = SceneObject::textbox("", Point::new(10.0, 20.0), 200.0, TextStyle::default());
        let bbox = obj.bounding_box();
        assert!((bbox.x - 10.0).abs() < 1e-9);
        assert!((bbox.y - 20.0).abs() < 1e-9);
        assert!((bbox.height - 24.0 * TEXT_LINE_HEIGHT).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_hit_test() {
        let mut obj = SceneObject::image(String::new(), 100.0, 10.0, Point::new(0.0, 0.0));
        assert!(obj.contains_point(Point::new(45.0, 0.0)));
        assert!(!obj.contains_point(Point::new(0.0, 45.0)));
        obj.transform.angle = 90.0;
        assert!(!obj.contains_point(Point::new(45.0, 0.0)));
        assert!(obj.contains_point(Point::new(0.0, 45.0)));
    }

    #[test]
    fn test_runtime_flags_not_serialized() {
        let mut obj = SceneObject::image("data:,".into(), 4.0, 4.0, Point::new(1.0, 1.0));
        obj.control = Some(ConvertControl::default());
        obj.selectable = false;
        let json = serde_json::to_value(&obj).expect("serialize");
        assert!(json.get("selectable").is_none());
        assert!(json.get("control").is_none());
        assert_eq!(json["type"], "image");
    }

    #[test]
    fn test_convert_control_sits_off_top_right_corner() {
        let obj = SceneObject::image(String::new(), 100.0, 50.0, Point::new(100.0, 100.0));
        let rect = ConvertControl::default().screen_rect(&obj, &Viewport::IDENTITY);
        assert_eq!(rect.center(), Point::new(166.0, 59.0));
        assert!((rect.width - 24.0).abs() < 1e-9);
    }
}
