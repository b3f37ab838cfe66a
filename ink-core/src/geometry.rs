//! Viewport and transform math.
//!
//! Screen coordinates are canvas pixels; scene coordinates are the space objects
//! live in. The viewport maps one onto the other with a uniform zoom followed by
//! a pan offset: `screen = scene * zoom + pan`.

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing floating point geometry.
pub const EPSILON: f64 = 1e-9;

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between two points.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Translate by a delta.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Canvas pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Size {
    /// Create a size, clamping degenerate dimensions to one pixel.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        let sane = |v: f64| if v.is_finite() && v >= 1.0 { v } else { 1.0 };
        Self {
            width: sane(width),
            height: sane(height),
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Create a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centered on `center`.
    #[must_use]
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    /// Smallest rectangle containing all points, `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// The four corners, clockwise from top-left.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }

    /// Inclusive point containment.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// True if the rectangles overlap or touch.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Grow on every side by `amount`.
    #[must_use]
    pub fn inflate(&self, amount: f64) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + 2.0 * amount,
            self.height + 2.0 * amount,
        )
    }
}

/// 2D affine matrix in `[a, b, c, d, e, f]` column order.
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine(pub [f64; 6]);

impl Affine {
    /// The identity matrix.
    pub const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// Pure translation.
    #[must_use]
    pub const fn translate(dx: f64, dy: f64) -> Self {
        Self([1.0, 0.0, 0.0, 1.0, dx, dy])
    }

    /// Non-uniform scale about the origin.
    #[must_use]
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    /// Rotation about the origin, in degrees (clockwise on a y-down screen).
    #[must_use]
    pub fn rotate_degrees(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self([cos, sin, -sin, cos, 0.0, 0.0])
    }

    /// `self * other`: apply `other` first, then `self`.
    #[must_use]
    pub fn then_after(&self, other: &Self) -> Self {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Self([
            a1 * a2 + c1 * b2,
            b1 * a2 + d1 * b2,
            a1 * c2 + c1 * d2,
            b1 * c2 + d1 * d2,
            a1 * e2 + c1 * f2 + e1,
            b1 * e2 + d1 * f2 + f1,
        ])
    }

    /// Map a point through the matrix.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        let [a, b, c, d, e, f] = self.0;
        Point::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    /// Inverse matrix, `None` when singular.
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let [a, b, c, d, e, f] = self.0;
        let det = a * d - b * c;
        if det.abs() < EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(Self([
            d * inv,
            -b * inv,
            -c * inv,
            a * inv,
            (c * f - d * e) * inv,
            (b * e - a * f) * inv,
        ]))
    }

    /// Axis-aligned bounds of a rectangle after transformation.
    #[must_use]
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        Rect::from_points(rect.corners().map(|c| self.apply(c))).unwrap_or(*rect)
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Allowed zoom range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    /// Smallest zoom factor.
    pub min: f64,
    /// Largest zoom factor.
    pub max: f64,
}

impl ZoomLimits {
    /// Clamp a zoom value into range; NaN yields the lower bound.
    #[must_use]
    pub fn clamp(&self, zoom: f64) -> f64 {
        let (min, max) = self.bounds();
        if zoom.is_nan() {
            return min;
        }
        zoom.clamp(min, max)
    }

    /// The range in ascending order. Bounds that are not finite and
    /// positive fall back to the defaults.
    #[must_use]
    pub fn bounds(&self) -> (f64, f64) {
        let defaults = Self::default();
        let usable = |v: f64| v.is_finite() && v > 0.0;
        let min = if usable(self.min) { self.min } else { defaults.min };
        let max = if usable(self.max) { self.max } else { defaults.max };
        (min.min(max), min.max(max))
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 20.0,
        }
    }
}

/// Pan/zoom state. Not part of history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Zoom factor (1.0 = 100%).
    pub zoom: f64,
    /// Horizontal pan offset in screen pixels.
    pub pan_x: f64,
    /// Vertical pan offset in screen pixels.
    pub pan_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Viewport {
    /// Zoom 1, no pan.
    pub const IDENTITY: Self = Self {
        zoom: 1.0,
        pan_x: 0.0,
        pan_y: 0.0,
    };

    /// Returns true for the identity mapping.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// The viewport as an affine matrix.
    #[must_use]
    pub fn matrix(&self) -> Affine {
        Affine([self.zoom, 0.0, 0.0, self.zoom, self.pan_x, self.pan_y])
    }

    /// Map a pointer position to scene coordinates.
    #[must_use]
    pub fn screen_to_scene(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan_x) / self.zoom,
            (screen.y - self.pan_y) / self.zoom,
        )
    }

    /// Map a scene position to screen coordinates.
    #[must_use]
    pub fn scene_to_screen(&self, scene: Point) -> Point {
        Point::new(
            scene.x * self.zoom + self.pan_x,
            scene.y * self.zoom + self.pan_y,
        )
    }

    /// Multiply zoom by `factor`, keeping the scene point under `anchor` fixed.
    ///
    /// The resulting zoom is clamped to `limits`; a non-finite factor leaves
    /// the zoom level unchanged.
    #[must_use]
    pub fn zoom_at_point(&self, anchor: Point, factor: f64, limits: ZoomLimits) -> Self {
        let requested = if factor.is_finite() {
            self.zoom * factor
        } else {
            self.zoom
        };
        let zoom = limits.clamp(requested);
        let fixed = self.screen_to_scene(anchor);
        Self {
            zoom,
            pan_x: anchor.x - fixed.x * zoom,
            pan_y: anchor.y - fixed.y * zoom,
        }
    }

    /// Zoom clamped to `limits`, non-finite pan reset to zero.
    #[must_use]
    pub fn sanitized(&self, limits: ZoomLimits) -> Self {
        let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            zoom: limits.clamp(self.zoom),
            pan_x: finite(self.pan_x),
            pan_y: finite(self.pan_y),
        }
    }

    /// Translate by a screen delta, then clamp against the scene bounds.
    ///
    /// When the scaled bounds are wider than the canvas the viewport may not
    /// reveal anything past their edges; when narrower, they stay fully visible.
    #[must_use]
    pub fn pan_by(&self, dx: f64, dy: f64, scene_bounds: &Rect, canvas: Size) -> Self {
        let dx = if dx.is_finite() { dx } else { 0.0 };
        let dy = if dy.is_finite() { dy } else { 0.0 };
        Self {
            zoom: self.zoom,
            pan_x: clamp_axis(
                self.pan_x + dx,
                scene_bounds.x,
                scene_bounds.right(),
                self.zoom,
                canvas.width,
            ),
            pan_y: clamp_axis(
                self.pan_y + dy,
                scene_bounds.y,
                scene_bounds.bottom(),
                self.zoom,
                canvas.height,
            ),
        }
    }
}

fn clamp_axis(pan: f64, min: f64, max: f64, zoom: f64, extent: f64) -> f64 {
    let a = -min * zoom;
    let b = extent - max * zoom;
    if !(a.is_finite() && b.is_finite()) {
        return pan;
    }
    pan.clamp(a.min(b), a.max(b))
}
