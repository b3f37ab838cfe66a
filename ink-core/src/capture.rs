//! Pointer state and free-hand stroke capture.

use crate::element::StrokeStyle;
use crate::geometry::Point;
use crate::path;
use crate::SceneObject;

/// Samples closer than this to the previous one are dropped.
const MIN_SAMPLE_DISTANCE: f64 = 0.5;

/// Global pressed state, tracked for every pointer event regardless of mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerTracker {
    pressed: bool,
}

impl PointerTracker {
    /// Pointer went down.
    pub fn press(&mut self) {
        self.pressed = true;
    }

    /// Pointer went up (or was cancelled).
    pub fn release(&mut self) {
        self.pressed = false;
    }

    /// Whether the pointer is currently down.
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

/// Pen brush settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    /// Stroke color.
    pub color: String,
    /// Stroke width; never below 0.1.
    pub width: f64,
}

impl Brush {
    /// Create a brush, clamping the width to something drawable.
    #[must_use]
    pub fn new(color: impl Into<String>, width: f64) -> Self {
        let width = if width.is_finite() { width.max(0.1) } else { 3.0 };
        Self {
            color: color.into(),
            width,
        }
    }

    /// Style applied to strokes drawn with this brush.
    #[must_use]
    pub fn style(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.color.clone(),
            width: self.width,
        }
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self::new("#000000", 3.0)
    }
}

/// Accumulates scene-space samples for the stroke being drawn.
#[derive(Debug, Clone, Default)]
pub struct StrokeCapture {
    samples: Vec<Point>,
    active: bool,
}

impl StrokeCapture {
    /// Begin a stroke at `p`, discarding any unfinished one.
    pub fn begin(&mut self, p: Point) {
        self.samples.clear();
        self.samples.push(p);
        self.active = true;
    }

    /// Add a sample if a stroke is in progress.
    pub fn extend(&mut self, p: Point) {
        if !self.active {
            return;
        }
        if self
            .samples
            .last()
            .is_some_and(|last| last.distance(p) < MIN_SAMPLE_DISTANCE)
        {
            return;
        }
        self.samples.push(p);
    }

    /// Whether a stroke is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Finish the stroke and build the object, `None` if nothing was captured.
    pub fn finish(&mut self, brush: &Brush) -> Option<SceneObject> {
        if !self.active {
            return None;
        }
        self.active = false;
        let samples = std::mem::take(&mut self.samples);
        let commands = path::smooth(&samples);
        if commands.is_empty() {
            return None;
        }
        Some(SceneObject::stroke(&commands, brush.style()))
    }

    /// Drop the stroke in progress.
    pub fn cancel(&mut self) {
        self.active = false;
        self.samples.clear();
    }
}
