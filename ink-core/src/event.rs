//! Pointer input.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::ObjectId;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button or finger went down.
    Down,
    /// Pointer moved.
    Move,
    /// Button or finger released.
    Up,
}

/// A pointer event in screen (canvas pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Phase of this event.
    pub phase: PointerPhase,
    /// X position in screen pixels.
    pub x: f64,
    /// Y position in screen pixels.
    pub y: f64,
}

impl PointerEvent {
    /// Pointer-down at a position.
    #[must_use]
    pub const fn down(x: f64, y: f64) -> Self {
        Self {
            phase: PointerPhase::Down,
            x,
            y,
        }
    }

    /// Pointer-move to a position.
    #[must_use]
    pub const fn moved(x: f64, y: f64) -> Self {
        Self {
            phase: PointerPhase::Move,
            x,
            y,
        }
    }

    /// Pointer-up at a position.
    #[must_use]
    pub const fn up(x: f64, y: f64) -> Self {
        Self {
            phase: PointerPhase::Up,
            x,
            y,
        }
    }

    /// Position as a point.
    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// What a pointer event did that the host may need to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Nothing for the host to do.
    None,
    /// The convert control of this object was pressed.
    ConvertRequested(ObjectId),
}

/// Mirror axis for flip commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Mirror left/right.
    Horizontal,
    /// Mirror top/bottom.
    Vertical,
}
