//! Vector path commands for ink strokes.
//!
//! Paths are stored as absolute drawing commands and serialize to the same
//! compact array form the synthesis service speaks: `["M", x, y]`,
//! `["Q", cx, cy, x, y]`, and so on.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::{CanvasError, CanvasResult};

/// A single absolute drawing command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCommand", into = "RawCommand")]
pub enum PathCommand {
    /// Start a new subpath.
    MoveTo(Point),
    /// Straight segment.
    LineTo(Point),
    /// Quadratic Bézier segment.
    QuadTo {
        /// Control point.
        ctrl: Point,
        /// End point.
        to: Point,
    },
    /// Cubic Bézier segment.
    CubicTo {
        /// First control point.
        ctrl1: Point,
        /// Second control point.
        ctrl2: Point,
        /// End point.
        to: Point,
    },
    /// Close the current subpath.
    Close,
}

impl PathCommand {
    /// Build a command from its letter and numeric operands.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidPath`] for unknown letters or a wrong
    /// operand count.
    pub fn from_parts(op: &str, args: &[f64]) -> CanvasResult<Self> {
        let p = |i: usize| Point::new(args[i], args[i + 1]);
        let expect = |n: usize| {
            if args.len() == n {
                Ok(())
            } else {
                Err(CanvasError::InvalidPath(format!(
                    "'{op}' takes {n} operands, got {}",
                    args.len()
                )))
            }
        };
        if args.iter().any(|v| !v.is_finite()) {
            return Err(CanvasError::InvalidPath(format!(
                "'{op}' has a non-finite operand"
            )));
        }
        match op {
            "M" => expect(2).map(|()| Self::MoveTo(p(0))),
            "L" => expect(2).map(|()| Self::LineTo(p(0))),
            "Q" => expect(4).map(|()| Self::QuadTo {
                ctrl: p(0),
                to: p(2),
            }),
            "C" => expect(6).map(|()| Self::CubicTo {
                ctrl1: p(0),
                ctrl2: p(2),
                to: p(4),
            }),
            "Z" | "z" => expect(0).map(|()| Self::Close),
            other => Err(CanvasError::InvalidPath(format!(
                "unsupported command '{other}'"
            ))),
        }
    }

    /// Command letter.
    #[must_use]
    pub fn letter(&self) -> &'static str {
        match self {
            Self::MoveTo(_) => "M",
            Self::LineTo(_) => "L",
            Self::QuadTo { .. } => "Q",
            Self::CubicTo { .. } => "C",
            Self::Close => "Z",
        }
    }

    /// Every point the command references, control points included.
    #[must_use]
    pub fn points(&self) -> Vec<Point> {
        match *self {
            Self::MoveTo(p) | Self::LineTo(p) => vec![p],
            Self::QuadTo { ctrl, to } => vec![ctrl, to],
            Self::CubicTo { ctrl1, ctrl2, to } => vec![ctrl1, ctrl2, to],
            Self::Close => Vec::new(),
        }
    }

    /// End point of the command, `None` for close.
    #[must_use]
    pub fn end(&self) -> Option<Point> {
        match *self {
            Self::MoveTo(p) | Self::LineTo(p) => Some(p),
            Self::QuadTo { to, .. } | Self::CubicTo { to, .. } => Some(to),
            Self::Close => None,
        }
    }

    /// Apply a point mapping to every coordinate.
    #[must_use]
    pub fn map(&self, f: impl Fn(Point) -> Point) -> Self {
        match *self {
            Self::MoveTo(p) => Self::MoveTo(f(p)),
            Self::LineTo(p) => Self::LineTo(f(p)),
            Self::QuadTo { ctrl, to } => Self::QuadTo {
                ctrl: f(ctrl),
                to: f(to),
            },
            Self::CubicTo { ctrl1, ctrl2, to } => Self::CubicTo {
                ctrl1: f(ctrl1),
                ctrl2: f(ctrl2),
                to: f(to),
            },
            Self::Close => Self::Close,
        }
    }
}

/// Wire form of a command: a letter followed by numbers.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct RawCommand(Vec<serde_json::Value>);

impl TryFrom<RawCommand> for PathCommand {
    type Error = CanvasError;

    fn try_from(raw: RawCommand) -> Result<Self, Self::Error> {
        let mut parts = raw.0.into_iter();
        let op = match parts.next() {
            Some(serde_json::Value::String(op)) => op,
            other => {
                return Err(CanvasError::InvalidPath(format!(
                    "expected command letter, got {other:?}"
                )))
            }
        };
        let args = parts
            .map(|v| {
                v.as_f64().ok_or_else(|| {
                    CanvasError::InvalidPath(format!("non-numeric operand {v} for '{op}'"))
                })
            })
            .collect::<CanvasResult<Vec<_>>>()?;
        Self::from_parts(&op, &args)
    }
}

impl From<PathCommand> for RawCommand {
    fn from(cmd: PathCommand) -> Self {
        let mut parts = vec![serde_json::Value::from(cmd.letter())];
        for p in cmd.points() {
            parts.push(p.x.into());
            parts.push(p.y.into());
        }
        Self(parts)
    }
}

/// Tight bounding box of a path, including curve extrema.
#[must_use]
pub fn bounds(commands: &[PathCommand]) -> Option<Rect> {
    let mut pts = Vec::with_capacity(commands.len() * 2);
    let mut cursor: Option<Point> = None;
    let mut start: Option<Point> = None;
    for cmd in commands {
        match *cmd {
            PathCommand::MoveTo(p) => {
                pts.push(p);
                start = Some(p);
            }
            PathCommand::LineTo(p) => pts.push(p),
            PathCommand::QuadTo { ctrl, to } => {
                pts.push(to);
                if let Some(from) = cursor {
                    pts.extend(quad_extrema(from, ctrl, to));
                }
            }
            PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                pts.push(to);
                if let Some(from) = cursor {
                    pts.extend(cubic_extrema(from, ctrl1, ctrl2, to));
                }
            }
            PathCommand::Close => {}
        }
        cursor = match cmd {
            PathCommand::Close => start,
            _ => cmd.end(),
        };
    }
    Rect::from_points(pts)
}

fn quad_at(p0: f64, p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    mt * mt * p0 + 2.0 * mt * t * p1 + t * t * p2
}

fn cubic_at(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    mt * mt * mt * p0 + 3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t * p3
}

fn quad_extrema(p0: Point, p1: Point, p2: Point) -> Vec<Point> {
    let root = |a: f64, b: f64, c: f64| {
        let denom = a - 2.0 * b + c;
        if denom.abs() < f64::EPSILON {
            None
        } else {
            Some((a - b) / denom).filter(|t| *t > 0.0 && *t < 1.0)
        }
    };
    [root(p0.x, p1.x, p2.x), root(p0.y, p1.y, p2.y)]
        .into_iter()
        .flatten()
        .map(|t| {
            Point::new(
                quad_at(p0.x, p1.x, p2.x, t),
                quad_at(p0.y, p1.y, p2.y, t),
            )
        })
        .collect()
}

fn cubic_extrema(p0: Point, p1: Point, p2: Point, p3: Point) -> Vec<Point> {
    // Roots of the derivative a*t^2 + b*t + c on each axis
    let roots = |v0: f64, v1: f64, v2: f64, v3: f64| -> Vec<f64> {
        let a = -v0 + 3.0 * v1 - 3.0 * v2 + v3;
        let b = 2.0 * (v0 - 2.0 * v1 + v2);
        let c = v1 - v0;
        let mut out = Vec::new();
        if a.abs() < f64::EPSILON {
            if b.abs() >= f64::EPSILON {
                out.push(-c / b);
            }
        } else {
            let disc = b * b - 4.0 * a * c;
            if disc >= 0.0 {
                let sq = disc.sqrt();
                out.push((-b + sq) / (2.0 * a));
                out.push((-b - sq) / (2.0 * a));
            }
        }
        out.retain(|t| *t > 0.0 && *t < 1.0);
        out
    };
    let mut ts = roots(p0.x, p1.x, p2.x, p3.x);
    ts.extend(roots(p0.y, p1.y, p2.y, p3.y));
    ts.into_iter()
        .map(|t| {
            Point::new(
                cubic_at(p0.x, p1.x, p2.x, p3.x, t),
                cubic_at(p0.y, p1.y, p2.y, p3.y, t),
            )
        })
        .collect()
}

/// Translate every coordinate.
#[must_use]
pub fn translate(commands: &[PathCommand], dx: f64, dy: f64) -> Vec<PathCommand> {
    commands.iter().map(|c| c.map(|p| p.offset(dx, dy))).collect()
}

/// Move a path so its bounding-box center sits on the origin.
///
/// Returns the local path together with the center it had before.
#[must_use]
pub fn center_on_origin(commands: &[PathCommand]) -> (Vec<PathCommand>, Point) {
    match bounds(commands) {
        Some(rect) => {
            let c = rect.center();
            (translate(commands, -c.x, -c.y), c)
        }
        None => (commands.to_vec(), Point::default()),
    }
}

/// Split a combined path into subpaths, one per move-to.
///
/// Runs of commands that never draw anything are dropped.
#[must_use]
pub fn split_subpaths(commands: &[PathCommand]) -> Vec<Vec<PathCommand>> {
    let mut out: Vec<Vec<PathCommand>> = Vec::new();
    let mut current: Vec<PathCommand> = Vec::new();
    for (i, cmd) in commands.iter().enumerate() {
        if matches!(cmd, PathCommand::MoveTo(_)) && i != 0 && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        current.push(*cmd);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out.retain(|sub| sub.iter().any(|c| !matches!(c, PathCommand::MoveTo(_))));
    out
}

/// Smooth raw pointer samples into a path.
///
/// Each interior sample becomes the control point of a quadratic whose end
/// is the midpoint to the next sample, so the curve passes through the
/// midpoints and stays tangent to the polyline.
#[must_use]
pub fn smooth(samples: &[Point]) -> Vec<PathCommand> {
    let Some(&first) = samples.first() else {
        return Vec::new();
    };
    let mut cmds = vec![PathCommand::MoveTo(first)];
    if samples.len() == 1 {
        cmds.push(PathCommand::LineTo(first));
        return cmds;
    }
    for pair in samples.windows(2) {
        cmds.push(PathCommand::QuadTo {
            ctrl: pair[0],
            to: pair[0].midpoint(pair[1]),
        });
    }
    if let Some(&last) = samples.last() {
        cmds.push(PathCommand::LineTo(last));
    }
    cmds
}

/// Render commands as SVG path data.
#[must_use]
pub fn to_svg_data(commands: &[PathCommand]) -> String {
    let mut d = String::with_capacity(commands.len() * 24);
    for (i, cmd) in commands.iter().enumerate() {
        if i > 0 {
            d.push(' ');
        }
        d.push_str(cmd.letter());
        for p in cmd.points() {
            let _ = write!(d, " {} {}", p.x, p.y);
        }
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_commands() {
        let cmds: Vec<PathCommand> =
            serde_json::from_str(r#"[["M", 0, 0], ["Q", 5, 10, 10, 0], ["L", 20, 0]]"#)
                .expect("parse");
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[0], PathCommand::MoveTo(Point::new(0.0, 0.0)));
        assert_eq!(
            cmds[1],
            PathCommand::QuadTo {
                ctrl: Point::new(5.0, 10.0),
                to: Point::new(10.0, 0.0)
            }
        );
        let json = serde_json::to_string(&cmds).expect("serialize");
        assert_eq!(json, r#"[["M",0.0,0.0],["Q",5.0,10.0,10.0,0.0],["L",20.0,0.0]]"#);
    }

    #[test]
    fn test_parse_rejects_bad_commands() {
        assert!(serde_json::from_str::<PathCommand>(r#"["X", 1, 2]"#).is_err());
        assert!(serde_json::from_str::<PathCommand>(r#"["M", 1]"#).is_err());
        assert!(serde_json::from_str::<PathCommand>(r#"["L", "a", 2]"#).is_err());
        assert!(serde_json::from_str::<PathCommand>(r"[]").is_err());
    }

    #[test]
    fn test_bounds_includes_curve_extremum() {
        let cmds = vec![
            PathCommand::MoveTo(Point::new(0.0, 0.0)),
            PathCommand::QuadTo {
                ctrl: Point::new(5.0, 10.0),
                to: Point::new(10.0, 0.0),
            },
        ];
        let rect = bounds(&cmds).expect("bounds");
        assert!((rect.height - 5.0).abs() < 1e-9);
        assert!((rect.width - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_split_at_move_to() {
        let cmds = vec![
            PathCommand::MoveTo(Point::new(0.0, 0.0)),
            PathCommand::LineTo(Point::new(1.0, 1.0)),
            PathCommand::MoveTo(Point::new(5.0, 0.0)),
            PathCommand::LineTo(Point::new(6.0, 1.0)),
            PathCommand::LineTo(Point::new(7.0, 0.0)),
            PathCommand::MoveTo(Point::new(9.0, 9.0)),
        ];
        let subs = split_subpaths(&cmds);
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].len(), 2);
        assert_eq!(subs[1].len(), 3);
    }

    #[test]
    fn test_smooth_single_click_draws_dot() {
        let cmds = smooth(&[Point::new(4.0, 4.0)]);
        assert_eq!(cmds.len(), 2);
        assert!(bounds(&cmds).is_some());
    }

    #[test]
    fn test_smooth_passes_through_endpoints() {
        let samples = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 10.0),
        ];
        let cmds = smooth(&samples);
        assert_eq!(cmds.first().and_then(PathCommand::end), Some(samples[0]));
        assert_eq!(cmds.last().and_then(PathCommand::end), Some(samples[2]));
    }

    #[test]
    fn test_center_on_origin() {
        let cmds = vec![
            PathCommand::MoveTo(Point::new(10.0, 10.0)),
            PathCommand::LineTo(Point::new(30.0, 50.0)),
        ];
        let (local, center) = center_on_origin(&cmds);
        assert_eq!(center, Point::new(20.0, 30.0));
        let rect = bounds(&local).expect("bounds");
        assert_eq!(rect.center(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_svg_data() {
        let cmds = vec![
            PathCommand::MoveTo(Point::new(1.0, 2.0)),
            PathCommand::LineTo(Point::new(3.5, 4.0)),
            PathCommand::Close,
        ];
        assert_eq!(to_svg_data(&cmds), "M 1 2 L 3.5 4 Z");
    }
}
