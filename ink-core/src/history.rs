//! Snapshot-based undo/redo.
//!
//! `past` always holds at least one snapshot (the scene as it was when the
//! history was created); its last entry is the current state. `future` holds
//! undone states, most recently undone last, and is dropped by any new record.

use std::collections::VecDeque;

use tracing::debug;

use crate::schema::Snapshot;
use crate::{CanvasResult, Scene};

/// Undo/redo stacks over serialized scene snapshots.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Snapshot>,
    future: Vec<Snapshot>,
    limit: usize,
}

impl History {
    /// Start a history whose snapshot zero is the current scene content.
    ///
    /// `limit` caps the number of past snapshots kept; it never drops below one.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene cannot be serialized.
    pub fn new(scene: &Scene, limit: usize) -> CanvasResult<Self> {
        let mut past = VecDeque::new();
        past.push_back(scene.serialize()?);
        Ok(Self {
            past,
            future: Vec::new(),
            limit: limit.max(1),
        })
    }

    /// Forget everything and make the current scene snapshot zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene cannot be serialized.
    pub fn reset(&mut self, scene: &Scene) -> CanvasResult<()> {
        let snapshot = scene.serialize()?;
        self.past.clear();
        self.past.push_back(snapshot);
        self.future.clear();
        Ok(())
    }

    /// Capture the scene after a committing edit.
    ///
    /// Returns `false` (and changes nothing) if the content is identical to
    /// the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene cannot be serialized.
    pub fn record(&mut self, scene: &Scene) -> CanvasResult<bool> {
        let snapshot = scene.serialize()?;
        if self.past.back() == Some(&snapshot) {
            debug!("history record skipped, content unchanged");
            return Ok(false);
        }
        self.past.push_back(snapshot);
        self.future.clear();
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        debug!(past = self.past.len(), "history recorded");
        Ok(true)
    }

    /// Step back one snapshot and load it into `scene`.
    ///
    /// Returns `false` when only snapshot zero is left.
    ///
    /// # Errors
    ///
    /// Returns an error if the target snapshot cannot be applied; both the
    /// stacks and the scene are then left unchanged.
    pub fn undo(&mut self, scene: &mut Scene) -> CanvasResult<bool> {
        if self.past.len() <= 1 {
            return Ok(false);
        }
        let target = &self.past[self.past.len() - 2];
        scene.deserialize(target)?;
        if let Some(current) = self.past.pop_back() {
            self.future.push(current);
        }
        debug!(past = self.past.len(), future = self.future.len(), "undo");
        Ok(true)
    }

    /// Re-apply the most recently undone snapshot.
    ///
    /// Returns `false` when there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be applied; both the stacks
    /// and the scene are then left unchanged.
    pub fn redo(&mut self, scene: &mut Scene) -> CanvasResult<bool> {
        let Some(target) = self.future.last() else {
            return Ok(false);
        };
        scene.deserialize(target)?;
        if let Some(next) = self.future.pop() {
            self.past.push_back(next);
        }
        debug!(past = self.past.len(), future = self.future.len(), "redo");
        Ok(true)
    }

    /// Whether undo would do anything.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.past.len() > 1
    }

    /// Whether redo would do anything.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of past snapshots, snapshot zero included.
    #[must_use]
    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    /// Number of redoable snapshots.
    #[must_use]
    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> Option<&Snapshot> {
        self.past.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::StrokeStyle;
    use crate::geometry::{Point, Size};
    use crate::path::PathCommand;
    use crate::SceneObject;

    fn stroke(x: f64) -> SceneObject {
        SceneObject::stroke(
            &[
                PathCommand::MoveTo(Point::new(x, 0.0)),
                PathCommand::LineTo(Point::new(x + 10.0, 10.0)),
            ],
            StrokeStyle::default(),
        )
    }

    #[test]
    fn test_curve_coordinates_survive_undo_redo() {
        let mut scene = Scene::new(Size::default());
        let mut history = History::new(&scene, 100).expect("history");
        scene
            .add_object(SceneObject::stroke(
                &[
                    PathCommand::MoveTo(Point::new(1.0, 2.0)),
                    PathCommand::CubicTo {
                        ctrl1: Point::new(3.0, 9.0),
                        ctrl2: Point::new(7.0, -4.0),
                        to: Point::new(12.0, 2.5),
                    },
                ],
                StrokeStyle::default(),
            ))
            .expect("add");
        assert!(history.record(&scene).expect("record"));
        let drawn = scene.serialize().expect("serialize");

        assert!(history.undo(&mut scene).expect("undo"));
        assert!(history.redo(&mut scene).expect("redo"));
        assert_eq!(scene.serialize().expect("serialize").as_str(), drawn.as_str());

        // Nothing changed since the redo, so nothing is recorded
        assert!(!history.record(&scene).expect("record"));
        assert_eq!(history.past_len(), 2);
    }

    #[test]
    fn test_undo_redo_symmetry() {
        let mut scene = Scene::new(Size::default());
        let mut history = History::new(&scene, 100).expect("history");

        for i in 0..3 {
            scene.add_object(stroke(f64::from(i) * 20.0)).expect("add");
            assert!(history.record(&scene).expect("record"));
        }
        let after_third = scene.serialize().expect("serialize");
        assert_eq!(history.past_len(), 4);

        assert!(history.undo(&mut scene).expect("undo"));
        assert_eq!(scene.len(), 2);
        assert!(history.redo(&mut scene).expect("redo"));
        assert_eq!(scene.serialize().expect("serialize"), after_third);
    }

    #[test]
    fn test_undo_exhaustion_is_noop() {
        let mut scene = Scene::new(Size::default());
        let mut history = History::new(&scene, 100).expect("history");
        scene.add_object(stroke(0.0)).expect("add");
        history.record(&scene).expect("record");

        assert!(history.undo(&mut scene).expect("undo"));
        assert!(scene.is_empty());
        for _ in 0..5 {
            assert!(!history.undo(&mut scene).expect("undo"));
        }
        assert_eq!(history.past_len(), 1);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_record_clears_future() {
        let mut scene = Scene::new(Size::default());
        let mut history = History::new(&scene, 100).expect("history");
        scene.add_object(stroke(0.0)).expect("add");
        history.record(&scene).expect("record");
        history.undo(&mut scene).expect("undo");
        assert!(history.can_redo());

        scene.add_object(stroke(50.0)).expect("add");
        history.record(&scene).expect("record");
        assert!(!history.can_redo());
        assert!(!history.redo(&mut scene).expect("redo"));
    }

    #[test]
    fn test_identical_record_skipped() {
        let scene = Scene::new(Size::default());
        let mut history = History::new(&scene, 100).expect("history");
        assert!(!history.record(&scene).expect("record"));
        assert_eq!(history.past_len(), 1);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut scene = Scene::new(Size::default());
        let mut history = History::new(&scene, 3).expect("history");
        for i in 0..5 {
            scene.add_object(stroke(f64::from(i) * 20.0)).expect("add");
            history.record(&scene).expect("record");
        }
        assert_eq!(history.past_len(), 3);
        while history.undo(&mut scene).expect("undo") {}
        assert_eq!(scene.len(), 3);
    }
}
