//! Scene graph: the ordered set of drawable objects.
//!
//! Order is z-order: later objects paint on top and win hit tests.

use std::collections::HashSet;

use tracing::error;

use crate::geometry::{Point, Rect, Size, Viewport};
use crate::schema::{SceneDocument, Snapshot};
use crate::{CanvasError, CanvasResult, ObjectId, SceneObject};

/// A scene containing all canvas objects plus the viewport.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Objects in paint order.
    objects: Vec<SceneObject>,
    /// Currently selected object IDs.
    selected: Vec<ObjectId>,
    /// Canvas pixel dimensions.
    size: Size,
    /// Current pan/zoom.
    viewport: Viewport,
}

impl Scene {
    /// Create a new empty scene with the given canvas size.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Append an object on top of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::DuplicateObject`] if the id is already present.
    pub fn add_object(&mut self, object: SceneObject) -> CanvasResult<ObjectId> {
        let id = object.id;
        if self.contains(id) {
            error!(%id, "refusing to add object with duplicate id");
            return Err(CanvasError::DuplicateObject(id));
        }
        self.objects.push(object);
        Ok(id)
    }

    /// Append several objects as one mutation; nothing is added on error.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::DuplicateObject`] if any id clashes with the
    /// scene or with another object in the batch.
    pub fn add_objects(&mut self, objects: Vec<SceneObject>) -> CanvasResult<Vec<ObjectId>> {
        let mut seen: HashSet<ObjectId> = self.objects.iter().map(|o| o.id).collect();
        for object in &objects {
            if !seen.insert(object.id) {
                error!(id = %object.id, "refusing batch with duplicate id");
                return Err(CanvasError::DuplicateObject(object.id));
            }
        }
        let ids = objects.iter().map(|o| o.id).collect();
        self.objects.extend(objects);
        Ok(ids)
    }

    /// Remove an object; absent ids are ignored.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<SceneObject> {
        self.selected.retain(|s| *s != id);
        let index = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(index))
    }

    /// Get an object by ID.
    #[must_use]
    pub fn get_object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Get a mutable reference to an object by ID.
    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Whether an object with this id exists.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.iter().any(|o| o.id == id)
    }

    /// Objects in paint order.
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    /// Mutable objects in paint order.
    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.objects.iter_mut()
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the scene is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Set `selectable` on every object.
    pub fn set_selectable_all(&mut self, flag: bool) {
        for object in &mut self.objects {
            object.selectable = flag;
        }
        if !flag {
            self.selected.clear();
        }
    }

    /// Set `evented` on every object.
    pub fn set_evented_all(&mut self, flag: bool) {
        for object in &mut self.objects {
            object.evented = flag;
        }
    }

    /// Topmost evented object under a scene point.
    #[must_use]
    pub fn object_at(&self, p: Point) -> Option<ObjectId> {
        self.objects
            .iter()
            .rev()
            .find(|o| o.evented && o.contains_point(p))
            .map(|o| o.id)
    }

    /// Selectable objects whose bounds intersect `rect`, in paint order.
    #[must_use]
    pub fn objects_in(&self, rect: &Rect) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|o| o.selectable && o.bounding_box().intersects(rect))
            .map(|o| o.id)
            .collect()
    }

    /// Union of every object's bounds.
    #[must_use]
    pub fn content_bounds(&self) -> Option<Rect> {
        self.objects
            .iter()
            .map(SceneObject::bounding_box)
            .reduce(|a, b| a.union(&b))
    }

    /// Area panning is clamped to: the canvas at zoom 1 plus any content beyond it.
    #[must_use]
    pub fn pan_bounds(&self) -> Rect {
        let canvas = Rect::new(0.0, 0.0, self.size.width, self.size.height);
        self.content_bounds()
            .map_or(canvas, |content| canvas.union(&content))
    }

    /// Add an object to the selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not found.
    pub fn select(&mut self, id: ObjectId) -> CanvasResult<()> {
        if !self.contains(id) {
            return Err(CanvasError::ObjectNotFound(id));
        }
        if !self.selected.contains(&id) {
            self.selected.push(id);
        }
        Ok(())
    }

    /// Deselect all objects.
    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    /// Currently selected ids.
    #[must_use]
    pub fn selected(&self) -> &[ObjectId] {
        &self.selected
    }

    /// Canvas pixel dimensions.
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Resize the canvas; degenerate sizes are clamped.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.size = Size::new(width, height);
    }

    /// Current viewport.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Replace the viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Serialize the object set (not the viewport) for history.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> CanvasResult<Snapshot> {
        Snapshot::from_document(&SceneDocument::from_scene(self))
    }

    /// Replace the entire object set from a snapshot.
    ///
    /// The scene is left untouched if the snapshot cannot be decoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is corrupt or incompatible.
    pub fn deserialize(&mut self, snapshot: &Snapshot) -> CanvasResult<()> {
        let document = snapshot.document()?;
        self.replace_objects(document.into_objects()?);
        Ok(())
    }

    /// Swap in a validated object list, clearing the selection.
    pub(crate) fn replace_objects(&mut self, objects: Vec<SceneObject>) {
        self.objects = objects;
        self.selected.clear();
    }
}
