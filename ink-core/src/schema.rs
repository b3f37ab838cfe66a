//! Canonical serialized representation of a scene.
//!
//! [`SceneDocument`] is the one shape shared by history snapshots and
//! persisted blobs. Snapshots leave the viewport out; blobs may carry it.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geometry::{Size, Viewport};
use crate::{CanvasError, CanvasResult, Scene, SceneObject};

/// Current document format version.
pub const FORMAT_VERSION: u32 = 1;

/// Viewport information.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportDocument {
    /// Canvas width in pixels.
    pub width: f64,
    /// Canvas height in pixels.
    pub height: f64,
    /// Zoom level.
    #[serde(default = "ViewportDocument::default_zoom")]
    pub zoom: f64,
    /// Horizontal pan offset.
    #[serde(default)]
    pub pan_x: f64,
    /// Vertical pan offset.
    #[serde(default)]
    pub pan_y: f64,
}

impl ViewportDocument {
    const fn default_zoom() -> f64 {
        1.0
    }

    /// Capture the scene's canvas size and viewport.
    #[must_use]
    pub fn from_scene(scene: &Scene) -> Self {
        let size = scene.size();
        let vp = scene.viewport();
        Self {
            width: size.width,
            height: size.height,
            zoom: vp.zoom,
            pan_x: vp.pan_x,
            pan_y: vp.pan_y,
        }
    }

    /// Canvas size, clamped to sane values.
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Pan/zoom state.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        Viewport {
            zoom: self.zoom,
            pan_x: self.pan_x,
            pan_y: self.pan_y,
        }
    }
}

/// Serialized scene content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Format version of the writer.
    #[serde(default = "SceneDocument::default_version")]
    pub version: u32,
    /// Objects in paint order.
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    /// Viewport, present only in persisted blobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<ViewportDocument>,
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            objects: Vec::new(),
            viewport: None,
        }
    }
}

impl SceneDocument {
    const fn default_version() -> u32 {
        FORMAT_VERSION
    }

    /// Capture the object set of a scene.
    #[must_use]
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            version: FORMAT_VERSION,
            objects: scene.objects().cloned().collect(),
            viewport: None,
        }
    }

    /// Attach the scene's viewport.
    #[must_use]
    pub fn with_viewport(mut self, viewport: ViewportDocument) -> Self {
        self.viewport = Some(viewport);
        self
    }

    /// Validate and return the objects.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported versions or duplicate ids.
    pub fn into_objects(self) -> CanvasResult<Vec<SceneObject>> {
        self.validate()?;
        Ok(self.objects)
    }

    /// Check version and id uniqueness.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported versions or duplicate ids.
    pub fn validate(&self) -> CanvasResult<()> {
        if self.version > FORMAT_VERSION {
            return Err(CanvasError::UnsupportedVersion {
                found: self.version,
                supported: FORMAT_VERSION,
            });
        }
        let mut seen = HashSet::with_capacity(self.objects.len());
        for object in &self.objects {
            if !seen.insert(object.id) {
                return Err(CanvasError::Snapshot(format!(
                    "object {} appears twice",
                    object.id
                )));
            }
        }
        Ok(())
    }
}

/// Immutable serialized scene content used by history.
///
/// Equality is byte equality of the serialized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Arc<str>);

impl Snapshot {
    /// Serialize a document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn from_document(document: &SceneDocument) -> CanvasResult<Self> {
        Ok(Self(serde_json::to_string(document)?.into()))
    }

    /// Wrap already-serialized JSON without checking it.
    #[must_use]
    pub fn from_raw(json: &str) -> Self {
        Self(json.into())
    }

    /// Decode the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is corrupt.
    pub fn document(&self) -> CanvasResult<SceneDocument> {
        serde_json::from_str(&self.0).map_err(|e| CanvasError::Snapshot(e.to_string()))
    }

    /// The serialized JSON.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn test_future_version_rejected() {
        let doc = SceneDocument {
            version: FORMAT_VERSION + 1,
            ..SceneDocument::default()
        };
        assert!(matches!(
            doc.into_objects(),
            Err(CanvasError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let obj = SceneObject::image(String::new(), 1.0, 1.0, Point::default());
        let doc = SceneDocument {
            objects: vec![obj.clone(), obj],
            ..SceneDocument::default()
        };
        assert!(matches!(doc.validate(), Err(CanvasError::Snapshot(_))));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let doc: SceneDocument = serde_json::from_str("{}").expect("parse");
        assert_eq!(doc.version, FORMAT_VERSION);
        assert!(doc.objects.is_empty());
        assert!(doc.viewport.is_none());
    }
}
