//! Opaque scene blobs exchanged with storage.

use crate::schema::{SceneDocument, ViewportDocument};
use crate::{CanvasError, CanvasResult, Scene};

/// Serialized scene as handed to the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneBlob(Vec<u8>);

impl SceneBlob {
    /// Wrap bytes received from storage.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Take the bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the blob is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Serialize objects, canvas size and viewport.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn save(scene: &Scene) -> CanvasResult<SceneBlob> {
    let document =
        SceneDocument::from_scene(scene).with_viewport(ViewportDocument::from_scene(scene));
    Ok(SceneBlob(serde_json::to_vec(&document)?))
}

/// Decode and validate a blob.
///
/// # Errors
///
/// Returns an error if the blob is corrupt, from a newer format, or holds
/// duplicate ids.
pub fn load(blob: &SceneBlob) -> CanvasResult<SceneDocument> {
    let document: SceneDocument =
        serde_json::from_slice(&blob.0).map_err(|e| CanvasError::Snapshot(e.to_string()))?;
    document.validate()?;
    Ok(document)
}
