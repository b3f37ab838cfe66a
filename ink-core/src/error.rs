//! Error types for canvas operations.

use thiserror::Error;

use crate::ObjectId;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Object not found in scene.
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// An object with this id is already part of the scene.
    #[error("Duplicate object id: {0}")]
    DuplicateObject(ObjectId),

    /// Scene serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A snapshot or blob could not be applied to the scene.
    #[error("Invalid snapshot: {0}")]
    Snapshot(String),

    /// The blob was written by an incompatible format version.
    #[error("Unsupported scene format version {found} (expected at most {supported})")]
    UnsupportedVersion {
        /// Version found in the blob.
        found: u32,
        /// Highest version this build understands.
        supported: u32,
    },

    /// A conversion for this object is already in flight.
    #[error("Conversion already pending for object {0}")]
    ConversionPending(ObjectId),

    /// The object kind has no conversion path.
    #[error("Object {0} cannot be converted")]
    NotConvertible(ObjectId),

    /// The object exists but is the wrong kind for the operation.
    #[error("Object {id} is not a {expected}")]
    WrongKind {
        /// Object addressed.
        id: ObjectId,
        /// Kind the operation needs.
        expected: &'static str,
    },

    /// The object cannot be selected in the active mode.
    #[error("Object {0} is not selectable in the current mode")]
    NotSelectable(ObjectId),

    /// Synthesized path data could not be interpreted.
    #[error("Invalid path data: {0}")]
    InvalidPath(String),

    /// An inserted image could not be decoded.
    #[error("Image error: {0}")]
    Image(String),

    /// An image is still following the pointer waiting to be placed.
    #[error("An image placement is already pending")]
    PlacementPending,

    /// An external capability (OCR, synthesis, storage) failed.
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// Export encoding failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure reported by an external collaborator.
///
/// Transport crates map their own errors into this type so the engine never
/// depends on a particular network stack.
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    /// The collaborator could not be reached or timed out.
    #[error("{service} unavailable: {message}")]
    Unavailable {
        /// Service name, e.g. `"ocr"`.
        service: &'static str,
        /// Human readable detail.
        message: String,
    },

    /// The collaborator answered, but rejected the request or replied with garbage.
    #[error("{service} rejected request: {message}")]
    Rejected {
        /// Service name, e.g. `"synthesis"`.
        service: &'static str,
        /// Human readable detail.
        message: String,
    },
}

impl CapabilityError {
    /// Shorthand for [`CapabilityError::Unavailable`].
    pub fn unavailable(service: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            service,
            message: message.into(),
        }
    }

    /// Shorthand for [`CapabilityError::Rejected`].
    pub fn rejected(service: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            service,
            message: message.into(),
        }
    }

    /// Returns true if retrying the same call later might succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
