//! Text and ink conversion.
//!
//! The engine never talks to a network itself. It hands out a
//! [`ConversionTicket`] describing what to ask the external services, the
//! host awaits [`ConversionTicket::run`] against its capabilities, and the
//! outcome is fed back through `Canvas::finish_conversion`. While a ticket is
//! out the scene stays fully interactive.

use std::collections::HashMap;
use std::ops::Range;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::element::StrokeStyle;
use crate::geometry::{Point, Rect};
use crate::path::{self, PathCommand};
use crate::persist::SceneBlob;
use crate::{CanvasError, CanvasResult, CapabilityError, ObjectId, SceneObject};

/// OCR capability.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognize text in an encoded image.
    async fn recognize_text(
        &self,
        image: &[u8],
        document_id: &str,
    ) -> Result<String, CapabilityError>;
}

/// Handwriting synthesis capability.
#[async_trait]
pub trait InkSynthesizer: Send + Sync {
    /// Produce handwriting paths for `text`.
    async fn synthesize_ink(&self, text: &str) -> Result<SynthesizedInk, CapabilityError>;
}

/// Persisted document as returned by storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredDocument {
    /// Scene blob, absent for a new document.
    pub scene: Option<SceneBlob>,
    /// Last OCR result cached alongside the scene.
    pub recognized_text: Option<String>,
}

/// Document storage capability.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a persisted document.
    async fn load_document(&self, document_id: &str) -> Result<StoredDocument, CapabilityError>;

    /// Persist a scene blob.
    async fn save_document(
        &self,
        document_id: &str,
        blob: &SceneBlob,
    ) -> Result<(), CapabilityError>;
}

/// Synthesis response: one or more command lists in the service's own
/// coordinate space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedInk {
    /// Path command lists.
    #[serde(default)]
    pub paths: Vec<Vec<PathCommand>>,
}

impl SynthesizedInk {
    /// Every drawable subpath, split at move-to boundaries.
    #[must_use]
    pub fn subpaths(&self) -> Vec<Vec<PathCommand>> {
        self.paths
            .iter()
            .flat_map(|p| path::split_subpaths(p))
            .collect()
    }

    /// Turn the ink into stroke objects whose combined bounds are centered
    /// on `center`.
    ///
    /// Each subpath becomes its own object positioned at its own centroid,
    /// keeping its offset from the combined centroid.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidPath`] if nothing drawable came back.
    pub fn into_objects(&self, center: Point, style: &StrokeStyle) -> CanvasResult<Vec<SceneObject>> {
        let subpaths = self.subpaths();
        let combined = subpaths
            .iter()
            .filter_map(|sub| path::bounds(sub))
            .reduce(|a, b| a.union(&b))
            .ok_or_else(|| CanvasError::InvalidPath("synthesis returned no strokes".to_string()))?;
        let origin = combined.center();
        let (dx, dy) = (center.x - origin.x, center.y - origin.y);
        Ok(subpaths
            .iter()
            .map(|sub| SceneObject::stroke(&path::translate(sub, dx, dy), style.clone()))
            .collect())
    }
}

/// Combined scene bounds of several objects.
#[must_use]
pub fn combined_bounds(objects: &[SceneObject]) -> Option<Rect> {
    objects
        .iter()
        .map(SceneObject::bounding_box)
        .reduce(|a, b| a.union(&b))
}

/// Which conversion is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    /// Text box to handwriting.
    TextToInk,
    /// Image to OCR text to handwriting.
    ImageToInk,
}

/// What to ask the external services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionRequest {
    /// Synthesize handwriting for this text.
    Synthesize {
        /// Text to write.
        text: String,
    },
    /// Recognize text in an image, then synthesize it.
    RecognizeThenSynthesize {
        /// Encoded image bytes.
        image: Vec<u8>,
        /// Document identifier for OCR.
        document_id: String,
    },
}

/// A started conversion awaiting its external result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTicket {
    /// Object being replaced.
    pub object: ObjectId,
    /// Direction.
    pub kind: ConversionKind,
    /// External calls to make.
    pub request: ConversionRequest,
}

impl ConversionTicket {
    /// Perform the external calls. Touches no scene state.
    ///
    /// # Errors
    ///
    /// Returns the first capability failure.
    pub async fn run(
        &self,
        recognizer: &dyn TextRecognizer,
        synthesizer: &dyn InkSynthesizer,
    ) -> Result<SynthesizedInk, CapabilityError> {
        match &self.request {
            ConversionRequest::Synthesize { text } => synthesizer.synthesize_ink(text).await,
            ConversionRequest::RecognizeThenSynthesize { image, document_id } => {
                let text = recognizer.recognize_text(image, document_id).await?;
                tracing::debug!(object = %self.object, chars = text.chars().count(), "image recognized");
                synthesizer.synthesize_ink(&text).await
            }
        }
    }
}

/// Bookkeeping for an in-flight conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingConversion {
    /// Direction.
    pub kind: ConversionKind,
}

/// At most one in-flight conversion per object.
#[derive(Debug, Clone, Default)]
pub struct PendingConversions {
    pending: HashMap<ObjectId, PendingConversion>,
}

impl PendingConversions {
    /// Register a conversion.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ConversionPending`] if one is already running
    /// for `object`.
    pub fn begin(&mut self, object: ObjectId, pending: PendingConversion) -> CanvasResult<()> {
        if self.pending.contains_key(&object) {
            return Err(CanvasError::ConversionPending(object));
        }
        self.pending.insert(object, pending);
        Ok(())
    }

    /// Remove and return the record for `object`.
    pub fn finish(&mut self, object: ObjectId) -> Option<PendingConversion> {
        self.pending.remove(&object)
    }

    /// Whether `object` has a conversion in flight.
    #[must_use]
    pub fn is_pending(&self, object: ObjectId) -> bool {
        self.pending.contains_key(&object)
    }

    /// Whether anything is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of conversions in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Latest OCR result for the document, searchable for a viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizedText {
    text: String,
}

impl RecognizedText {
    /// Wrap recognized text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The recognized text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Case-insensitive, non-overlapping matches of `term` as char ranges.
    #[must_use]
    pub fn find(&self, term: &str) -> Vec<Range<usize>> {
        let needle: Vec<char> = term.chars().collect();
        if needle.is_empty() {
            return Vec::new();
        }
        let hay: Vec<char> = self.text.chars().collect();
        let same = |a: char, b: char| a == b || a.to_lowercase().eq(b.to_lowercase());
        let mut matches = Vec::new();
        let mut i = 0;
        while i + needle.len() <= hay.len() {
            if hay[i..i + needle.len()]
                .iter()
                .zip(&needle)
                .all(|(a, b)| same(*a, *b))
            {
                matches.push(i..i + needle.len());
                i += needle.len();
            } else {
                i += 1;
            }
        }
        matches
    }
}
