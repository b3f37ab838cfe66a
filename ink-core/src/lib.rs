//! # Inkboard Core
//!
//! Headless engine for a freehand drawing canvas with handwriting
//! conversion.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   Canvas                    │
//! ├─────────────────────────────────────────────┤
//! │  Scene           │  Interaction             │
//! │  - Objects       │  - Mode machine          │
//! │  - Viewport      │  - Pointer capture       │
//! │  - Selection     │  - Text editing          │
//! ├─────────────────────────────────────────────┤
//! │  History         │  Conversion              │
//! │  - Snapshots     │  - Tickets               │
//! │  - Undo / redo   │  - Capability traits     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Rendering lives in `ink-renderer`, network collaborators in `ink-remote`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod canvas;
pub mod capture;
pub mod config;
pub mod convert;
pub mod element;
pub mod error;
pub mod event;
pub mod export;
pub mod geometry;
pub mod history;
pub mod media;
pub mod mode;
pub mod notify;
pub mod path;
pub mod persist;
pub mod scene;
pub mod schema;
pub mod text;

pub use canvas::{Canvas, CommitHook};
pub use capture::Brush;
pub use config::{CanvasConfig, TextConfig};
pub use convert::{
    ConversionKind, ConversionRequest, ConversionTicket, DocumentStore, InkSynthesizer,
    RecognizedText, StoredDocument, SynthesizedInk, TextRecognizer,
};
pub use element::{
    ConvertControl, ObjectId, ObjectKind, SceneObject, StrokeStyle, TextStyle, Transform,
};
pub use error::{CanvasError, CanvasResult, CapabilityError};
pub use event::{Axis, PointerEvent, PointerOutcome, PointerPhase};
pub use export::{ExportArtifact, ExportFormat, SceneEncoder};
pub use geometry::{Point, Rect, Size, Viewport, ZoomLimits};
pub use history::History;
pub use mode::{Cursor, Mode, ModeMachine, ModeProfile};
pub use notify::{CollectingNotifier, Level, Notification, Notifier, TracingNotifier};
pub use path::PathCommand;
pub use persist::SceneBlob;
pub use scene::Scene;
pub use schema::{SceneDocument, Snapshot, ViewportDocument};

/// Canvas core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
