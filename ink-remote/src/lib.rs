//! # Inkboard Remote
//!
//! HTTP implementations of the capability traits the canvas engine depends
//! on: text recognition, handwriting synthesis and document storage.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use ink_remote::{HttpBackend, RemoteConfig};
//!
//! let backend = HttpBackend::new(&RemoteConfig::new("http://127.0.0.1:8000/api"))?;
//! let ink = backend.synthesize("hello").await?;
//! println!("{} paths", ink.paths.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;

pub use client::{HttpBackend, OCR_SERVICE, STORAGE_SERVICE, SYNTHESIS_SERVICE};
pub use config::RemoteConfig;
pub use error::{RemoteError, RemoteResult};
