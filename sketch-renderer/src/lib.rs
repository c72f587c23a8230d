//! # Saorsa Sketch Renderer
//!
//! Turns canvas snapshots into encoded images and owns the per-surface
//! undo/redo engine.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               CanvasEngine                  │
//! ├──────────────────────┬──────────────────────┤
//! │ History (core)       │ RasterExporter       │
//! │ commit / undo / redo │ PNG (lossless)       │
//! │ clear / current      │ JPEG (quality 0..1)  │
//! └──────────────────────┴──────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod decode;
pub mod engine;
pub mod error;
pub mod export;

pub use decode::{load_snapshot, parse_data_uri, DecodedDataUri, ImageFormat};
pub use engine::CanvasEngine;
pub use error::{RenderError, RenderResult};
pub use export::{to_data_uri, ExportConfig, RasterExporter, RasterFormat};
