//! # Saorsa Sketch Core
//!
//! Core types for the draw-and-guess game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 sketch-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Canvas History      │  Guess Types         │
//! │  - Snapshots         │  - GuessRequest      │
//! │  - Undo / redo       │  - GuessResult       │
//! │  - Bounded capacity  │  - Feedback          │
//! ├─────────────────────────────────────────────┤
//! │  Service Mode (process-wide online/offline) │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Data flows one way: history → raster export → guess orchestrator → UI.
//! Nothing in the guess path mutates canvas state.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod feedback;
pub mod guess;
pub mod history;
pub mod mode;
pub mod snapshot;

pub use error::{SketchError, SketchResult};
pub use feedback::GuessFeedback;
pub use guess::{GuessRequest, GuessResult, MAX_SUGGESTIONS};
pub use history::{History, DEFAULT_HISTORY_CAPACITY};
pub use mode::{ServiceMode, SharedServiceMode};
pub use snapshot::{current_timestamp, Snapshot, BYTES_PER_PIXEL};

/// Sketch core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
