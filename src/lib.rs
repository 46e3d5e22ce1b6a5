//! flatlayer — session-based layering and region-editing engine for
//! flat-design raster images.
//!
//! The pipeline: an uploaded image is partitioned into concentric layers by
//! the segmentation strategy chain (promptable model, alpha channel, white
//! background, corner color, iterative extraction), a click resolves to the
//! most specific mask at that point, a parametric edit transforms pixels
//! under that mask only, and the compositor merges the result back with an
//! optional feathered seam. All state lives in in-memory sessions with TTL
//! eviction.
//!
//! The crate boundary accepts and returns decoded pixel buffers
//! ([`image::RgbImage`] / [`image::GrayImage`]) and plain data structures;
//! file decoding and encoding belong to the caller (the bundled CLI does
//! exactly that).

pub mod cli;
pub mod compositor;
pub mod config;
pub mod editor;
pub mod engine;
pub mod error;
pub mod layering;
pub mod layers;
pub mod mask;
pub mod model;
pub mod naming;
pub mod palette;
pub mod picker;
pub mod segment;
pub mod session;

// --- High-level re-exports -------------------------------------------------

pub use crate::config::EngineConfig;
pub use crate::editor::EditParams;
pub use crate::engine::Engine;
pub use crate::error::EngineError;
pub use crate::layers::{LayerId, LayerSet};
pub use crate::palette::ColorEntry;
pub use crate::picker::PickResult;
pub use crate::segment::{SegMode, SegmentOptions, SegmentOutcome};
pub use crate::session::EditSession;
