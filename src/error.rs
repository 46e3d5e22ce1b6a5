//! Error taxonomy for the layering engine.
//!
//! Every failure a caller can act on gets its own variant with enough
//! structured detail (strategy, layer, coordinate) to decide what to do
//! next. Internal recovery happens in exactly two places: the segmentation
//! orchestrator falls through its strategy chain, and the region picker
//! falls back from the promptable model to priority-order picking.

use thiserror::Error;
use uuid::Uuid;

use crate::layers::LayerId;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed shape or type at an API boundary (empty image, mask whose
    /// dimensions disagree with the session, zero-sized buffer, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Every segmentation strategy was attempted and failed. Carries one
    /// "strategy: reason" entry per attempt, in chain order.
    #[error("segmentation failed: {}", .reasons.join("; "))]
    SegmentationFailure { reasons: Vec<String> },

    /// The promptable model could not be loaded or invoked. Triggers a
    /// fallback in the orchestrator and picker; only surfaces to the caller
    /// when no fallback succeeds either.
    #[error("promptable model unavailable: {0}")]
    ModelUnavailable(String),

    /// Click coordinate outside the session image.
    #[error("point ({x}, {y}) out of bounds for {width}x{height} image")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },

    /// The requested layer is not part of the session's layer set.
    #[error("unknown layer: {0}")]
    UnknownLayer(String),

    /// The layer exists but no mask is bound for it yet (e.g. the promptable
    /// active slot before any pick).
    #[error("no mask bound for layer {0}; pick a region first")]
    MissingMask(LayerId),

    /// Edit parameters named a mode this engine does not implement. This is
    /// a hard error rather than the no-op the behavior was ported from.
    #[error("unknown edit mode: {0}")]
    UnknownEditMode(String),

    /// Structurally valid edit parameters with out-of-range or unparseable
    /// values (bad hex color, delta outside [-1, 1], ...).
    #[error("invalid edit parameters: {0}")]
    InvalidEditParams(String),

    /// Compositing operands disagree in size.
    #[error("shape mismatch: expected {expected_w}x{expected_h}, got {actual_w}x{actual_h}")]
    ShapeMismatch {
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },

    #[error("session not found: {0}")]
    SessionNotFound(Uuid),
}

impl EngineError {
    /// Shorthand for the common dimension-check failure.
    pub fn shape(expected: (u32, u32), actual: (u32, u32)) -> Self {
        EngineError::ShapeMismatch {
            expected_w: expected.0,
            expected_h: expected.1,
            actual_w: actual.0,
            actual_h: actual.1,
        }
    }
}
