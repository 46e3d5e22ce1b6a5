// ============================================================================
// PROMPTABLE SEGMENTATION SERVICE
// ============================================================================
//
// The engine talks to point-promptable segmentation through one trait so the
// ONNX-backed production model and test doubles are interchangeable. The
// service is an explicit object constructed once and passed by handle; there
// is no hidden global instance.

mod onnx;

pub use onnx::{validate_model_path, ModelPaths, OnnxPromptModel};

use image::{GrayImage, RgbImage};

use crate::error::EngineError;

/// Whole-image embedding cached per session so repeated clicks skip the
/// expensive encoder pass.
#[derive(Debug, Clone)]
pub struct Embedding {
    pub data: Vec<f32>,
    pub shape: Vec<i64>,
    /// Source image dimensions (w, h) the embedding was computed from.
    pub original_size: (u32, u32),
}

/// One ranked mask proposal for a click.
#[derive(Debug, Clone)]
pub struct MaskCandidate {
    pub mask: GrayImage,
    pub score: f32,
    pub area: u64,
}

pub trait PromptSegmenter: Send + Sync {
    /// Whether the backing weights are present and loadable. Cheap; called
    /// on every segmentation.
    fn is_available(&self) -> bool;

    /// Encode the whole image once. Expensive; runs at upload time.
    fn embed(&self, image: &RgbImage) -> Result<Embedding, EngineError>;

    /// Point-prompted segmentation against a cached embedding. Returns
    /// candidates sorted by descending confidence.
    fn predict_point(
        &self,
        embedding: &Embedding,
        x: u32,
        y: u32,
    ) -> Result<Vec<MaskCandidate>, EngineError>;
}
