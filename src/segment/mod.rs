// ============================================================================
// SEGMENTATION ORCHESTRATOR — ordered strategy chain with fallback
// ============================================================================
//
// Strategies are independent objects behind one trait, iterated in priority
// order until one produces a usable foreground mask. Adding or reordering a
// strategy is a data change, not a control-flow rewrite. Every candidate
// mask goes through the same cleanup (small close, largest 4-connected
// component, coverage sanity window) before distance-field layering.

mod alpha;
mod corner;
mod grabcut;
mod white_bg;

pub use alpha::AlphaChannelStrategy;
pub use corner::CornerColorStrategy;
pub use grabcut::GrabCutStrategy;
pub use white_bg::WhiteBackgroundStrategy;

use std::fmt;

use image::{GrayImage, RgbImage};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::layering::{self, BandSpec, LayeringReport, DEFAULT_BORDER_RATIO};
use crate::layers::LayerSet;
use crate::mask;
use crate::model::{Embedding, PromptSegmenter};

/// Foreground coverage sanity window: outside it a strategy's mask is
/// treated as a failure and the chain moves on.
pub const MIN_FG_RATIO: f64 = 0.01;
pub const MAX_FG_RATIO: f64 = 0.99;

/// Which mechanism produced the accepted segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegMode {
    Promptable,
    AlphaChannel,
    WhiteBackground,
    CornerColor,
    GrabCut,
}

impl fmt::Display for SegMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SegMode::Promptable => "promptable",
            SegMode::AlphaChannel => "alpha_channel",
            SegMode::WhiteBackground => "white_background",
            SegMode::CornerColor => "corner_color",
            SegMode::GrabCut => "grabcut",
        };
        f.write_str(s)
    }
}

/// Tunables for the strategy chain and the subsequent layering step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentOptions {
    /// Border thickness fraction for the 2-layer split.
    pub border_ratio: f32,
    /// Grayscale brightness at or above which a pixel counts as white
    /// background.
    pub white_threshold: u8,
    /// Number of concentric layers to produce (2 = border + field).
    pub layer_count: usize,
    /// Explicit distance ratios; overrides `layer_count` when set.
    pub layer_ratios: Option<Vec<f32>>,
    /// Iterations for the foreground-extraction fallback.
    pub grabcut_iterations: usize,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        SegmentOptions {
            border_ratio: DEFAULT_BORDER_RATIO,
            white_threshold: 245,
            layer_count: 2,
            layer_ratios: None,
            grabcut_iterations: 5,
        }
    }
}

impl SegmentOptions {
    fn band_spec(&self) -> BandSpec {
        match &self.layer_ratios {
            Some(ratios) => BandSpec::Ratios(ratios.clone()),
            None if self.layer_count <= 2 => BandSpec::two_layer(self.border_ratio),
            None => BandSpec::Count(self.layer_count),
        }
    }
}

/// One way of producing a raw foreground mask. Cleanup and validation are
/// the orchestrator's job, not the strategy's.
pub trait SegmentStrategy: Send + Sync {
    fn kind(&self) -> SegMode;
    fn attempt(
        &self,
        image: &RgbImage,
        alpha: Option<&GrayImage>,
        options: &SegmentOptions,
    ) -> Result<GrayImage, String>;
}

/// The default chain, most capable first.
pub fn default_chain() -> Vec<Box<dyn SegmentStrategy>> {
    vec![
        Box::new(AlphaChannelStrategy),
        Box::new(WhiteBackgroundStrategy),
        Box::new(CornerColorStrategy),
        Box::new(GrabCutStrategy),
    ]
}

/// Result of a successful segmentation.
#[derive(Debug)]
pub struct SegmentOutcome {
    pub layers: LayerSet,
    pub mode: SegMode,
    /// Present for layered (non-promptable) segmentations.
    pub report: Option<LayeringReport>,
    /// Present when the promptable model computed a reusable embedding.
    pub embedding: Option<Embedding>,
}

fn validate_input(image: &RgbImage, alpha: Option<&GrayImage>) -> Result<(), EngineError> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(EngineError::InvalidInput("empty image".into()));
    }
    if let Some(a) = alpha {
        if a.dimensions() != (w, h) {
            return Err(EngineError::InvalidInput(format!(
                "alpha channel {}x{} does not match image {}x{}",
                a.width(),
                a.height(),
                w,
                h
            )));
        }
    }
    Ok(())
}

/// Run the strategy chain and return the first cleaned, in-window foreground
/// mask along with the strategy that produced it. Failure reasons accumulate
/// into `reasons`.
fn first_usable_foreground(
    chain: &[Box<dyn SegmentStrategy>],
    image: &RgbImage,
    alpha: Option<&GrayImage>,
    options: &SegmentOptions,
    reasons: &mut Vec<String>,
) -> Option<(GrayImage, SegMode)> {
    for strategy in chain {
        let kind = strategy.kind();
        let raw = match strategy.attempt(image, alpha, options) {
            Ok(m) => m,
            Err(reason) => {
                info!("segment: {} failed: {}", kind, reason);
                reasons.push(format!("{}: {}", kind, reason));
                continue;
            }
        };

        let cleaned = mask::largest_component(&mask::close3(&raw));
        let fg_ratio = mask::coverage(&cleaned);
        if fg_ratio < MIN_FG_RATIO {
            let reason = format!("foreground too small ({:.1}%)", fg_ratio * 100.0);
            info!("segment: {} rejected: {}", kind, reason);
            reasons.push(format!("{}: {}", kind, reason));
            continue;
        }
        if fg_ratio > MAX_FG_RATIO {
            let reason = format!("foreground too large ({:.1}%), likely no background", fg_ratio * 100.0);
            info!("segment: {} rejected: {}", kind, reason);
            reasons.push(format!("{}: {}", kind, reason));
            continue;
        }

        info!("segment: {} accepted, foreground {:.1}%", kind, fg_ratio * 100.0);
        return Some((cleaned, kind));
    }
    None
}

/// Produce a valid layer set (and, when the promptable model is available, a
/// reusable embedding) from a decoded image.
pub fn segment(
    image: &RgbImage,
    alpha: Option<&GrayImage>,
    options: &SegmentOptions,
    model: Option<&dyn PromptSegmenter>,
) -> Result<SegmentOutcome, EngineError> {
    validate_input(image, alpha)?;
    let chain = default_chain();
    let mut reasons: Vec<String> = Vec::new();

    // Promptable path: cache the embedding now, defer mask generation to
    // click time. A coarse background mask is still needed so background
    // clicks can be rejected without invoking the model.
    if let Some(model) = model {
        if model.is_available() {
            match model.embed(image) {
                Ok(embedding) => {
                    let rug = match first_usable_foreground(&chain, image, alpha, options, &mut reasons)
                    {
                        Some((m, _)) => m,
                        None => {
                            // No coarse split: treat everything as foreground
                            // so no click is rejected as background.
                            warn!("segment: no coarse background for promptable mode");
                            let (w, h) = image.dimensions();
                            GrayImage::from_pixel(w, h, image::Luma([mask::FG]))
                        }
                    };
                    let bands = vec![rug.clone()];
                    return Ok(SegmentOutcome {
                        layers: LayerSet::new(rug, bands),
                        mode: SegMode::Promptable,
                        report: None,
                        embedding: Some(embedding),
                    });
                }
                Err(e) => {
                    warn!("segment: embedding failed, falling back to mask chain: {}", e);
                    reasons.push(format!("promptable: {}", e));
                }
            }
        } else {
            reasons.push("promptable: model weights not present".into());
        }
    }

    match first_usable_foreground(&chain, image, alpha, options, &mut reasons) {
        Some((rug, mode)) => {
            let (layers, report) = layering::split_layers(&rug, &options.band_spec());
            Ok(SegmentOutcome { layers, mode, report: Some(report), embedding: None })
        }
        None => Err(EngineError::SegmentationFailure { reasons }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerId;
    use crate::model::MaskCandidate;

    struct StubModel {
        available: bool,
        embed_fails: bool,
    }

    impl PromptSegmenter for StubModel {
        fn is_available(&self) -> bool {
            self.available
        }
        fn embed(&self, image: &RgbImage) -> Result<Embedding, EngineError> {
            if self.embed_fails {
                return Err(EngineError::ModelUnavailable("stub".into()));
            }
            Ok(Embedding { data: vec![0.0], shape: vec![1], original_size: image.dimensions() })
        }
        fn predict_point(
            &self,
            _embedding: &Embedding,
            _x: u32,
            _y: u32,
        ) -> Result<Vec<MaskCandidate>, EngineError> {
            Ok(Vec::new())
        }
    }

    /// 8x8 white image with a centered 4x4 black square.
    fn white_with_square() -> RgbImage {
        let mut img = RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255]));
        for y in 2..6 {
            for x in 2..6 {
                img.put_pixel(x, y, image::Rgb([0, 0, 0]));
            }
        }
        img
    }

    #[test]
    fn white_background_strategy_segments_the_square() {
        let options = SegmentOptions {
            white_threshold: 250,
            layer_ratios: Some(vec![0.5]),
            ..SegmentOptions::default()
        };
        let outcome = segment(&white_with_square(), None, &options, None).unwrap();
        assert_eq!(outcome.mode, SegMode::WhiteBackground);

        let report = outcome.report.unwrap();
        assert_eq!(report.fg_ratio, 0.25);
        assert_eq!(mask::area(outcome.layers.rug()), 16);
        assert_eq!(mask::area(outcome.layers.background()), 48);
        for y in 2..6 {
            for x in 2..6 {
                assert_eq!(outcome.layers.rug().get_pixel(x, y).0[0], 255);
            }
        }
    }

    #[test]
    fn alpha_channel_takes_priority_over_white_threshold() {
        // Alpha marks the left half opaque even though the image is gray.
        let img = RgbImage::from_pixel(8, 8, image::Rgb([128, 128, 128]));
        let mut alpha = GrayImage::new(8, 8);
        for y in 0..8 {
            for x in 0..4 {
                alpha.put_pixel(x, y, image::Luma([255]));
            }
        }
        let outcome = segment(&img, Some(&alpha), &SegmentOptions::default(), None).unwrap();
        assert_eq!(outcome.mode, SegMode::AlphaChannel);
        assert_eq!(mask::area(outcome.layers.rug()), 32);
    }

    #[test]
    fn all_white_image_exhausts_the_chain() {
        let img = RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255]));
        let err = segment(&img, None, &SegmentOptions::default(), None).unwrap_err();
        match err {
            EngineError::SegmentationFailure { reasons } => {
                assert!(!reasons.is_empty());
            }
            other => panic!("expected SegmentationFailure, got {:?}", other),
        }
    }

    #[test]
    fn corner_strategy_handles_light_gray_gradient_background() {
        // Light gray background (outside the white-threshold window) with a
        // mild horizontal gradient and a dark subject.
        let mut img = RgbImage::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                let bg = 225 + (x as i32 / 3) as u8; // 225..230
                img.put_pixel(x, y, image::Rgb([bg, bg, bg]));
            }
        }
        for y in 5..11 {
            for x in 5..11 {
                img.put_pixel(x, y, image::Rgb([60, 20, 20]));
            }
        }
        let outcome = segment(&img, None, &SegmentOptions::default(), None).unwrap();
        assert_eq!(outcome.mode, SegMode::CornerColor);
        assert_eq!(mask::area(outcome.layers.rug()), 36);
    }

    #[test]
    fn available_model_defers_masking_and_caches_the_embedding() {
        let model = StubModel { available: true, embed_fails: false };
        let outcome =
            segment(&white_with_square(), None, &SegmentOptions::default(), Some(&model)).unwrap();
        assert_eq!(outcome.mode, SegMode::Promptable);
        assert!(outcome.embedding.is_some());
        assert!(outcome.report.is_none());
        // The coarse background mask still exists for click rejection.
        assert_eq!(mask::area(outcome.layers.background()), 48);
    }

    #[test]
    fn failing_embed_falls_back_to_the_mask_chain() {
        let model = StubModel { available: true, embed_fails: true };
        let outcome =
            segment(&white_with_square(), None, &SegmentOptions::default(), Some(&model)).unwrap();
        assert_eq!(outcome.mode, SegMode::WhiteBackground);
        assert!(outcome.embedding.is_none());
    }

    #[test]
    fn unavailable_model_is_skipped_silently() {
        let model = StubModel { available: false, embed_fails: false };
        let outcome =
            segment(&white_with_square(), None, &SegmentOptions::default(), Some(&model)).unwrap();
        assert_eq!(outcome.mode, SegMode::WhiteBackground);
    }

    #[test]
    fn layer_count_four_produces_indexed_bands() {
        let mut img = RgbImage::from_pixel(32, 32, image::Rgb([255, 255, 255]));
        for y in 4..28 {
            for x in 4..28 {
                img.put_pixel(x, y, image::Rgb([10, 10, 10]));
            }
        }
        let options = SegmentOptions { layer_count: 4, ..SegmentOptions::default() };
        let outcome = segment(&img, None, &options, None).unwrap();
        assert_eq!(outcome.layers.band_count(), 4);
        assert!(outcome.layers.knows(&LayerId::Indexed(3)));
        assert!(!outcome.layers.knows(&LayerId::Indexed(4)));
        // Bands plus background still partition the image.
        let band_total: u64 =
            (0..4).map(|i| mask::area(outcome.layers.band(i).unwrap())).sum();
        assert_eq!(band_total + mask::area(outcome.layers.background()), 32 * 32);
    }
}
