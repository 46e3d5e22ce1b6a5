// ============================================================================
// REGION PICKER — resolve a click point to the most specific mask
// ============================================================================
//
// Legacy mode walks the precomputed layers most-specific-first and returns
// the first mask that covers the click. Promptable mode short-circuits on
// background clicks, then asks the model for ranked candidates, filters out
// noise-sized ones, and binds the best as the session's active mask; the
// rest stay in the session so the caller can switch granularity without a
// new model invocation. A failing model falls back to legacy picking.

use image::GrayImage;
use log::{info, warn};

use crate::error::EngineError;
use crate::layers::LayerId;
use crate::mask;
use crate::model::PromptSegmenter;
use crate::session::EditSession;

/// Candidates smaller than this fraction of the image are treated as noise
/// clicks and discarded.
pub const MIN_CANDIDATE_AREA_RATIO: f64 = 0.003;

/// A resolved click: the layer it selected (`None` for background / empty
/// clicks) and the mask to edit under.
#[derive(Debug, Clone)]
pub struct PickResult {
    pub layer: Option<LayerId>,
    pub mask: GrayImage,
}

impl PickResult {
    fn none(width: u32, height: u32) -> PickResult {
        PickResult { layer: None, mask: mask::empty(width, height) }
    }
}

fn at(m: &GrayImage, x: u32, y: u32) -> bool {
    m.get_pixel(x, y).0[0] > 0
}

/// Priority-order picking over the precomputed layer set.
pub fn pick_legacy(session: &EditSession, x: u32, y: u32) -> PickResult {
    let (w, h) = session.layers.dimensions();
    for id in session.layers.pick_order() {
        let Some(m) = session.layers.mask(&id) else { continue };
        if !at(m, x, y) {
            continue;
        }
        if id == LayerId::Background {
            // Explicit background click selects nothing.
            return PickResult::none(w, h);
        }
        return PickResult { layer: Some(id), mask: m.clone() };
    }
    PickResult::none(w, h)
}

/// Resolve a click for the session, using the promptable model when an
/// embedding is cached and falling back to legacy picking otherwise.
pub fn pick(
    session: &mut EditSession,
    model: Option<&dyn PromptSegmenter>,
    x: u32,
    y: u32,
) -> Result<PickResult, EngineError> {
    let (w, h) = session.layers.dimensions();
    if x >= w || y >= h {
        return Err(EngineError::OutOfBounds { x, y, width: w, height: h });
    }

    if let (Some(model), Some(embedding)) = (model, session.embedding.as_ref()) {
        // Background check first: never spend an inference on a click the
        // coarse mask already rules out.
        if at(session.layers.background(), x, y) {
            info!("pick: ({}, {}) on background, returning none", x, y);
            session.candidates = None;
            return Ok(PickResult::none(w, h));
        }

        match model.predict_point(embedding, x, y) {
            Ok(candidates) => {
                let min_area = (w as f64 * h as f64 * MIN_CANDIDATE_AREA_RATIO) as u64;
                let kept: Vec<_> =
                    candidates.into_iter().filter(|c| c.area >= min_area).collect();
                let Some(best) = kept.first() else {
                    info!("pick: all candidates below {} px, treating as noise click", min_area);
                    session.candidates = None;
                    return Ok(PickResult::none(w, h));
                };
                info!(
                    "pick: model selected region, score={:.3}, area={} ({} candidates kept)",
                    best.score,
                    best.area,
                    kept.len()
                );
                let mask = best.mask.clone();
                session.layers.set_active(mask.clone());
                session.candidates = Some(kept);
                return Ok(PickResult { layer: Some(LayerId::Active), mask });
            }
            Err(e) => {
                warn!("pick: model failed, falling back to legacy picking: {}", e);
            }
        }
    }

    Ok(pick_legacy(session, x, y))
}

/// Re-bind one of the retained candidates from the last promptable pick.
pub fn switch_candidate(session: &mut EditSession, index: usize) -> Result<PickResult, EngineError> {
    let candidate = session
        .candidates
        .as_ref()
        .and_then(|c| c.get(index))
        .ok_or_else(|| {
            EngineError::InvalidInput(format!("no pick candidate at index {}", index))
        })?;
    let mask = candidate.mask.clone();
    session.layers.set_active(mask.clone());
    Ok(PickResult { layer: Some(LayerId::Active), mask })
}
