// ============================================================================
// ENGINE FACADE — the crate's boundary API over decoded pixel buffers
// ============================================================================
//
// Wires the session store, the segmentation chain and the optional
// promptable model together. Model inference runs on a small dedicated
// thread pool so a batch of expensive clicks cannot starve callers doing
// cheap pixel work.

use std::sync::Arc;

use image::{GrayImage, RgbImage};
use log::info;
use uuid::Uuid;

use crate::compositor;
use crate::config::EngineConfig;
use crate::editor::{self, EditParams};
use crate::error::EngineError;
use crate::layers::LayerId;
use crate::model::{ModelPaths, OnnxPromptModel, PromptSegmenter};
use crate::picker::{self, PickResult};
use crate::segment::{self, SegmentOutcome};
use crate::session::{EditSession, SessionMeta, SessionStore};

pub struct Engine {
    config: EngineConfig,
    store: SessionStore,
    model: Option<Arc<dyn PromptSegmenter>>,
    inference_pool: rayon::ThreadPool,
}

impl Engine {
    /// Build an engine from config. The promptable model service is
    /// constructed here (and only here) when all three model paths are set;
    /// weights load lazily on first use.
    pub fn new(config: EngineConfig) -> Result<Engine, EngineError> {
        let model: Option<Arc<dyn PromptSegmenter>> = match (
            &config.ort_library,
            &config.encoder_model,
            &config.decoder_model,
        ) {
            (Some(runtime), Some(encoder), Some(decoder)) => {
                Some(Arc::new(OnnxPromptModel::new(ModelPaths {
                    runtime: runtime.clone(),
                    encoder: encoder.clone(),
                    decoder: decoder.clone(),
                })))
            }
            _ => None,
        };
        Self::with_model(config, model)
    }

    /// Build with an explicit model service (or none). Tests inject doubles
    /// through this constructor.
    pub fn with_model(
        config: EngineConfig,
        model: Option<Arc<dyn PromptSegmenter>>,
    ) -> Result<Engine, EngineError> {
        let inference_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.inference_threads.max(1))
            .thread_name(|i| format!("flatlayer-infer-{}", i))
            .build()
            .map_err(|e| EngineError::InvalidInput(format!("inference pool: {}", e)))?;
        let store = SessionStore::new(config.session_ttl());
        Ok(Engine { config, store, model, inference_pool })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session_count(&self) -> usize {
        self.store.len()
    }

    fn model_ref(&self) -> Option<&dyn PromptSegmenter> {
        self.model.as_deref()
    }

    // ------------------------------------------------------------------
    // Boundary operations
    // ------------------------------------------------------------------

    /// Segment an image without creating a session, using the configured
    /// defaults as strategy hints.
    pub fn segment(
        &self,
        image: &RgbImage,
        alpha: Option<&GrayImage>,
    ) -> Result<SegmentOutcome, EngineError> {
        self.segment_with(image, alpha, &self.config.segment_options())
    }

    /// Segment with explicit per-call strategy hints.
    pub fn segment_with(
        &self,
        image: &RgbImage,
        alpha: Option<&GrayImage>,
        options: &crate::segment::SegmentOptions,
    ) -> Result<SegmentOutcome, EngineError> {
        self.inference_pool
            .install(|| segment::segment(image, alpha, options, self.model_ref()))
    }

    /// Segment an image and store the result as a new editing session.
    pub fn create_session(
        &self,
        image: RgbImage,
        alpha: Option<&GrayImage>,
    ) -> Result<(Uuid, SessionMeta), EngineError> {
        let outcome = self.segment(&image, alpha)?;
        let session =
            EditSession::new(image, outcome.layers, outcome.mode, outcome.report, outcome.embedding);
        let meta = session.meta.clone();
        let id = self.store.insert(session);
        Ok((id, meta))
    }

    /// Resolve a click to a layer selection.
    pub fn pick(&self, session_id: Uuid, x: u32, y: u32) -> Result<PickResult, EngineError> {
        let model = self.model.clone();
        self.store.with(session_id, |session| {
            self.inference_pool.install(|| picker::pick(session, model.as_deref(), x, y))
        })
    }

    /// Re-bind one of the ranked candidates kept from the last pick.
    pub fn switch_candidate(
        &self,
        session_id: Uuid,
        index: usize,
    ) -> Result<PickResult, EngineError> {
        self.store.with(session_id, |session| picker::switch_candidate(session, index))
    }

    /// Edit the named layer of a session: transform pixels under its mask,
    /// composite the result over the current image (optionally feathered),
    /// and replace the session image. Returns the new image and the mask
    /// that was edited under.
    pub fn apply_edit(
        &self,
        session_id: Uuid,
        layer: &LayerId,
        params: &EditParams,
        feather_radius: u32,
    ) -> Result<(RgbImage, GrayImage), EngineError> {
        params.validate()?;
        self.store.with(session_id, |session| {
            if !session.layers.knows(layer) {
                return Err(EngineError::UnknownLayer(layer.to_string()));
            }
            let mask = session
                .layers
                .mask(layer)
                .ok_or_else(|| EngineError::MissingMask(layer.clone()))?
                .clone();

            let edited = editor::edit_layer(&session.image, &mask, params)?;
            let result = compositor::composite(&session.image, &edited, &mask, feather_radius)?;
            info!(
                "apply_edit: session={}, layer={}, feather={}",
                session_id, layer, feather_radius
            );
            session.image = result.clone();
            Ok((result, mask))
        })
    }

    /// Current image of a session.
    pub fn session_image(&self, session_id: Uuid) -> Result<RgbImage, EngineError> {
        self.store.with(session_id, |session| Ok(session.image.clone()))
    }

    pub fn delete_session(&self, session_id: Uuid) -> bool {
        self.store.delete(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).unwrap()
    }

    /// 8x8 white image with a centered 4x4 dark square.
    fn sample_image() -> RgbImage {
        let mut img = RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255]));
        for y in 2..6 {
            for x in 2..6 {
                img.put_pixel(x, y, image::Rgb([40, 40, 40]));
            }
        }
        img
    }

    #[test]
    fn upload_pick_edit_roundtrip() {
        let e = engine();
        let (id, meta) = e.create_session(sample_image(), None).unwrap();
        assert_eq!((meta.width, meta.height), (8, 8));

        let picked = e.pick(id, 3, 3).unwrap();
        let layer = picked.layer.unwrap();

        let params = EditParams::Recolor { color: "#ff0000".into(), alpha: 1.0 };
        let (result, mask_used) = e.apply_edit(id, &layer, &params, 0).unwrap();
        assert!(mask::area(&mask_used) > 0);
        // The clicked pixel took the new color; the background did not.
        assert_eq!(result.get_pixel(3, 3).0, [255, 0, 0]);
        assert_eq!(result.get_pixel(0, 0).0, [255, 255, 255]);

        // The session image advanced to the edited result.
        let current = e.session_image(id).unwrap();
        assert_eq!(current.as_raw(), result.as_raw());

        assert!(e.delete_session(id));
        assert!(matches!(
            e.session_image(id).unwrap_err(),
            EngineError::SessionNotFound(_)
        ));
    }

    #[test]
    fn editing_an_unknown_layer_fails() {
        let e = engine();
        let (id, _) = e.create_session(sample_image(), None).unwrap();
        let params = EditParams::Brightness { delta: 0.1 };
        // The 2-layer session has no indexed layer 7.
        let err = e.apply_edit(id, &LayerId::Indexed(7), &params, 0).unwrap_err();
        assert!(matches!(err, EngineError::UnknownLayer(_)));
    }

    #[test]
    fn editing_the_active_slot_before_a_pick_reports_missing_mask() {
        let e = engine();
        let (id, _) = e.create_session(sample_image(), None).unwrap();
        let params = EditParams::Brightness { delta: 0.1 };
        let err = e.apply_edit(id, &LayerId::Active, &params, 0).unwrap_err();
        assert!(matches!(err, EngineError::MissingMask(LayerId::Active)));
    }

    #[test]
    fn consecutive_edits_accumulate() {
        let e = engine();
        let (id, _) = e.create_session(sample_image(), None).unwrap();
        let darken = EditParams::Brightness { delta: -0.5 };
        e.apply_edit(id, &LayerId::Rug, &darken, 0).unwrap();
        let (result, _) = e.apply_edit(id, &LayerId::Rug, &darken, 0).unwrap();
        // 40 -> 20 -> 10.
        assert_eq!(result.get_pixel(3, 3).0, [10, 10, 10]);
    }
}
