// ============================================================================
// ENGINE CONFIGURATION
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::layering::DEFAULT_BORDER_RATIO;
use crate::segment::SegmentOptions;

/// Environment variables overriding the model paths, so deployments can
/// point at their weights without a config file.
pub const ENV_ORT_LIB: &str = "FLATLAYER_ORT_LIB";
pub const ENV_ENCODER: &str = "FLATLAYER_ENCODER";
pub const ENV_DECODER: &str = "FLATLAYER_DECODER";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Border thickness fraction for the 2-layer split.
    pub border_ratio: f32,
    /// Grayscale threshold for white-background detection.
    pub white_threshold: u8,
    /// Concentric layers to produce at segmentation time.
    pub layer_count: usize,
    /// Idle seconds before a session is evicted; 0 keeps sessions forever.
    pub session_ttl_secs: u64,
    /// Threads in the dedicated model-inference pool.
    pub inference_threads: usize,
    /// ONNX Runtime shared library; absent means no promptable model.
    pub ort_library: Option<PathBuf>,
    pub encoder_model: Option<PathBuf>,
    pub decoder_model: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            border_ratio: DEFAULT_BORDER_RATIO,
            white_threshold: 245,
            layer_count: 2,
            session_ttl_secs: 30 * 60,
            inference_threads: 2,
            ort_library: None,
            encoder_model: None,
            decoder_model: None,
        }
    }
}

impl EngineConfig {
    /// Apply environment-variable overrides for the model paths.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var(ENV_ORT_LIB) {
            self.ort_library = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var(ENV_ENCODER) {
            self.encoder_model = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var(ENV_DECODER) {
            self.decoder_model = Some(PathBuf::from(v));
        }
        self
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn segment_options(&self) -> SegmentOptions {
        SegmentOptions {
            border_ratio: self.border_ratio,
            white_threshold: self.white_threshold,
            layer_count: self.layer_count,
            ..SegmentOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_knobs() {
        let c = EngineConfig::default();
        assert_eq!(c.border_ratio, 0.22);
        assert_eq!(c.white_threshold, 245);
        assert_eq!(c.layer_count, 2);
        assert_eq!(c.session_ttl(), Duration::from_secs(1800));
        assert!(c.ort_library.is_none());
    }

    #[test]
    fn partial_json_fills_the_rest_from_defaults() {
        let c: EngineConfig = serde_json::from_str(r#"{"layer_count": 4}"#).unwrap();
        assert_eq!(c.layer_count, 4);
        assert_eq!(c.white_threshold, 245);
    }
}
