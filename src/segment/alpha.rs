use image::{GrayImage, RgbImage};

use super::{SegMode, SegmentOptions, SegmentStrategy};
use crate::mask;

/// Foreground = opaque pixels, for images that carry a per-pixel opacity
/// channel.
pub struct AlphaChannelStrategy;

impl SegmentStrategy for AlphaChannelStrategy {
    fn kind(&self) -> SegMode {
        SegMode::AlphaChannel
    }

    fn attempt(
        &self,
        _image: &RgbImage,
        alpha: Option<&GrayImage>,
        _options: &SegmentOptions,
    ) -> Result<GrayImage, String> {
        let alpha = alpha.ok_or_else(|| "no alpha channel".to_string())?;
        let fg = mask::binarize(alpha);
        if mask::area(&fg) == 0 {
            return Err("alpha channel fully transparent".into());
        }
        Ok(fg)
    }
}
