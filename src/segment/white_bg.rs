use image::{GrayImage, RgbImage};

use super::{SegMode, SegmentOptions, SegmentStrategy};
use crate::mask::{self, FG};

/// White-background detection: background = near-white pixels, refined by
/// flood-filling from the image edges so internal white patterns inside the
/// subject are not misclassified as background.
pub struct WhiteBackgroundStrategy;

/// BT.601 grayscale of one pixel.
fn luma(px: &image::Rgb<u8>) -> f32 {
    0.299 * px.0[0] as f32 + 0.587 * px.0[1] as f32 + 0.114 * px.0[2] as f32
}

impl SegmentStrategy for WhiteBackgroundStrategy {
    fn kind(&self) -> SegMode {
        SegMode::WhiteBackground
    }

    fn attempt(
        &self,
        image: &RgbImage,
        _alpha: Option<&GrayImage>,
        options: &SegmentOptions,
    ) -> Result<GrayImage, String> {
        let (w, h) = image.dimensions();
        let threshold = options.white_threshold as f32;

        let mut bg_colored = GrayImage::new(w, h);
        let mut any_bg = false;
        for (x, y, px) in image.enumerate_pixels() {
            if luma(px) >= threshold {
                bg_colored.put_pixel(x, y, image::Luma([FG]));
                any_bg = true;
            }
        }
        if !any_bg {
            return Err(format!("no pixels at or above white threshold {}", options.white_threshold));
        }

        Ok(mask::foreground_from_edge_fill(&bg_colored))
    }
}
