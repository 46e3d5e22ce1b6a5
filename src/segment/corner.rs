use image::{GrayImage, RgbImage};

use super::{SegMode, SegmentOptions, SegmentStrategy};
use crate::mask::FG;

/// Maximum Euclidean RGB distance from the corner-estimated background
/// color for a bright pixel to still count as background.
const BG_COLOR_TOLERANCE: f32 = 26.0;
/// Minimum mean brightness for the tolerance rule to apply.
const BG_MIN_BRIGHTNESS: f32 = 200.0;
/// Mean brightness at which a pixel is background unconditionally.
const NEAR_WHITE: f32 = 248.0;

/// Rule-based fallback: estimate the background color from small patches at
/// the four image corners and classify by distance to that estimate plus a
/// brightness gate. Tolerates light gray or gently graded backgrounds that
/// a hard white threshold misses.
pub struct CornerColorStrategy;

fn median(mut values: Vec<u8>) -> f32 {
    values.sort_unstable();
    values[values.len() / 2] as f32
}

/// Per-channel median over the four corner patches.
fn estimate_background(image: &RgbImage) -> [f32; 3] {
    let (w, h) = image.dimensions();
    let p = ((w.min(h) as f32 * 0.06).round() as u32).max(4).min(w).min(h);

    let mut channels: [Vec<u8>; 3] = Default::default();
    let corners = [(0, 0), (w - p, 0), (0, h - p), (w - p, h - p)];
    for (cx, cy) in corners {
        for y in cy..cy + p {
            for x in cx..cx + p {
                let px = image.get_pixel(x, y);
                for c in 0..3 {
                    channels[c].push(px.0[c]);
                }
            }
        }
    }
    [median(std::mem::take(&mut channels[0])), median(std::mem::take(&mut channels[1])), median(std::mem::take(&mut channels[2]))]
}

impl SegmentStrategy for CornerColorStrategy {
    fn kind(&self) -> SegMode {
        SegMode::CornerColor
    }

    fn attempt(
        &self,
        image: &RgbImage,
        _alpha: Option<&GrayImage>,
        _options: &SegmentOptions,
    ) -> Result<GrayImage, String> {
        let (w, h) = image.dimensions();
        if w < 8 || h < 8 {
            return Err("image too small for corner sampling".into());
        }
        let bg = estimate_background(image);
        let tol_sq = BG_COLOR_TOLERANCE * BG_COLOR_TOLERANCE;

        let mut fg = GrayImage::new(w, h);
        for (x, y, px) in image.enumerate_pixels() {
            let [r, g, b] = [px.0[0] as f32, px.0[1] as f32, px.0[2] as f32];
            let brightness = (r + g + b) / 3.0;
            let dr = r - bg[0];
            let dg = g - bg[1];
            let db = b - bg[2];
            let dist_sq = dr * dr + dg * dg + db * db;

            let is_bg = (dist_sq <= tol_sq && brightness >= BG_MIN_BRIGHTNESS)
                || brightness >= NEAR_WHITE;
            if !is_bg {
                fg.put_pixel(x, y, image::Luma([FG]));
            }
        }
        Ok(fg)
    }
}
