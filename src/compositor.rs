// ============================================================================
// COMPOSITOR — alpha-blend an edited region back into the base image
// ============================================================================
//
// out = (1 - a) * base + a * edited, with a = mask / 255 clamped to [0, 1].
// A feather radius r > 0 replaces a with its (2r+1)x(2r+1) box average,
// computed via a 2-D summed-area table so the cost is independent of r.
// Radius 0 keeps the hard edge of the raw mask.

use image::{GrayImage, RgbImage};
use rayon::prelude::*;

use crate::error::EngineError;

/// Box-average a weight field with clamped window edges. The continuous
/// [0, 1] weights exist only inside this step; masks stay binary elsewhere.
fn box_mean(alpha: &[f32], width: usize, height: usize, radius: usize) -> Vec<f32> {
    // Summed-area table with a zero top row / left column, f64 accumulators
    // so large images do not drift.
    let stride = width + 1;
    let mut sat = vec![0.0f64; stride * (height + 1)];
    for y in 0..height {
        let mut row_sum = 0.0f64;
        for x in 0..width {
            row_sum += alpha[y * width + x] as f64;
            sat[(y + 1) * stride + x + 1] = sat[y * stride + x + 1] + row_sum;
        }
    }

    let r = radius;
    let mut out = vec![0.0f32; alpha.len()];
    out.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let y0 = y.saturating_sub(r);
        let y1 = (y + r).min(height - 1);
        for (x, value) in row.iter_mut().enumerate() {
            let x0 = x.saturating_sub(r);
            let x1 = (x + r).min(width - 1);
            let sum = sat[(y1 + 1) * stride + x1 + 1] - sat[y0 * stride + x1 + 1]
                - sat[(y1 + 1) * stride + x0]
                + sat[y0 * stride + x0];
            let area = ((y1 - y0 + 1) * (x1 - x0 + 1)) as f64;
            *value = (sum / area).clamp(0.0, 1.0) as f32;
        }
    });
    out
}

/// Merge `edited` into `base` using `mask` as the alpha channel, optionally
/// softened by a box blur of radius `feather_radius`.
pub fn composite(
    base: &RgbImage,
    edited: &RgbImage,
    mask: &GrayImage,
    feather_radius: u32,
) -> Result<RgbImage, EngineError> {
    if base.dimensions() != edited.dimensions() {
        return Err(EngineError::shape(base.dimensions(), edited.dimensions()));
    }
    if mask.dimensions() != base.dimensions() {
        return Err(EngineError::shape(base.dimensions(), mask.dimensions()));
    }

    let (w, h) = base.dimensions();
    let (w, h) = (w as usize, h as usize);

    let mut alpha: Vec<f32> = mask.as_raw().iter().map(|&v| (v as f32 / 255.0).clamp(0.0, 1.0)).collect();
    if feather_radius > 0 {
        alpha = box_mean(&alpha, w, h, feather_radius as usize);
    }

    let base_raw = base.as_raw();
    let edited_raw = edited.as_raw();
    let stride = w * 3;
    let mut out = vec![0u8; base_raw.len()];

    out.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_base = &base_raw[y * stride..(y + 1) * stride];
        let row_edit = &edited_raw[y * stride..(y + 1) * stride];
        for x in 0..w {
            let a = alpha[y * w + x];
            let pi = x * 3;
            for c in 0..3 {
                let b = row_base[pi + c] as f32;
                let e = row_edit[pi + c] as f32;
                row_out[pi + c] = ((1.0 - a) * b + a * e).round().clamp(0.0, 255.0) as u8;
            }
        }
    });

    Ok(RgbImage::from_raw(w as u32, h as u32, out).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::FG;

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(w, h, image::Rgb(rgb))
    }

    fn half_mask(w: u32, h: u32) -> GrayImage {
        let mut m = GrayImage::new(w, h);
        for y in 0..h {
            for x in 0..w / 2 {
                m.put_pixel(x, y, image::Luma([FG]));
            }
        }
        m
    }

    #[test]
    fn identical_images_compose_to_themselves() {
        let img = solid(6, 4, [40, 90, 200]);
        for r in [0u32, 1, 3] {
            let out = composite(&img, &img, &half_mask(6, 4), r).unwrap();
            assert_eq!(out.as_raw(), img.as_raw(), "radius {}", r);
        }
    }

    #[test]
    fn hard_edge_equals_per_pixel_substitution() {
        let base = solid(6, 4, [0, 0, 0]);
        let edited = solid(6, 4, [255, 255, 255]);
        let mask = half_mask(6, 4);
        let out = composite(&base, &edited, &mask, 0).unwrap();
        for y in 0..4 {
            for x in 0..6 {
                let expected = if mask.get_pixel(x, y).0[0] > 0 { 255 } else { 0 };
                assert_eq!(out.get_pixel(x, y).0, [expected; 3]);
            }
        }
    }

    #[test]
    fn feathering_softens_the_seam() {
        let base = solid(8, 8, [0, 0, 0]);
        let edited = solid(8, 8, [255, 255, 255]);
        let out = composite(&base, &edited, &half_mask(8, 8), 2).unwrap();
        // A pixel right at the seam ends up strictly between the extremes.
        let seam = out.get_pixel(4, 4).0[0];
        assert!(seam > 0 && seam < 255, "seam value {}", seam);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let base = solid(4, 4, [0, 0, 0]);
        let edited = solid(5, 4, [0, 0, 0]);
        let err = composite(&base, &edited, &GrayImage::new(4, 4), 0).unwrap_err();
        assert!(matches!(err, EngineError::ShapeMismatch { .. }));

        let err = composite(&base, &base.clone(), &GrayImage::new(4, 3), 0).unwrap_err();
        assert!(matches!(err, EngineError::ShapeMismatch { .. }));
    }
}
