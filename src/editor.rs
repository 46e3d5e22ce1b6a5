// ============================================================================
// LAYER EDITOR — parametric pixel operations confined to a mask
// ============================================================================
//
// Pixels outside the mask come back bit-identical; pixels inside are
// transformed in f32 and clipped to the valid byte range. The parameter set
// is a closed tagged enum: an unrecognized `mode` string is a hard
// `UnknownEditMode` error at parse time, never a silent no-op.

use image::{GrayImage, RgbImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// BT.601 luma weights, matching the grayscale used across segmentation.
const LUMA: [f32; 3] = [0.299, 0.587, 0.114];

/// Default blend factor for `recolor`: strong enough to read as the new
/// color, weak enough to keep the original texture.
pub const DEFAULT_RECOLOR_ALPHA: f32 = 0.65;

fn default_alpha() -> f32 {
    DEFAULT_RECOLOR_ALPHA
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EditParams {
    /// Blend every masked pixel toward `color` with blend factor `alpha`.
    Recolor {
        color: String,
        #[serde(default = "default_alpha")]
        alpha: f32,
    },
    /// Scale intensity by (1 + delta).
    Brightness { delta: f32 },
    /// Scale deviation from the masked-region mean by (1 + delta).
    Contrast { delta: f32 },
    /// Interpolate between the pixel and its luminance gray by delta
    /// (negative desaturates, positive oversaturates).
    Saturation { delta: f32 },
}

impl EditParams {
    /// Parse a JSON parameter object, mapping an unknown `mode` tag to
    /// `UnknownEditMode` and everything else malformed to
    /// `InvalidEditParams`.
    pub fn from_json(json: &str) -> Result<EditParams, EngineError> {
        let params: EditParams = serde_json::from_str(json).map_err(|e| {
            let msg = e.to_string();
            if msg.contains("unknown variant") {
                let mode = serde_json::from_str::<serde_json::Value>(json)
                    .ok()
                    .and_then(|v| v.get("mode").and_then(|m| m.as_str().map(str::to_owned)))
                    .unwrap_or_else(|| "<missing>".to_owned());
                EngineError::UnknownEditMode(mode)
            } else {
                EngineError::InvalidEditParams(msg)
            }
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Range-check values and parse the hex color eagerly so bad parameters
    /// fail before any pixel work starts.
    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            EditParams::Recolor { color, alpha } => {
                parse_hex(color)?;
                if !(0.0..=1.0).contains(alpha) {
                    return Err(EngineError::InvalidEditParams(format!(
                        "recolor alpha {} outside [0, 1]",
                        alpha
                    )));
                }
            }
            EditParams::Brightness { delta }
            | EditParams::Contrast { delta }
            | EditParams::Saturation { delta } => {
                if !(-1.0..=1.0).contains(delta) {
                    return Err(EngineError::InvalidEditParams(format!(
                        "delta {} outside [-1, 1]",
                        delta
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Parse "#RRGGBB" (leading '#' optional) into an RGB triple.
pub fn parse_hex(color: &str) -> Result<[u8; 3], EngineError> {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EngineError::InvalidEditParams(format!(
            "invalid hex color: {:?}",
            color
        )));
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap();
    Ok([channel(0), channel(2), channel(4)])
}

// ============================================================================
// Masked transform
// ============================================================================

/// Apply a per-pixel transform to masked pixels only, rows in parallel.
fn apply_masked<F>(image: &RgbImage, mask_raw: &[u8], transform: F) -> RgbImage
where
    F: Fn(f32, f32, f32) -> (f32, f32, f32) + Sync,
{
    let (w, h) = image.dimensions();
    let (w, h) = (w as usize, h as usize);
    let src = image.as_raw();
    let stride = w * 3;
    let mut dst = vec![0u8; src.len()];

    dst.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src[y * stride..(y + 1) * stride];
        for x in 0..w {
            let pi = x * 3;
            if mask_raw[y * w + x] == 0 {
                row_out[pi..pi + 3].copy_from_slice(&row_in[pi..pi + 3]);
                continue;
            }
            let (r, g, b) = transform(
                row_in[pi] as f32,
                row_in[pi + 1] as f32,
                row_in[pi + 2] as f32,
            );
            row_out[pi] = r.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 1] = g.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 2] = b.round().clamp(0.0, 255.0) as u8;
        }
    });

    RgbImage::from_raw(w as u32, h as u32, dst).unwrap()
}

/// Mean RGB over masked pixels. Empty masks fall back to mid-gray so
/// contrast on a degenerate mask is a no-op rather than a divide-by-zero.
fn masked_mean(image: &RgbImage, mask_raw: &[u8]) -> [f32; 3] {
    let w = image.width() as usize;
    let src = image.as_raw();
    let mut sum = [0.0f64; 3];
    let mut count = 0u64;
    for (i, &m) in mask_raw.iter().enumerate() {
        if m == 0 {
            continue;
        }
        let pi = (i / w) * w * 3 + (i % w) * 3;
        sum[0] += src[pi] as f64;
        sum[1] += src[pi + 1] as f64;
        sum[2] += src[pi + 2] as f64;
        count += 1;
    }
    if count == 0 {
        return [127.0, 127.0, 127.0];
    }
    [
        (sum[0] / count as f64) as f32,
        (sum[1] / count as f64) as f32,
        (sum[2] / count as f64) as f32,
    ]
}

/// Apply `params` to the pixels of `image` under `mask`, returning a new
/// image. The input is never mutated.
pub fn edit_layer(
    image: &RgbImage,
    mask: &GrayImage,
    params: &EditParams,
) -> Result<RgbImage, EngineError> {
    if mask.dimensions() != image.dimensions() {
        return Err(EngineError::InvalidInput(format!(
            "mask {}x{} does not match image {}x{}",
            mask.width(),
            mask.height(),
            image.width(),
            image.height()
        )));
    }
    params.validate()?;
    let mask_raw = mask.as_raw();

    let out = match params {
        EditParams::Recolor { color, alpha } => {
            let [tr, tg, tb] = parse_hex(color)?;
            let (tr, tg, tb) = (tr as f32, tg as f32, tb as f32);
            let a = *alpha;
            apply_masked(image, mask_raw, move |r, g, b| {
                (
                    (1.0 - a) * r + a * tr,
                    (1.0 - a) * g + a * tg,
                    (1.0 - a) * b + a * tb,
                )
            })
        }
        EditParams::Brightness { delta } => {
            let gain = 1.0 + delta;
            apply_masked(image, mask_raw, move |r, g, b| (r * gain, g * gain, b * gain))
        }
        EditParams::Contrast { delta } => {
            let gain = 1.0 + delta;
            let mean = masked_mean(image, mask_raw);
            apply_masked(image, mask_raw, move |r, g, b| {
                (
                    (r - mean[0]) * gain + mean[0],
                    (g - mean[1]) * gain + mean[1],
                    (b - mean[2]) * gain + mean[2],
                )
            })
        }
        EditParams::Saturation { delta } => {
            let d = *delta;
            apply_masked(image, mask_raw, move |r, g, b| {
                let gray = LUMA[0] * r + LUMA[1] * g + LUMA[2] * b;
                (
                    (1.0 + d) * r - d * gray,
                    (1.0 + d) * g - d * gray,
                    (1.0 + d) * b - d * gray,
                )
            })
        }
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::FG;

    fn checker() -> (RgbImage, GrayImage) {
        let mut img = RgbImage::new(4, 4);
        let mut m = GrayImage::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                img.put_pixel(x, y, image::Rgb([200, 100, 50]));
                if x < 2 {
                    m.put_pixel(x, y, image::Luma([FG]));
                }
            }
        }
        (img, m)
    }

    #[test]
    fn pixels_outside_mask_are_untouched() {
        let (img, m) = checker();
        let params = EditParams::Recolor { color: "#00ff00".into(), alpha: 1.0 };
        let out = edit_layer(&img, &m, &params).unwrap();
        for y in 0..4 {
            assert_eq!(out.get_pixel(3, y).0, [200, 100, 50]);
            assert_eq!(out.get_pixel(0, y).0, [0, 255, 0]);
        }
    }

    #[test]
    fn recolor_blends_with_default_alpha() {
        let (img, m) = checker();
        let params = EditParams::from_json(r##"{"mode": "recolor", "color": "#000000"}"##).unwrap();
        let out = edit_layer(&img, &m, &params).unwrap();
        // 0.35 * original toward black.
        assert_eq!(out.get_pixel(0, 0).0, [70, 35, 18]);
    }

    #[test]
    fn brightness_scales_masked_pixels() {
        let (img, m) = checker();
        let out = edit_layer(&img, &m, &EditParams::Brightness { delta: 0.5 }).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [255, 150, 75]);
    }

    #[test]
    fn contrast_is_noop_at_zero_delta() {
        let (img, m) = checker();
        let out = edit_layer(&img, &m, &EditParams::Contrast { delta: 0.0 }).unwrap();
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn full_desaturation_grays_masked_pixels() {
        let (img, m) = checker();
        let out = edit_layer(&img, &m, &EditParams::Saturation { delta: -1.0 }).unwrap();
        let p = out.get_pixel(0, 0).0;
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
        // Gray value is the BT.601 luma of the original.
        let expected = (0.299 * 200.0 + 0.587 * 100.0 + 0.114 * 50.0f32).round() as u8;
        assert_eq!(p[0], expected);
    }

    #[test]
    fn unknown_mode_is_a_hard_error() {
        let err = EditParams::from_json(r#"{"mode": "sharpen", "delta": 0.2}"#).unwrap_err();
        assert!(matches!(err, EngineError::UnknownEditMode(m) if m == "sharpen"));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = EditParams::Brightness { delta: 1.5 }.validate().unwrap_err();
        assert!(matches!(err, EngineError::InvalidEditParams(_)));

        let err = EditParams::Recolor { color: "#12345".into(), alpha: 0.5 }
            .validate()
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidEditParams(_)));
    }

    #[test]
    fn mismatched_mask_fails_validation() {
        let (img, _) = checker();
        let err = edit_layer(&img, &GrayImage::new(3, 4), &EditParams::Brightness { delta: 0.0 })
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
}
