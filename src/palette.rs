// ============================================================================
// COLOR PALETTE — K-means extraction, tolerance-based remapping, variants
// ============================================================================

use image::{GrayImage, RgbImage};
use kmeans_colors::get_kmeans;
use log::debug;
// `::palette` disambiguates the color crate from this module.
use ::palette::{FromColor, Hsv, IntoColor, Srgb};
use serde::Serialize;

use crate::error::EngineError;

/// Fixed seed so repeated extractions of the same image agree.
const KMEANS_SEED: u64 = 42;
const KMEANS_MAX_ITER: usize = 20;
const KMEANS_CONVERGE: f32 = 1.0e-4;
/// Independent restarts; the best-scoring run wins. Random centroid
/// initialization can strand a cluster on small palettes, so a handful of
/// seeds keeps extraction stable.
const KMEANS_RUNS: u64 = 5;

/// One dominant color: centroid RGB, derived hex code, and its share of the
/// sampled pixels.
#[derive(Debug, Clone, Serialize)]
pub struct ColorEntry {
    pub rgb: [u8; 3],
    pub hex: String,
    pub ratio: f64,
}

impl ColorEntry {
    fn new(rgb: [u8; 3], ratio: f64) -> ColorEntry {
        let hex = format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2]);
        ColorEntry { rgb, hex, ratio }
    }
}

/// A hue-shifted recoloring of an image together with its shifted palette.
#[derive(Debug, Clone)]
pub struct PaletteVariant {
    pub hue_shift: f32,
    pub colors: Vec<[u8; 3]>,
    pub image: RgbImage,
}

// ============================================================================
// Extraction
// ============================================================================

/// Dominant colors via K-means over the (optionally masked) pixels, sorted
/// by descending occupancy. Cluster count is capped at the sample size; an
/// empty sample yields an empty palette.
pub fn extract_palette(
    image: &RgbImage,
    n_colors: usize,
    mask: Option<&GrayImage>,
) -> Result<Vec<ColorEntry>, EngineError> {
    if let Some(m) = mask {
        if m.dimensions() != image.dimensions() {
            return Err(EngineError::InvalidInput(format!(
                "palette mask {}x{} does not match image {}x{}",
                m.width(),
                m.height(),
                image.width(),
                image.height()
            )));
        }
    }
    if n_colors == 0 {
        return Err(EngineError::InvalidInput("n_colors must be >= 1".into()));
    }

    let mask_raw = mask.map(|m| m.as_raw().as_slice());
    let mut samples: Vec<Srgb<f32>> = Vec::new();
    for (i, px) in image.pixels().enumerate() {
        if let Some(mr) = mask_raw {
            if mr[i] == 0 {
                continue;
            }
        }
        samples.push(Srgb::new(px.0[0], px.0[1], px.0[2]).into_format());
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    // The index buffer is u8-typed, so more than 255 clusters can never be
    // attributed anyway.
    let k = n_colors.min(samples.len()).min(255);
    let mut result = get_kmeans(k, KMEANS_MAX_ITER, KMEANS_CONVERGE, false, &samples, KMEANS_SEED);
    for run in 1..KMEANS_RUNS {
        let candidate =
            get_kmeans(k, KMEANS_MAX_ITER, KMEANS_CONVERGE, false, &samples, KMEANS_SEED + run);
        if candidate.score < result.score {
            result = candidate;
        }
    }

    let mut counts = vec![0u64; result.centroids.len()];
    for &idx in &result.indices {
        counts[idx as usize] += 1;
    }

    let total = samples.len() as f64;
    let mut order: Vec<usize> = (0..result.centroids.len()).collect();
    order.sort_by(|&a, &b| counts[b].cmp(&counts[a]));

    let entries: Vec<ColorEntry> = order
        .into_iter()
        .filter(|&i| counts[i] > 0)
        .map(|i| {
            let c: Srgb<u8> = result.centroids[i].into_format();
            ColorEntry::new([c.red, c.green, c.blue], counts[i] as f64 / total)
        })
        .collect();

    debug!(
        "extract_palette: {} clusters from {} samples: {:?}",
        entries.len(),
        samples.len(),
        entries.iter().map(|e| e.hex.as_str()).collect::<Vec<_>>()
    );
    Ok(entries)
}

// ============================================================================
// Mapping-based recolor
// ============================================================================

/// Remap every pixel within Euclidean RGB distance `tolerance` of a source
/// color to the paired target color. With `preserve_luminance` the remap
/// happens in HSV, replacing hue and saturation while keeping the value
/// channel, so the original shading survives.
pub fn apply_color_mapping(
    image: &RgbImage,
    sources: &[[u8; 3]],
    targets: &[[u8; 3]],
    tolerance: f32,
    preserve_luminance: bool,
) -> Result<RgbImage, EngineError> {
    if sources.len() != targets.len() {
        return Err(EngineError::InvalidInput(format!(
            "{} source colors vs {} target colors",
            sources.len(),
            targets.len()
        )));
    }

    let tol_sq = tolerance * tolerance;
    let mut result = image.clone();

    for (src, tgt) in sources.iter().zip(targets) {
        let target_hsv: Hsv = Srgb::new(tgt[0], tgt[1], tgt[2]).into_format::<f32>().into_color();
        for px in result.pixels_mut() {
            let dr = px.0[0] as f32 - src[0] as f32;
            let dg = px.0[1] as f32 - src[1] as f32;
            let db = px.0[2] as f32 - src[2] as f32;
            if dr * dr + dg * dg + db * db > tol_sq {
                continue;
            }
            if preserve_luminance {
                let hsv: Hsv =
                    Srgb::new(px.0[0], px.0[1], px.0[2]).into_format::<f32>().into_color();
                let remapped = Hsv::new(target_hsv.hue, target_hsv.saturation, hsv.value);
                let rgb: Srgb<u8> = Srgb::from_color(remapped).into_format();
                px.0 = [rgb.red, rgb.green, rgb.blue];
            } else {
                px.0 = *tgt;
            }
        }
    }
    Ok(result)
}

/// Rotate the hue of a single color by `shift` degrees.
pub fn shift_hue(rgb: [u8; 3], shift: f32) -> [u8; 3] {
    let hsv: Hsv = Srgb::new(rgb[0], rgb[1], rgb[2]).into_format::<f32>().into_color();
    let shifted = Hsv::new(hsv.hue + shift, hsv.saturation, hsv.value);
    let out: Srgb<u8> = Srgb::from_color(shifted).into_format();
    [out.red, out.green, out.blue]
}

/// Generate hue-shifted recolorings: for each shift, rotate every base
/// color's hue by that offset and reapply the mapping.
pub fn color_variants(
    image: &RgbImage,
    base_colors: &[[u8; 3]],
    hue_shifts: &[f32],
    tolerance: f32,
) -> Result<Vec<PaletteVariant>, EngineError> {
    let mut variants = Vec::with_capacity(hue_shifts.len());
    for &shift in hue_shifts {
        let shifted: Vec<[u8; 3]> = base_colors.iter().map(|&c| shift_hue(c, shift)).collect();
        let recolored = apply_color_mapping(image, base_colors, &shifted, tolerance, true)?;
        variants.push(PaletteVariant { hue_shift: shift, colors: shifted, image: recolored });
    }
    Ok(variants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Left half pure red, right half pure blue.
    fn red_blue() -> RgbImage {
        let mut img = RgbImage::new(8, 4);
        for y in 0..4 {
            for x in 0..8 {
                let c = if x < 4 { [255, 0, 0] } else { [0, 0, 255] };
                img.put_pixel(x, y, image::Rgb(c));
            }
        }
        img
    }

    #[test]
    fn two_color_image_clusters_evenly() {
        let palette = extract_palette(&red_blue(), 2, None).unwrap();
        assert_eq!(palette.len(), 2);
        assert_relative_eq!(palette[0].ratio, 0.5, epsilon = 1e-9);
        assert_relative_eq!(palette[1].ratio, 0.5, epsilon = 1e-9);
        for entry in &palette {
            let near_red = entry.rgb[0] > 250 && entry.rgb[1] < 5 && entry.rgb[2] < 5;
            let near_blue = entry.rgb[2] > 250 && entry.rgb[0] < 5 && entry.rgb[1] < 5;
            assert!(near_red || near_blue, "unexpected centroid {:?}", entry.rgb);
        }
    }

    #[test]
    fn ratios_sum_to_one_without_a_mask() {
        let palette = extract_palette(&red_blue(), 5, None).unwrap();
        let sum: f64 = palette.iter().map(|e| e.ratio).sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn masked_extraction_sees_only_masked_pixels() {
        let mut m = GrayImage::new(8, 4);
        for y in 0..4 {
            for x in 0..4 {
                m.put_pixel(x, y, image::Luma([255]));
            }
        }
        let palette = extract_palette(&red_blue(), 3, Some(&m)).unwrap();
        assert_eq!(palette.len(), 1);
        assert!(palette[0].rgb[0] > 250);
    }

    #[test]
    fn empty_mask_yields_empty_palette() {
        let palette = extract_palette(&red_blue(), 3, Some(&GrayImage::new(8, 4))).unwrap();
        assert!(palette.is_empty());
    }

    #[test]
    fn mapping_recolors_within_tolerance_only() {
        let out =
            apply_color_mapping(&red_blue(), &[[255, 0, 0]], &[[0, 255, 0]], 10.0, false).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [0, 255, 0]);
        assert_eq!(out.get_pixel(7, 0).0, [0, 0, 255]);
    }

    #[test]
    fn zero_tolerance_touches_exact_matches_only() {
        let mut img = red_blue();
        img.put_pixel(0, 0, image::Rgb([254, 0, 0])); // one off-red pixel
        let out = apply_color_mapping(&img, &[[255, 0, 0]], &[[0, 255, 0]], 0.0, false).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [254, 0, 0]);
        assert_eq!(out.get_pixel(1, 0).0, [0, 255, 0]);
    }

    #[test]
    fn luminance_preserving_remap_keeps_value_channel() {
        let out =
            apply_color_mapping(&red_blue(), &[[255, 0, 0]], &[[0, 255, 0]], 10.0, true).unwrap();
        let px = out.get_pixel(0, 0).0;
        // Pure red has V = 1.0 in HSV; the remapped pixel keeps it while
        // taking green's hue and saturation, landing on pure green.
        assert_eq!(px, [0, 255, 0]);
    }

    #[test]
    fn mismatched_mapping_lists_are_rejected() {
        let err = apply_color_mapping(&red_blue(), &[[255, 0, 0]], &[], 5.0, false).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn variants_shift_every_base_color() {
        let variants = color_variants(&red_blue(), &[[255, 0, 0]], &[120.0], 10.0).unwrap();
        assert_eq!(variants.len(), 1);
        // Red shifted by +120 degrees lands on green.
        assert_eq!(variants[0].colors[0], [0, 255, 0]);
        assert_eq!(variants[0].image.get_pixel(0, 0).0, [0, 255, 0]);
    }
}
