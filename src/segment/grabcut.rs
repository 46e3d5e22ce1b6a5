// ============================================================================
// ITERATIVE FOREGROUND EXTRACTION — GrabCut-style color-model fallback
// ============================================================================
//
// Coarsest strategy in the chain. A trimap (definite/probable foreground and
// background) is seeded either from a previous coarse mask or from a
// centered rectangle covering 80% of the image. Each iteration fits a small
// set of color components to both sides and re-assigns every "probable"
// pixel to the side whose nearest component is closer. The smoothness the
// full algorithm gets from its pairwise term is approximated downstream by
// the orchestrator's morphological cleanup.

use image::{GrayImage, RgbImage};
use log::debug;

use super::{SegMode, SegmentOptions, SegmentStrategy};
use crate::mask::FG;

const BGD: u8 = 0;
const FGD: u8 = 1;
const PR_BGD: u8 = 2;
const PR_FGD: u8 = 3;

/// Color components per side.
const COMPONENTS: usize = 4;
/// Refinement passes when fitting components.
const FIT_PASSES: usize = 6;
/// Cap on sampled pixels per side when fitting.
const MAX_SAMPLES: usize = 1 << 14;

pub struct GrabCutStrategy;

impl SegmentStrategy for GrabCutStrategy {
    fn kind(&self) -> SegMode {
        SegMode::GrabCut
    }

    fn attempt(
        &self,
        image: &RgbImage,
        _alpha: Option<&GrayImage>,
        options: &SegmentOptions,
    ) -> Result<GrayImage, String> {
        extract_foreground(image, None, options.grabcut_iterations)
    }
}

#[inline]
fn is_fg(label: u8) -> bool {
    label == FGD || label == PR_FGD
}

/// Seed the trimap from a centered rectangle covering 80% of the image:
/// probable foreground inside, definite background outside.
fn trimap_from_rect(w: u32, h: u32) -> Vec<u8> {
    let mx = (w as f32 * 0.1) as u32;
    let my = (h as f32 * 0.1) as u32;
    let mut trimap = vec![BGD; (w * h) as usize];
    for y in my..h - my {
        for x in mx..w - mx {
            trimap[(y * w + x) as usize] = PR_FGD;
        }
    }
    trimap
}

/// Seed the trimap from a coarse mask: probable labels everywhere, with a
/// definite foreground core near the image center and definite background
/// near the rim.
fn trimap_from_mask(seed: &GrayImage) -> Vec<u8> {
    let (w, h) = seed.dimensions();
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let max_dist = (cx * cx + cy * cy).sqrt();

    let mut trimap = vec![PR_BGD; (w * h) as usize];
    for (x, y, px) in seed.enumerate_pixels() {
        let inside = px.0[0] > 128;
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let dist = (dx * dx + dy * dy).sqrt();

        let idx = (y * w + x) as usize;
        trimap[idx] = match (inside, dist) {
            (true, d) if d < max_dist * 0.3 => FGD,
            (true, _) => PR_FGD,
            (false, d) if d > max_dist * 0.9 => BGD,
            (false, _) => PR_BGD,
        };
    }
    trimap
}

/// Sampled pixel colors for one side of the trimap.
fn side_samples(image: &RgbImage, trimap: &[u8], fg: bool) -> Vec<[f32; 3]> {
    let total = trimap.iter().filter(|&&l| is_fg(l) == fg).count();
    let stride = (total / MAX_SAMPLES).max(1);
    image
        .pixels()
        .zip(trimap)
        .filter(|(_, &l)| is_fg(l) == fg)
        .step_by(stride)
        .map(|(px, _)| [px.0[0] as f32, px.0[1] as f32, px.0[2] as f32])
        .collect()
}

/// Fit `COMPONENTS` color means to the samples with a few Lloyd passes.
/// Components that lose all members collapse onto the overall mean.
fn fit_components(samples: &[[f32; 3]]) -> Vec<[f32; 3]> {
    let n = samples.len();
    let mut means: Vec<[f32; 3]> = (0..COMPONENTS)
        .map(|i| samples[i * (n - 1) / (COMPONENTS - 1).max(1)])
        .collect();

    let overall = {
        let mut acc = [0.0f64; 3];
        for s in samples {
            for c in 0..3 {
                acc[c] += s[c] as f64;
            }
        }
        [(acc[0] / n as f64) as f32, (acc[1] / n as f64) as f32, (acc[2] / n as f64) as f32]
    };

    for _ in 0..FIT_PASSES {
        let mut sums = vec![[0.0f64; 4]; COMPONENTS];
        for s in samples {
            let k = nearest_component(&means, s);
            for c in 0..3 {
                sums[k][c] += s[c] as f64;
            }
            sums[k][3] += 1.0;
        }
        for (mean, sum) in means.iter_mut().zip(&sums) {
            *mean = if sum[3] > 0.0 {
                [(sum[0] / sum[3]) as f32, (sum[1] / sum[3]) as f32, (sum[2] / sum[3]) as f32]
            } else {
                overall
            };
        }
    }
    means
}

#[inline]
fn nearest_component(means: &[[f32; 3]], px: &[f32; 3]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::MAX;
    for (i, m) in means.iter().enumerate() {
        let dr = px[0] - m[0];
        let dg = px[1] - m[1];
        let db = px[2] - m[2];
        let d = dr * dr + dg * dg + db * db;
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

#[inline]
fn component_distance(means: &[[f32; 3]], px: &[f32; 3]) -> f32 {
    let k = nearest_component(means, px);
    let m = &means[k];
    let dr = px[0] - m[0];
    let dg = px[1] - m[1];
    let db = px[2] - m[2];
    dr * dr + dg * dg + db * db
}

/// Run the iterative extraction. `seed` supplies a coarse prior mask; with
/// no seed a centered 80% rectangle is assumed foreground.
pub fn extract_foreground(
    image: &RgbImage,
    seed: Option<&GrayImage>,
    iterations: usize,
) -> Result<GrayImage, String> {
    let (w, h) = image.dimensions();
    if w < 8 || h < 8 {
        return Err("image too small for foreground extraction".into());
    }
    if let Some(s) = seed {
        if s.dimensions() != (w, h) {
            return Err("seed mask dimensions do not match image".into());
        }
    }

    let mut trimap = match seed {
        Some(s) => trimap_from_mask(s),
        None => trimap_from_rect(w, h),
    };

    let pixels: Vec<[f32; 3]> =
        image.pixels().map(|px| [px.0[0] as f32, px.0[1] as f32, px.0[2] as f32]).collect();

    for iteration in 0..iterations {
        let fg_samples = side_samples(image, &trimap, true);
        let bg_samples = side_samples(image, &trimap, false);
        if fg_samples.is_empty() || bg_samples.is_empty() {
            return Err("degenerate trimap: one side has no pixels".into());
        }
        let fg_model = fit_components(&fg_samples);
        let bg_model = fit_components(&bg_samples);

        let mut changed = 0usize;
        for (idx, label) in trimap.iter_mut().enumerate() {
            // Definite labels are fixed; only probable pixels move.
            if *label != PR_FGD && *label != PR_BGD {
                continue;
            }
            let px = &pixels[idx];
            let next = if component_distance(&fg_model, px) < component_distance(&bg_model, px) {
                PR_FGD
            } else {
                PR_BGD
            };
            if next != *label {
                *label = next;
                changed += 1;
            }
        }
        debug!("grabcut: iteration {}, {} reassignments", iteration, changed);
        if changed == 0 {
            break;
        }
    }

    let data: Vec<u8> = trimap.iter().map(|&l| if is_fg(l) { FG } else { 0 }).collect();
    Ok(GrayImage::from_raw(w, h, data).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask;

    /// Distinctly colored subject on a distinct background.
    fn subject_on_background() -> RgbImage {
        let mut img = RgbImage::from_pixel(20, 20, image::Rgb([220, 220, 215]));
        for y in 6..14 {
            for x in 6..14 {
                img.put_pixel(x, y, image::Rgb([150, 30, 30]));
            }
        }
        img
    }

    #[test]
    fn rect_seeded_extraction_finds_the_subject() {
        let fg = extract_foreground(&subject_on_background(), None, 5).unwrap();
        // Every subject pixel classified foreground, background rim excluded.
        for y in 6..14 {
            for x in 6..14 {
                assert_eq!(fg.get_pixel(x, y).0[0], 255, "subject pixel ({}, {}) lost", x, y);
            }
        }
        assert_eq!(fg.get_pixel(0, 0).0[0], 0);
        assert_eq!(fg.get_pixel(4, 4).0[0], 0);
    }

    #[test]
    fn mask_seeded_extraction_respects_the_prior() {
        let img = subject_on_background();
        let mut seed = GrayImage::new(20, 20);
        for y in 5..15 {
            for x in 5..15 {
                seed.put_pixel(x, y, image::Luma([255]));
            }
        }
        let fg = extract_foreground(&img, Some(&seed), 3).unwrap();
        assert!(mask::area(&fg) >= 64);
        assert_eq!(fg.get_pixel(10, 10).0[0], 255);
        assert_eq!(fg.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn mismatched_seed_is_rejected() {
        let img = subject_on_background();
        let seed = GrayImage::new(10, 10);
        assert!(extract_foreground(&img, Some(&seed), 3).is_err());
    }
}
