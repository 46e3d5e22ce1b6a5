// ============================================================================
// DISTANCE-FIELD LAYERING — concentric bands from a foreground mask
// ============================================================================
//
// The exact Euclidean distance transform (distance of every foreground pixel
// to the nearest background pixel) is computed with the two-pass
// Felzenszwalb/Huttenlocher lower-envelope algorithm on squared distances:
// one 1-D pass over columns, one over rows, then a square root.
//
// Foreground pixels are partitioned into successive distance bands by
// ascending thresholds `ratio_i * max_dist`; a pixel with
// `prev < d <= ratio_i * max_dist` belongs to band i. Two ratios naturally
// give an outer border band and an inner field band.

use image::GrayImage;
use log::debug;
use serde::Serialize;

use crate::layers::LayerSet;
use crate::mask::{self, FG};

/// Default border thickness fraction for the 2-band split.
pub const DEFAULT_BORDER_RATIO: f32 = 0.22;

/// How the foreground should be banded.
#[derive(Debug, Clone)]
pub enum BandSpec {
    /// N evenly spaced bands (N >= 2). `Count(2)` uses the default border
    /// ratio rather than an even split.
    Count(usize),
    /// Explicit ascending distance ratios in (0, 1]. A trailing 1.0 is
    /// appended if missing so the outermost threshold reaches `max_dist`.
    Ratios(Vec<f32>),
}

impl BandSpec {
    pub fn two_layer(border_ratio: f32) -> BandSpec {
        BandSpec::Ratios(vec![border_ratio, 1.0])
    }

    fn resolve(&self) -> Vec<f32> {
        match self {
            BandSpec::Count(n) if *n <= 2 => vec![DEFAULT_BORDER_RATIO, 1.0],
            BandSpec::Count(n) => (1..=*n).map(|i| i as f32 / *n as f32).collect(),
            BandSpec::Ratios(rs) => {
                let mut rs: Vec<f32> = rs.clone();
                rs.sort_by(|a, b| a.total_cmp(b));
                if rs.last().copied() != Some(1.0) {
                    rs.push(1.0);
                }
                rs
            }
        }
    }
}

/// Metadata describing how a layer split came out.
#[derive(Debug, Clone, Serialize)]
pub struct LayeringReport {
    /// Maximum of the distance transform over the foreground, in pixels.
    pub max_dist: f32,
    /// The thresholds actually used, as fractions of `max_dist`.
    pub ratios: Vec<f32>,
    /// Foreground fraction of the whole image.
    pub fg_ratio: f64,
}

// ============================================================================
// Euclidean distance transform
// ============================================================================

const INF: f32 = 1.0e20;

/// Intersection abscissa of the parabolas rooted at q and p.
#[inline]
fn intersect(f: &[f32], q: usize, p: usize) -> f32 {
    ((f[q] + (q * q) as f32) - (f[p] + (p * p) as f32)) / (2 * q - 2 * p) as f32
}

/// 1-D squared distance transform (lower envelope of parabolas).
fn dt_1d(f: &[f32], d: &mut [f32], v: &mut [usize], z: &mut [f32]) {
    let n = f.len();
    let mut k = 0usize;
    v[0] = 0;
    z[0] = -INF;
    z[1] = INF;
    for q in 1..n {
        // z[0] = -INF guarantees the pop loop stops at k = 0.
        let mut s = intersect(f, q, v[k]);
        while s <= z[k] {
            k -= 1;
            s = intersect(f, q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = INF;
    }

    k = 0;
    for q in 0..n {
        while z[k + 1] < q as f32 {
            k += 1;
        }
        let dq = q as f32 - v[k] as f32;
        d[q] = dq * dq + f[v[k]];
    }
}

/// Per-pixel Euclidean distance to the nearest background (zero) pixel,
/// row-major. Background pixels get 0; an all-foreground image saturates.
pub fn distance_transform(mask: &GrayImage) -> Vec<f32> {
    let (w, h) = mask.dimensions();
    let (w, h) = (w as usize, h as usize);
    let src = mask.as_raw();

    let mut grid: Vec<f32> = src.iter().map(|&v| if v > 0 { INF } else { 0.0 }).collect();

    let max_dim = w.max(h);
    let mut f = vec![0.0f32; max_dim];
    let mut d = vec![0.0f32; max_dim];
    let mut v = vec![0usize; max_dim];
    let mut z = vec![0.0f32; max_dim + 1];

    // Columns first, then rows (order does not matter for correctness).
    for x in 0..w {
        for y in 0..h {
            f[y] = grid[y * w + x];
        }
        dt_1d(&f[..h], &mut d[..h], &mut v[..h], &mut z[..h + 1]);
        for y in 0..h {
            grid[y * w + x] = d[y];
        }
    }
    for y in 0..h {
        f[..w].copy_from_slice(&grid[y * w..(y + 1) * w]);
        dt_1d(&f[..w], &mut d[..w], &mut v[..w], &mut z[..w + 1]);
        grid[y * w..(y + 1) * w].copy_from_slice(&d[..w]);
    }

    for value in grid.iter_mut() {
        *value = value.min(INF).sqrt();
    }
    grid
}

// ============================================================================
// Band partition
// ============================================================================

/// Split a binary foreground mask into concentric distance bands.
///
/// If the foreground is too thin to band (`max_dist < 2`) the split
/// collapses to a single band equal to the whole foreground. Degenerate
/// coverage is the orchestrator's problem; this function bands whatever
/// mask it is handed.
pub fn split_layers(foreground: &GrayImage, spec: &BandSpec) -> (LayerSet, LayeringReport) {
    let rug = mask::binarize(foreground);
    let (w, h) = rug.dimensions();
    let fg_ratio = mask::coverage(&rug);

    let dist = distance_transform(&rug);
    let max_dist = dist.iter().copied().fold(0.0f32, f32::max);

    if max_dist < 2.0 {
        debug!("layering: max_dist {:.2} < 2, collapsing to a single band", max_dist);
        let report = LayeringReport { max_dist, ratios: vec![1.0], fg_ratio };
        let band = rug.clone();
        return (LayerSet::new(rug, vec![band]), report);
    }

    let ratios = spec.resolve();
    let mut bands: Vec<GrayImage> = Vec::with_capacity(ratios.len());
    let mut prev = 0.0f32;
    for ratio in &ratios {
        let threshold = ratio * max_dist;
        let data: Vec<u8> = dist
            .iter()
            .map(|&d| if d > prev && d <= threshold { FG } else { 0 })
            .collect();
        bands.push(GrayImage::from_raw(w, h, data).unwrap());
        prev = threshold;
    }

    debug!(
        "layering: {} bands, max_dist={:.2}, fg_ratio={:.3}",
        bands.len(),
        max_dist,
        fg_ratio
    );
    let report = LayeringReport { max_dist, ratios, fg_ratio };
    (LayerSet::new(rug, bands), report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerId;

    /// 8x8 all-background with a centered 4x4 foreground square.
    fn centered_square() -> GrayImage {
        let mut m = GrayImage::new(8, 8);
        for y in 2..6 {
            for x in 2..6 {
                m.put_pixel(x, y, image::Luma([FG]));
            }
        }
        m
    }

    #[test]
    fn distances_of_centered_square() {
        let dist = distance_transform(&centered_square());
        // Ring pixels sit 1 away from background, the inner 2x2 sits 2 away.
        assert_eq!(dist[2 * 8 + 2], 1.0);
        assert_eq!(dist[3 * 8 + 3], 2.0);
        assert_eq!(dist[0], 0.0);
    }

    #[test]
    fn two_band_split_of_centered_square() {
        let (set, report) = split_layers(&centered_square(), &BandSpec::two_layer(0.5));
        assert_eq!(report.fg_ratio, 16.0 / 64.0);
        assert_eq!(report.max_dist, 2.0);
        assert_eq!(set.band_count(), 2);

        // Border = 12-pixel outer ring, field = inner 2x2.
        assert_eq!(mask::area(set.border().unwrap()), 12);
        assert_eq!(mask::area(set.field().unwrap()), 4);
        assert_eq!(mask::area(set.rug()), 16);
        assert_eq!(mask::area(set.background()), 48);
    }

    #[test]
    fn bands_and_background_partition_every_pixel() {
        let (set, _) = split_layers(&centered_square(), &BandSpec::two_layer(0.5));
        for y in 0..8 {
            for x in 0..8 {
                let mut members = 0;
                for id in [LayerId::Border, LayerId::Field, LayerId::Background] {
                    if set.mask(&id).unwrap().get_pixel(x, y).0[0] > 0 {
                        members += 1;
                    }
                }
                assert_eq!(members, 1, "pixel ({}, {}) in {} layers", x, y, members);
            }
        }
    }

    #[test]
    fn growing_border_ratio_never_shrinks_border() {
        let fg = centered_square();
        let mut last = 0u64;
        for ratio in [0.1f32, 0.3, 0.5, 0.8] {
            let (set, _) = split_layers(&fg, &BandSpec::two_layer(ratio));
            let count = mask::area(set.border().unwrap());
            assert!(count >= last, "border shrank at ratio {}", ratio);
            last = count;
        }
    }

    #[test]
    fn thin_foreground_collapses_to_single_band() {
        // A 1-pixel-wide stripe has max_dist 1: too thin to band.
        let mut m = GrayImage::new(8, 8);
        for x in 0..8 {
            m.put_pixel(x, 4, image::Luma([FG]));
        }
        let (set, report) = split_layers(&m, &BandSpec::two_layer(0.22));
        assert_eq!(set.band_count(), 1);
        assert_eq!(report.ratios, vec![1.0]);
        assert_eq!(mask::area(set.field().unwrap()), 8);
        assert!(set.border().is_none());
    }

    #[test]
    fn count_spec_gives_even_multi_layer_split() {
        let (set, report) = split_layers(&centered_square(), &BandSpec::Count(4));
        assert_eq!(set.band_count(), 4);
        assert_eq!(report.ratios, vec![0.25, 0.5, 0.75, 1.0]);
        // Bands still partition the foreground.
        let total: u64 = (0..4).map(|i| mask::area(set.band(i).unwrap())).sum();
        assert_eq!(total, 16);
    }

    #[test]
    fn explicit_ratios_are_sorted_and_capped_at_one() {
        let spec = BandSpec::Ratios(vec![0.6, 0.2]);
        let (_, report) = split_layers(&centered_square(), &spec);
        assert_eq!(report.ratios, vec![0.2, 0.6, 1.0]);
    }
}
