// ============================================================================
// MASK UTILITIES — binary mask hygiene shared by the segmentation pipeline
// ============================================================================
//
// Masks are single-channel GrayImage buffers, binary-valued (0 / 255) at
// every API boundary. Everything here treats input values as boolean
// membership (> 0) and produces strictly 0/255 output.

use std::collections::VecDeque;

use image::GrayImage;

pub const FG: u8 = 255;

/// Re-quantize a mask to strict 0/255 (membership = value > 0).
pub fn binarize(mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();
    let data: Vec<u8> = mask.as_raw().iter().map(|&v| if v > 0 { FG } else { 0 }).collect();
    GrayImage::from_raw(w, h, data).unwrap()
}

/// All-zero mask of the given dimensions.
pub fn empty(width: u32, height: u32) -> GrayImage {
    GrayImage::new(width, height)
}

/// Logical complement (0 <-> 255).
pub fn invert(mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();
    let data: Vec<u8> = mask.as_raw().iter().map(|&v| if v > 0 { 0 } else { FG }).collect();
    GrayImage::from_raw(w, h, data).unwrap()
}

/// Number of member pixels.
pub fn area(mask: &GrayImage) -> u64 {
    mask.as_raw().iter().filter(|&&v| v > 0).count() as u64
}

/// Member fraction of the whole image, in [0, 1].
pub fn coverage(mask: &GrayImage) -> f64 {
    let total = (mask.width() as u64 * mask.height() as u64).max(1);
    area(mask) as f64 / total as f64
}

// ============================================================================
// Morphology
// ============================================================================

fn expand(mask: &GrayImage, grow: bool) -> GrayImage {
    let (w, h) = mask.dimensions();
    let src = mask.as_raw();
    let mut out = vec![0u8; src.len()];
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let mut v = if grow { 0u8 } else { FG };
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                        continue;
                    }
                    let nv = src[(ny as u32 * w + nx as u32) as usize];
                    v = if grow { v.max(nv) } else { v.min(nv) };
                }
            }
            out[(y as u32 * w + x as u32) as usize] = if v > 0 { FG } else { 0 };
        }
    }
    GrayImage::from_raw(w, h, out).unwrap()
}

/// 3x3 morphological close (dilate then erode). Removes speckle holes
/// without moving the outer boundary.
pub fn close3(mask: &GrayImage) -> GrayImage {
    expand(&expand(mask, true), false)
}

// ============================================================================
// Connected components (4-neighbor)
// ============================================================================

/// Keep only the single largest 4-connected component; everything else
/// becomes background. An empty mask stays empty.
pub fn largest_component(mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();
    let src = mask.as_raw();
    let n = src.len();
    let mut labels = vec![0u32; n];
    let mut next_label = 0u32;
    let mut best_label = 0u32;
    let mut best_size = 0usize;
    let mut queue = VecDeque::with_capacity(1024);

    for start in 0..n {
        if src[start] == 0 || labels[start] != 0 {
            continue;
        }
        next_label += 1;
        let label = next_label;
        labels[start] = label;
        let mut size = 1usize;
        queue.push_back((start as u32 % w, start as u32 / w));

        while let Some((px, py)) = queue.pop_front() {
            let neighbors = [
                (px.wrapping_sub(1), py),
                (px + 1, py),
                (px, py.wrapping_sub(1)),
                (px, py + 1),
            ];
            for (nx, ny) in neighbors {
                if nx >= w || ny >= h {
                    continue;
                }
                let idx = (ny * w + nx) as usize;
                if src[idx] > 0 && labels[idx] == 0 {
                    labels[idx] = label;
                    size += 1;
                    queue.push_back((nx, ny));
                }
            }
        }

        if size > best_size {
            best_size = size;
            best_label = label;
        }
    }

    let out: Vec<u8> = labels
        .iter()
        .map(|&l| if l != 0 && l == best_label { FG } else { 0 })
        .collect();
    GrayImage::from_raw(w, h, out).unwrap()
}

// ============================================================================
// Edge flood fill
// ============================================================================

/// Given a mask of background-*colored* pixels, flood the true background
/// inward from all four image edges and return the foreground: everything
/// not reachable. Interior same-colored holes inside the subject stay
/// foreground instead of being misclassified.
pub fn foreground_from_edge_fill(bg_colored: &GrayImage) -> GrayImage {
    let (w, h) = bg_colored.dimensions();
    let src = bg_colored.as_raw();
    let mut reached = vec![false; src.len()];
    let mut queue = VecDeque::with_capacity((2 * (w + h)) as usize);

    let seed = |x: u32, y: u32, reached: &mut Vec<bool>, queue: &mut VecDeque<(u32, u32)>| {
        let idx = (y * w + x) as usize;
        if src[idx] > 0 && !reached[idx] {
            reached[idx] = true;
            queue.push_back((x, y));
        }
    };
    for x in 0..w {
        seed(x, 0, &mut reached, &mut queue);
        seed(x, h - 1, &mut reached, &mut queue);
    }
    for y in 0..h {
        seed(0, y, &mut reached, &mut queue);
        seed(w - 1, y, &mut reached, &mut queue);
    }

    while let Some((px, py)) = queue.pop_front() {
        let neighbors = [
            (px.wrapping_sub(1), py),
            (px + 1, py),
            (px, py.wrapping_sub(1)),
            (px, py + 1),
        ];
        for (nx, ny) in neighbors {
            if nx >= w || ny >= h {
                continue;
            }
            let idx = (ny * w + nx) as usize;
            if src[idx] > 0 && !reached[idx] {
                reached[idx] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    let out: Vec<u8> = reached.iter().map(|&r| if r { 0 } else { FG }).collect();
    GrayImage::from_raw(w, h, out).unwrap()
}
