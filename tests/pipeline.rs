//! End-to-end pipeline tests over the public engine API: segment an image,
//! resolve clicks, edit under the picked mask, composite, and verify the
//! spec-level properties hold across module boundaries.

use approx::assert_relative_eq;
use image::{GrayImage, Rgb, RgbImage};

use flatlayer::compositor::composite;
use flatlayer::layers::LayerId;
use flatlayer::palette::{apply_color_mapping, extract_palette};
use flatlayer::{EditParams, Engine, EngineConfig, EngineError};

/// 8x8 all-white image with a centered 4x4 black square.
fn white_with_black_square() -> RgbImage {
    let mut img = RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]));
    for y in 2..6 {
        for x in 2..6 {
            img.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }
    img
}

/// Half pure red, half pure blue.
fn red_blue() -> RgbImage {
    let mut img = RgbImage::new(10, 10);
    for y in 0..10 {
        for x in 0..10 {
            let c = if x < 5 { [255, 0, 0] } else { [0, 0, 255] };
            img.put_pixel(x, y, Rgb(c));
        }
    }
    img
}

#[test]
fn white_threshold_scenario_produces_exact_masks() {
    let config = EngineConfig { white_threshold: 250, ..EngineConfig::default() };
    let engine = Engine::new(config).unwrap();
    let outcome = engine.segment(&white_with_black_square(), None).unwrap();

    let report = outcome.report.expect("layered segmentation carries a report");
    assert_relative_eq!(report.fg_ratio, 0.25, epsilon = 1e-12);

    // rug_mask exactly equals the 4x4 square, background its complement.
    for y in 0..8u32 {
        for x in 0..8u32 {
            let in_square = (2..6).contains(&x) && (2..6).contains(&y);
            let rug = outcome.layers.rug().get_pixel(x, y).0[0] > 0;
            let bg = outcome.layers.background().get_pixel(x, y).0[0] > 0;
            assert_eq!(rug, in_square, "rug wrong at ({}, {})", x, y);
            assert_eq!(bg, !in_square, "background wrong at ({}, {})", x, y);
        }
    }
}

#[test]
fn layer_masks_partition_every_pixel() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let outcome = engine.segment(&white_with_black_square(), None).unwrap();
    let bands = outcome.layers.band_count();

    for y in 0..8u32 {
        for x in 0..8u32 {
            let mut members = 0;
            for i in 0..bands {
                if outcome.layers.band(i).unwrap().get_pixel(x, y).0[0] > 0 {
                    members += 1;
                }
            }
            if outcome.layers.background().get_pixel(x, y).0[0] > 0 {
                members += 1;
            }
            assert_eq!(members, 1, "pixel ({}, {}) belongs to {} layers", x, y, members);
        }
    }
}

#[test]
fn composite_is_idempotent_for_identical_inputs() {
    let img = red_blue();
    let mut mask = GrayImage::new(10, 10);
    for y in 0..10 {
        for x in 3..7 {
            mask.put_pixel(x, y, image::Luma([255]));
        }
    }
    for radius in [0u32, 1, 2, 5] {
        let out = composite(&img, &img, &mask, radius).unwrap();
        assert_eq!(out.as_raw(), img.as_raw(), "radius {}", radius);
    }
}

#[test]
fn hard_edge_composite_equals_substitution() {
    let base = red_blue();
    let edited = RgbImage::from_pixel(10, 10, Rgb([0, 255, 0]));
    let mut mask = GrayImage::new(10, 10);
    for y in 2..8 {
        for x in 2..8 {
            mask.put_pixel(x, y, image::Luma([255]));
        }
    }
    let out = composite(&base, &edited, &mask, 0).unwrap();
    for y in 0..10u32 {
        for x in 0..10u32 {
            let expected =
                if mask.get_pixel(x, y).0[0] > 0 { *edited.get_pixel(x, y) } else { *base.get_pixel(x, y) };
            assert_eq!(*out.get_pixel(x, y), expected, "at ({}, {})", x, y);
        }
    }
}

#[test]
fn palette_scenario_red_blue_clusters() {
    let palette = extract_palette(&red_blue(), 2, None).unwrap();
    assert_eq!(palette.len(), 2);
    let sum: f64 = palette.iter().map(|e| e.ratio).sum();
    assert_relative_eq!(sum, 1.0, epsilon = 1e-9);
    for entry in &palette {
        assert_relative_eq!(entry.ratio, 0.5, epsilon = 1e-9);
    }
}

#[test]
fn recolor_scenario_with_and_without_luminance() {
    let img = red_blue();

    let plain = apply_color_mapping(&img, &[[255, 0, 0]], &[[0, 255, 0]], 10.0, false).unwrap();
    for y in 0..10u32 {
        assert_eq!(plain.get_pixel(0, y).0, [0, 255, 0]);
        assert_eq!(plain.get_pixel(9, y).0, [0, 0, 255]);
    }

    let kept = apply_color_mapping(&img, &[[255, 0, 0]], &[[0, 255, 0]], 10.0, true).unwrap();
    // Pure red has full HSV value; preserving it while adopting green's
    // hue/saturation lands on pure green.
    assert_eq!(kept.get_pixel(0, 0).0, [0, 255, 0]);
    assert_eq!(kept.get_pixel(9, 0).0, [0, 0, 255]);
}

#[test]
fn background_click_selects_nothing() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let (id, _) = engine.create_session(white_with_black_square(), None).unwrap();
    let picked = engine.pick(id, 0, 0).unwrap();
    assert_eq!(picked.layer, None);
    assert!(picked.mask.as_raw().iter().all(|&v| v == 0));
}

#[test]
fn out_of_bounds_click_is_structured() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let (id, _) = engine.create_session(white_with_black_square(), None).unwrap();
    match engine.pick(id, 42, 1).unwrap_err() {
        EngineError::OutOfBounds { x, y, width, height } => {
            assert_eq!((x, y, width, height), (42, 1, 8, 8));
        }
        other => panic!("expected OutOfBounds, got {:?}", other),
    }
}

#[test]
fn feathered_edit_blends_across_the_seam() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let mut img = RgbImage::from_pixel(16, 16, Rgb([255, 255, 255]));
    for y in 4..12 {
        for x in 4..12 {
            img.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }
    let (id, _) = engine.create_session(img, None).unwrap();

    let recolor = EditParams::Recolor { color: "#ff0000".into(), alpha: 1.0 };
    let (result, _) = engine.apply_edit(id, &LayerId::Rug, &recolor, 2).unwrap();

    // Deep inside the rug the feathered alpha saturates to 1: fully red.
    // At the rug's own boundary the alpha dips below 1, pulling the edited
    // red partway back toward the original black. Background: untouched.
    assert_eq!(result.get_pixel(8, 8).0, [255, 0, 0]);
    let seam = result.get_pixel(4, 8).0;
    assert!(seam[0] > 0 && seam[0] < 255, "seam {:?} not blended", seam);
    assert_eq!(result.get_pixel(0, 0).0, [255, 255, 255]);
}

#[test]
fn session_image_advances_with_each_edit() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let (id, _) = engine.create_session(white_with_black_square(), None).unwrap();

    let before = engine.session_image(id).unwrap();
    let recolor = EditParams::Recolor { color: "#336699".into(), alpha: 1.0 };
    let (after, _) = engine.apply_edit(id, &LayerId::Rug, &recolor, 0).unwrap();
    assert_ne!(before.as_raw(), after.as_raw());
    assert_eq!(engine.session_image(id).unwrap().as_raw(), after.as_raw());
}

#[test]
fn unknown_edit_mode_is_rejected_end_to_end() {
    let err = EditParams::from_json(r#"{"mode": "pixelate", "delta": 0.5}"#).unwrap_err();
    assert!(matches!(err, EngineError::UnknownEditMode(m) if m == "pixelate"));
}
