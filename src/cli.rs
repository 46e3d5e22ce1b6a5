// ============================================================================
// CLI — headless batch processing via command-line arguments
// ============================================================================
//
// Usage examples:
//   flatlayer segment -i design.png --layers 2 --out-dir masks/
//   flatlayer palette -i design.png -n 5
//   flatlayer recolor -i design.png --from "#c1272d" --to "#0047ab" -o out.png
//   flatlayer edit -i design.png --layer field \
//       --params '{"mode": "recolor", "color": "#0047ab"}' -o out.png
//
// All decoding/encoding of image files happens here; the engine itself only
// ever sees decoded pixel buffers.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use image::DynamicImage;

use crate::config::EngineConfig;
use crate::editor::EditParams;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::layers::LayerId;
use crate::naming;
use crate::palette;

#[derive(Parser, Debug)]
#[command(
    name = "flatlayer",
    about = "Headless layering and region-editing for flat-design images",
    long_about = "Segment flat-design raster images into concentric layers, extract\n\
                  dominant colors, and apply masked recolor/adjustment edits without\n\
                  a server in front.\n\n\
                  Example:\n  \
                  flatlayer segment -i design.png --out-dir masks/\n  \
                  flatlayer edit -i design.png --layer field --params \
                  '{\"mode\": \"recolor\", \"color\": \"#0047ab\"}' -o out.png"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Print timing information and raise the log level.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Segment an image and write per-layer mask PNGs plus a JSON report.
    Segment {
        /// Input image (PNG/JPEG/WEBP/BMP).
        #[arg(short, long)]
        input: PathBuf,
        /// Number of concentric layers (2 = border + field).
        #[arg(long, default_value_t = 2)]
        layers: usize,
        /// Border thickness fraction for the 2-layer split.
        #[arg(long, default_value_t = crate::layering::DEFAULT_BORDER_RATIO)]
        border_ratio: f32,
        /// Directory for the mask PNGs and report.
        #[arg(long, value_name = "DIR")]
        out_dir: PathBuf,
    },
    /// Print the dominant colors of an image.
    Palette {
        #[arg(short, long)]
        input: PathBuf,
        /// Number of colors to extract.
        #[arg(short, default_value_t = 5)]
        n: usize,
        /// Emit machine-readable JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Remap one color to another across the whole image.
    Recolor {
        #[arg(short, long)]
        input: PathBuf,
        /// Source color ("#RRGGBB" or "R,G,B").
        #[arg(long)]
        from: String,
        /// Target color.
        #[arg(long)]
        to: String,
        /// Euclidean RGB distance within which pixels are remapped.
        #[arg(long, default_value_t = 40.0)]
        tolerance: f32,
        /// Remap hue/saturation only, keeping the original shading.
        #[arg(long)]
        keep_luminance: bool,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Segment, edit one layer, composite and save.
    Edit {
        #[arg(short, long)]
        input: PathBuf,
        /// Layer to edit: border, field, rug, layer_N.
        #[arg(long)]
        layer: String,
        /// Edit parameters as JSON, e.g. '{"mode": "brightness", "delta": 0.2}'.
        #[arg(long)]
        params: String,
        /// Feather radius for the composite seam (0 = hard edge).
        #[arg(long, default_value_t = 0)]
        feather: u32,
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Run the requested subcommand and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    let started = Instant::now();
    let result = match args.command {
        Command::Segment { input, layers, border_ratio, out_dir } => {
            cmd_segment(&input, layers, border_ratio, &out_dir)
        }
        Command::Palette { input, n, json } => cmd_palette(&input, n, json),
        Command::Recolor { input, from, to, tolerance, keep_luminance, output } => {
            cmd_recolor(&input, &from, &to, tolerance, keep_luminance, &output)
        }
        Command::Edit { input, layer, params, feather, output } => {
            cmd_edit(&input, &layer, &params, feather, &output)
        }
    };

    match result {
        Ok(()) => {
            if args.verbose {
                println!("done in {:.0}ms", started.elapsed().as_secs_f64() * 1000.0);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Decode an input file into the engine's buffer types, splitting off the
/// alpha channel when the file carries one.
fn load(path: &Path) -> Result<(image::RgbImage, Option<image::GrayImage>), String> {
    let decoded = image::open(path).map_err(|e| format!("load {}: {}", path.display(), e))?;
    let alpha = match &decoded {
        DynamicImage::ImageRgba8(_) | DynamicImage::ImageLumaA8(_) => {
            let rgba = decoded.to_rgba8();
            let (w, h) = rgba.dimensions();
            let data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
            Some(image::GrayImage::from_raw(w, h, data).unwrap())
        }
        _ => None,
    };
    Ok((decoded.to_rgb8(), alpha))
}

fn engine_with(layers: usize, border_ratio: f32) -> Result<Engine, String> {
    let config = EngineConfig { layer_count: layers, border_ratio, ..EngineConfig::default() }
        .with_env_overrides();
    Engine::new(config).map_err(|e| e.to_string())
}

fn cmd_segment(
    input: &Path,
    layers: usize,
    border_ratio: f32,
    out_dir: &Path,
) -> Result<(), String> {
    let (rgb, alpha) = load(input)?;
    let engine = engine_with(layers, border_ratio)?;
    let outcome = engine.segment(&rgb, alpha.as_ref()).map_err(|e| e.to_string())?;

    std::fs::create_dir_all(out_dir).map_err(|e| format!("create {}: {}", out_dir.display(), e))?;

    let mut names: Vec<LayerId> = vec![LayerId::Rug, LayerId::Background];
    if outcome.layers.band_count() <= 2 {
        names.push(LayerId::Border);
        names.push(LayerId::Field);
    } else {
        for i in 0..outcome.layers.band_count() {
            names.push(LayerId::Indexed(i));
        }
    }
    for id in names {
        let Some(mask) = outcome.layers.mask(&id) else { continue };
        let path = out_dir.join(format!("{}.png", id));
        mask.save(&path).map_err(|e| format!("save {}: {}", path.display(), e))?;
        println!("wrote {}", path.display());
    }

    let report = serde_json::json!({
        "mode": outcome.mode,
        "report": outcome.report,
    });
    let report_path = out_dir.join("report.json");
    std::fs::write(&report_path, serde_json::to_string_pretty(&report).unwrap())
        .map_err(|e| format!("save {}: {}", report_path.display(), e))?;
    println!("wrote {}", report_path.display());
    Ok(())
}

fn cmd_palette(input: &Path, n: usize, json: bool) -> Result<(), String> {
    let (rgb, _) = load(input)?;
    let entries = palette::extract_palette(&rgb, n, None).map_err(|e| e.to_string())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries).unwrap());
        return Ok(());
    }
    for entry in &entries {
        println!(
            "{}  {:>5.1}%  {}",
            entry.hex,
            entry.ratio * 100.0,
            naming::describe(entry.rgb)
        );
    }
    Ok(())
}

fn cmd_recolor(
    input: &Path,
    from: &str,
    to: &str,
    tolerance: f32,
    keep_luminance: bool,
    output: &Path,
) -> Result<(), String> {
    let (rgb, _) = load(input)?;
    let source = naming::parse_color(from).map_err(|e| e.to_string())?;
    let target = naming::parse_color(to).map_err(|e| e.to_string())?;
    let result = palette::apply_color_mapping(&rgb, &[source], &[target], tolerance, keep_luminance)
        .map_err(|e| e.to_string())?;
    result.save(output).map_err(|e| format!("save {}: {}", output.display(), e))?;
    println!("wrote {}", output.display());
    Ok(())
}

fn cmd_edit(
    input: &Path,
    layer: &str,
    params_json: &str,
    feather: u32,
    output: &Path,
) -> Result<(), String> {
    let layer = LayerId::parse(layer)
        .ok_or_else(|| EngineError::UnknownLayer(layer.to_string()).to_string())?;
    let params = EditParams::from_json(params_json).map_err(|e| e.to_string())?;

    let (rgb, alpha) = load(input)?;
    let engine = engine_with(2, crate::layering::DEFAULT_BORDER_RATIO)?;
    let (id, _) = engine.create_session(rgb, alpha.as_ref()).map_err(|e| e.to_string())?;
    let (result, _) = engine.apply_edit(id, &layer, &params, feather).map_err(|e| e.to_string())?;
    engine.delete_session(id);

    result.save(output).map_err(|e| format!("save {}: {}", output.display(), e))?;
    println!("wrote {}", output.display());
    Ok(())
}
