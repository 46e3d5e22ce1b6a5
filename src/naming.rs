// ============================================================================
// PERCEPTUAL COLOR NAMING — nearest named color by CIE Lab distance
// ============================================================================
//
// sRGB -> linear -> XYZ (D65) -> CIE Lab, then CIE76 delta-E (Euclidean Lab
// distance) against a fixed library of named colors. Library Lab values are
// computed once on first use.

use std::sync::OnceLock;

use ::palette::{IntoColor, Lab, Srgb};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedColor {
    pub name: &'static str,
    pub family: &'static str,
    pub hex: &'static str,
}

#[derive(Debug, Clone)]
pub struct ColorMatch {
    pub entry: NamedColor,
    pub delta_e: f32,
    pub input_hex: String,
}

macro_rules! named {
    ($name:literal, $family:literal, $hex:literal) => {
        NamedColor { name: $name, family: $family, hex: $hex }
    };
}

/// Swatch library used for naming. Hue families keep the nearest-neighbour
/// result explainable ("a darker red", not "some brown").
pub const COLOR_LIBRARY: &[NamedColor] = &[
    // Reds
    named!("Cherry Red", "red", "#C1272D"),
    named!("Vermilion", "red", "#D9381E"),
    named!("Crimson", "red", "#8B1E3F"),
    named!("Burgundy", "red", "#6D0F1F"),
    named!("Rose", "red", "#D64B7F"),
    named!("Brick Red", "red", "#B23A48"),
    named!("Coral Red", "red", "#FF5A5F"),
    named!("Pure Red", "red", "#FF0000"),
    named!("Carmine", "red", "#960018"),
    named!("Watermelon", "red", "#FC6C85"),
    // Oranges
    named!("Pumpkin", "orange", "#FF7518"),
    named!("Amber", "orange", "#FFBF00"),
    named!("Caramel", "orange", "#C96A2C"),
    named!("Apricot", "orange", "#FBCEB1"),
    named!("Tangerine", "orange", "#F28500"),
    named!("Terracotta", "orange", "#E2725B"),
    named!("Orange", "orange", "#FF8C00"),
    named!("Persimmon", "orange", "#EC5800"),
    // Yellows
    named!("Lemon", "yellow", "#FFF44F"),
    named!("Mustard", "yellow", "#D2A106"),
    named!("Champagne", "yellow", "#F7E7CE"),
    named!("Gold", "yellow", "#D4AF37"),
    named!("Cream", "yellow", "#FFFDD0"),
    named!("Sunflower", "yellow", "#FFC512"),
    named!("Ochre", "yellow", "#CC7722"),
    // Greens
    named!("Olive", "green", "#556B2F"),
    named!("Moss", "green", "#6B8E23"),
    named!("Emerald", "green", "#50C878"),
    named!("Mint", "green", "#98FF98"),
    named!("Pine", "green", "#01796F"),
    named!("Grass", "green", "#7CFC00"),
    named!("Forest Green", "green", "#228B22"),
    named!("Teal", "green", "#008080"),
    named!("Pure Green", "green", "#00FF00"),
    // Blues
    named!("Sky Blue", "blue", "#87CEEB"),
    named!("Lake Blue", "blue", "#4AA3DF"),
    named!("Sapphire", "blue", "#0F52BA"),
    named!("Navy", "blue", "#1F2A44"),
    named!("Cobalt", "blue", "#0047AB"),
    named!("Ice Blue", "blue", "#D6F0FF"),
    named!("Slate Blue", "blue", "#5B7C99"),
    named!("Azure", "blue", "#007FFF"),
    named!("Indigo", "blue", "#4B0082"),
    named!("Royal Blue", "blue", "#4169E1"),
    named!("Pure Blue", "blue", "#0000FF"),
    // Purples
    named!("Lavender", "purple", "#B57EDC"),
    named!("Violet", "purple", "#7F00FF"),
    named!("Plum", "purple", "#6E2C5B"),
    named!("Grape", "purple", "#6F2DA8"),
    named!("Mauve", "purple", "#915F6D"),
    named!("Eggplant", "purple", "#3D2B56"),
    named!("Lilac", "purple", "#C8A2C8"),
    named!("Magenta", "purple", "#FF00FF"),
    // Browns
    named!("Camel", "brown", "#C19A6B"),
    named!("Chestnut", "brown", "#954535"),
    named!("Coffee", "brown", "#6F4E37"),
    named!("Chocolate", "brown", "#4E2A1E"),
    named!("Walnut", "brown", "#5C4033"),
    named!("Sand", "brown", "#C2B280"),
    named!("Khaki", "brown", "#BDB76B"),
    named!("Tan", "brown", "#D2B48C"),
    named!("Saddle Brown", "brown", "#8B4513"),
    named!("Cinnamon", "brown", "#7B3F00"),
    // Neutrals
    named!("Ivory", "neutral", "#FFFFF0"),
    named!("Off-white", "neutral", "#F5F5DC"),
    named!("Light Gray", "neutral", "#D9D9D9"),
    named!("Medium Gray", "neutral", "#A6A6A6"),
    named!("Graphite", "neutral", "#4B4F54"),
    named!("Charcoal", "neutral", "#222222"),
    named!("Black", "neutral", "#000000"),
    named!("White", "neutral", "#FFFFFF"),
    named!("Silver", "neutral", "#C0C0C0"),
    named!("Warm Gray", "neutral", "#8B8680"),
];

fn hex_to_rgb(hex: &str) -> [u8; 3] {
    let h = hex.trim_start_matches('#');
    let channel = |i: usize| u8::from_str_radix(&h[i..i + 2], 16).unwrap_or(0);
    [channel(0), channel(2), channel(4)]
}

/// sRGB bytes to CIE Lab (D65).
pub fn rgb_to_lab(rgb: [u8; 3]) -> Lab {
    Srgb::new(rgb[0], rgb[1], rgb[2]).into_format::<f32>().into_color()
}

/// CIE76 delta-E: Euclidean distance in Lab space.
pub fn delta_e(a: Lab, b: Lab) -> f32 {
    let dl = a.l - b.l;
    let da = a.a - b.a;
    let db = a.b - b.b;
    (dl * dl + da * da + db * db).sqrt()
}

fn library_lab() -> &'static Vec<(NamedColor, Lab)> {
    static CACHE: OnceLock<Vec<(NamedColor, Lab)>> = OnceLock::new();
    CACHE.get_or_init(|| {
        COLOR_LIBRARY.iter().map(|&entry| (entry, rgb_to_lab(hex_to_rgb(entry.hex)))).collect()
    })
}

/// Parse "#RRGGBB", "RRGGBB" or "R,G,B" into an RGB triple.
pub fn parse_color(input: &str) -> Result<[u8; 3], EngineError> {
    let s = input.trim();
    let hex = s.trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(hex_to_rgb(hex));
    }
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() == 3 {
        let mut rgb = [0u8; 3];
        for (slot, part) in rgb.iter_mut().zip(&parts) {
            *slot = part
                .parse::<u8>()
                .map_err(|_| EngineError::InvalidInput(format!("unparseable color: {:?}", input)))?;
        }
        return Ok(rgb);
    }
    Err(EngineError::InvalidInput(format!("unparseable color: {:?}", input)))
}

/// Nearest library entry by CIE76 delta-E.
pub fn match_color(rgb: [u8; 3]) -> ColorMatch {
    let input_lab = rgb_to_lab(rgb);
    let input_hex = format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2]);

    let mut best: Option<(NamedColor, f32)> = None;
    for &(entry, lab) in library_lab() {
        let de = delta_e(input_lab, lab);
        if best.map_or(true, |(_, b)| de < b) {
            best = Some((entry, de));
        }
    }
    // The library is non-empty, so a best entry always exists.
    let (entry, de) = best.unwrap();
    ColorMatch { entry, delta_e: de, input_hex }
}

/// Natural-language description for a chosen swatch, e.g.
/// `"Cherry Red (close to #C1272D)"`.
pub fn describe(rgb: [u8; 3]) -> String {
    let m = match_color(rgb);
    format!("{} (close to {})", m.entry.name, m.entry.hex)
}
