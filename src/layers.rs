// ============================================================================
// LAYER MODEL — named masks partitioning an image
// ============================================================================

use std::fmt;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::mask;

/// Closed identifier for the layers a session can address.
///
/// The fixed 2-layer case (`Border`, `Field`, `Rug`, `Background`) is checked
/// at compile time; `Indexed` covers the N-layer case and `Active` is the
/// dynamic slot bound by promptable picking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum LayerId {
    Border,
    Field,
    /// Union of all distance bands (border + field in the 2-layer case).
    Rug,
    Background,
    Indexed(usize),
    /// The mask most recently bound by a promptable pick.
    Active,
}

impl LayerId {
    pub fn parse(s: &str) -> Option<LayerId> {
        match s {
            "border" => Some(LayerId::Border),
            "field" => Some(LayerId::Field),
            "rug" => Some(LayerId::Rug),
            "background" => Some(LayerId::Background),
            "selected_region" | "active" => Some(LayerId::Active),
            _ => {
                let idx = s.strip_prefix("layer_")?;
                idx.parse::<usize>().ok().map(LayerId::Indexed)
            }
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerId::Border => write!(f, "border"),
            LayerId::Field => write!(f, "field"),
            LayerId::Rug => write!(f, "rug"),
            LayerId::Background => write!(f, "background"),
            LayerId::Indexed(i) => write!(f, "layer_{}", i),
            LayerId::Active => write!(f, "selected_region"),
        }
    }
}

impl From<LayerId> for String {
    fn from(id: LayerId) -> String {
        id.to_string()
    }
}

impl TryFrom<String> for LayerId {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        LayerId::parse(&s).ok_or_else(|| format!("unknown layer name: {}", s))
    }
}

/// Masks produced by segmentation, covering the image exhaustively and
/// disjointly: every pixel belongs to exactly one distance band or to the
/// background. `rug` is derived (union of the bands) and `active` sits
/// outside the partition.
#[derive(Debug, Clone)]
pub struct LayerSet {
    width: u32,
    height: u32,
    /// Concentric distance bands, outermost first. For the 2-layer case
    /// `bands[0]` is the border and `bands[1]` the field; a too-thin
    /// foreground collapses to a single band equal to the whole rug.
    bands: Vec<GrayImage>,
    rug: GrayImage,
    background: GrayImage,
    active: Option<GrayImage>,
}

impl LayerSet {
    /// Assemble a layer set from distance bands and the foreground mask.
    /// The background is always the foreground's complement.
    pub fn new(rug: GrayImage, bands: Vec<GrayImage>) -> Self {
        let (width, height) = rug.dimensions();
        let background = mask::invert(&rug);
        LayerSet { width, height, bands, rug, background, active: None }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn rug(&self) -> &GrayImage {
        &self.rug
    }

    pub fn background(&self) -> &GrayImage {
        &self.background
    }

    /// Border band. Only defined for the 2-band split; a collapsed
    /// single-band rug has no border.
    pub fn border(&self) -> Option<&GrayImage> {
        if self.bands.len() == 2 { Some(&self.bands[0]) } else { None }
    }

    /// Field band: the inner band of a 2-band split, or the whole rug when
    /// the split collapsed to a single band.
    pub fn field(&self) -> Option<&GrayImage> {
        match self.bands.len() {
            1 => Some(&self.bands[0]),
            2 => Some(&self.bands[1]),
            _ => None,
        }
    }

    pub fn band(&self, index: usize) -> Option<&GrayImage> {
        self.bands.get(index)
    }

    pub fn active(&self) -> Option<&GrayImage> {
        self.active.as_ref()
    }

    /// Bind the dynamic active mask (promptable picking). The mask must
    /// match the set's dimensions; callers validate before binding.
    pub fn set_active(&mut self, mask: GrayImage) {
        debug_assert_eq!(mask.dimensions(), (self.width, self.height));
        self.active = Some(mask);
    }

    pub fn clear_active(&mut self) {
        self.active = None;
    }

    /// Whether the layer id addresses a mask this set could ever hold.
    /// (`Active` is known even before a pick binds it.)
    pub fn knows(&self, id: &LayerId) -> bool {
        match id {
            LayerId::Rug | LayerId::Background | LayerId::Active => true,
            LayerId::Border => self.bands.len() == 2,
            LayerId::Field => self.bands.len() <= 2 && !self.bands.is_empty(),
            LayerId::Indexed(i) => *i < self.bands.len(),
        }
    }

    pub fn mask(&self, id: &LayerId) -> Option<&GrayImage> {
        match id {
            LayerId::Border => self.border(),
            LayerId::Field => self.field(),
            LayerId::Rug => Some(&self.rug),
            LayerId::Background => Some(&self.background),
            LayerId::Indexed(i) => self.band(*i),
            LayerId::Active => self.active(),
        }
    }

    /// Layers in most-specific-first order for priority picking: bands from
    /// the innermost outward, then the rug union, then background.
    pub fn pick_order(&self) -> Vec<LayerId> {
        let mut order: Vec<LayerId> = Vec::with_capacity(self.bands.len() + 2);
        if self.bands.len() <= 2 {
            order.push(LayerId::Field);
            if self.bands.len() == 2 {
                order.push(LayerId::Border);
            }
        } else {
            for i in (0..self.bands.len()).rev() {
                order.push(LayerId::Indexed(i));
            }
        }
        order.push(LayerId::Rug);
        order.push(LayerId::Background);
        order
    }
}
