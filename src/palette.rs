//! Colour palette collaborator
//!
//! The interpreter validates colour names against a [`Palette`] when objects
//! are defined; renderers use the same palette to turn names into bytes.

use crate::types::Rgba;
use std::collections::HashMap;

/// Name → RGBA lookup consulted by the object factory and renderers.
pub trait Palette {
    fn rgba(&self, name: &str) -> Option<Rgba>;

    fn define_color(&mut self, name: &str, rgba: Rgba);

    fn contains(&self, name: &str) -> bool {
        self.rgba(name).is_some()
    }
}

/// Hue ramps used for the generated `heatN` colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Hsv,
    CyanRed,
    BlueOrange,
    BlueYellow,
    PurpleGreen,
    GreenMagenta,
    GreenRed,
}

impl ColorScheme {
    /// Colour at brightness `p` in `[0, 1]`, as RGB ratios.
    pub fn at(self, p: f64) -> (f64, f64, f64) {
        let sat = (p - 0.5).abs() * 2.0;
        match self {
            ColorScheme::Hsv => hsv_to_rgb(240.0 * (1.0 - p), 0.9, 1.0),
            ColorScheme::CyanRed => hsv_to_rgb(180.0 * (1.0 - p), sat, 1.0),
            ColorScheme::BlueOrange => hsv_to_rgb(30.0 + 180.0 * (1.0 - p), sat, 1.0),
            ColorScheme::BlueYellow => hsv_to_rgb(60.0 + 180.0 * (1.0 - p), sat, 1.0),
            ColorScheme::PurpleGreen => hsv_to_rgb(90.0 + 180.0 * (1.0 - p), sat, 1.0),
            ColorScheme::GreenMagenta => hsv_to_rgb(120.0 + 180.0 * p, sat, 1.0),
            ColorScheme::GreenRed => hsv_to_rgb(150.0 + 180.0 * p, sat, 1.0),
        }
    }
}

/// HSV → RGB with hue in degrees and saturation/value in `[0, 1]`.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    let sector = (h / 60.0).floor();
    let f = h / 60.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    match (sector as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// A few X11 names; a full `rgb.txt` import belongs to the host.
const NAMED_COLORS: &[(&str, u8, u8, u8)] = &[
    ("white", 255, 255, 255),
    ("black", 0, 0, 0),
    ("gray", 190, 190, 190),
    ("orange", 255, 165, 0),
    ("purple", 160, 32, 240),
    ("pink", 255, 192, 203),
    ("brown", 165, 42, 42),
    ("SteelBlue", 70, 130, 180),
    ("chocolate1", 255, 127, 36),
    ("SkyBlue", 135, 206, 235),
    ("PaleGreen", 152, 251, 152),
    ("LightGoldenrod", 238, 221, 130),
    ("navy", 0, 0, 128),
    ("gold", 255, 215, 0),
    ("ivory", 255, 255, 240),
];

/// Friendlier defaults for the primary colour names.
const ALIASES: &[(&str, &str)] = &[
    ("blue", "SteelBlue"),
    ("red", "chocolate1"),
    ("magenta", "orange"),
    ("cyan", "SkyBlue"),
    ("green", "PaleGreen"),
    ("yellow", "LightGoldenrod"),
];

/// The built-in palette: generated ramps, named colours and aliases.
#[derive(Debug, Clone)]
pub struct ColorTable {
    scheme: ColorScheme,
    colors: HashMap<String, Rgba>,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::new(ColorScheme::default())
    }
}

impl ColorTable {
    pub fn new(scheme: ColorScheme) -> Self {
        let mut table = Self {
            scheme,
            colors: HashMap::new(),
        };
        table.reset();
        table
    }

    /// An empty palette with no built-in names.
    pub fn empty() -> Self {
        Self {
            scheme: ColorScheme::default(),
            colors: HashMap::new(),
        }
    }

    pub fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    /// Forget user definitions and rebuild the built-in names.
    pub fn reset(&mut self) {
        self.colors.clear();
        for level in 0..=100 {
            let p = level as f64 / 100.0;
            let q = 1.0 - p;
            self.define_color(&format!("gray{level}"), Rgba::from_components(p, p, p, 1.0));
            let (r, g, b) = self.scheme.at(p);
            self.define_color(&format!("heat{level}"), Rgba::from_components(r, g, b, 1.0));
            self.define_color(
                &format!("cool{level}"),
                Rgba::from_components(0.0, 0.8 * p, 0.9 * p + 0.4 * q, 1.0),
            );
        }
        for &(name, r, g, b) in NAMED_COLORS {
            self.define_color(name, Rgba::new(r, g, b, 255));
        }
        for &(alias, name) in ALIASES {
            if let Some(rgba) = self.rgba(name) {
                self.define_color(alias, rgba);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Palette for ColorTable {
    fn rgba(&self, name: &str) -> Option<Rgba> {
        self.colors.get(name).copied()
    }

    fn define_color(&mut self, name: &str, rgba: Rgba) {
        self.colors.insert(name.to_string(), rgba);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ramps_exist() {
        let table = ColorTable::default();
        assert_eq!(table.rgba("gray0"), Some(Rgba::BLACK));
        assert_eq!(table.rgba("gray100"), Some(Rgba::WHITE));
        assert!(table.contains("heat50"));
        assert!(table.contains("cool100"));
        assert!(!table.contains("heat101"));
    }

    #[test]
    fn aliases_follow_their_targets() {
        let table = ColorTable::default();
        assert_eq!(table.rgba("cyan"), table.rgba("SkyBlue"));
        assert_eq!(table.rgba("red"), Some(Rgba::new(255, 127, 36, 255)));
    }

    #[test]
    fn hsv_primary_hues() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), (1.0, 0.0, 0.0));
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), (0.0, 1.0, 0.0));
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), (0.0, 0.0, 1.0));
    }

    #[test]
    fn user_definitions_survive_until_reset() {
        let mut table = ColorTable::default();
        table.define_color("brand", Rgba::new(1, 2, 3, 4));
        assert_eq!(table.rgba("brand"), Some(Rgba::new(1, 2, 3, 4)));
        table.reset();
        assert!(!table.contains("brand"));
    }
}
