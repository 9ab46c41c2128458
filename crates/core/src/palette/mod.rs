use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{FractalBeatError, Result};

/// Packed 24-bit RGB colour in `0xRRGGBB` layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32")]
pub struct Color(u32);

impl Color {
    /// Builds a colour from a hex literal; bits above the low 24 are
    /// discarded.
    pub const fn new(hex: u32) -> Self {
        Self(hex & 0x00ff_ffff)
    }

    pub const fn hex(&self) -> u32 {
        self.0
    }

    pub const fn red(&self) -> u8 {
        ((self.0 >> 16) & 0xff) as u8
    }

    pub const fn green(&self) -> u8 {
        ((self.0 >> 8) & 0xff) as u8
    }

    pub const fn blue(&self) -> u8 {
        (self.0 & 0xff) as u8
    }

    /// Channel triple in `[r, g, b]` order for renderers that want bytes.
    pub const fn rgb(&self) -> [u8; 3] {
        [self.red(), self.green(), self.blue()]
    }
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::new(hex)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// Named, ordered colour list with a single accent colour.
///
/// Palettes are shared by reference. Swapping the active palette changes
/// the colours handed to future spawns only; items already in flight keep
/// the colour they were assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PaletteData")]
pub struct Palette {
    /// Display name, also used for case-insensitive lookup.
    pub name: String,
    colors: Vec<Color>,
    /// Highlight colour for chrome around the tunnel.
    pub accent: Color,
}

/// Wire form of [`Palette`]; deserialisation funnels through the
/// validating constructor.
#[derive(Deserialize)]
struct PaletteData {
    name: String,
    colors: Vec<Color>,
    accent: Color,
}

impl TryFrom<PaletteData> for Palette {
    type Error = FractalBeatError;

    fn try_from(data: PaletteData) -> Result<Self> {
        Palette::new(data.name, data.colors, data.accent)
    }
}

impl Palette {
    /// Builds a palette. The colour list must hold at least one entry so
    /// round-robin assignment always has something to hand out.
    pub fn new(name: impl Into<String>, colors: Vec<Color>, accent: Color) -> Result<Self> {
        if colors.is_empty() {
            return Err(FractalBeatError::msg("a palette needs at least one colour"));
        }
        Ok(Self {
            name: name.into(),
            colors,
            accent,
        })
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Colour at `index`, wrapping round the end of the list.
    pub fn color(&self, index: usize) -> Color {
        self.colors[index % self.colors.len()]
    }

    /// The stock palettes, in display order.
    pub fn builtin() -> Vec<Arc<Palette>> {
        fn stock(name: &str, colors: &[u32], accent: u32) -> Arc<Palette> {
            Arc::new(Palette {
                name: name.to_string(),
                colors: colors.iter().copied().map(Color::new).collect(),
                accent: Color::new(accent),
            })
        }

        vec![
            stock("Cyberpunk", &[0xff00ff, 0x00ffff, 0xff1493, 0x7b68ee], 0xff00ff),
            stock("Acid", &[0x00ff41, 0x39ff14, 0xadff2f, 0x7fff00], 0x00ff41),
            stock("Sunset", &[0xff4500, 0xff6347, 0xff8c00, 0xffd700], 0xff4500),
            stock("Frost", &[0x00bfff, 0x87ceeb, 0x4169e1, 0x00ced1], 0x00bfff),
            stock("Mono", &[0xffffff, 0xcccccc, 0x999999, 0x666666], 0xffffff),
        ]
    }

    /// The palette applied when nothing else is selected: the first of the
    /// built-in set.
    pub fn default_palette() -> Arc<Palette> {
        Self::builtin().swap_remove(0)
    }

    /// Case-insensitive lookup over the built-in set.
    pub fn named(name: &str) -> Option<Arc<Palette>> {
        Self::builtin()
            .into_iter()
            .find(|palette| palette.name.eq_ignore_ascii_case(name))
    }
}
