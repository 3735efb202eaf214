//! Glyph measurement: turns (word, font size) into the pixel box the renderer will fill.
//!
//! Two measurers are provided:
//! - `AbGlyphMeasurer` measures with the real TTF the renderer draws with.
//! - `FontMetricMeasurer` uses static em-width tables. It is the fallback when no
//!   font file is available and the deterministic measurer used by tests.
//!
//! Static tables cover ASCII 0x20..=0x7E (95 printable characters), index =
//! `(char as usize) - 32`. East Asian wide characters are one full em; any other
//! non-ASCII character falls back to `average_char_width`.

use ab_glyph::{FontVec, PxScale};
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Glyph box + measurer trait
// ────────────────────────────────────────────────────────────────────────────

/// Axis-aligned pixel footprint of a word rendered at a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlyphBox {
    pub width: u32,
    pub height: u32,
}

impl GlyphBox {
    /// The box of the same word drawn rotated by 90°.
    pub fn rotated(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// Text-measurement capability. Must be a pure function of its inputs.
pub trait GlyphMeasurer: Send + Sync {
    fn measure(&self, word: &str, font_size: u32) -> GlyphBox;
}

// ────────────────────────────────────────────────────────────────────────────
// Font family enum
// ────────────────────────────────────────────────────────────────────────────

/// Font families with a static metric table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    /// Chinese sans-serif; Latin glyphs are half-width.
    SimHei,
    /// Proportional Latin sans-serif with full-width CJK fallback.
    Inter,
}

impl std::str::FromStr for FontFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simhei" => Ok(FontFamily::SimHei),
            "inter" => Ok(FontFamily::Inter),
            other => Err(format!("unknown font family '{other}' (expected simhei or inter)")),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for a font family. All widths are in em units.
pub struct FontMetricTable {
    widths: [f32; 95],
    /// Fallback width for non-ASCII, non-wide characters.
    pub average_char_width: f32,
    /// Width of East Asian wide characters.
    pub wide_char_width: f32,
    /// Line box height as a multiple of the font size.
    pub line_height: f32,
}

impl FontMetricTable {
    /// Measures the rendered width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    self.widths[code - 32]
                } else if is_wide(c) {
                    self.wide_char_width
                } else {
                    self.average_char_width
                }
            })
            .sum()
    }
}

/// East Asian wide and full-width ranges (Hangul, CJK, kana, full-width forms).
fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x3FFFD)
}

/// SimHei: Latin glyphs are fixed half-width.
static SIMHEI_TABLE: FontMetricTable = FontMetricTable {
    widths: [0.5; 95],
    average_char_width: 0.5,
    wide_char_width: 1.0,
    line_height: 1.0,
};

/// Inter: humanist sans-serif.
static INTER_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
        0.25, 0.30, 0.38, 0.56, 0.56, 0.89, 0.67, 0.22, 0.33, 0.33, 0.39, 0.59, 0.28, 0.33, 0.28, 0.31,
        // 0     1     2     3     4     5     6     7     8     9
        0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56,
        // :     ;     <     =     >     ?     @
        0.28, 0.28, 0.59, 0.59, 0.59, 0.50, 1.02,
        // A     B     C     D     E     F     G     H     I     J     K     L     M
        0.67, 0.61, 0.61, 0.67, 0.56, 0.50, 0.67, 0.67, 0.25, 0.39, 0.61, 0.53, 0.78,
        // N     O     P     Q     R     S     T     U     V     W     X     Y     Z
        0.67, 0.72, 0.56, 0.72, 0.61, 0.50, 0.56, 0.67, 0.67, 0.89, 0.61, 0.61, 0.56,
        // [     \     ]     ^     _     `
        0.28, 0.31, 0.28, 0.47, 0.56, 0.34,
        // a     b     c     d     e     f     g     h     i     j     k     l     m
        0.56, 0.56, 0.50, 0.56, 0.56, 0.31, 0.56, 0.56, 0.22, 0.22, 0.53, 0.22, 0.83,
        // n     o     p     q     r     s     t     u     v     w     x     y     z
        0.56, 0.56, 0.56, 0.56, 0.33, 0.44, 0.39, 0.56, 0.50, 0.72, 0.50, 0.50, 0.44,
        // {     |     }     ~
        0.33, 0.26, 0.33, 0.59,
    ],
    average_char_width: 0.52,
    wide_char_width: 1.0,
    line_height: 1.2,
};

/// Returns the static metric table for a given font family.
pub fn get_metrics(font: &FontFamily) -> &'static FontMetricTable {
    match font {
        FontFamily::SimHei => &SIMHEI_TABLE,
        FontFamily::Inter => &INTER_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Measurers
// ────────────────────────────────────────────────────────────────────────────

/// Table-driven measurer. Deterministic and font-file free.
#[derive(Debug, Clone, Copy)]
pub struct FontMetricMeasurer {
    pub font: FontFamily,
}

impl FontMetricMeasurer {
    pub fn new(font: FontFamily) -> Self {
        Self { font }
    }
}

impl GlyphMeasurer for FontMetricMeasurer {
    fn measure(&self, word: &str, font_size: u32) -> GlyphBox {
        let metrics = get_metrics(&self.font);
        let size = font_size as f32;
        GlyphBox {
            width: ((metrics.measure_str(word) * size).ceil() as u32).max(1),
            height: ((metrics.line_height * size).ceil() as u32).max(1),
        }
    }
}

/// Measures with a loaded TrueType/OpenType font.
pub struct AbGlyphMeasurer {
    font: FontVec,
}

impl AbGlyphMeasurer {
    pub fn new(font: FontVec) -> Self {
        Self { font }
    }
}

impl GlyphMeasurer for AbGlyphMeasurer {
    fn measure(&self, word: &str, font_size: u32) -> GlyphBox {
        let (width, height) =
            imageproc::drawing::text_size(PxScale::from(font_size as f32), &self.font, word);
        GlyphBox {
            width: width.max(1),
            height: height.max(font_size).max(1),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
