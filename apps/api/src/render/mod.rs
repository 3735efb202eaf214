//! Raster output for a committed layout.
//!
//! # Colour rules
//! - `Palette`: fixed palette indexed by rank (wraps around).
//! - `GrayscaleByRank`: rank 0 is darkest, later ranks fade toward light grey.
//!
//! The PNG artifact lives at a fixed public path and is replaced on every run.

use std::io::Cursor;
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{imageops, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::layout::Placement;

/// Directory under the static root holding the rendered cloud.
pub const ARTIFACT_DIR: &str = "uploads";
pub const ARTIFACT_FILE: &str = "wordcloud.png";

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[rustfmt::skip]
const PALETTE: [[u8; 3]; 8] = [
    [0x1f, 0x77, 0xb4], [0xff, 0x7f, 0x0e], [0x2c, 0xa0, 0x2c], [0xd6, 0x27, 0x28],
    [0x94, 0x67, 0xbd], [0x8c, 0x56, 0x4b], [0xe3, 0x77, 0xc2], [0x17, 0xbe, 0xcf],
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to persist artifact: {0}")]
    Persist(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRule {
    Palette,
    GrayscaleByRank,
}

impl std::str::FromStr for ColorRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "palette" => Ok(ColorRule::Palette),
            "grayscale" | "greyscale" | "grayscale_by_rank" => Ok(ColorRule::GrayscaleByRank),
            other => Err(format!("unknown color rule '{other}'")),
        }
    }
}

impl ColorRule {
    /// Colour for the word at `rank` out of `total` placed words.
    pub fn color_for(self, rank: usize, total: usize) -> Rgba<u8> {
        match self {
            ColorRule::Palette => {
                let [r, g, b] = PALETTE[rank % PALETTE.len()];
                Rgba([r, g, b, 255])
            }
            ColorRule::GrayscaleByRank => {
                // 0 → near-black, last → light grey; never white on white.
                let span = total.saturating_sub(1).max(1) as f32;
                let t = (rank.min(total) as f32 / span).clamp(0.0, 1.0);
                let level = (20.0 + t * 180.0).round() as u8;
                Rgba([level, level, level, 255])
            }
        }
    }
}

/// Raster output capability. Returns encoded PNG bytes.
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        width: u32,
        height: u32,
        placements: &[Placement],
        rule: ColorRule,
    ) -> Result<Vec<u8>, RenderError>;
}

/// Draws words with `imageproc`; without a font, fills each glyph box instead.
pub struct ImageRenderer {
    font: Option<FontVec>,
}

impl ImageRenderer {
    pub fn new(font: Option<FontVec>) -> Self {
        Self { font }
    }

    fn paint(&self, canvas: &mut RgbaImage, placement: &Placement, color: Rgba<u8>) {
        let Some(font) = &self.font else {
            let rect = Rect::at(placement.x as i32, placement.y as i32)
                .of_size(placement.width.max(1), placement.height.max(1));
            draw_filled_rect_mut(canvas, rect, color);
            return;
        };

        let scale = PxScale::from(placement.font_size as f32);
        if !placement.rotated {
            draw_text_mut(
                canvas,
                color,
                placement.x as i32,
                placement.y as i32,
                scale,
                font,
                &placement.word.text,
            );
            return;
        }

        // Draw upright on a scratch tile, turn it 90° counter-clockwise, then
        // copy only the inked pixels so neighbouring words are untouched.
        let mut tile = RgbaImage::from_pixel(placement.height.max(1), placement.width.max(1), BACKGROUND);
        draw_text_mut(&mut tile, color, 0, 0, scale, font, &placement.word.text);
        let turned = imageops::rotate270(&tile);
        for (tx, ty, pixel) in turned.enumerate_pixels() {
            if *pixel == BACKGROUND {
                continue;
            }
            let (cx, cy) = (placement.x + i64::from(tx), placement.y + i64::from(ty));
            if cx >= 0 && cy >= 0 && (cx as u32) < canvas.width() && (cy as u32) < canvas.height() {
                canvas.put_pixel(cx as u32, cy as u32, *pixel);
            }
        }
    }
}

impl Renderer for ImageRenderer {
    fn render(
        &self,
        width: u32,
        height: u32,
        placements: &[Placement],
        rule: ColorRule,
    ) -> Result<Vec<u8>, RenderError> {
        let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);
        for placement in placements {
            let color = rule.color_for(placement.rank, placements.len());
            self.paint(&mut canvas, placement, color);
        }

        let mut bytes = Vec::new();
        canvas.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// Atomically replaces `<static_dir>/uploads/wordcloud.png` and returns the
/// public path relative to the static root.
pub fn write_artifact(static_dir: &Path, png: &[u8]) -> Result<String, RenderError> {
    let dir = static_dir.join(ARTIFACT_DIR);
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    std::io::Write::write_all(&mut tmp, png)?;
    let target = dir.join(ARTIFACT_FILE);
    tmp.persist(&target)
        .map_err(|e| RenderError::Persist(e.error.to_string()))?;

    info!(path = %target.display(), bytes = png.len(), "Word cloud image written");
    Ok(format!("{ARTIFACT_DIR}/{ARTIFACT_FILE}"))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
