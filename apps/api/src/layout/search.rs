//! Placement Search: Archimedean spiral probing with font-size back-off.
//!
//! # Spiral
//! `r(θ) = a·θ` with `a = pitch / 2π` and `pitch = step / 2`, so successive turns
//! are half a step apart. The angular increment is `pitch / r`, keeping
//! consecutive samples roughly `pitch` pixels apart along the arc. At half-cell
//! pitch every grid cell receives at least one sample, so total work is
//! O(area / step²). Each sample is snapped down to the occupancy cell grid
//! before probing, so a cell-aligned gap is found when it exactly fits.
//! The walk stops once `r` exceeds the distance from the anchor to the farthest
//! canvas corner.
//!
//! # Back-off
//! On `FAIL` the font size drops by 5% (at least 1px, never below
//! `min_font_size`) and the spiral restarts. The word is given up once the floor
//! fails or `max_backoff_attempts` reductions have been spent.

use std::f64::consts::TAU;

use crate::layout::font_metrics::{GlyphBox, GlyphMeasurer};
use crate::layout::occupancy::OccupancyGrid;
use crate::layout::LayoutConfig;

/// Fraction of the current size removed on each back-off step.
const BACKOFF_FRACTION: f64 = 0.05;

/// A collision-free spot for one glyph footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoundPosition {
    pub x: i64,
    pub y: i64,
    pub font_size: u32,
    pub glyph: GlyphBox,
    pub rotated: bool,
}

/// Result of placing one word, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffOutcome {
    pub position: Option<FoundPosition>,
    /// Every font size tried, in order. Strictly decreasing.
    pub attempted_sizes: Vec<u32>,
}

/// Walks the spiral around `anchor` and returns the top-left corner of the first
/// free `footprint`-sized rectangle, or `None` if the spiral leaves the canvas.
pub fn find_position(
    footprint: GlyphBox,
    grid: &OccupancyGrid,
    anchor: (f64, f64),
    step: f64,
) -> Option<(i64, i64)> {
    let (canvas_w, canvas_h) = (f64::from(grid.width()), f64::from(grid.height()));
    let (w, h) = (f64::from(footprint.width), f64::from(footprint.height));
    if footprint.width > grid.width() || footprint.height > grid.height() {
        return None;
    }

    let step = step.max(1.0);
    let pitch = step / 2.0;
    let a = pitch / TAU;
    let cell = f64::from(grid.cell_size());
    let max_radius = [(0.0, 0.0), (canvas_w, 0.0), (0.0, canvas_h), (canvas_w, canvas_h)]
        .iter()
        .map(|(cx, cy)| (cx - anchor.0).hypot(cy - anchor.1))
        .fold(0.0_f64, f64::max)
        + step;

    let mut theta = 0.0_f64;
    let mut last = None;
    loop {
        let r = a * theta;
        if r > max_radius {
            return None;
        }
        let cx = anchor.0 + r * theta.cos();
        let cy = anchor.1 + r * theta.sin();
        theta += pitch / r.max(pitch);

        // Snap to the cell grid, then clamp so edge candidates stay in the canvas.
        let x = snap(cx - w / 2.0, cell).clamp(0.0, canvas_w - w) as i64;
        let y = snap(cy - h / 2.0, cell).clamp(0.0, canvas_h - h) as i64;
        if last == Some((x, y)) {
            continue;
        }
        last = Some((x, y));

        if grid.probe(x, y, footprint.width, footprint.height) {
            return Some((x, y));
        }
    }
}

fn snap(v: f64, cell: f64) -> f64 {
    (v / cell).floor() * cell
}

/// Next font size after a failed attempt. Strictly smaller than `size` when
/// `size > min`.
pub fn next_font_size(size: u32, min: u32) -> u32 {
    if size <= min {
        return min;
    }
    let reduced = (f64::from(size) * (1.0 - BACKOFF_FRACTION)).floor() as u32;
    reduced.min(size - 1).max(min)
}

/// Searches for a spot for `text`, shrinking it until it fits or back-off runs out.
///
/// `orientations` lists the rotations to try at each size, in preference order.
pub fn place_with_backoff(
    text: &str,
    start_size: u32,
    orientations: &[bool],
    measurer: &dyn GlyphMeasurer,
    grid: &OccupancyGrid,
    anchor: (f64, f64),
    config: &LayoutConfig,
) -> BackoffOutcome {
    let min = config.min_font_size;
    let mut size = start_size.clamp(min, config.max_font_size.max(min));
    let mut attempted_sizes = Vec::new();
    let mut reductions = 0u32;
    let step = f64::from(config.cell_size);

    loop {
        attempted_sizes.push(size);
        let upright = measurer.measure(text, size);

        for &rotated in orientations {
            let glyph = if rotated { upright.rotated() } else { upright };
            let footprint = reserve_margin(glyph, config.margin, grid);
            if let Some((x, y)) = find_position(footprint, grid, anchor, step) {
                return BackoffOutcome {
                    position: Some(FoundPosition {
                        x,
                        y,
                        font_size: size,
                        glyph,
                        rotated,
                    }),
                    attempted_sizes,
                };
            }
        }

        if size <= min || reductions >= config.max_backoff_attempts {
            return BackoffOutcome {
                position: None,
                attempted_sizes,
            };
        }
        size = next_font_size(size, min);
        reductions += 1;
    }
}

/// Grows a glyph box by the inter-word margin, without pushing a glyph that
/// fits the canvas out of it.
pub fn reserve_margin(glyph: GlyphBox, margin: u32, grid: &OccupancyGrid) -> GlyphBox {
    GlyphBox {
        width: (glyph.width + margin).min(grid.width().max(glyph.width)),
        height: (glyph.height + margin).min(grid.height().max(glyph.height)),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
