//! Layout Engine: drives one word-cloud layout run.
//!
//! # State machine
//! `Init → Processing(word_index) → Done`
//! - `Init` validates the canvas and builds an empty `OccupancyGrid`.
//! - `Processing` handles words in non-increasing weight order: scale → measure →
//!   spiral search with back-off → commit → record. Exhausted words are skipped.
//! - `Done` is reached after the last word, or early when the `LayoutBudget`
//!   runs out (remaining words are skipped, never dropped silently).
//!
//! Each engine owns its grid and seeded RNG, so concurrent runs share nothing
//! and the same input + seed always yields the same result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::layout::font_metrics::GlyphMeasurer;
use crate::layout::frequency::{aggregate, WeightedWord};
use crate::layout::occupancy::OccupancyGrid;
use crate::layout::scaler::scale;
use crate::layout::search::{place_with_backoff, BackoffOutcome};
use crate::layout::{LayoutConfig, LayoutError};

/// Maximum anchor offset from the canvas centre, as a fraction of each dimension.
const ANCHOR_JITTER: f64 = 0.05;

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// A committed word. `width`/`height` are the glyph box as drawn (already
/// swapped when `rotated`); the reserved margin is not included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub word: WeightedWord,
    pub font_size: u32,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    pub rotated: bool,
    /// Position of the word in processing order (0 = heaviest).
    pub rank: usize,
}

impl Placement {
    /// True if the two glyph rectangles share at least one pixel.
    pub fn overlaps(&self, other: &Placement) -> bool {
        self.x < other.x + i64::from(other.width)
            && other.x < self.x + i64::from(self.width)
            && self.y < other.y + i64::from(other.height)
            && other.y < self.y + i64::from(self.height)
    }
}

/// Outcome of one run. Partial layouts are valid results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub placements: Vec<Placement>,
    /// Words that could not be placed, in processing order.
    pub skipped: Vec<WeightedWord>,
    /// Words cut by `max_words` before layout began. Not failures.
    pub excluded: usize,
    /// True if the budget ran out before every word was attempted.
    pub interrupted: bool,
}

/// Cooperative stop conditions checked between words.
#[derive(Debug, Clone, Default)]
pub struct LayoutBudget {
    pub deadline: Option<Instant>,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl LayoutBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn exhausted(&self) -> bool {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayoutState {
    Init,
    Processing(usize),
    Done,
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Lays out the given (already grammatically filtered) tokens.
///
/// Setup failures (`InvalidConfig`, `InvalidCanvas`, `EmptyInput`) abort the run.
pub fn layout<S: AsRef<str>>(
    words: &[S],
    config: &LayoutConfig,
    measurer: &dyn GlyphMeasurer,
    budget: &LayoutBudget,
) -> Result<LayoutResult, LayoutError> {
    let engine = LayoutEngine::new(config.clone(), measurer)?;
    let mut ranked = aggregate(words)?;

    let excluded = ranked.len().saturating_sub(config.max_words);
    ranked.truncate(config.max_words);

    let mut result = engine.run(ranked, budget);
    result.excluded = excluded;
    Ok(result)
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

/// Single-run layout engine. Consumed by `run`.
pub struct LayoutEngine<'m> {
    config: LayoutConfig,
    measurer: &'m dyn GlyphMeasurer,
    grid: OccupancyGrid,
    rng: StdRng,
    state: LayoutState,
}

impl<'m> LayoutEngine<'m> {
    /// `Init`: validates config and canvas and builds an empty grid.
    pub fn new(config: LayoutConfig, measurer: &'m dyn GlyphMeasurer) -> Result<Self, LayoutError> {
        config.validate()?;
        let (width, height) = canvas_dims(&config)?;
        let grid = OccupancyGrid::new(width, height, config.cell_size);
        Ok(Self::with_grid(config, measurer, grid))
    }

    /// Starts from an existing grid, e.g. one with reserved regions.
    pub fn with_grid(config: LayoutConfig, measurer: &'m dyn GlyphMeasurer, grid: OccupancyGrid) -> Self {
        let rng = StdRng::seed_from_u64(config.random_seed);
        Self {
            config,
            measurer,
            grid,
            rng,
            state: LayoutState::Init,
        }
    }

    /// Runs `Processing` over `words` until `Done`.
    pub fn run(mut self, mut words: Vec<WeightedWord>, budget: &LayoutBudget) -> LayoutResult {
        // Stable: equal weights keep input order.
        words.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        let max_weight = words.first().map_or(0.0, |w| w.weight);

        let mut placements = Vec::with_capacity(words.len());
        let mut skipped = Vec::new();
        let mut interrupted = false;

        let mut queue = words.into_iter().enumerate();
        self.state = LayoutState::Processing(0);
        while let LayoutState::Processing(_) = self.state {
            let Some((rank, word)) = queue.next() else {
                self.state = LayoutState::Done;
                break;
            };
            self.state = LayoutState::Processing(rank);

            if budget.exhausted() {
                warn!(
                    remaining = queue.len() + 1,
                    "Layout budget exhausted; skipping remaining words"
                );
                interrupted = true;
                skipped.push(word);
                skipped.extend(queue.by_ref().map(|(_, w)| w));
                self.state = LayoutState::Done;
                break;
            }

            let outcome = self.place_word(rank, &word, max_weight);
            match outcome.position {
                Some(found) => {
                    self.grid.commit(
                        found.x,
                        found.y,
                        found.glyph.width + self.config.margin,
                        found.glyph.height + self.config.margin,
                    );
                    placements.push(Placement {
                        word,
                        font_size: found.font_size,
                        x: found.x,
                        y: found.y,
                        width: found.glyph.width,
                        height: found.glyph.height,
                        rotated: found.rotated,
                        rank,
                    });
                }
                None => {
                    debug!(
                        word = %word.text,
                        attempts = outcome.attempted_sizes.len(),
                        "No room for word; skipping"
                    );
                    skipped.push(word);
                }
            }
        }

        debug!(
            placed = placements.len(),
            skipped = skipped.len(),
            fill = self.grid.fill_ratio(),
            "Layout run finished"
        );

        LayoutResult {
            canvas_width: self.grid.width(),
            canvas_height: self.grid.height(),
            placements,
            skipped,
            excluded: 0,
            interrupted,
        }
    }

    /// Searches for a spot for one word without committing it.
    ///
    /// Draws from the run's RNG (orientation, then anchor jitter), so calls must
    /// happen in processing order to stay reproducible.
    pub(crate) fn place_word(&mut self, rank: usize, word: &WeightedWord, max_weight: f64) -> BackoffOutcome {
        let size = scale(word, rank, max_weight, &self.config);

        let prefer_horizontal = f64::from(self.config.prefer_horizontal);
        let horizontal_first = self.rng.random_bool(prefer_horizontal.clamp(0.0, 1.0));
        let orientations: &[bool] = match (prefer_horizontal, horizontal_first) {
            (p, _) if p >= 1.0 => &[false],
            (p, _) if p <= 0.0 => &[true],
            (_, true) => &[false, true],
            (_, false) => &[true, false],
        };

        let (w, h) = (f64::from(self.grid.width()), f64::from(self.grid.height()));
        let jitter_x = self.rng.random_range(-ANCHOR_JITTER..=ANCHOR_JITTER) * w;
        let jitter_y = self.rng.random_range(-ANCHOR_JITTER..=ANCHOR_JITTER) * h;
        let anchor = (w / 2.0 + jitter_x, h / 2.0 + jitter_y);

        place_with_backoff(
            &word.text,
            size,
            orientations,
            self.measurer,
            &self.grid,
            anchor,
            &self.config,
        )
    }
}

fn canvas_dims(config: &LayoutConfig) -> Result<(u32, u32), LayoutError> {
    let invalid = || LayoutError::InvalidCanvas {
        width: config.canvas_width,
        height: config.canvas_height,
    };
    if config.canvas_width <= 0 || config.canvas_height <= 0 {
        return Err(invalid());
    }
    let width = u32::try_from(config.canvas_width).map_err(|_| invalid())?;
    let height = u32::try_from(config.canvas_height).map_err(|_| invalid())?;
    Ok((width, height))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
