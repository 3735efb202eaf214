// Word-cloud layout engine.
// Implements: frequency ranking, font-size scaling, coarse occupancy grid,
// Archimedean spiral placement with font-size back-off.
// The whole run is CPU-bound and must be driven from tokio::task::spawn_blocking.

pub mod engine;
pub mod font_metrics;
pub mod frequency;
pub mod occupancy;
pub mod scaler;
pub mod search;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export the public API consumed by the HTTP layer and the renderer.
pub use engine::{layout, LayoutBudget, LayoutEngine, LayoutResult, Placement};
pub use font_metrics::{AbGlyphMeasurer, FontFamily, FontMetricMeasurer, GlyphBox, GlyphMeasurer};
pub use frequency::WeightedWord;

/// Errors that abort a whole layout run. Per-word failures never surface here.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("no countable words in input")]
    EmptyInput,

    #[error("invalid canvas {width}x{height}: dimensions must be positive")]
    InvalidCanvas { width: i64, height: i64 },

    #[error("invalid layout config: {0}")]
    InvalidConfig(String),
}

/// How relative weight is compressed before mapping into the font-size range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingMode {
    Linear,
    Sqrt,
    Log,
}

impl std::str::FromStr for ScalingMode {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(ScalingMode::Linear),
            "sqrt" => Ok(ScalingMode::Sqrt),
            "log" => Ok(ScalingMode::Log),
            other => Err(LayoutError::InvalidConfig(format!(
                "unknown scaling mode '{other}'"
            ))),
        }
    }
}

/// Parameters for one layout run.
///
/// Canvas dimensions are signed so a misconfigured value reaches the engine and
/// is rejected as `InvalidCanvas` instead of wrapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub canvas_width: i64,
    pub canvas_height: i64,
    pub min_font_size: u32,
    pub max_font_size: u32,
    pub scaling_mode: ScalingMode,
    /// Only the `max_words` highest-weight words enter the layout.
    pub max_words: usize,
    pub random_seed: u64,
    pub max_backoff_attempts: u32,
    /// Probability that a word is tried horizontally first (0.0 – 1.0).
    pub prefer_horizontal: f32,
    /// Free pixels reserved right of and below every glyph box.
    pub margin: u32,
    /// Edge length in pixels of one occupancy cell.
    pub cell_size: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800,
            canvas_height: 400,
            min_font_size: 8,
            max_font_size: 120,
            scaling_mode: ScalingMode::Sqrt,
            max_words: 100,
            random_seed: 42,
            max_backoff_attempts: 64,
            prefer_horizontal: 0.9,
            margin: 2,
            cell_size: 4,
        }
    }
}

impl LayoutConfig {
    /// Checks the font and orientation parameters. Canvas checks happen at `INIT`.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.min_font_size == 0 {
            return Err(LayoutError::InvalidConfig(
                "min_font_size must be at least 1".to_string(),
            ));
        }
        if self.min_font_size > self.max_font_size {
            return Err(LayoutError::InvalidConfig(format!(
                "min_font_size {} exceeds max_font_size {}",
                self.min_font_size, self.max_font_size
            )));
        }
        if !(0.0..=1.0).contains(&self.prefer_horizontal) {
            return Err(LayoutError::InvalidConfig(format!(
                "prefer_horizontal {} outside 0.0..=1.0",
                self.prefer_horizontal
            )));
        }
        if self.max_words == 0 {
            return Err(LayoutError::InvalidConfig(
                "max_words must be at least 1".to_string(),
            ));
        }
        if self.cell_size == 0 {
            return Err(LayoutError::InvalidConfig(
                "cell_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
