//! Size Scaler: maps a word's weight to a font size in pixels.
//!
//! # Scaling rules
//! - rank 0 (the heaviest word) always gets `max_font_size`
//! - every other word lands in `[min_font_size, max_font_size]`
//! - larger relative weight never yields a smaller size (monotonic)
//!
//! `Sqrt` and `Log` compress skewed distributions so a single dominant word
//! does not swallow the canvas.

use crate::layout::frequency::WeightedWord;
use crate::layout::{LayoutConfig, ScalingMode};

/// Returns the target font size for `word` at position `rank` in processing order.
pub fn scale(word: &WeightedWord, rank: usize, max_weight: f64, config: &LayoutConfig) -> u32 {
    let min = config.min_font_size;
    let max = config.max_font_size.max(min);
    if rank == 0 {
        return max;
    }
    if !(max_weight > 0.0) || !(word.weight > 0.0) {
        return min;
    }

    let relative = (word.weight / max_weight).clamp(0.0, 1.0);
    let fraction = match config.scaling_mode {
        ScalingMode::Linear => relative,
        ScalingMode::Sqrt => relative.sqrt(),
        ScalingMode::Log => (1.0 + word.weight).ln() / (1.0 + max_weight).ln(),
    }
    .clamp(0.0, 1.0);

    let span = f64::from(max - min);
    let size = f64::from(min) + span * fraction;
    (size.round() as u32).clamp(min, max)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn word(weight: f64) -> WeightedWord {
        WeightedWord {
            text: "好".to_string(),
            weight,
        }
    }

    fn config(mode: ScalingMode) -> LayoutConfig {
        LayoutConfig {
            min_font_size: 10,
            max_font_size: 110,
            scaling_mode: mode,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn test_top_rank_gets_max_size() {
        for mode in [ScalingMode::Linear, ScalingMode::Sqrt, ScalingMode::Log] {
            assert_eq!(scale(&word(3.0), 0, 3.0, &config(mode)), 110);
        }
    }

    #[test]
    fn test_linear_is_proportional() {
        let cfg = config(ScalingMode::Linear);
        // 10 + 100 * 0.5 = 60
        assert_eq!(scale(&word(5.0), 1, 10.0, &cfg), 60);
    }

    #[test]
    fn test_sqrt_compresses_relative_to_linear() {
        let linear = scale(&word(1.0), 3, 100.0, &config(ScalingMode::Linear));
        let sqrt = scale(&word(1.0), 3, 100.0, &config(ScalingMode::Sqrt));
        // sqrt(0.01) = 0.1 → 10 + 10 = 20; linear → 10 + 1 = 11
        assert_eq!(sqrt, 20);
        assert_eq!(linear, 11);
        assert!(sqrt > linear);
    }

    #[test]
    fn test_log_compresses_relative_to_linear() {
        let linear = scale(&word(2.0), 3, 1000.0, &config(ScalingMode::Linear));
        let log = scale(&word(2.0), 3, 1000.0, &config(ScalingMode::Log));
        assert!(log > linear, "log {log} should exceed linear {linear}");
    }

    #[test]
    fn test_tiny_weight_hits_floor() {
        let cfg = config(ScalingMode::Linear);
        assert_eq!(scale(&word(0.0001), 50, 1_000_000.0, &cfg), 10);
    }

    #[test]
    fn test_size_always_within_bounds() {
        for mode in [ScalingMode::Linear, ScalingMode::Sqrt, ScalingMode::Log] {
            let cfg = config(mode);
            for w in [0.5, 1.0, 7.0, 49.0, 50.0, 80.0] {
                let size = scale(&word(w), 2, 50.0, &cfg);
                assert!((10..=110).contains(&size), "{mode:?} weight {w} gave {size}");
            }
        }
    }

    #[test]
    fn test_monotonic_in_weight() {
        for mode in [ScalingMode::Linear, ScalingMode::Sqrt, ScalingMode::Log] {
            let cfg = config(mode);
            let mut previous = 0;
            for w in 1..=40 {
                let size = scale(&word(f64::from(w)), 1, 40.0, &cfg);
                assert!(size >= previous, "{mode:?} not monotonic at weight {w}");
                previous = size;
            }
        }
    }

    #[test]
    fn test_equal_min_and_max() {
        let cfg = LayoutConfig {
            min_font_size: 24,
            max_font_size: 24,
            ..LayoutConfig::default()
        };
        assert_eq!(scale(&word(1.0), 4, 9.0, &cfg), 24);
    }
}
