//! Frequency Aggregator: turns a flat token stream into ranked weighted words.
//!
//! Ranking is by occurrence count, descending. Ties keep the order in which each
//! word was first seen, so the output is a pure function of the input sequence.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::layout::LayoutError;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// A word paired with its frequency-derived weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedWord {
    pub text: String,
    /// Occurrence count. Always > 0.
    pub weight: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregation
// ────────────────────────────────────────────────────────────────────────────

/// Counts exact-match occurrences and returns words sorted by weight descending.
///
/// Blank tokens are not countable. Fails with `LayoutError::EmptyInput` when
/// nothing countable remains.
pub fn aggregate<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<WeightedWord>, LayoutError> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, u64)> = Vec::new();

    for token in tokens {
        let text = token.as_ref().trim();
        if text.is_empty() {
            continue;
        }
        match index.get(text) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(text, counts.len());
                counts.push((text, 1));
            }
        }
    }

    if counts.is_empty() {
        return Err(LayoutError::EmptyInput);
    }

    // `sort_by` is stable: equal counts stay in first-seen order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    Ok(counts
        .into_iter()
        .map(|(text, count)| WeightedWord {
            text: text.to_string(),
            weight: count as f64,
        })
        .collect())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_counts_and_sorts_descending() {
        let words = aggregate(&["好", "美丽", "好", "快", "好", "美丽"]).unwrap();
        let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["好", "美丽", "快"]);
        assert_eq!(words[0].weight, 3.0);
        assert_eq!(words[1].weight, 2.0);
        assert_eq!(words[2].weight, 1.0);
    }

    #[test]
    fn test_aggregate_ties_keep_first_seen_order() {
        let words = aggregate(&["c", "a", "b", "a", "c", "b"]).unwrap();
        let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_aggregate_is_exact_match() {
        let words = aggregate(&["Big", "big"]).unwrap();
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn test_aggregate_empty_input_fails() {
        let empty: [&str; 0] = [];
        assert!(matches!(aggregate(&empty), Err(LayoutError::EmptyInput)));
    }

    #[test]
    fn test_aggregate_blank_tokens_are_not_countable() {
        assert!(matches!(
            aggregate(&["", "  ", "\n"]),
            Err(LayoutError::EmptyInput)
        ));
    }

    #[test]
    fn test_aggregate_weights_positive() {
        let words = aggregate(&["x", "y", "x"]).unwrap();
        assert!(words.iter().all(|w| w.weight > 0.0));
    }
}
