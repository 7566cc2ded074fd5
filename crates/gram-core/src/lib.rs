//! Shared vocabulary for the gramdex engines: clamped n-gram configuration,
//! the [`Token`] abstraction, deterministic window-key encoding, and the
//! model type tags used by export/load.
//!
//! This crate is intentionally minimal: no engine logic, no collections of
//! its own. Every other gramdex crate depends on it, so everything here is
//! a leaf-level building block.

use std::fmt::{self, Debug, Display};
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result cap applied when a caller passes `0` for `max_results`.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// N-gram bounds and result cap shared by all four engines.
///
/// Invariants: `1 <= n_min <= n_max` and `max_results >= 1`. Both are
/// maintained by clamping at construction and on model load; invalid
/// values are repaired silently, never surfaced as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GramConfig {
    /// Smallest gram/context length enumerated.
    pub n_min: usize,
    /// Largest gram/context length enumerated.
    pub n_max: usize,
    /// Result cap; also the candidate-admission cap during fuzzy scans.
    pub max_results: usize,
}

impl GramConfig {
    /// Build a config, clamping out-of-range values.
    ///
    /// `n_min` is raised to at least 1, `n_max` to at least `n_min`, and a
    /// `max_results` of 0 falls back to [`DEFAULT_MAX_RESULTS`].
    pub fn new(n_min: usize, n_max: usize, max_results: usize) -> Self {
        let n_min = n_min.max(1);
        GramConfig {
            n_min,
            n_max: n_max.max(n_min),
            max_results: if max_results == 0 {
                DEFAULT_MAX_RESULTS
            } else {
                max_results
            },
        }
    }
}

/// A symbol usable by the token engines.
///
/// A token is any value with equality and a canonical string projection:
/// the `Display` impl. The engines never inspect tokens beyond that
/// projection: all indexing, matching, and deduplication flows through
/// encoded window keys, so observable token equality is equality of
/// projections.
///
/// The blanket impl means strings, integers, and plain enums all qualify
/// without any ceremony.
pub trait Token: Clone + Eq + Hash + Debug + Display {}

impl<T: Clone + Eq + Hash + Debug + Display> Token for T {}

/// Encode a window of tokens as a deterministic string key.
///
/// The format is `"<len>:<tok0>|<tok1>|…|<tokN-1>"`. The length prefix
/// keeps windows of different sizes that join to the same text from
/// colliding. The key over a full sequence doubles as that sequence's
/// *identity key* for exact matching.
///
/// # Examples
///
/// ```
/// use gram_core::window_key;
///
/// assert_eq!(window_key(&["if", "id"]), "2:if|id");
/// assert_eq!(window_key::<u32>(&[]), "0:");
/// ```
pub fn window_key<T: Token>(window: &[T]) -> String {
    use std::fmt::Write as _;

    let mut key = String::new();
    let _ = write!(key, "{}:", window.len());
    for (i, tok) in window.iter().enumerate() {
        if i > 0 {
            key.push('|');
        }
        let _ = write!(key, "{tok}");
    }
    key
}

/// Type tag carried by every exported model.
///
/// Serialized under the `"type"` field using the wire names below; `load`
/// rejects a model whose tag does not match the receiving engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "NgramStringFuzzy")]
    StringFuzzy,
    #[serde(rename = "NgramStringPredict")]
    StringPredict,
    #[serde(rename = "NgramTokenFuzzy")]
    TokenFuzzy,
    #[serde(rename = "NgramTokenPredict")]
    TokenPredict,
}

impl Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ModelKind::StringFuzzy => "NgramStringFuzzy",
            ModelKind::StringPredict => "NgramStringPredict",
            ModelKind::TokenFuzzy => "NgramTokenFuzzy",
            ModelKind::TokenPredict => "NgramTokenPredict",
        };
        f.write_str(tag)
    }
}

/// The single failure surfaced by the engines.
///
/// Every other error condition (empty input, unknown grams, out-of-range
/// config) is recovered locally as "no results" or a clamped value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// `load` was handed a model exported by a different engine variant.
    #[error("incompatible model: expected {expected}, got {found}")]
    IncompatibleModel {
        expected: ModelKind,
        found: ModelKind,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_passes_valid_values_through() {
        let config = GramConfig::new(2, 5, 7);
        assert_eq!(config.n_min, 2);
        assert_eq!(config.n_max, 5);
        assert_eq!(config.max_results, 7);
    }

    #[test]
    fn config_clamps_zero_n_min() {
        let config = GramConfig::new(0, 5, 10);
        assert_eq!(config.n_min, 1);
    }

    #[test]
    fn config_clamps_n_max_below_n_min() {
        let config = GramConfig::new(4, 2, 10);
        assert_eq!(config.n_min, 4);
        assert_eq!(config.n_max, 4);
    }

    #[test]
    fn config_zero_max_results_falls_back() {
        let config = GramConfig::new(1, 3, 0);
        assert_eq!(config.max_results, DEFAULT_MAX_RESULTS);
    }

    #[test]
    fn window_key_format() {
        assert_eq!(window_key(&["a", "b", "c"]), "3:a|b|c");
        assert_eq!(window_key(&[42u32]), "1:42");
    }

    #[test]
    fn window_key_length_prefix_disambiguates() {
        // One token containing the separator vs. two tokens.
        assert_eq!(window_key(&["a|b"]), "1:a|b");
        assert_eq!(window_key(&["a", "b"]), "2:a|b");
        assert_ne!(window_key(&["a|b"]), window_key(&["a", "b"]));
    }

    #[test]
    fn window_key_empty() {
        assert_eq!(window_key::<String>(&[]), "0:");
    }

    #[test]
    fn model_kind_wire_names() {
        let json = serde_json::to_string(&ModelKind::TokenPredict).unwrap();
        assert_eq!(json, "\"NgramTokenPredict\"");
        let back: ModelKind = serde_json::from_str("\"NgramStringFuzzy\"").unwrap();
        assert_eq!(back, ModelKind::StringFuzzy);
    }

    #[test]
    fn model_kind_display_matches_wire_name() {
        assert_eq!(ModelKind::StringPredict.to_string(), "NgramStringPredict");
    }

    #[test]
    fn model_error_message_names_both_kinds() {
        let err = ModelError::IncompatibleModel {
            expected: ModelKind::StringFuzzy,
            found: ModelKind::TokenFuzzy,
        };
        let message = err.to_string();
        assert!(message.contains("NgramStringFuzzy"));
        assert!(message.contains("NgramTokenFuzzy"));
    }
}
