//! Character-alphabet gramdex engines.
//!
//! [`StringFuzzy`] ranks trained lexicon strings by substring overlap with
//! a query; [`StringPredict`] predicts the most likely next character after
//! a prefix by blending variable-order context statistics. Both treat a
//! string as its sequence of `char`s and optionally lower-case corpus and
//! query before all other processing.

mod fuzzy;
mod predict;

pub use fuzzy::{FuzzyMatch, StringFuzzy, StringFuzzyModel};
pub use predict::{ContextEntry, StringPredict, StringPredictModel};
