//! Token-alphabet gramdex engines.
//!
//! [`TokenFuzzy`] ranks trained token sequences by shared windows with a
//! query sequence; [`TokenPredict`] predicts the most likely next token
//! after a prefix. Both are generic over any [`gram_core::Token`], a value
//! with equality and a canonical string projection, and key all index
//! state by encoded windows, so token identity flows entirely through that
//! projection.

mod fuzzy;
mod predict;

pub use fuzzy::{TokenFuzzy, TokenFuzzyModel, TokenMatch};
pub use predict::{TokenContextEntry, TokenCount, TokenPredict, TokenPredictModel};
