//! Gramdex — in-memory n-gram indexing and scoring engines.
//!
//! Four engine variants share one architecture:
//!
//! - [`StringFuzzy`]: rank trained strings by substring overlap with a query.
//! - [`StringPredict`]: predict the next character after a prefix.
//! - [`TokenFuzzy`]: rank trained token sequences by shared windows.
//! - [`TokenPredict`]: predict the next token after a prefix.
//!
//! They differ only in the alphabet (characters vs. opaque [`Token`]s) and
//! the scoring objective (overlap strength vs. next-symbol probability).
//! All four accumulate into the same lazily finalized [`ResultSet`] and
//! export/load the same kind-tagged model shape.
//!
//! # Quick Start
//!
//! ```
//! use gramdex::{StringFuzzy, TokenPredict};
//!
//! let mut fuzzy = StringFuzzy::default();
//! fuzzy.train(&["apple", "applet", "banana"]);
//! assert_eq!(fuzzy.search_best(Some("appl")).as_deref(), Some("apple"));
//!
//! let mut predict = TokenPredict::new(1, 4, 10);
//! predict.train(&[["IF", "ID", "ASSIGN", "NUM"]]);
//! assert_eq!(predict.predict_best(Some(&["IF", "ID"])), Some("ASSIGN"));
//! ```

use std::fs;
use std::io;
use std::path::Path;

pub use gram_core::{DEFAULT_MAX_RESULTS, GramConfig, ModelError, ModelKind, Token, window_key};
pub use gramdex_string::{
    ContextEntry, FuzzyMatch, StringFuzzy, StringFuzzyModel, StringPredict, StringPredictModel,
};
pub use gramdex_token::{
    TokenContextEntry, TokenCount, TokenFuzzy, TokenFuzzyModel, TokenMatch, TokenPredict,
    TokenPredictModel,
};
pub use rank_core::{Prediction, RankEntry, ResultSet};

/// Load a training corpus from a text file: one entry per line, blank lines
/// and `#` comments skipped.
pub fn load_corpus(path: &Path) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| l.to_string())
        .collect())
}
