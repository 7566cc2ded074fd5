//! Window inverted index and fuzzy matcher over token sequences.

use std::collections::{HashMap, HashSet};

use gram_core::{GramConfig, ModelError, ModelKind, Token, window_key};
use rank_core::{RankEntry, ResultSet};
use serde::{Deserialize, Serialize};

/// A matched lexicon sequence and its normalized strength.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenMatch<T: Token> {
    pub value: Vec<T>,
    pub strength: f64,
}

impl<T: Token> RankEntry for TokenMatch<T> {
    type Value = Vec<T>;

    fn value(&self) -> Vec<T> {
        self.value.clone()
    }

    fn score(&self) -> f64 {
        self.strength
    }
}

/// Exported logical model of a [`TokenFuzzy`] engine.
///
/// Sources are referenced by index into `lexicon_sequences`;
/// `identity_to_sequence` maps a full-sequence identity key to that index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenFuzzyModel<T: Token> {
    #[serde(rename = "type")]
    pub kind: ModelKind,
    pub n_gram_min: usize,
    pub n_gram_max: usize,
    pub max_results: usize,
    #[serde(default)]
    pub lexicon_sequences: Vec<Vec<T>>,
    #[serde(default)]
    pub identity_to_sequence: HashMap<String, usize>,
    #[serde(default)]
    pub ngram_dict: HashMap<String, Vec<usize>>,
}

/// Token-window fuzzy matcher over a trained sequence lexicon.
///
/// The shape mirrors the string matcher with two differences: sources are
/// referenced by lexicon index and keyed through encoded windows, and no
/// source length gate is applied.
pub struct TokenFuzzy<T: Token> {
    config: GramConfig,
    lexicon: Vec<Vec<T>>,
    exact_by_identity: HashMap<String, usize>,
    gram_index: HashMap<String, Vec<usize>>,
    results: ResultSet<TokenMatch<T>>,
    last_input: Option<String>,
}

impl<T: Token> TokenFuzzy<T> {
    /// Create an engine with clamped configuration.
    pub fn new(n_min: usize, n_max: usize, max_results: usize) -> Self {
        let config = GramConfig::new(n_min, n_max, max_results);
        TokenFuzzy {
            config,
            lexicon: Vec::new(),
            exact_by_identity: HashMap::new(),
            gram_index: HashMap::new(),
            results: ResultSet::new(config.max_results),
            last_input: None,
        }
    }

    pub fn config(&self) -> GramConfig {
        self.config
    }

    /// Replace the index with one built from `corpus`.
    ///
    /// Sequences with an already-interned identity key are skipped, so a
    /// posting never holds the same lexicon index twice.
    pub fn train(&mut self, corpus: &[impl AsRef<[T]>]) -> &mut Self {
        self.lexicon.clear();
        self.exact_by_identity.clear();
        self.gram_index.clear();
        self.results.clear();
        self.last_input = None;

        let mut seen = HashSet::new();
        for item in corpus {
            let seq = item.as_ref();
            let identity = window_key(seq);
            if self.exact_by_identity.contains_key(&identity) {
                continue;
            }
            let idx = self.lexicon.len();
            self.lexicon.push(seq.to_vec());
            self.exact_by_identity.insert(identity, idx);

            seen.clear();
            let top = self.config.n_max.min(seq.len());
            for k in self.config.n_min..=top {
                for window in seq.windows(k) {
                    let key = window_key(window);
                    if seen.insert(key.clone()) {
                        self.gram_index.entry(key).or_default().push(idx);
                    }
                }
            }
        }
        self
    }

    /// Run a query, replacing the engine's result buffer.
    ///
    /// Re-running an input with the unchanged identity key is a no-op.
    pub fn search(&mut self, query: &[T]) -> &mut Self {
        let identity = window_key(query);
        if self.last_input.as_deref() == Some(identity.as_str()) {
            return self;
        }
        let entries = self.scan(query);
        self.results.clear();
        for entry in entries {
            self.results.push(entry);
        }
        self.last_input = Some(identity);
        self
    }

    /// Run a query without touching instance state.
    pub fn search_pure(&self, query: &[T]) -> ResultSet<TokenMatch<T>> {
        let mut set = ResultSet::new(self.config.max_results);
        for entry in self.scan(query) {
            set.push(entry);
        }
        set
    }

    /// Query (when given) and return the best-matching sequence.
    ///
    /// `None` re-reads the results of the cached input.
    pub fn search_best(&mut self, query: Option<&[T]>) -> Option<Vec<T>> {
        if let Some(query) = query {
            self.search(query);
        }
        self.top_value()
    }

    fn scan(&self, query: &[T]) -> Vec<TokenMatch<T>> {
        if query.is_empty() {
            return Vec::new();
        }
        if let Some(&idx) = self.exact_by_identity.get(&window_key(query)) {
            let mut entries = vec![TokenMatch {
                value: self.lexicon[idx].clone(),
                strength: f64::INFINITY,
            }];
            normalize(&mut entries);
            return entries;
        }

        let len = query.len();
        let mut entries: Vec<TokenMatch<T>> = Vec::new();
        let mut admitted: HashMap<usize, usize> = HashMap::new();
        let mut seen = HashSet::new();

        let top = self.config.n_max.min(len);
        for k in (self.config.n_min..=top).rev() {
            for window in query.windows(k) {
                let key = window_key(window);
                if !seen.insert(key.clone()) {
                    continue;
                }
                let Some(posting) = self.gram_index.get(&key) else {
                    continue;
                };
                for &idx in posting {
                    if let Some(&slot) = admitted.get(&idx) {
                        entries[slot].strength += (k * k) as f64;
                    } else {
                        if admitted.len() >= self.config.max_results {
                            continue;
                        }
                        admitted.insert(idx, entries.len());
                        entries.push(TokenMatch {
                            value: self.lexicon[idx].clone(),
                            strength: 1.0,
                        });
                    }
                }
            }
        }
        normalize(&mut entries);
        entries
    }

    pub fn results(&mut self) -> &[TokenMatch<T>] {
        self.results.results()
    }

    pub fn values(&mut self) -> &[Vec<T>] {
        self.results.values()
    }

    pub fn scores(&mut self) -> &[f64] {
        self.results.scores()
    }

    pub fn top(&mut self) -> Option<&TokenMatch<T>> {
        self.results.top()
    }

    pub fn top_value(&mut self) -> Option<Vec<T>> {
        self.results.top_value()
    }

    pub fn top_score(&mut self) -> f64 {
        self.results.top_score()
    }

    /// Clone the config and index into a transportable model.
    pub fn export(&self) -> TokenFuzzyModel<T> {
        TokenFuzzyModel {
            kind: ModelKind::TokenFuzzy,
            n_gram_min: self.config.n_min,
            n_gram_max: self.config.n_max,
            max_results: self.config.max_results,
            lexicon_sequences: self.lexicon.clone(),
            identity_to_sequence: self.exact_by_identity.clone(),
            ngram_dict: self.gram_index.clone(),
        }
    }

    /// Replace config and index from an exported model.
    pub fn load(&mut self, model: TokenFuzzyModel<T>) -> Result<&mut Self, ModelError> {
        if model.kind != ModelKind::TokenFuzzy {
            return Err(ModelError::IncompatibleModel {
                expected: ModelKind::TokenFuzzy,
                found: model.kind,
            });
        }
        self.config = GramConfig::new(model.n_gram_min, model.n_gram_max, model.max_results);
        self.lexicon = model.lexicon_sequences;
        self.exact_by_identity = model.identity_to_sequence;
        self.gram_index = model.ngram_dict;
        self.results = ResultSet::new(self.config.max_results);
        self.last_input = None;
        Ok(self)
    }
}

impl<T: Token> Default for TokenFuzzy<T> {
    fn default() -> Self {
        TokenFuzzy::new(3, 5, 10)
    }
}

fn normalize<T: Token>(entries: &mut [TokenMatch<T>]) {
    if entries.iter().any(|e| e.strength.is_infinite()) {
        for entry in entries.iter_mut() {
            entry.strength = if entry.strength.is_infinite() { 1.0 } else { 0.0 };
        }
        return;
    }
    let total: f64 = entries.iter().map(|e| e.strength).sum();
    if total > 0.0 {
        for entry in entries.iter_mut() {
            entry.strength /= total;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEQ_A: [&str; 5] = ["IF", "ID", "ASSIGN", "NUM", "SEMI"];
    const SEQ_B: [&str; 6] = ["IF", "LP", "ID", "RP", "BO", "BC"];
    const SEQ_C: [&str; 4] = ["ID", "ASSIGN", "NUM", "SEMI"];

    fn statement_engine() -> TokenFuzzy<&'static str> {
        let mut engine = TokenFuzzy::new(1, 3, 10);
        engine.train(&[&SEQ_A[..], &SEQ_B[..], &SEQ_C[..]]);
        engine
    }

    // --- indexing ---

    #[test]
    fn train_interns_each_sequence_once() {
        let mut engine = TokenFuzzy::new(1, 3, 10);
        engine.train(&[&SEQ_A[..], &SEQ_A[..], &SEQ_B[..]]);
        let model = engine.export();
        assert_eq!(model.lexicon_sequences.len(), 2);
        assert_eq!(model.identity_to_sequence.len(), 2);
    }

    #[test]
    fn postings_hold_each_index_once() {
        let mut engine = TokenFuzzy::new(1, 2, 10);
        // "A" appears three times in one sequence.
        engine.train(&[["A", "A", "A"]]);
        let model = engine.export();
        for (_, posting) in &model.ngram_dict {
            assert_eq!(posting.len(), 1);
        }
    }

    #[test]
    fn postings_reference_sequences_containing_the_window() {
        let model = statement_engine().export();
        for (key, posting) in &model.ngram_dict {
            for &idx in posting {
                let seq = &model.lexicon_sequences[idx];
                let contains = (0..seq.len()).any(|start| {
                    (start..seq.len())
                        .map(|end| window_key(&seq[start..=end]))
                        .any(|candidate| candidate == *key)
                });
                assert!(contains, "sequence {idx} lacks window {key:?}");
            }
        }
    }

    // --- matching ---

    #[test]
    fn shared_windows_rank_longest_overlap_first() {
        let mut engine = statement_engine();
        engine.search(&["IF", "ID", "ASSIGN"]);
        assert_eq!(engine.top_value().unwrap(), SEQ_A.to_vec());
        // All three sequences share at least one token with the query.
        assert_eq!(engine.results().len(), 3);
        let total: f64 = engine.scores().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn exact_sequence_dominates() {
        let mut engine = statement_engine();
        engine.search(&SEQ_A);
        assert_eq!(engine.results().len(), 1);
        assert_eq!(engine.top_value().unwrap(), SEQ_A.to_vec());
        assert_eq!(engine.top_score(), 1.0);
    }

    #[test]
    fn empty_query_yields_no_results() {
        let mut engine = statement_engine();
        engine.search(&[]);
        assert!(engine.results().is_empty());
        assert_eq!(engine.top_score(), 0.0);
    }

    #[test]
    fn unknown_tokens_yield_no_results() {
        let mut engine = statement_engine();
        engine.search(&["WHILE", "DO"]);
        assert!(engine.results().is_empty());
    }

    #[test]
    fn no_length_gate_admits_long_sequences() {
        let mut engine = TokenFuzzy::new(1, 2, 10);
        let long: Vec<&str> = std::iter::repeat_n("X", 40)
            .chain(["IF"])
            .collect();
        engine.train(&[long.clone()]);
        // A single-token query still matches the 41-token sequence.
        engine.search(&["IF"]);
        assert_eq!(engine.top_value().unwrap(), long);
    }

    #[test]
    fn candidate_cap_admits_posting_order() {
        let mut engine = TokenFuzzy::new(1, 2, 2);
        let corpus: Vec<Vec<String>> = (0..6)
            .map(|i| vec![format!("T{i}"), "COMMON".to_string()])
            .collect();
        engine.train(&corpus);
        engine.search(&["COMMON".to_string()]);
        assert_eq!(engine.results().len(), 2);
        let values = engine.values().to_vec();
        assert_eq!(values[0][0], "T0");
        assert_eq!(values[1][0], "T1");
    }

    #[test]
    fn integer_tokens_work_through_the_blanket_impl() {
        let mut engine = TokenFuzzy::new(1, 2, 10);
        engine.train(&[[1u32, 2, 3], [4, 5, 6]]);
        engine.search(&[1u32, 2]);
        assert_eq!(engine.top_value().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn repeated_search_with_same_query_is_noop() {
        let mut engine = statement_engine();
        engine.search(&["IF", "ID"]);
        let before = engine.scores().to_vec();
        engine.search(&["IF", "ID"]);
        assert_eq!(engine.scores(), before.as_slice());
    }

    #[test]
    fn search_best_defaults_to_cached_query() {
        let mut engine = statement_engine();
        let first = engine.search_best(Some(&["IF", "ID", "ASSIGN"]));
        assert_eq!(engine.search_best(None), first);
    }

    #[test]
    fn search_pure_leaves_instance_untouched() {
        let mut engine = statement_engine();
        engine.search(&["IF", "ID", "ASSIGN"]);
        let cached = engine.scores().to_vec();

        let mut pure = engine.search_pure(&["ID", "ASSIGN"]);
        assert!(pure.top_value().is_some());
        assert_eq!(engine.scores(), cached.as_slice());
    }

    // --- export / load ---

    #[test]
    fn export_load_round_trips() {
        let engine = statement_engine();
        let model = engine.export();

        let mut restored: TokenFuzzy<&str> = TokenFuzzy::default();
        restored.load(model.clone()).unwrap();
        assert_eq!(restored.export(), model);

        restored.search(&["IF", "ID", "ASSIGN"]);
        assert_eq!(restored.top_value().unwrap(), SEQ_A.to_vec());
    }

    #[test]
    fn load_rejects_foreign_kind() {
        let mut model = statement_engine().export();
        model.kind = ModelKind::StringPredict;
        let mut engine: TokenFuzzy<&str> = TokenFuzzy::default();
        assert!(engine.load(model).is_err());
    }

    #[test]
    fn model_json_round_trips_with_owned_tokens() {
        let mut engine: TokenFuzzy<String> = TokenFuzzy::new(1, 3, 10);
        let corpus: Vec<Vec<String>> = vec![
            SEQ_A.iter().map(|s| s.to_string()).collect(),
            SEQ_B.iter().map(|s| s.to_string()).collect(),
        ];
        engine.train(&corpus);

        let json = serde_json::to_string(&engine.export()).unwrap();
        let model: TokenFuzzyModel<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(model, engine.export());
        assert_eq!(serde_json::to_value(&model).unwrap()["type"], "NgramTokenFuzzy");
    }
}
