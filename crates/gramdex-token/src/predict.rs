//! Variable-order next-token prediction keyed by encoded windows.

use std::collections::{BTreeMap, HashMap};

use gram_core::{GramConfig, ModelError, ModelKind, Token, window_key};
use rank_core::{Prediction, ResultSet};
use serde::{Deserialize, Serialize};

/// One observed next token and how often it followed a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCount<T> {
    pub token: T,
    pub count: u64,
}

/// Next-token statistics for one encoded context window.
///
/// Counts are keyed by the token's string projection so iteration order,
/// and with it probability tie-breaking, is deterministic; the token value
/// itself rides along for result emission. `total` always equals the sum
/// of the counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenContextEntry<T> {
    pub counts: BTreeMap<String, TokenCount<T>>,
    pub total: u64,
}

impl<T> TokenContextEntry<T> {
    fn new() -> Self {
        TokenContextEntry {
            counts: BTreeMap::new(),
            total: 0,
        }
    }
}

/// Exported logical model of a [`TokenPredict`] engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPredictModel<T> {
    #[serde(rename = "type")]
    pub kind: ModelKind,
    pub n_gram_min: usize,
    pub n_gram_max: usize,
    pub max_results: usize,
    #[serde(default)]
    pub context_dict: HashMap<String, TokenContextEntry<T>>,
}

/// Next-token predictor blending variable-order window statistics.
///
/// Identical in shape to the string predictor with encoded token windows
/// as context keys.
pub struct TokenPredict<T: Token> {
    config: GramConfig,
    context_table: HashMap<String, TokenContextEntry<T>>,
    results: ResultSet<Prediction<T>>,
    last_input: Option<String>,
}

impl<T: Token> TokenPredict<T> {
    /// Create an engine with clamped configuration.
    pub fn new(n_min: usize, n_max: usize, max_results: usize) -> Self {
        let config = GramConfig::new(n_min, n_max, max_results);
        TokenPredict {
            config,
            context_table: HashMap::new(),
            results: ResultSet::new(config.max_results),
            last_input: None,
        }
    }

    pub fn config(&self) -> GramConfig {
        self.config
    }

    /// Replace the context table with one built from `corpus`.
    pub fn train(&mut self, corpus: &[impl AsRef<[T]>]) -> &mut Self {
        self.context_table.clear();
        self.results.clear();
        self.last_input = None;

        for item in corpus {
            let seq = item.as_ref();
            for pos in 1..seq.len() {
                let next = &seq[pos];
                let top = self.config.n_max.min(pos);
                for k in self.config.n_min..=top {
                    let context = window_key(&seq[pos - k..pos]);
                    let entry = self
                        .context_table
                        .entry(context)
                        .or_insert_with(TokenContextEntry::new);
                    let slot = entry
                        .counts
                        .entry(next.to_string())
                        .or_insert_with(|| TokenCount {
                            token: next.clone(),
                            count: 0,
                        });
                    slot.count += 1;
                    entry.total += 1;
                }
            }
        }
        self
    }

    /// Predict the next token after `prefix`, replacing the result buffer.
    ///
    /// Re-running a prefix with the unchanged identity key is a no-op.
    pub fn predict(&mut self, prefix: &[T]) -> &mut Self {
        let identity = window_key(prefix);
        if self.last_input.as_deref() == Some(identity.as_str()) {
            return self;
        }
        let entries = self.scan(prefix);
        self.results.clear();
        for entry in entries {
            self.results.push(entry);
        }
        self.last_input = Some(identity);
        self
    }

    /// Predict without touching instance state.
    pub fn predict_pure(&self, prefix: &[T]) -> ResultSet<Prediction<T>> {
        let mut set = ResultSet::new(self.config.max_results);
        for entry in self.scan(prefix) {
            set.push(entry);
        }
        set
    }

    /// Predict (when given a prefix) and return the most likely token.
    ///
    /// `None` re-reads the results of the cached prefix.
    pub fn predict_best(&mut self, prefix: Option<&[T]>) -> Option<T> {
        if let Some(prefix) = prefix {
            self.predict(prefix);
        }
        self.top_value()
    }

    fn scan(&self, prefix: &[T]) -> Vec<Prediction<T>> {
        let len = prefix.len();
        let mut blended: BTreeMap<String, (T, f64)> = BTreeMap::new();
        let mut weight_total = 0.0;

        for k in self.config.n_min..=self.config.n_max {
            if k > len {
                break;
            }
            let context = window_key(&prefix[len - k..]);
            let Some(entry) = self.context_table.get(&context) else {
                continue;
            };
            if entry.total == 0 {
                continue;
            }
            let weight = k as f64;
            weight_total += weight;
            for (label, counted) in &entry.counts {
                let slot = blended
                    .entry(label.clone())
                    .or_insert_with(|| (counted.token.clone(), 0.0));
                slot.1 += weight * counted.count as f64 / entry.total as f64;
            }
        }

        if weight_total == 0.0 {
            return Vec::new();
        }
        blended
            .into_values()
            .map(|(value, score)| Prediction {
                value,
                probability: score / weight_total,
            })
            .collect()
    }

    pub fn results(&mut self) -> &[Prediction<T>] {
        self.results.results()
    }

    pub fn values(&mut self) -> &[T] {
        self.results.values()
    }

    pub fn scores(&mut self) -> &[f64] {
        self.results.scores()
    }

    pub fn top(&mut self) -> Option<&Prediction<T>> {
        self.results.top()
    }

    pub fn top_value(&mut self) -> Option<T> {
        self.results.top_value()
    }

    pub fn top_score(&mut self) -> f64 {
        self.results.top_score()
    }

    /// Clone the config and context table into a transportable model.
    pub fn export(&self) -> TokenPredictModel<T> {
        TokenPredictModel {
            kind: ModelKind::TokenPredict,
            n_gram_min: self.config.n_min,
            n_gram_max: self.config.n_max,
            max_results: self.config.max_results,
            context_dict: self.context_table.clone(),
        }
    }

    /// Replace config and context table from an exported model.
    pub fn load(&mut self, model: TokenPredictModel<T>) -> Result<&mut Self, ModelError> {
        if model.kind != ModelKind::TokenPredict {
            return Err(ModelError::IncompatibleModel {
                expected: ModelKind::TokenPredict,
                found: model.kind,
            });
        }
        self.config = GramConfig::new(model.n_gram_min, model.n_gram_max, model.max_results);
        self.context_table = model.context_dict;
        self.results = ResultSet::new(self.config.max_results);
        self.last_input = None;
        Ok(self)
    }
}

impl<T: Token> Default for TokenPredict<T> {
    fn default() -> Self {
        TokenPredict::new(3, 25, 10)
    }
}
