//! Variable-order next-character prediction over a context table.

use std::collections::{BTreeMap, HashMap};

use gram_core::{GramConfig, ModelError, ModelKind};
use rank_core::{Prediction, ResultSet};
use serde::{Deserialize, Serialize};

/// Next-symbol statistics for one context string.
///
/// `total` always equals the sum of `counts` values; both are bumped
/// together during training.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub counts: BTreeMap<char, u64>,
    pub total: u64,
}

/// Exported logical model of a [`StringPredict`] engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringPredictModel {
    #[serde(rename = "type")]
    pub kind: ModelKind,
    pub n_gram_min: usize,
    pub n_gram_max: usize,
    pub max_results: usize,
    pub case_sense: bool,
    #[serde(default)]
    pub context_dict: HashMap<String, ContextEntry>,
}

/// Next-character predictor blending variable-order context statistics.
///
/// Training records, for every position in every corpus string and every
/// admissible context length, which character followed that context.
/// Prediction looks up each order's context ending at the prefix, weights
/// its distribution by the context length, and linearly blends. Longer
/// contexts therefore dominate without any backoff smoothing.
pub struct StringPredict {
    config: GramConfig,
    case_sensitive: bool,
    context_table: HashMap<String, ContextEntry>,
    results: ResultSet<Prediction<char>>,
    last_input: Option<String>,
}

impl StringPredict {
    /// Create an engine with clamped configuration.
    pub fn new(n_min: usize, n_max: usize, max_results: usize, case_sensitive: bool) -> Self {
        let config = GramConfig::new(n_min, n_max, max_results);
        StringPredict {
            config,
            case_sensitive,
            context_table: HashMap::new(),
            results: ResultSet::new(config.max_results),
            last_input: None,
        }
    }

    pub fn config(&self) -> GramConfig {
        self.config
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    fn canonical(&self, s: &str) -> String {
        if self.case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    }

    /// Replace the context table with one built from `corpus`.
    pub fn train(&mut self, corpus: &[impl AsRef<str>]) -> &mut Self {
        self.context_table.clear();
        self.results.clear();
        self.last_input = None;

        for item in corpus {
            let chars: Vec<char> = self.canonical(item.as_ref()).chars().collect();
            for pos in 1..chars.len() {
                let next = chars[pos];
                let top = self.config.n_max.min(pos);
                for k in self.config.n_min..=top {
                    let context: String = chars[pos - k..pos].iter().collect();
                    let entry = self.context_table.entry(context).or_default();
                    *entry.counts.entry(next).or_insert(0) += 1;
                    entry.total += 1;
                }
            }
        }
        self
    }

    /// Predict the next character after `prefix`, replacing the result
    /// buffer. Re-running the unchanged prefix is a no-op.
    pub fn predict(&mut self, prefix: &str) -> &mut Self {
        if self.last_input.as_deref() == Some(prefix) {
            return self;
        }
        let entries = self.scan(prefix);
        self.results.clear();
        for entry in entries {
            self.results.push(entry);
        }
        self.last_input = Some(prefix.to_string());
        self
    }

    /// Predict without touching instance state.
    pub fn predict_pure(&self, prefix: &str) -> ResultSet<Prediction<char>> {
        let mut set = ResultSet::new(self.config.max_results);
        for entry in self.scan(prefix) {
            set.push(entry);
        }
        set
    }

    /// Predict (when given a prefix) and return the most likely character.
    ///
    /// `None` re-reads the results of the cached prefix.
    pub fn predict_best(&mut self, prefix: Option<&str>) -> Option<char> {
        if let Some(prefix) = prefix {
            self.predict(prefix);
        }
        self.top_value()
    }

    fn scan(&self, prefix: &str) -> Vec<Prediction<char>> {
        let prefix = self.canonical(prefix);
        let chars: Vec<char> = prefix.chars().collect();
        let len = chars.len();

        // Symbol-keyed accumulation keeps emission order deterministic.
        let mut blended: BTreeMap<char, f64> = BTreeMap::new();
        let mut weight_total = 0.0;

        for k in self.config.n_min..=self.config.n_max {
            if k > len {
                break;
            }
            let context: String = chars[len - k..].iter().collect();
            let Some(entry) = self.context_table.get(&context) else {
                continue;
            };
            if entry.total == 0 {
                continue;
            }
            let weight = k as f64;
            weight_total += weight;
            for (&symbol, &count) in &entry.counts {
                *blended.entry(symbol).or_insert(0.0) +=
                    weight * count as f64 / entry.total as f64;
            }
        }

        if weight_total == 0.0 {
            return Vec::new();
        }
        blended
            .into_iter()
            .map(|(value, score)| Prediction {
                value,
                probability: score / weight_total,
            })
            .collect()
    }

    pub fn results(&mut self) -> &[Prediction<char>] {
        self.results.results()
    }

    pub fn values(&mut self) -> &[char] {
        self.results.values()
    }

    pub fn scores(&mut self) -> &[f64] {
        self.results.scores()
    }

    pub fn top(&mut self) -> Option<&Prediction<char>> {
        self.results.top()
    }

    pub fn top_value(&mut self) -> Option<char> {
        self.results.top_value()
    }

    pub fn top_score(&mut self) -> f64 {
        self.results.top_score()
    }

    /// Clone the config and context table into a transportable model.
    pub fn export(&self) -> StringPredictModel {
        StringPredictModel {
            kind: ModelKind::StringPredict,
            n_gram_min: self.config.n_min,
            n_gram_max: self.config.n_max,
            max_results: self.config.max_results,
            case_sense: self.case_sensitive,
            context_dict: self.context_table.clone(),
        }
    }

    /// Replace config and context table from an exported model.
    pub fn load(&mut self, model: StringPredictModel) -> Result<&mut Self, ModelError> {
        if model.kind != ModelKind::StringPredict {
            return Err(ModelError::IncompatibleModel {
                expected: ModelKind::StringPredict,
                found: model.kind,
            });
        }
        self.config = GramConfig::new(model.n_gram_min, model.n_gram_max, model.max_results);
        self.case_sensitive = model.case_sense;
        self.context_table = model.context_dict;
        self.results = ResultSet::new(self.config.max_results);
        self.last_input = None;
        Ok(self)
    }
}

impl Default for StringPredict {
    fn default() -> Self {
        StringPredict::new(1, 25, 10, true)
    }
}
