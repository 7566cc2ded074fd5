//! Substring inverted index and descending-order fuzzy matcher.

use std::collections::{HashMap, HashSet};

use gram_core::{GramConfig, ModelError, ModelKind};
use rank_core::{RankEntry, ResultSet};
use serde::{Deserialize, Serialize};

/// A single fuzzy match: the canonical source string and its strength.
///
/// Strengths are normalized after every scan, so across one query's results
/// they lie in `[0, 1]` and sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    pub value: String,
    pub strength: f64,
}

impl RankEntry for FuzzyMatch {
    type Value = String;

    fn value(&self) -> String {
        self.value.clone()
    }

    fn score(&self) -> f64 {
        self.strength
    }
}

/// Exported logical model of a [`StringFuzzy`] engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringFuzzyModel {
    #[serde(rename = "type")]
    pub kind: ModelKind,
    pub n_gram_min: usize,
    pub n_gram_max: usize,
    pub max_results: usize,
    pub case_sense: bool,
    #[serde(default)]
    pub exact_set: HashSet<String>,
    #[serde(default)]
    pub ngram_dict: HashMap<String, Vec<String>>,
}

/// Character n-gram fuzzy matcher over a trained string lexicon.
///
/// Training builds an inverted index from every substring of length
/// `n_min..=n_max` to the canonical lexicon strings containing it. A query
/// scans its own grams from largest to smallest, admitting up to
/// `max_results` candidate sources and accumulating overlap strength for
/// sources already admitted. Longer grams are worth quadratically more.
///
/// Postings keep lexicon insertion order, which makes the admission order
/// under the candidate cap deterministic.
#[derive(Debug)]
pub struct StringFuzzy {
    config: GramConfig,
    case_sensitive: bool,
    exact_set: HashSet<String>,
    gram_index: HashMap<String, Vec<String>>,
    results: ResultSet<FuzzyMatch>,
    last_input: Option<String>,
}

impl StringFuzzy {
    /// Create an engine with clamped configuration.
    pub fn new(n_min: usize, n_max: usize, max_results: usize, case_sensitive: bool) -> Self {
        let config = GramConfig::new(n_min, n_max, max_results);
        StringFuzzy {
            config,
            case_sensitive,
            exact_set: HashSet::new(),
            gram_index: HashMap::new(),
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

    /// Replace the index with one built from `corpus`.
    ///
    /// Items whose canonical form is already indexed are skipped, so a
    /// posting never holds the same source twice.
    pub fn train(&mut self, corpus: &[impl AsRef<str>]) -> &mut Self {
        self.exact_set.clear();
        self.gram_index.clear();
        self.results.clear();
        self.last_input = None;

        // Per-item gram-dedup scratch, reused across items.
        let mut seen = HashSet::new();
        for item in corpus {
            let source = self.canonical(item.as_ref());
            if !self.exact_set.insert(source.clone()) {
                continue;
            }
            let chars: Vec<char> = source.chars().collect();
            seen.clear();
            let top = self.config.n_max.min(chars.len());
            for k in self.config.n_min..=top {
                for start in 0..=chars.len() - k {
                    let gram: String = chars[start..start + k].iter().collect();
                    if seen.insert(gram.clone()) {
                        self.gram_index.entry(gram).or_default().push(source.clone());
                    }
                }
            }
        }
        self
    }

    /// Run a query, replacing the engine's result buffer.
    ///
    /// Re-running the unchanged input is a no-op.
    pub fn search(&mut self, input: &str) -> &mut Self {
        if self.last_input.as_deref() == Some(input) {
            return self;
        }
        let entries = self.scan(input);
        self.results.clear();
        for entry in entries {
            self.results.push(entry);
        }
        self.last_input = Some(input.to_string());
        self
    }

    /// Run a query without touching instance state.
    ///
    /// Returns a freshly allocated result set, enabling parallel reads of a
    /// trained engine.
    pub fn search_pure(&self, input: &str) -> ResultSet<FuzzyMatch> {
        let mut set = ResultSet::new(self.config.max_results);
        for entry in self.scan(input) {
            set.push(entry);
        }
        set
    }

    /// Query (when given) and return the best-matching source.
    ///
    /// `None` re-reads the results of the cached input.
    pub fn search_best(&mut self, input: Option<&str>) -> Option<String> {
        if let Some(input) = input {
            self.search(input);
        }
        self.top_value()
    }

    fn scan(&self, input: &str) -> Vec<FuzzyMatch> {
        let query = self.canonical(input);
        if query.is_empty() {
            return Vec::new();
        }
        if self.exact_set.contains(&query) {
            let mut entries = vec![FuzzyMatch {
                value: query,
                strength: f64::INFINITY,
            }];
            normalize(&mut entries);
            return entries;
        }

        let chars: Vec<char> = query.chars().collect();
        let len = chars.len();

        // Admissible source length range.
        let min_len = ((len as f64 * 0.75).floor() as usize).max(2);
        let max_len = ((len as f64 * 1.25).ceil() as usize).max(2);

        let mut entries: Vec<FuzzyMatch> = Vec::new();
        let mut admitted: HashMap<String, usize> = HashMap::new();
        let mut seen = HashSet::new();

        let top = self.config.n_max.min(len);
        for k in (self.config.n_min..=top).rev() {
            for start in 0..=len - k {
                let gram: String = chars[start..start + k].iter().collect();
                if !seen.insert(gram.clone()) {
                    continue;
                }
                let Some(posting) = self.gram_index.get(&gram) else {
                    continue;
                };
                for source in posting {
                    if let Some(&slot) = admitted.get(source.as_str()) {
                        entries[slot].strength += (k * k) as f64;
                    } else {
                        let source_len = source.chars().count();
                        if source_len < min_len || source_len > max_len {
                            continue;
                        }
                        if admitted.len() >= self.config.max_results {
                            continue;
                        }
                        admitted.insert(source.clone(), entries.len());
                        entries.push(FuzzyMatch {
                            value: source.clone(),
                            strength: 1.0,
                        });
                    }
                }
            }
        }
        normalize(&mut entries);
        entries
    }

    pub fn results(&mut self) -> &[FuzzyMatch] {
        self.results.results()
    }

    pub fn values(&mut self) -> &[String] {
        self.results.values()
    }

    pub fn scores(&mut self) -> &[f64] {
        self.results.scores()
    }

    pub fn top(&mut self) -> Option<&FuzzyMatch> {
        self.results.top()
    }

    pub fn top_value(&mut self) -> Option<String> {
        self.results.top_value()
    }

    pub fn top_score(&mut self) -> f64 {
        self.results.top_score()
    }

    /// Clone the config and index into a transportable model.
    pub fn export(&self) -> StringFuzzyModel {
        StringFuzzyModel {
            kind: ModelKind::StringFuzzy,
            n_gram_min: self.config.n_min,
            n_gram_max: self.config.n_max,
            max_results: self.config.max_results,
            case_sense: self.case_sensitive,
            exact_set: self.exact_set.clone(),
            ngram_dict: self.gram_index.clone(),
        }
    }

    /// Replace config and index from an exported model.
    ///
    /// Config values are re-clamped; results and the cached input are
    /// cleared. The one rejected condition is a model exported by a
    /// different engine variant.
    pub fn load(&mut self, model: StringFuzzyModel) -> Result<&mut Self, ModelError> {
        if model.kind != ModelKind::StringFuzzy {
            return Err(ModelError::IncompatibleModel {
                expected: ModelKind::StringFuzzy,
                found: model.kind,
            });
        }
        self.config = GramConfig::new(model.n_gram_min, model.n_gram_max, model.max_results);
        self.case_sensitive = model.case_sense;
        self.exact_set = model.exact_set;
        self.gram_index = model.ngram_dict;
        self.results = ResultSet::new(self.config.max_results);
        self.last_input = None;
        Ok(self)
    }
}

impl Default for StringFuzzy {
    fn default() -> Self {
        StringFuzzy::new(3, 5, 10, false)
    }
}

/// Normalize strengths in place.
///
/// An infinite sentinel (exact match) wins outright: 1 for it, 0 for the
/// rest. Otherwise strengths are scaled to sum to 1; an all-zero buffer is
/// left alone.
fn normalize(entries: &mut [FuzzyMatch]) {
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
