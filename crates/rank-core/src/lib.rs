//! Lazily finalized result buffer shared by every gramdex engine.
//!
//! Queries accumulate entries into a [`ResultSet`] in whatever order the
//! scan produces them; the first getter after a mutation triggers a single
//! `finalize` pass that sorts, truncates to the result cap, and rebuilds
//! the value/score projections. Repeated getters are then free.
//!
//! Engines plug in through the [`RankEntry`] trait (the value, score, and
//! comparator hooks) rather than by subclassing a buffer type. This keeps
//! accumulation decoupled from ranking: a matcher can bump strengths in
//! place without re-sorting after every sighting.

use std::cmp::Ordering;

/// Hooks an engine provides for its result entries.
///
/// `Value` is the caller-facing payload: a matched source for fuzzy
/// engines, a predicted symbol for predictors. `score` is a probability in
/// `[0, 1]` for predictors and a normalized overlap strength for matchers.
pub trait RankEntry {
    /// The caller-facing payload projected out of an entry.
    type Value: Clone + std::fmt::Debug;

    fn value(&self) -> Self::Value;

    fn score(&self) -> f64;

    /// Ranking order between two entries.
    ///
    /// The default orders by score descending. Ties keep insertion order
    /// because [`ResultSet::finalize`] uses a stable sort.
    fn compare(&self, other: &Self) -> Ordering {
        other
            .score()
            .partial_cmp(&self.score())
            .unwrap_or(Ordering::Equal)
    }
}

/// One predicted symbol and its blended probability.
///
/// Shared by the string and token predictors; `V` is `char` for the former
/// and the token type for the latter.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction<V> {
    pub value: V,
    pub probability: f64,
}

impl<V: Clone + std::fmt::Debug> RankEntry for Prediction<V> {
    type Value = V;

    fn value(&self) -> V {
        self.value.clone()
    }

    fn score(&self) -> f64 {
        self.probability
    }
}

/// Result buffer with a dirty flag and idempotent finalization.
///
/// The buffer holds at most `max_results` entries *after* finalization;
/// before that it holds whatever the scan pushed. `dirty` is set by every
/// mutation and cleared by `finalize`, so finalization runs exactly once
/// per dirty cycle no matter how many getters are called.
#[derive(Debug, Clone)]
pub struct ResultSet<E: RankEntry> {
    entries: Vec<E>,
    values: Vec<E::Value>,
    scores: Vec<f64>,
    max_results: usize,
    dirty: bool,
}

impl<E: RankEntry> ResultSet<E> {
    /// Create an empty, clean result set with the given cap.
    pub fn new(max_results: usize) -> Self {
        ResultSet {
            entries: Vec::new(),
            values: Vec::new(),
            scores: Vec::new(),
            max_results,
            dirty: false,
        }
    }

    /// Empty the buffer and projections and mark the set dirty.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.values.clear();
        self.scores.clear();
        self.dirty = true;
    }

    /// Mark the set dirty without touching entries.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Append an entry, marking the set dirty.
    pub fn push(&mut self, entry: E) {
        self.entries.push(entry);
        self.dirty = true;
    }

    /// Replace the result cap. Takes effect at the next finalization.
    pub fn set_max_results(&mut self, max_results: usize) {
        self.max_results = max_results;
        self.dirty = true;
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Sort, cap, and project. Idempotent: a clean set returns immediately.
    ///
    /// The sort is stable, so entries with equal scores keep the order in
    /// which they were pushed.
    pub fn finalize(&mut self) {
        if !self.dirty {
            return;
        }
        self.entries.sort_by(|a, b| a.compare(b));
        self.entries.truncate(self.max_results);
        self.values = self.entries.iter().map(|e| e.value()).collect();
        self.scores = self.entries.iter().map(|e| e.score()).collect();
        self.dirty = false;
    }

    /// Finalized entries, best first.
    pub fn results(&mut self) -> &[E] {
        self.finalize();
        &self.entries
    }

    /// Finalized value projection.
    pub fn values(&mut self) -> &[E::Value] {
        self.finalize();
        &self.values
    }

    /// Finalized score projection.
    pub fn scores(&mut self) -> &[f64] {
        self.finalize();
        &self.scores
    }

    /// Best entry, or `None` when the set is empty.
    pub fn top(&mut self) -> Option<&E> {
        self.finalize();
        self.entries.first()
    }

    /// Best value, or `None` when the set is empty.
    pub fn top_value(&mut self) -> Option<E::Value> {
        self.finalize();
        self.values.first().cloned()
    }

    /// Best score, or `0.0` when the set is empty.
    pub fn top_score(&mut self) -> f64 {
        self.finalize();
        self.scores.first().copied().unwrap_or(0.0)
    }
}
