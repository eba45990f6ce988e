//! Relevance scores.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A BM25 score as reported by SQLite.
///
/// SQLite's `bm25()` returns *lower* (more negative) numbers for *better*
/// matches. The `Ord` impl follows that convention: a better match compares
/// as `Less`, so an ascending sort puts the best match first. Never sort by
/// the raw value descending.
///
/// ```
/// use catalog_core::RelevanceScore;
///
/// let strong = RelevanceScore::from_raw(-7.5);
/// let weak = RelevanceScore::from_raw(-0.3);
///
/// assert!(strong.is_better_than(weak));
/// let mut scores = vec![weak, strong];
/// scores.sort();
/// assert_eq!(scores, vec![strong, weak]);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelevanceScore(f64);

impl RelevanceScore {
    /// Score given to results that were not ranked (browse listings).
    pub const UNRANKED: RelevanceScore = RelevanceScore(0.0);

    pub fn from_raw(raw: f64) -> Self {
        Self(raw)
    }

    /// The engine's raw value (lower is better).
    pub fn raw(self) -> f64 {
        self.0
    }

    pub fn is_better_than(self, other: RelevanceScore) -> bool {
        self < other
    }
}

impl PartialEq for RelevanceScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RelevanceScore {}

impl PartialOrd for RelevanceScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RelevanceScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
