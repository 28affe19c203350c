//! Blended lexical similarity and best-match selection

use tracing::debug;

use crate::domain::qa::QaEntry;
use crate::domain::text::{QueryProfile, jaccard};

/// Weights of the three lexical signals; they sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityWeights {
    pub keywords: f64,
    pub bigrams: f64,
    pub trigrams: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            keywords: 0.5,
            bigrams: 0.3,
            trigrams: 0.2,
        }
    }
}

/// Components of one similarity score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityBreakdown {
    pub keyword_sim: f64,
    pub bigram_sim: f64,
    pub trigram_sim: f64,
    pub combined: f64,
    pub length_penalty: f64,
    pub score: f64,
}

/// Best candidate found for a query
#[derive(Debug, Clone, Copy)]
pub struct MatchOutcome<'a> {
    best: Option<&'a QaEntry>,
    score: f64,
}

impl<'a> MatchOutcome<'a> {
    pub fn no_match(score: f64) -> Self {
        Self { best: None, score }
    }

    pub fn is_match(&self) -> bool {
        self.best.is_some()
    }

    /// Matched entry, only when the score reached the threshold
    pub fn entry(&self) -> Option<&'a QaEntry> {
        self.best
    }

    pub fn answer(&self) -> Option<&'a str> {
        self.best.map(QaEntry::answer)
    }

    /// Best score across the pool, reported even on a miss
    pub fn score(&self) -> f64 {
        self.score
    }
}

/// Scores candidates against a query and picks the best one
#[derive(Debug, Clone, Default)]
pub struct SimilarityMatcher {
    weights: SimilarityWeights,
}

impl SimilarityMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(mut self, weights: SimilarityWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn weights(&self) -> SimilarityWeights {
        self.weights
    }

    /// Score two profiled queries
    pub fn breakdown(&self, query: &QueryProfile, candidate: &QueryProfile) -> SimilarityBreakdown {
        let keyword_sim = jaccard(query.keyword_set(), candidate.keyword_set());
        let bigram_sim = jaccard(query.bigrams(), candidate.bigrams());
        let trigram_sim = jaccard(query.trigrams(), candidate.trigrams());

        let combined = self.weights.keywords * keyword_sim
            + self.weights.bigrams * bigram_sim
            + self.weights.trigrams * trigram_sim;

        let longest = query.len().max(candidate.len());
        let length_penalty = if longest == 0 {
            0.0
        } else {
            query.len().min(candidate.len()) as f64 / longest as f64
        };

        SimilarityBreakdown {
            keyword_sim,
            bigram_sim,
            trigram_sim,
            combined,
            length_penalty,
            score: combined * length_penalty,
        }
    }

    pub fn score(&self, query: &QueryProfile, candidate: &QueryProfile) -> f64 {
        self.breakdown(query, candidate).score
    }

    /// Best candidate scoring at least `threshold`.
    ///
    /// Candidates without a shared keyword are skipped. Ties keep the
    /// earlier candidate, so the store's ordering decides.
    pub fn find_best_match<'a>(
        &self,
        query: &QueryProfile,
        candidates: &'a [QaEntry],
        threshold: f64,
    ) -> MatchOutcome<'a> {
        let mut best: Option<&'a QaEntry> = None;
        let mut best_score = 0.0;

        for candidate in candidates {
            let profile = QueryProfile::with_stored_keywords(candidate.query(), candidate.keywords());

            if !query.shares_keyword_with(&profile) {
                continue;
            }

            let score = self.score(query, &profile);

            if best.is_none() || score > best_score {
                best = Some(candidate);
                best_score = score;
            }
        }

        match best {
            Some(entry) if best_score >= threshold => {
                debug!(
                    entry_id = %entry.id(),
                    score = best_score,
                    threshold,
                    "Fuzzy match accepted"
                );
                MatchOutcome {
                    best: Some(entry),
                    score: best_score,
                }
            }
            Some(entry) => {
                debug!(
                    entry_id = %entry.id(),
                    score = best_score,
                    threshold,
                    "Near miss below threshold"
                );
                MatchOutcome::no_match(best_score)
            }
            None => MatchOutcome::no_match(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::qa::{NewQaEntry, QaEntryId, QueryType};

    fn entry(id: i64, query: &str, answer: &str) -> QaEntry {
        let new_entry = NewQaEntry::new(query, answer, QueryType::Informational).unwrap();
        QaEntry::inserted(QaEntryId::new(id), new_entry, Utc::now())
    }

    #[test]
    fn test_identical_queries_score_one() {
        let matcher = SimilarityMatcher::new();
        let a = QueryProfile::new("What is the capital of France?");
        let b = QueryProfile::new("what is the capital of france");

        let breakdown = matcher.breakdown(&a, &b);
        assert!((breakdown.score - 1.0).abs() < 1e-9);
        assert!((breakdown.length_penalty - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_paraphrase_scores_above_read_threshold() {
        let matcher = SimilarityMatcher::new();
        let stored = QueryProfile::new("What is the capital of France?");
        let query = QueryProfile::new("what's the capital of France");

        let breakdown = matcher.breakdown(&query, &stored);
        assert!((breakdown.keyword_sim - 1.0).abs() < 1e-9);
        assert!(breakdown.score >= 0.7, "score {}", breakdown.score);
        assert!(breakdown.score < 1.0);
    }

    #[test]
    fn test_empty_profiles_score_zero() {
        let matcher = SimilarityMatcher::new();
        let empty = QueryProfile::new("");

        assert_eq!(matcher.score(&empty, &empty), 0.0);
    }

    #[test]
    fn test_find_best_match_picks_highest() {
        let matcher = SimilarityMatcher::new();
        let pool = vec![
            entry(1, "france population growth", "a"),
            entry(2, "What is the capital of France?", "Paris"),
            entry(3, "rust borrow checker", "b"),
        ];

        let outcome = matcher.find_best_match(
            &QueryProfile::new("what's the capital of France"),
            &pool,
            0.7,
        );

        assert!(outcome.is_match());
        assert_eq!(outcome.answer(), Some("Paris"));
        assert_eq!(outcome.entry().map(|e| e.id().value()), Some(2));
    }

    #[test]
    fn test_find_best_match_reports_near_miss_score() {
        let matcher = SimilarityMatcher::new();
        let pool = vec![entry(1, "france population growth since the war", "a")];

        let outcome = matcher.find_best_match(
            &QueryProfile::new("capital of france"),
            &pool,
            0.99,
        );

        assert!(!outcome.is_match());
        assert!(outcome.answer().is_none());
        assert!(outcome.score() > 0.0);
    }

    #[test]
    fn test_find_best_match_skips_disjoint_candidates() {
        let matcher = SimilarityMatcher::new();
        let pool = vec![entry(1, "rust borrow checker", "a")];

        let outcome = matcher.find_best_match(&QueryProfile::new("capital of france"), &pool, 0.0);

        assert!(!outcome.is_match());
        assert_eq!(outcome.score(), 0.0);
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let matcher = SimilarityMatcher::new();
        let pool = vec![
            entry(1, "capital of france", "first"),
            entry(2, "Capital of France", "second"),
        ];

        let outcome = matcher.find_best_match(&QueryProfile::new("capital of france"), &pool, 0.5);

        assert_eq!(outcome.answer(), Some("first"));
    }

    #[test]
    fn test_threshold_monotonicity() {
        let matcher = SimilarityMatcher::new();
        let pool = vec![
            entry(1, "What is the capital of France?", "Paris"),
            entry(2, "largest city in france", "Paris too"),
        ];
        let query = QueryProfile::new("capital city of france");

        let thresholds = [1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.2, 0.1, 0.0];
        let mut matched_before = false;

        for threshold in thresholds {
            let outcome = matcher.find_best_match(&query, &pool, threshold);

            if matched_before {
                assert!(outcome.is_match(), "lost match at threshold {}", threshold);
            }
            if outcome.is_match() {
                assert!(outcome.score() >= threshold);
            }
            matched_before = outcome.is_match();
        }

        assert!(matched_before);
    }

    #[test]
    fn test_custom_weights() {
        let matcher = SimilarityMatcher::new().with_weights(SimilarityWeights {
            keywords: 1.0,
            bigrams: 0.0,
            trigrams: 0.0,
        });
        let a = QueryProfile::new("capital france");
        let b = QueryProfile::new("france capital");

        assert!((matcher.score(&a, &b) - 1.0).abs() < 1e-9);
    }
}
