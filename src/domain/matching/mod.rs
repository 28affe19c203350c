//! Similarity matcher - fuzzy lookup over keyword-sharing candidates

mod similarity;

pub use similarity::{MatchOutcome, SimilarityBreakdown, SimilarityMatcher, SimilarityWeights};
