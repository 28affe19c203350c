//! Learning cache configuration

use serde::{Deserialize, Serialize};

use super::DEFAULT_CANDIDATE_LIMIT;
use crate::domain::quality::{
    DEFAULT_MIN_INSERT_ANSWER_CHARS, DEFAULT_MIN_INSERT_QUERY_WORDS, InsertFloor,
};

/// Similarity needed to reuse a stored answer when serving
pub const READ_THRESHOLD: f64 = 0.7;

/// Similarity needed to treat a learned pair as a known question
pub const WRITE_THRESHOLD: f64 = 0.85;

/// Configuration for the learning cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Similarity threshold for serving a cached answer (0.0 to 1.0)
    #[serde(default = "default_read_threshold")]
    pub read_threshold: f64,

    /// Similarity threshold for deduplicating learned pairs (0.0 to 1.0)
    /// Stricter than the read threshold
    #[serde(default = "default_write_threshold")]
    pub write_threshold: f64,

    /// Maximum keyword-overlap candidates scored per lookup
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,

    /// Minimum query words before a brand-new entry is created
    #[serde(default = "default_min_insert_query_words")]
    pub min_insert_query_words: usize,

    /// Minimum answer characters before a brand-new entry is created
    #[serde(default = "default_min_insert_answer_chars")]
    pub min_insert_answer_chars: usize,
}

fn default_read_threshold() -> f64 {
    READ_THRESHOLD
}

fn default_write_threshold() -> f64 {
    WRITE_THRESHOLD
}

fn default_candidate_limit() -> usize {
    DEFAULT_CANDIDATE_LIMIT
}

fn default_min_insert_query_words() -> usize {
    DEFAULT_MIN_INSERT_QUERY_WORDS
}

fn default_min_insert_answer_chars() -> usize {
    DEFAULT_MIN_INSERT_ANSWER_CHARS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            read_threshold: default_read_threshold(),
            write_threshold: default_write_threshold(),
            candidate_limit: default_candidate_limit(),
            min_insert_query_words: default_min_insert_query_words(),
            min_insert_answer_chars: default_min_insert_answer_chars(),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read threshold clamped to [0, 1]
    pub fn read_threshold(&self) -> f64 {
        self.read_threshold.clamp(0.0, 1.0)
    }

    /// Write threshold clamped to [0, 1]
    pub fn write_threshold(&self) -> f64 {
        self.write_threshold.clamp(0.0, 1.0)
    }

    /// Candidate limit, never zero
    pub fn candidate_limit(&self) -> usize {
        self.candidate_limit.max(1)
    }

    pub fn insert_floor(&self) -> InsertFloor {
        InsertFloor {
            min_query_words: self.min_insert_query_words,
            min_answer_chars: self.min_insert_answer_chars,
        }
    }

    /// Set the read threshold
    pub fn with_read_threshold(mut self, threshold: f64) -> Self {
        self.read_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the write threshold
    pub fn with_write_threshold(mut self, threshold: f64) -> Self {
        self.write_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the candidate limit
    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit;
        self
    }

    /// Set the floor applied to brand-new entries
    pub fn with_insert_floor(mut self, floor: InsertFloor) -> Self {
        self.min_insert_query_words = floor.min_query_words;
        self.min_insert_answer_chars = floor.min_answer_chars;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();

        assert!((config.read_threshold() - 0.7).abs() < 1e-9);
        assert!((config.write_threshold() - 0.85).abs() < 1e-9);
        assert!(config.write_threshold() > config.read_threshold());
        assert_eq!(config.candidate_limit(), 50);
        assert_eq!(config.insert_floor(), InsertFloor::default());
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::new()
            .with_read_threshold(0.6)
            .with_write_threshold(1.5)
            .with_candidate_limit(0)
            .with_insert_floor(InsertFloor {
                min_query_words: 2,
                min_answer_chars: 80,
            });

        assert!((config.read_threshold() - 0.6).abs() < 1e-9);
        assert!((config.write_threshold() - 1.0).abs() < 1e-9);
        assert_eq!(config.candidate_limit(), 1);
        assert_eq!(config.insert_floor().min_query_words, 2);
        assert_eq!(config.insert_floor().min_answer_chars, 80);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: CacheConfig = serde_json::from_str(r#"{"read_threshold": 0.75}"#).unwrap();

        assert!((config.read_threshold() - 0.75).abs() < 1e-9);
        assert!((config.write_threshold() - 0.85).abs() < 1e-9);
        assert_eq!(config.candidate_limit(), 50);
    }

    #[test]
    fn test_out_of_range_thresholds_are_clamped_on_read() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"read_threshold": -1.0, "write_threshold": 7.0}"#).unwrap();

        assert_eq!(config.read_threshold(), 0.0);
        assert_eq!(config.write_threshold(), 1.0);
    }
}
