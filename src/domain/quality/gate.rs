//! Quality gate - admission and overwrite decisions

use tracing::debug;

use super::overwrite_rules::{AnswerProfile, OVERWRITE_RULES, OverwriteRule};
use super::storage_rules::{PairProfile, Rejection, STORAGE_RULES, StorageRule};

/// Minimum query words for a brand-new entry
pub const DEFAULT_MIN_INSERT_QUERY_WORDS: usize = 3;

/// Minimum answer length (characters) for a brand-new entry
pub const DEFAULT_MIN_INSERT_ANSWER_CHARS: usize = 100;

/// Outcome of the overwrite heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverwriteDecision {
    pub better: bool,
    /// Rule that decided; `None` means the incumbent was kept by default
    pub decided_by: Option<OverwriteRule>,
}

/// Stricter floor applied before creating a brand-new entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertFloor {
    pub min_query_words: usize,
    pub min_answer_chars: usize,
}

impl Default for InsertFloor {
    fn default() -> Self {
        Self {
            min_query_words: DEFAULT_MIN_INSERT_QUERY_WORDS,
            min_answer_chars: DEFAULT_MIN_INSERT_ANSWER_CHARS,
        }
    }
}

/// Storage admission and overwrite policy
#[derive(Debug, Clone, Default)]
pub struct QualityGate {
    insert_floor: InsertFloor,
}

impl QualityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_insert_floor(mut self, insert_floor: InsertFloor) -> Self {
        self.insert_floor = insert_floor;
        self
    }

    pub fn insert_floor(&self) -> InsertFloor {
        self.insert_floor
    }

    /// First failing admission rule, if any
    pub fn assess(&self, query: &str, answer: &str) -> Result<(), Rejection> {
        let pair = PairProfile::new(query, answer);

        STORAGE_RULES.iter().try_for_each(|rule| rule.check(&pair))
    }

    pub fn is_storable(&self, query: &str, answer: &str) -> bool {
        self.assess(query, answer).is_ok()
    }

    /// Admission rules plus the insert floor for brand-new entries
    pub fn assess_new_entry(&self, query: &str, answer: &str) -> Result<(), Rejection> {
        self.assess(query, answer)?;

        let query_words = query.split_whitespace().count();
        if query_words < self.insert_floor.min_query_words {
            return Err(Rejection::new(
                StorageRule::BelowInsertFloor,
                format!(
                    "query has {} words, need {}",
                    query_words, self.insert_floor.min_query_words
                ),
            ));
        }

        let answer_chars = answer.chars().count();
        if answer_chars < self.insert_floor.min_answer_chars {
            return Err(Rejection::new(
                StorageRule::BelowInsertFloor,
                format!(
                    "answer has {} characters, need {}",
                    answer_chars, self.insert_floor.min_answer_chars
                ),
            ));
        }

        Ok(())
    }

    /// Run the overwrite heuristics in order
    pub fn decide_overwrite(&self, existing: &str, new: &str) -> OverwriteDecision {
        let existing = AnswerProfile::new(existing);
        let new = AnswerProfile::new(new);

        for rule in OVERWRITE_RULES {
            if let Some(better) = rule.decide(&existing, &new) {
                debug!(rule = %rule, better, "Overwrite heuristic decided");
                return OverwriteDecision {
                    better,
                    decided_by: Some(*rule),
                };
            }
        }

        OverwriteDecision {
            better: false,
            decided_by: None,
        }
    }

    pub fn is_better(&self, existing: &str, new: &str) -> bool {
        self.decide_overwrite(existing, new).better
    }
}
