//! Admission rules - is a (query, answer) pair worth storing?

use std::collections::HashSet;
use std::fmt;

use crate::domain::text::{non_space_len, normalize, words_of};

/// Queries need at least this many non-space characters
pub const MIN_QUERY_CHARS: usize = 5;

/// Answers need at least this many non-space characters
pub const MIN_ANSWER_CHARS: usize = 50;

/// Answers carrying an error marker are only accepted from this length on
pub const ERROR_ANSWER_MIN_CHARS: usize = 200;

/// Answers need at least this many periods
pub const MIN_SENTENCES: usize = 3;

/// Share of query words that must reappear in the answer
pub const MIN_RELEVANCE: f64 = 0.2;

const QUESTION_MARKERS: &[&str] = &[
    "what", "who", "where", "when", "why", "how", "which", "can", "is", "are", "will", "should",
    "did", "does", "do",
];

const COMMAND_MARKERS: &[&str] = &[
    "tell", "explain", "describe", "show", "list", "find", "search", "get", "give",
];

const ERROR_MARKERS: &[&str] = &[
    "error",
    "sorry",
    "couldn't find",
    "could not find",
    "no information",
    "no results",
    "unable to",
    "failed to",
    "cannot",
    "not available",
];

/// Lexical features of a candidate pair, computed once for all rules
#[derive(Debug, Clone)]
pub struct PairProfile {
    query_chars: usize,
    answer_chars: usize,
    answer_len: usize,
    answer_lower: String,
    answer_periods: usize,
    query_lower: String,
    query_words: HashSet<String>,
    answer_words: HashSet<String>,
}

impl PairProfile {
    pub fn new(query: &str, answer: &str) -> Self {
        let clean_query = normalize(query);
        let answer_lower = answer.to_lowercase();

        Self {
            query_chars: non_space_len(query),
            answer_chars: non_space_len(answer),
            answer_len: answer.chars().count(),
            answer_periods: answer.matches('.').count(),
            query_lower: query.to_lowercase(),
            query_words: words_of(&clean_query).into_iter().collect(),
            answer_words: words_of(&normalize(&answer_lower)).into_iter().collect(),
            answer_lower,
        }
    }

    /// Share of query words found in the answer, `None` when the query has none
    fn relevance(&self) -> Option<f64> {
        if self.query_words.is_empty() {
            return None;
        }

        let overlap = self.query_words.intersection(&self.answer_words).count();
        Some(overlap as f64 / self.query_words.len() as f64)
    }
}

/// Why a pair was refused
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub rule: StorageRule,
    pub reason: String,
}

impl Rejection {
    pub fn new(rule: StorageRule, reason: impl Into<String>) -> Self {
        Self {
            rule,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.rule, self.reason)
    }
}

/// One admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageRule {
    QueryTooShort,
    AnswerTooShort,
    NotAQuestion,
    ErrorAnswer,
    TooFewSentences,
    Irrelevant,
    /// Not part of [`STORAGE_RULES`]; applied to brand-new entries only
    BelowInsertFloor,
}

/// Admission rules in evaluation order
pub const STORAGE_RULES: &[StorageRule] = &[
    StorageRule::QueryTooShort,
    StorageRule::AnswerTooShort,
    StorageRule::NotAQuestion,
    StorageRule::ErrorAnswer,
    StorageRule::TooFewSentences,
    StorageRule::Irrelevant,
];

impl StorageRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueryTooShort => "query_too_short",
            Self::AnswerTooShort => "answer_too_short",
            Self::NotAQuestion => "not_a_question",
            Self::ErrorAnswer => "error_answer",
            Self::TooFewSentences => "too_few_sentences",
            Self::Irrelevant => "irrelevant",
            Self::BelowInsertFloor => "below_insert_floor",
        }
    }

    /// Evaluate the rule against a profiled pair
    pub fn check(&self, pair: &PairProfile) -> Result<(), Rejection> {
        match self {
            Self::QueryTooShort => {
                if pair.query_chars < MIN_QUERY_CHARS {
                    return Err(Rejection::new(
                        *self,
                        format!(
                            "query has {} characters, need {}",
                            pair.query_chars, MIN_QUERY_CHARS
                        ),
                    ));
                }
            }
            Self::AnswerTooShort => {
                if pair.answer_chars < MIN_ANSWER_CHARS {
                    return Err(Rejection::new(
                        *self,
                        format!(
                            "answer has {} characters, need {}",
                            pair.answer_chars, MIN_ANSWER_CHARS
                        ),
                    ));
                }
            }
            Self::NotAQuestion => {
                let asks = QUESTION_MARKERS
                    .iter()
                    .chain(COMMAND_MARKERS)
                    .any(|marker| pair.query_lower.contains(*marker));

                if !asks {
                    return Err(Rejection::new(
                        *self,
                        "query has no question or command word",
                    ));
                }
            }
            Self::ErrorAnswer => {
                let marker = ERROR_MARKERS
                    .iter()
                    .find(|marker| pair.answer_lower.contains(*marker));

                if let Some(marker) = marker {
                    if pair.answer_len < ERROR_ANSWER_MIN_CHARS {
                        return Err(Rejection::new(
                            *self,
                            format!("short answer contains '{}'", marker),
                        ));
                    }
                }
            }
            Self::TooFewSentences => {
                if pair.answer_periods < MIN_SENTENCES {
                    return Err(Rejection::new(
                        *self,
                        format!(
                            "answer has {} sentences, need {}",
                            pair.answer_periods, MIN_SENTENCES
                        ),
                    ));
                }
            }
            Self::Irrelevant => {
                if let Some(relevance) = pair.relevance() {
                    if relevance < MIN_RELEVANCE {
                        return Err(Rejection::new(
                            *self,
                            format!("answer covers {:.0}% of query words", relevance * 100.0),
                        ));
                    }
                }
            }
            // Configured floor, checked by the gate
            Self::BelowInsertFloor => {}
        }

        Ok(())
    }
}

impl fmt::Display for StorageRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
