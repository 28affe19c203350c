//! Overwrite heuristics - should a new answer replace the stored one?

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::text::{normalize, words_of};

/// New answers shorter than this never replace anything
pub const MIN_OVERWRITE_CHARS: usize = 50;

const LENGTH_GAIN_RATIO: f64 = 1.3;
const LENGTH_LOSS_RATIO: f64 = 0.7;
const SENTENCE_GAIN_RATIO: f64 = 1.5;
const MARKUP_GAIN_RATIO: f64 = 1.5;
const VOCABULARY_GAIN_RATIO: f64 = 1.3;

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Structural features of one answer
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerProfile {
    chars: usize,
    sentences: usize,
    markup_tags: usize,
    unique_words: usize,
}

impl AnswerProfile {
    pub fn new(answer: &str) -> Self {
        let unique_words: HashSet<String> = words_of(&normalize(answer)).into_iter().collect();

        Self {
            chars: answer.chars().count(),
            sentences: answer.matches('.').count(),
            markup_tags: MARKUP_TAG.find_iter(answer).count(),
            unique_words: unique_words.len(),
        }
    }

    pub fn chars(&self) -> usize {
        self.chars
    }

    pub fn sentences(&self) -> usize {
        self.sentences
    }

    pub fn markup_tags(&self) -> usize {
        self.markup_tags
    }

    pub fn unique_words(&self) -> usize {
        self.unique_words
    }
}

/// One overwrite heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteRule {
    MinimumLength,
    LengthRatio,
    SentenceGrowth,
    MarkupGrowth,
    VocabularyGrowth,
}

/// Heuristics in evaluation order; the first decisive one wins
pub const OVERWRITE_RULES: &[OverwriteRule] = &[
    OverwriteRule::MinimumLength,
    OverwriteRule::LengthRatio,
    OverwriteRule::SentenceGrowth,
    OverwriteRule::MarkupGrowth,
    OverwriteRule::VocabularyGrowth,
];

impl OverwriteRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MinimumLength => "minimum_length",
            Self::LengthRatio => "length_ratio",
            Self::SentenceGrowth => "sentence_growth",
            Self::MarkupGrowth => "markup_growth",
            Self::VocabularyGrowth => "vocabulary_growth",
        }
    }

    /// `Some(better)` when the rule decides, `None` to fall through
    pub fn decide(&self, existing: &AnswerProfile, new: &AnswerProfile) -> Option<bool> {
        match self {
            Self::MinimumLength => (new.chars < MIN_OVERWRITE_CHARS).then_some(false),
            Self::LengthRatio => {
                let ratio = new.chars as f64 / existing.chars.max(1) as f64;

                if ratio > LENGTH_GAIN_RATIO {
                    Some(true)
                } else if ratio < LENGTH_LOSS_RATIO {
                    Some(false)
                } else {
                    None
                }
            }
            Self::SentenceGrowth => {
                grows(existing.sentences, new.sentences, SENTENCE_GAIN_RATIO).then_some(true)
            }
            Self::MarkupGrowth => {
                grows(existing.markup_tags, new.markup_tags, MARKUP_GAIN_RATIO).then_some(true)
            }
            Self::VocabularyGrowth => grows(
                existing.unique_words,
                new.unique_words,
                VOCABULARY_GAIN_RATIO,
            )
            .then_some(true),
        }
    }
}

impl fmt::Display for OverwriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn grows(existing: usize, new: usize, ratio: f64) -> bool {
    new as f64 > existing as f64 * ratio
}
