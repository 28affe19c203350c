//! Extractive summarizer - picks the sentences most relevant to a query

use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::domain::generation::Summarizer;

/// Raw text shorter than this produces the apology answer
pub const MIN_RAW_TEXT_CHARS: usize = 100;

/// Hard cap on the sentences joined into one summary
const MAX_SUMMARY_SENTENCES: usize = 30;

const MIN_SENTENCE_WORDS: usize = 4;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static MERGED_SENTENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.([A-Z])").expect("valid regex"));
static SOURCE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"From https?://\S+:\s*").expect("valid regex"));
static CITATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[citation needed\]|\[\d+\]").expect("valid regex"));
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid regex"));
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+").expect("valid regex"));

/// Deterministic extractive summarizer over retrieved page text
#[derive(Debug, Clone)]
pub struct ExtractiveSummarizer {
    max_chars: usize,
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self::new(2048)
    }
}

impl ExtractiveSummarizer {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(16),
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Summary of `raw_text` focused on `query`
    pub fn summarize_text(&self, query: &str, raw_text: &str) -> String {
        if raw_text.chars().count() < MIN_RAW_TEXT_CHARS {
            return insufficient_information(query);
        }

        let text = clean_source_text(raw_text);
        let sentences: Vec<&str> = text
            .unicode_sentences()
            .map(str::trim)
            .filter(|s| s.split_whitespace().count() >= MIN_SENTENCE_WORDS)
            .collect();

        if sentences.is_empty() {
            return insufficient_information(query);
        }

        let query_words = lowercase_words(query);
        let scores: Vec<f64> = sentences
            .iter()
            .enumerate()
            .map(|(index, sentence)| score_sentence(sentence, index, &query_words))
            .collect();

        let selected = select_sentences(&scores);
        let summary = selected
            .iter()
            .take(MAX_SUMMARY_SENTENCES)
            .map(|&index| sentences[index])
            .collect::<Vec<_>>()
            .join(" ");

        debug!(
            sentences = sentences.len(),
            selected = selected.len().min(MAX_SUMMARY_SENTENCES),
            chars = summary.chars().count(),
            "Summarized source text"
        );

        truncate_at_sentence(&summary, self.max_chars)
    }
}

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    async fn summarize(&self, query: &str, raw_text: &str) -> String {
        self.summarize_text(query, raw_text)
    }
}

fn insufficient_information(query: &str) -> String {
    format!(
        "I couldn't find much information about '{}'. Please try a different query.",
        query
    )
}

/// Collapses whitespace, splits merged sentences, drops source headers and citation marks
fn clean_source_text(raw_text: &str) -> String {
    let text = WHITESPACE.replace_all(raw_text, " ");
    let text = MERGED_SENTENCE.replace_all(text.trim(), ". ${1}");
    let text = SOURCE_PREFIX.replace_all(&text, "");
    let text = CITATION.replace_all(&text, "");

    text.into_owned()
}

fn lowercase_words(text: &str) -> HashSet<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

fn score_sentence(sentence: &str, index: usize, query_words: &HashSet<String>) -> f64 {
    let words = lowercase_words(sentence);
    let overlap = words.intersection(query_words).count();

    let relevance = overlap as f64 / query_words.len().max(1) as f64;
    let position = 1.0 / (index as f64 / 10.0 + 1.0);
    let length = (sentence.chars().count() as f64 / 150.0).min(1.0);

    let mut score = 0.5 * relevance + 0.2 * position + 0.1 * length;

    if sentence.chars().any(|c| c.is_ascii_digit()) {
        score *= 1.5;
    }

    if ENTITY.is_match(sentence) {
        score *= 1.3;
    }

    score
}

/// Indices of the top-scoring sentences plus their predecessors, in text order
fn select_sentences(scores: &[f64]) -> Vec<usize> {
    let wanted = (scores.len() / 4).clamp(5, 20);

    let mut ranked: Vec<usize> = (0..scores.len()).collect();
    // Stable sort keeps earlier sentences first on equal scores
    ranked.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));

    let mut selected = BTreeSet::new();
    for &index in ranked.iter().take(wanted) {
        selected.insert(index);
        if index > 0 {
            selected.insert(index - 1);
        }
    }

    selected.into_iter().collect()
}

/// Cuts `summary` to at most `max_chars`, preferring the last full stop past the midpoint
fn truncate_at_sentence(summary: &str, max_chars: usize) -> String {
    if summary.chars().count() <= max_chars {
        return summary.to_string();
    }

    let head: String = summary.chars().take(max_chars.saturating_sub(3)).collect();

    if let Some(pos) = head.rfind('.') {
        if head[..pos].chars().count() > max_chars / 2 {
            return head[..=pos].to_string();
        }
    }

    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str, body: &str) -> String {
        format!("From {}:\n\n{}", url, body)
    }

    #[test]
    fn test_short_text_yields_apology() {
        let summary = ExtractiveSummarizer::default().summarize_text("quantum foam", "Too short.");

        assert_eq!(
            summary,
            "I couldn't find much information about 'quantum foam'. Please try a different query."
        );
    }

    #[test]
    fn test_clean_source_text() {
        let cleaned = clean_source_text(
            "From https://example.org/paris:\n\nParis is the capital.It has   many museums[1]. \
             Facts[citation needed] abound.",
        );

        assert_eq!(
            cleaned,
            "Paris is the capital. It has many museums. Facts abound."
        );
    }

    #[test]
    fn test_summary_prefers_relevant_sentences() {
        let raw = source(
            "https://example.org/a",
            "The weather today is mild and pleasant for a walk outside. \
             Many people enjoy reading books in the afternoon sun. \
             Bananas grow in tropical climates across several continents. \
             The capital of France is Paris, home to about 2 million people. \
             Cats often sleep for most of the day in warm places. \
             Trains connect most of the larger towns in the region quickly. \
             Gardens need water and attention through the dry summer months.",
        );

        let summarizer = ExtractiveSummarizer::default();
        let summary = summarizer.summarize_text("What is the capital of France?", &raw);

        assert!(summary.contains("The capital of France is Paris"));
        assert!(!summary.contains("From https://"));
    }

    #[test]
    fn test_summary_keeps_text_order() {
        let raw = "Alpha sentence talks about nothing in particular today. \
                   Beta sentence mentions the rust compiler and its borrow checker. \
                   Gamma sentence describes the ocean and distant islands calmly.";

        let summary = ExtractiveSummarizer::default().summarize_text("rust compiler", raw);

        let alpha = summary.find("Alpha").unwrap();
        let beta = summary.find("Beta").unwrap();
        assert!(alpha < beta);
    }

    #[test]
    fn test_short_sentences_dropped() {
        let raw = "Yes indeed. This longer sentence about compilers carries the actual content here. \
                   Okay. Another sentence about compilers explains optimisation passes in depth.";

        let summary = ExtractiveSummarizer::default().summarize_text("compilers", raw);

        assert!(!summary.contains("Yes indeed."));
        assert!(!summary.contains("Okay."));
    }

    #[test]
    fn test_summary_is_deterministic() {
        let raw = "The Rust language was first released in 2015 by Mozilla Research. \
                   It focuses on memory safety without garbage collection at all. \
                   Cargo is the package manager that ships with every Rust toolchain. \
                   Many companies now use Rust for systems programming work daily.";
        let summarizer = ExtractiveSummarizer::default();

        assert_eq!(
            summarizer.summarize_text("rust language", raw),
            summarizer.summarize_text("rust language", raw)
        );
    }

    #[test]
    fn test_select_sentences_adds_predecessor() {
        let mut scores = vec![0.0; 40];
        scores[12] = 5.0;

        let selected = select_sentences(&scores);

        assert_eq!(selected.len(), 11);
        assert!(selected.contains(&11));
        assert!(selected.contains(&12));
        assert!(selected.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_truncate_at_sentence_boundary() {
        let summary = "First sentence is here. Second sentence is a bit longer than the first.";

        assert_eq!(truncate_at_sentence(summary, 200), summary);
        assert_eq!(truncate_at_sentence(summary, 40), "First sentence is here.");
        assert_eq!(
            truncate_at_sentence("abcdefghijklmnopqrstuvwxyz", 10),
            "abcdefg..."
        );
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let summary = "é".repeat(50);
        let truncated = truncate_at_sentence(&summary, 20);

        assert_eq!(truncated.chars().count(), 20);
        assert!(truncated.ends_with("..."));
    }
}
