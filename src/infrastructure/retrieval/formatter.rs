//! Answer formatter - turns a plain summary into sectioned HTML
//!
//! Output is deterministic for a given (query, summary) pair. The formatter
//! runs behind the [`Summarizer`] seam through [`FormattedSummarizer`], so the
//! cache stores the markup it serves.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::domain::generation::Summarizer;
use crate::domain::qa::QueryType;

/// Summaries shorter than this get a single "Quick Answer" section
const QUICK_ANSWER_MAX_CHARS: usize = 100;

/// Lead-in kept before a bullet list
const LEAD_CHARS: usize = 150;

/// Context kept under a ranked list
const RANKING_CONTEXT_CHARS: usize = 300;

const MIN_LIST_ITEMS: usize = 3;
const MAX_BULLETS: usize = 8;
const MAX_RANKED_ITEMS: usize = 10;
const MAX_FACTS: usize = 4;
const FACTS_PER_PATTERN: usize = 2;
const MIN_FACT_CHARS: usize = 20;
const MAX_DETAILS: usize = 3;
const MIN_DETAIL_CHARS: usize = 30;

const QUESTION_WORDS: &[&str] = &[
    "what", "who", "where", "when", "why", "how", "is", "are", "was", "were", "do", "does", "did",
    "can", "could", "would", "should", "has", "have", "had",
];

const RANKING_MARKERS: &[&str] = &[
    "top", "best", "cleanest", "greatest", "largest", "smallest", "highest", "lowest", "rank",
    "list",
];

const SUPERLATIVES: &[&str] = &[
    "tallest", "highest", "biggest", "largest", "smallest", "shortest",
];

/// Capitalized words never emphasized inside bullets
const PLAIN_TERMS: &[&str] = &[
    "this", "that", "these", "those", "there", "their", "which", "where", "when", "what",
];

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid regex"));
static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));
static CAPITALIZED_TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+(?:[A-Z][a-z]+)*\b").expect("valid regex"));

static NUMBERED_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\n|\. )([1-9][0-9]?)[.)]\s+([A-Z][^.!?\n]+)").expect("valid regex")
});
static BULLET_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\n)[*\-•]\s+([A-Z][^.!?\n]+)").expect("valid regex"));
static RANKED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,2})\s+(?:is|was|has been)\s+(?:ranked|rated|known|named|called|considered|recognized)",
    )
    .expect("valid regex")
});

static BULLET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:^|\n)(?:\d+\.\s+|\*\s+|:\s+)([A-Z][^.!?]*[.!?])",
        r"(?:^|\n)(?:First|Second|Third|Finally|Lastly)[,:]?\s+([A-Z][^.!?]*[.!?])",
        r"[.!?]\s+([A-Z][^.!?]*? (?:include|includes|are|is|was|were):[^.!?]*[.!?])",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
    .collect()
});

static FACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        "is", "are", "was", "were", "has", "have", "contains", "includes", "consists of",
    ]
    .into_iter()
    .map(|verb| Regex::new(&format!(r"([^.!?]*? {} [^.!?]*?\.)", verb)).expect("valid regex"))
    .collect()
});

/// Deterministic HTML formatter for generated answers
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerFormatter;

impl AnswerFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Sectioned HTML answer for `query` built from `summary`
    pub fn format(&self, query: &str, summary: &str) -> String {
        let summary = summary.trim();

        if summary.chars().count() < QUICK_ANSWER_MAX_CHARS {
            return format!(
                "<div class='doc-section'><h3>Quick Answer</h3><p><strong>Based on my search:</strong> {}</p></div>",
                escape(summary)
            );
        }

        let query = query.trim().trim_end_matches('?');
        let query_lower = query.to_lowercase();
        let query_type = QueryType::classify(query);
        let ranking = is_ranking_query(&query_lower);

        if ranking {
            if let Some(answer) = ranking_answer(&query_lower, summary) {
                return answer;
            }
        }

        let topic = title_case(&topic_phrase(&query_lower));
        let list_items = extract_list_items(summary);
        let direct = extract_direct_answer(&query_lower, summary);

        let mut bullets = bullet_candidates(summary);
        if bullets.len() < MIN_LIST_ITEMS && !list_items.is_empty() {
            bullets = list_items;
        }

        let mut out = String::new();

        if let Some(direct) = &direct {
            out.push_str(&format!(
                "<div class='doc-section'>\n<h3>Direct Answer</h3>\n<p class='direct-answer'><strong>{}</strong></p>\n</div>\n",
                escape(direct)
            ));
        }

        out.push_str(&format!(
            "<div class='doc-section'><h3>{}</h3><p>",
            escape(&section_heading(query_type, &topic))
        ));

        if bullets.len() >= MIN_LIST_ITEMS {
            let numbered = query_type == QueryType::Ranking || ranking;
            let lead: String = summary.chars().take(LEAD_CHARS).collect();
            out.push_str(&escape(&lead));
            out.push_str("...</p></div>\n");
            out.push_str(&bullet_section(&bullets, numbered));
        } else {
            out.push_str(&escape(summary));
            out.push_str("</p></div>\n");
        }

        let facts = key_facts(summary);
        if facts.len() >= 2 {
            out.push_str(&facts_section(&facts));
        }

        if let Some(direct) = &direct {
            out.push_str(&details_section(direct, summary));
        }

        out
    }
}

/// Summarizer that formats the inner summarizer's output as HTML
#[derive(Debug, Clone)]
pub struct FormattedSummarizer<S> {
    inner: S,
    formatter: AnswerFormatter,
}

impl<S> FormattedSummarizer<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            formatter: AnswerFormatter::new(),
        }
    }
}

#[async_trait]
impl<S: Summarizer> Summarizer for FormattedSummarizer<S> {
    async fn summarize(&self, query: &str, raw_text: &str) -> String {
        let summary = self.inner.summarize(query, raw_text).await;
        self.formatter.format(query, &summary)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn is_ranking_query(query_lower: &str) -> bool {
    RANKING_MARKERS
        .iter()
        .any(|marker| query_lower.contains(marker))
}

/// Up to three content words of the query, in query order
fn topic_phrase(query_lower: &str) -> String {
    let mut seen = HashSet::new();
    let words: Vec<&str> = WORD
        .find_iter(query_lower)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() > 2 && !QUESTION_WORDS.contains(w))
        .filter(|w| seen.insert(*w))
        .take(3)
        .collect();

    if words.is_empty() {
        query_lower.to_string()
    } else {
        words.join(" ")
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn section_heading(query_type: QueryType, topic: &str) -> String {
    match query_type {
        QueryType::Person => format!("About {}", topic),
        QueryType::Location => format!("Location Information: {}", topic),
        QueryType::Time => format!("Timeline: {}", topic),
        QueryType::Reason => format!("Analysis: Why {}?", topic),
        QueryType::Process => format!("Process: {}", topic),
        QueryType::Comparison => format!("Comparison: {}", topic),
        QueryType::Recommendation => format!("Recommendations: {}", topic),
        QueryType::Ranking => format!("Rankings: {}", topic),
        QueryType::Definition | QueryType::Quantity | QueryType::Informational => {
            format!("Information: {}", topic)
        }
    }
}

/// Numbered, bulleted or "X is ranked ..." items, at least three of them
fn extract_list_items(text: &str) -> Vec<String> {
    let mut numbered: BTreeMap<u32, String> = BTreeMap::new();
    for caps in NUMBERED_ITEM.captures_iter(text) {
        if let Ok(number) = caps[1].parse::<u32>() {
            if (1..=20).contains(&number) {
                numbered.insert(number, caps[2].trim().to_string());
            }
        }
    }
    if numbered.len() >= MIN_LIST_ITEMS {
        return numbered.into_values().collect();
    }

    let bullets: Vec<String> = BULLET_ITEM
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .collect();
    if bullets.len() >= MIN_LIST_ITEMS {
        return bullets;
    }

    let names: Vec<String> = RANKED_NAME
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .collect();
    if names.len() >= MIN_LIST_ITEMS {
        return names;
    }

    Vec::new()
}

fn bullet_candidates(summary: &str) -> Vec<String> {
    BULLET_PATTERNS
        .iter()
        .flat_map(|pattern| {
            pattern
                .captures_iter(summary)
                .map(|caps| caps[1].trim().to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

fn case_insensitive(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .ok()
}

/// Short factual answer for capital, definition and superlative questions
fn extract_direct_answer(query_lower: &str, text: &str) -> Option<String> {
    if query_lower.contains("capital")
        && (query_lower.contains("city") || query_lower.contains("what is"))
    {
        let country = query_lower
            .split("capital of ")
            .nth(1)
            .and_then(|rest| WORD.find(rest))?
            .as_str();

        let pattern = format!(
            r"(?:capital|capital city) of {} is ([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)",
            regex::escape(country)
        );

        return case_insensitive(&pattern)?
            .captures(text)
            .map(|caps| caps[1].to_string());
    }

    if let Some(topic) = query_lower.strip_prefix("what is") {
        let topic = topic.trim();
        if topic.is_empty() {
            return None;
        }

        let pattern = format!(r"{} (?:is|refers to|means) ([^.!?]+)", regex::escape(topic));

        return case_insensitive(&pattern)?
            .captures(text)
            .map(|caps| caps[1].trim().to_string());
    }

    let superlative = SUPERLATIVES.iter().find(|word| query_lower.contains(*word))?;
    let pattern = format!(
        r"(?:the|world's|earth's) {} ([^.!?]+) is ([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)",
        superlative
    );

    case_insensitive(&pattern)?
        .captures(text)
        .map(|caps| format!("{} ({})", &caps[2], &caps[1]))
}

/// Ranked list plus context, when the summary holds a list
fn ranking_answer(query_lower: &str, summary: &str) -> Option<String> {
    let items = extract_list_items(summary);
    if items.len() < MIN_LIST_ITEMS {
        return None;
    }

    let heading = if query_lower.contains("top") {
        "Top Results"
    } else if query_lower.contains("best") {
        "Best Results"
    } else {
        "Ranked List"
    };

    let mut out = format!(
        "<div class='doc-section'>\n<h3>{}</h3>\n<ol class='ranked-list'>\n",
        heading
    );
    for item in items.iter().take(MAX_RANKED_ITEMS) {
        out.push_str(&format!("<li><strong>{}</strong></li>\n", escape(item)));
    }
    out.push_str("</ol>\n</div>\n");

    let context: String = summary.chars().take(RANKING_CONTEXT_CHARS).collect();
    out.push_str(&format!(
        "<div class='doc-section'>\n<h3>Context</h3>\n<p>{}...</p>\n</div>\n",
        escape(&context)
    ));

    Some(out)
}

fn bullet_section(bullets: &[String], numbered: bool) -> String {
    let (heading, tag) = if numbered {
        ("Top Results", "ol")
    } else {
        ("Key Points", "ul")
    };

    let mut out = format!(
        "<div class='doc-section'>\n<h3>{}</h3>\n<{} class='key-points'>\n",
        heading, tag
    );
    for bullet in bullets.iter().take(MAX_BULLETS) {
        out.push_str(&format!("<li>{}</li>\n", emphasize_terms(&escape(bullet))));
    }
    out.push_str(&format!("</{}>\n</div>\n", tag));

    out
}

/// Wraps the first occurrence of each capitalized term in `<em>`
fn emphasize_terms(text: &str) -> String {
    let mut seen = HashSet::new();
    let terms: Vec<&str> = CAPITALIZED_TERM
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|term| term.chars().count() > 3)
        .filter(|term| !PLAIN_TERMS.contains(&term.to_lowercase().as_str()))
        .filter(|term| seen.insert(*term))
        .collect();

    let mut out = text.to_string();
    for term in terms {
        out = out.replacen(term, &format!("<em>{}</em>", term), 1);
    }
    out
}

fn key_facts(summary: &str) -> Vec<String> {
    FACT_PATTERNS
        .iter()
        .flat_map(|pattern| {
            pattern
                .captures_iter(summary)
                .take(FACTS_PER_PATTERN)
                .map(|caps| caps[1].trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|fact| fact.chars().count() > MIN_FACT_CHARS)
        .collect()
}

fn facts_section(facts: &[String]) -> String {
    let mut out =
        String::from("<div class='doc-section'>\n<h3>Important Facts</h3>\n<ul class='fact-list'>\n");

    for fact in facts.iter().take(MAX_FACTS) {
        let fact = escape(fact);
        let item = [" is ", " are "]
            .iter()
            .find_map(|verb| {
                fact.split_once(verb).map(|(subject, predicate)| {
                    format!("<strong>{}</strong>{}{}", subject.trim(), verb, predicate.trim())
                })
            })
            .unwrap_or(fact);

        out.push_str(&format!("<li>{}</li>\n", item));
    }
    out.push_str("</ul>\n</div>\n");

    out
}

fn details_section(direct: &str, summary: &str) -> String {
    let mut out = format!(
        "<div class='doc-section'>\n<h3>Details: {}</h3>\n",
        escape(direct)
    );

    let related: Vec<&str> = split_sentences(summary)
        .into_iter()
        .filter(|sentence| sentence.contains(direct) && sentence.chars().count() > MIN_DETAIL_CHARS)
        .take(MAX_DETAILS)
        .collect();

    if related.is_empty() {
        out.push_str(&format!(
            "<p>Additional information about {} is not available in the current search results.</p>\n",
            escape(direct)
        ));
    } else {
        out.push_str("<ul class='details-list'>\n");
        for sentence in related {
            out.push_str(&format!("<li>{}</li>\n", escape(sentence)));
        }
        out.push_str("</ul>\n");
    }

    out.push_str("</div>\n");
    out
}

/// Sentences split after terminal punctuation, punctuation kept
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_BREAK.find_iter(text) {
        sentences.push(text[start..m.start() + 1].trim());
        start = m.end();
    }
    if start < text.len() {
        sentences.push(text[start..].trim());
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::MockSummarizer;

    const PARIS: &str = "The capital of France is Paris, a city on the Seine river. \
                         Paris is home to more than two million residents. \
                         The Louvre is the most visited museum in the world. \
                         Paris has been the capital for many centuries.";

    #[test]
    fn test_short_summary_gets_quick_answer() {
        let html = AnswerFormatter::new().format("What is Rust?", "Rust is a language.");

        assert_eq!(
            html,
            "<div class='doc-section'><h3>Quick Answer</h3><p><strong>Based on my search:</strong> \
             Rust is a language.</p></div>"
        );
    }

    #[test]
    fn test_capital_question_gets_direct_answer_and_details() {
        let html = AnswerFormatter::new().format("What is the capital of France?", PARIS);

        assert!(html.starts_with("<div class='doc-section'>\n<h3>Direct Answer</h3>"));
        assert!(html.contains("<p class='direct-answer'><strong>Paris</strong></p>"));
        assert!(html.contains("<h3>Information: The Capital France</h3>"));
        assert!(html.contains("<h3>Important Facts</h3>"));
        assert!(html.contains("<h3>Details: Paris</h3>"));
        assert!(html.contains("<li>Paris is home to more than two million residents.</li>"));
    }

    #[test]
    fn test_format_is_deterministic() {
        let formatter = AnswerFormatter::new();

        assert_eq!(
            formatter.format("Why do leaves change colour?", PARIS),
            formatter.format("Why do leaves change colour?", PARIS)
        );
    }

    #[test]
    fn test_heading_follows_query_type() {
        let html = AnswerFormatter::new().format("Why do leaves change colour?", PARIS);

        assert!(html.contains("<h3>Analysis: Why Leaves Change Colour?</h3>"));
    }

    #[test]
    fn test_ranking_query_gets_ordered_list() {
        let summary = "Rankings vary by survey.\n\
                       1. Zurich leads for transport and safety\n\
                       2. Copenhagen follows for cycling infrastructure\n\
                       3. Vienna rounds out the podium for culture\n\
                       Other cities trail behind the leading three.";

        let html = AnswerFormatter::new().format("Top cities to live in", summary);

        assert!(html.starts_with("<div class='doc-section'>\n<h3>Top Results</h3>\n<ol class='ranked-list'>"));
        assert!(html.contains("<li><strong>Zurich leads for transport and safety</strong></li>"));
        assert!(html.contains("<h3>Context</h3>"));
    }

    #[test]
    fn test_extract_list_items() {
        let numbered = "Intro\n1. Alpha first item\n2. Beta second item\n3. Gamma third item";
        assert_eq!(
            extract_list_items(numbered),
            vec!["Alpha first item", "Beta second item", "Gamma third item"]
        );

        let ranked = "Oslo is ranked highly. Bergen is known for rain. Tromso is considered remote.";
        assert_eq!(extract_list_items(ranked), vec!["Oslo", "Bergen", "Tromso"]);

        assert!(extract_list_items("Nothing to list here.").is_empty());
    }

    #[test]
    fn test_superlative_direct_answer() {
        let text = "Climbers know that the tallest mountain on Earth is Everest, in the Himalayas.";

        assert_eq!(
            extract_direct_answer("which is the tallest mountain", text),
            Some("Everest (mountain on Earth)".to_string())
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let summary = "Generics use angle brackets like Vec<T> in Rust code. \
                       They let one function work across many types safely. \
                       Traits bound what a generic parameter can do.";

        let html = AnswerFormatter::new().format("Explain Rust generics", summary);

        assert!(html.contains("Vec&lt;T&gt;"));
        assert!(!html.contains("Vec<T>"));
    }

    #[test]
    fn test_emphasize_terms_once() {
        assert_eq!(
            emphasize_terms("Paris and Paris again, with This ignored"),
            "<em>Paris</em> and Paris again, with This ignored"
        );
    }

    #[tokio::test]
    async fn test_formatted_summarizer_wraps_inner_output() {
        let mut inner = MockSummarizer::new();
        inner
            .expect_summarize()
            .times(1)
            .returning(|_, _| PARIS.to_string());

        let summarizer = FormattedSummarizer::new(inner);
        let answer = summarizer
            .summarize("What is the capital of France?", "raw text")
            .await;

        assert!(answer.contains("<strong>Paris</strong>"));
        assert!(answer.contains("class='doc-section'"));
    }
}
