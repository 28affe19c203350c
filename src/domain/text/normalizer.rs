//! Normalizer functions

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Maximum number of keywords kept for a single text
pub const KEYWORD_LIMIT: usize = 15;

/// Below this many candidate tokens every token is kept, without frequency ranking
const FREQUENCY_RANKING_MIN_TOKENS: usize = 5;

/// Tokens must be longer than this many characters to count
const MIN_TOKEN_CHARS: usize = 2;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Stop words dropped during keyword extraction
static KEYWORD_STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "is", "are", "was", "were", "in", "on", "at", "to",
        "for", "with", "by", "about", "like", "from", "of", "as", "what", "when", "where", "who",
        "why", "how", "can", "could", "would", "should", "may", "might", "must", "need", "have",
        "has", "had", "do", "does", "did", "will", "shall", "this", "that", "these", "those",
        "them", "they", "their", "we", "us", "our", "ours", "you", "your", "yours", "he", "him",
        "his", "she", "her", "hers", "it", "its", "be", "been", "being", "am",
    ]
    .into_iter()
    .collect()
});

/// Smaller stop list used for content words (relevance and vocabulary checks)
static WORD_STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "is", "are", "was", "were", "in", "on", "at", "to",
        "for", "with", "by", "about", "like", "from", "of", "as", "what", "when", "where", "who",
        "why", "how",
    ]
    .into_iter()
    .collect()
});

/// Lowercases, replaces punctuation with spaces, collapses whitespace and trims
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_punctuation = NON_WORD.replace_all(&lowered, " ");

    WHITESPACE
        .replace_all(&without_punctuation, " ")
        .trim()
        .to_string()
}

/// Extracts up to [`KEYWORD_LIMIT`] salient tokens from normalized text.
///
/// Stop words and tokens of two characters or fewer are dropped. When more
/// than five tokens survive, the most frequent ones are kept, ties going to
/// the token seen first. The result never contains duplicates.
pub fn keywords_of(clean: &str) -> Vec<String> {
    let tokens: Vec<&str> = filtered_tokens(clean, &KEYWORD_STOP_WORDS).collect();

    if tokens.len() <= FREQUENCY_RANKING_MIN_TOKENS {
        return dedup_in_order(tokens);
    }

    // token -> (count, first position)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();

    for (position, token) in tokens.iter().enumerate() {
        counts.entry(*token).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(token, (count, first))| (token, count, first))
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(KEYWORD_LIMIT)
        .map(|(token, _, _)| token.to_string())
        .collect()
}

/// All content words of normalized text, in order, duplicates included
pub fn words_of(clean: &str) -> Vec<String> {
    filtered_tokens(clean, &WORD_STOP_WORDS)
        .map(str::to_string)
        .collect()
}

/// Set of all `n`-character windows of the text
pub fn ngrams(clean: &str, n: usize) -> HashSet<String> {
    if n == 0 {
        return HashSet::new();
    }

    let chars: Vec<char> = clean.chars().collect();

    chars.windows(n).map(|w| w.iter().collect()).collect()
}

/// Jaccard similarity; two empty sets are 0.0, not 1.0
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();

    if union == 0 {
        return 0.0;
    }

    a.intersection(b).count() as f64 / union as f64
}

/// Hex SHA-256 of the trimmed, lowercased query
pub fn query_hash(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.trim().to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

/// Number of characters that are not whitespace
pub fn non_space_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

fn filtered_tokens<'a>(
    clean: &'a str,
    stop_words: &'a HashSet<&'static str>,
) -> impl Iterator<Item = &'a str> + 'a {
    clean
        .split_whitespace()
        .filter(move |token| !stop_words.contains(token))
        .filter(|token| token.chars().count() > MIN_TOKEN_CHARS)
}

fn dedup_in_order(tokens: Vec<&str>) -> Vec<String> {
    let mut seen = HashSet::new();

    tokens
        .into_iter()
        .filter(|token| seen.insert(*token))
        .map(str::to_string)
        .collect()
}

/// Precomputed lexical features of one query
#[derive(Debug, Clone)]
pub struct QueryProfile {
    clean: String,
    keywords: Vec<String>,
    keyword_set: HashSet<String>,
    bigrams: HashSet<String>,
    trigrams: HashSet<String>,
}

impl QueryProfile {
    /// Profile a raw query
    pub fn new(query: &str) -> Self {
        let clean = normalize(query);
        let keywords = keywords_of(&clean);

        Self::with_keywords(clean, keywords)
    }

    /// Profile a raw query whose keywords were extracted earlier (e.g. at insert time)
    pub fn with_stored_keywords(query: &str, keywords: &[String]) -> Self {
        Self::with_keywords(normalize(query), keywords.to_vec())
    }

    fn with_keywords(clean: String, keywords: Vec<String>) -> Self {
        let keyword_set = keywords.iter().cloned().collect();
        let bigrams = ngrams(&clean, 2);
        let trigrams = ngrams(&clean, 3);

        Self {
            clean,
            keywords,
            keyword_set,
            bigrams,
            trigrams,
        }
    }

    pub fn clean(&self) -> &str {
        &self.clean
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn keyword_set(&self) -> &HashSet<String> {
        &self.keyword_set
    }

    pub fn bigrams(&self) -> &HashSet<String> {
        &self.bigrams
    }

    pub fn trigrams(&self) -> &HashSet<String> {
        &self.trigrams
    }

    /// Length of the normalized text in characters
    pub fn len(&self) -> usize {
        self.clean.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.clean.is_empty()
    }

    /// True when the profile has at least one keyword in common with `other`
    pub fn shares_keyword_with(&self, other: &QueryProfile) -> bool {
        !self.keyword_set.is_disjoint(&other.keyword_set)
    }
}
