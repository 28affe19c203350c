//! Retrieval and summarization configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One HTML search endpoint and how to read its result links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEngine {
    pub name: String,

    /// Search page queried for result links
    pub url: String,

    /// Name of the query-string parameter carrying the query
    #[serde(default = "default_query_param")]
    pub query_param: String,

    /// CSS selector for result links on the search page
    pub result_selector: String,
}

impl SearchEngine {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        result_selector: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            query_param: default_query_param(),
            result_selector: result_selector.into(),
        }
    }
}

/// Configuration for web retrieval and extractive summarization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Search engines tried in order until one yields result links
    #[serde(default = "default_search_engines")]
    pub search_engines: Vec<SearchEngine>,

    /// Maximum number of pages fetched per query
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    /// Pages fetched in parallel
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Pages yielding less text than this are dropped
    #[serde(default = "default_min_source_chars")]
    pub min_source_chars: usize,

    /// Text kept from each page
    #[serde(default = "default_max_chars_per_source")]
    pub max_chars_per_source: usize,

    /// Upper bound on summary length
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,

    /// Wrap summaries in sectioned HTML
    #[serde(default = "default_format_answers")]
    pub format_answers: bool,

    /// User agents rotated across outgoing requests
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,

    /// Links containing any of these fragments are never fetched
    #[serde(default = "default_blocked_url_fragments")]
    pub blocked_url_fragments: Vec<String>,
}

fn default_search_engines() -> Vec<SearchEngine> {
    vec![
        SearchEngine::new("duckduckgo", "https://html.duckduckgo.com/html/", "a.result__a"),
        SearchEngine::new("brave", "https://search.brave.com/search", "a.snippet-title"),
        SearchEngine::new("mojeek", "https://www.mojeek.com/search", "a.title"),
    ]
}

fn default_query_param() -> String {
    "q".to_string()
}

fn default_max_sources() -> usize {
    8
}

fn default_concurrency() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_min_source_chars() -> usize {
    200
}

fn default_max_chars_per_source() -> usize {
    5000
}

fn default_summary_max_chars() -> usize {
    2048
}

fn default_format_answers() -> bool {
    true
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_blocked_url_fragments() -> Vec<String> {
    [
        "youtube.com",
        "facebook.com",
        "twitter.com",
        "instagram.com",
        "linkedin.com",
        "pinterest.com",
        "reddit.com",
        "tiktok.com",
        "amazon.com",
        "ebay.com",
        "netflix.com",
        "spotify.com",
        "apple.com",
        "microsoft.com",
        "login",
        "signin",
        "account",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search_engines: default_search_engines(),
            max_sources: default_max_sources(),
            concurrency: default_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
            min_source_chars: default_min_source_chars(),
            max_chars_per_source: default_max_chars_per_source(),
            summary_max_chars: default_summary_max_chars(),
            format_answers: default_format_answers(),
            user_agents: default_user_agents(),
            blocked_url_fragments: default_blocked_url_fragments(),
        }
    }
}

impl RetrievalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn with_search_engines(mut self, engines: Vec<SearchEngine>) -> Self {
        self.search_engines = engines;
        self
    }

    pub fn with_max_sources(mut self, max: usize) -> Self {
        self.max_sources = max;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_user_agents(mut self, user_agents: Vec<String>) -> Self {
        self.user_agents = user_agents;
        self
    }

    pub fn with_format_answers(mut self, enabled: bool) -> Self {
        self.format_answers = enabled;
        self
    }

    pub fn with_blocked_url_fragments(mut self, fragments: Vec<String>) -> Self {
        self.blocked_url_fragments = fragments;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetrievalConfig::default();

        let names: Vec<&str> = config.search_engines.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["duckduckgo", "brave", "mojeek"]);
        assert_eq!(config.search_engines[0].url, "https://html.duckduckgo.com/html/");
        assert_eq!(config.search_engines[0].query_param, "q");
        assert_eq!(config.search_engines[0].result_selector, "a.result__a");
        assert_eq!(config.user_agents.len(), 5);
        assert!(config.format_answers);
        assert_eq!(config.max_sources, 8);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.summary_max_chars, 2048);
        assert!(config.blocked_url_fragments.iter().any(|f| f == "login"));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: RetrievalConfig =
            serde_json::from_str(
                r#"{
                    "max_sources": 3,
                    "search_engines": [
                        {"name": "local", "url": "http://localhost/s", "result_selector": "a.hit"}
                    ]
                }"#,
            )
            .unwrap();

        assert_eq!(config.max_sources, 3);
        assert_eq!(
            config.search_engines,
            vec![SearchEngine::new("local", "http://localhost/s", "a.hit")]
        );
        assert_eq!(config.concurrency, 4);
    }
}
