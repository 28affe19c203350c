//! Web retriever - search page scraping and parallel page fetching

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Url;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::config::{RetrievalConfig, SearchEngine};
use crate::domain::DomainError;
use crate::domain::generation::Retriever;

/// Query parameter carrying the real target of a search-engine redirect link
const REDIRECT_TARGET_PARAM: &str = "uddg";

/// Sent when no user agents are configured
const FALLBACK_USER_AGENT: &str = concat!("qa-learning-cache/", env!("CARGO_PKG_VERSION"));

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "head", "nav", "footer", "header", "svg", "form",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "h1", "h2", "h3", "h4", "h5", "h6", "br", "li", "tr", "td",
    "th", "blockquote", "pre",
];

/// A configured search engine with its selector and base URL parsed
#[derive(Debug, Clone)]
struct CompiledEngine {
    engine: SearchEngine,
    selector: Selector,
    base: Url,
}

impl CompiledEngine {
    fn compile(engine: &SearchEngine) -> Result<Self, DomainError> {
        let selector = Selector::parse(&engine.result_selector).map_err(|e| {
            DomainError::configuration(format!(
                "Invalid result selector '{}' for {}: {}",
                engine.result_selector, engine.name, e
            ))
        })?;

        let base = Url::parse(&engine.url).map_err(|e| {
            DomainError::configuration(format!(
                "Invalid search URL '{}' for {}: {}",
                engine.url, engine.name, e
            ))
        })?;

        Ok(Self {
            engine: engine.clone(),
            selector,
            base,
        })
    }
}

/// Retriever that scrapes HTML search pages and fetches the linked pages
#[derive(Debug)]
pub struct HttpRetriever {
    client: reqwest::Client,
    config: RetrievalConfig,
    engines: Vec<CompiledEngine>,
    next_agent: AtomicUsize,
}

impl HttpRetriever {
    pub fn new(config: RetrievalConfig) -> Result<Self, DomainError> {
        if config.search_engines.is_empty() {
            return Err(DomainError::configuration(
                "At least one search engine must be configured",
            ));
        }

        let engines = config
            .search_engines
            .iter()
            .map(CompiledEngine::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(FALLBACK_USER_AGENT)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            engines,
            next_agent: AtomicUsize::new(0),
        })
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Next user agent in round-robin order
    fn next_user_agent(&self) -> &str {
        let agents = &self.config.user_agents;
        if agents.is_empty() {
            return FALLBACK_USER_AGENT;
        }

        let index = self.next_agent.fetch_add(1, Ordering::Relaxed) % agents.len();
        &agents[index]
    }

    /// Result links for a query from the first engine that yields any,
    /// deduplicated and capped at `max_sources`
    pub async fn search(&self, query: &str) -> Result<Vec<String>, DomainError> {
        let mut answered = false;
        let mut last_error = None;

        for engine in &self.engines {
            match self.search_engine(engine, query).await {
                Ok(links) if !links.is_empty() => {
                    debug!(engine = %engine.engine.name, links = links.len(), "Search succeeded");
                    return Ok(links);
                }
                Ok(_) => {
                    debug!(engine = %engine.engine.name, "Search returned no usable links");
                    answered = true;
                }
                Err(e) => {
                    warn!(engine = %engine.engine.name, error = %e, "Search engine failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(Vec::new()),
        }
    }

    async fn search_engine(
        &self,
        engine: &CompiledEngine,
        query: &str,
    ) -> Result<Vec<String>, DomainError> {
        let response = self
            .client
            .get(engine.base.clone())
            .query(&[(engine.engine.query_param.as_str(), query)])
            .header(USER_AGENT, self.next_user_agent())
            .header(ACCEPT, "text/html,application/xhtml+xml,application/xml")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| DomainError::internal(format!("Search request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DomainError::internal(format!(
                "Search returned status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DomainError::internal(format!("Failed to read search page: {}", e)))?;

        Ok(self.result_links(engine, &body))
    }

    /// Extract, resolve and filter result links from one engine's search page
    fn result_links(&self, engine: &CompiledEngine, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut links: Vec<String> = Vec::new();

        for href in document
            .select(&engine.selector)
            .filter_map(|el| el.value().attr("href"))
        {
            let Some(url) = resolve_result_link(&engine.base, href) else {
                continue;
            };

            if self.is_allowed(&url) && !links.contains(&url) {
                links.push(url);
            }

            if links.len() >= self.config.max_sources {
                break;
            }
        }

        links
    }

    fn is_allowed(&self, url: &str) -> bool {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return false;
        }

        let lowered = url.to_lowercase();

        !self
            .config
            .blocked_url_fragments
            .iter()
            .any(|fragment| lowered.contains(&fragment.to_lowercase()))
    }

    /// Visible text of one page as a `From <url>:` block, `None` when unusable
    pub async fn fetch_page(&self, url: &str) -> Option<String> {
        let request = self
            .client
            .get(url)
            .header(USER_AGENT, self.next_user_agent());

        let response = match request.send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(url = %url, status = %response.status(), "Skipping page");
                return None;
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Failed to fetch page");
                return None;
            }
        };

        let body = response.text().await.ok()?;
        let text = visible_text(&body);

        if text.chars().count() <= self.config.min_source_chars {
            debug!(url = %url, chars = text.len(), "Page has too little text");
            return None;
        }

        let text: String = text.chars().take(self.config.max_chars_per_source).collect();

        Some(format!("From {}:\n\n{}", url, text))
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, query: &str) -> String {
        let links = match self.search(query).await {
            Ok(links) => links,
            Err(e) => {
                warn!(query = %query, error = %e, "Web search failed");
                return String::new();
            }
        };

        if links.is_empty() {
            warn!(query = %query, "Web search returned no usable links");
            return String::new();
        }

        let pages: Vec<String> = stream::iter(links.iter().cloned())
            .map(|url| async move { self.fetch_page(&url).await })
            .buffered(self.config.concurrency.max(1))
            .filter_map(|page| async move { page })
            .collect()
            .await;

        debug!(
            query = %query,
            links = links.len(),
            pages = pages.len(),
            "Retrieved source text"
        );

        pages.join("\n\n")
    }
}

/// Absolute target of a result link, unwrapping search-engine redirects
fn resolve_result_link(base: &Url, href: &str) -> Option<String> {
    let url = base.join(href).ok()?;

    if let Some((_, target)) = url
        .query_pairs()
        .find(|(key, _)| key == REDIRECT_TARGET_PARAM)
    {
        return Some(target.into_owned());
    }

    // Other links back into the search engine are navigation, not results
    if url.host_str() == base.host_str() {
        return None;
    }

    Some(url.to_string())
}

/// Visible text of an HTML page, one block per line
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next());

    let mut text = String::new();

    match body {
        Some(body) => collect_text(&body, &mut text),
        None => collect_text(&document.root_element(), &mut text),
    }

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: &ElementRef, out: &mut String) {
    for node in element.children() {
        if let Some(child) = ElementRef::wrap(node) {
            let tag = child.value().name();

            if SKIPPED_TAGS.contains(&tag) {
                continue;
            }

            let is_block = BLOCK_TAGS.contains(&tag);
            if is_block && !out.ends_with('\n') {
                out.push('\n');
            }

            collect_text(&child, out);

            if is_block {
                out.push('\n');
            }
        } else if let Some(text) = node.value().as_text() {
            out.push_str(text);
        }
    }
}
