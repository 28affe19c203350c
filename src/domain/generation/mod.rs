//! Answer generation collaborators
//!
//! The cache only sees these two seams: a retriever that gathers raw text
//! for a query and a summarizer that turns it into the stored answer.

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// Gathers raw text about a query from external sources
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Concatenated source text; failures yield an empty or short string
    async fn retrieve(&self, query: &str) -> String;
}

/// Turns raw retrieved text into a final answer
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, query: &str, raw_text: &str) -> String;
}
