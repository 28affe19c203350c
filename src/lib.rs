//! Learning Q&A cache
//!
//! Sits in front of a slow web-retrieval and summarization pipeline:
//! - Exact reuse of stored answers by query hash
//! - Fuzzy reuse through keyword and character n-gram similarity
//! - Quality-gated learning of newly generated answers
//! - PostgreSQL or in-memory storage with atomic use counting

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::AppState;
use domain::generation::Summarizer;
use infrastructure::retrieval::{ExtractiveSummarizer, FormattedSummarizer, HttpRetriever};
use infrastructure::services::LearningCacheService;
use infrastructure::storage::StoreFactory;

/// Opens the configured store and wires the service with the web retriever
/// and extractive summarizer, formatted as HTML when enabled.
pub async fn create_learning_cache(config: &AppConfig) -> anyhow::Result<Arc<LearningCacheService>> {
    let storage_config = config.storage.to_storage_config()?;
    let store = StoreFactory::create(&storage_config).await?;

    let retriever = HttpRetriever::new(config.retrieval.clone())?;
    let extractive = ExtractiveSummarizer::new(config.retrieval.summary_max_chars);
    let summarizer: Arc<dyn Summarizer> = if config.retrieval.format_answers {
        Arc::new(FormattedSummarizer::new(extractive))
    } else {
        Arc::new(extractive)
    };

    Ok(Arc::new(LearningCacheService::with_config(
        store,
        Arc::new(retriever),
        summarizer,
        config.cache.clone(),
    )))
}

/// Application state for the HTTP layer
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    Ok(AppState::new(create_learning_cache(config).await?))
}
