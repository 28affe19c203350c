//! Answer generation collaborators - web retrieval, extractive summarization and answer formatting

mod config;
mod formatter;
mod http;
mod summarizer;

pub use config::{RetrievalConfig, SearchEngine};
pub use formatter::{AnswerFormatter, FormattedSummarizer};
pub use http::{HttpRetriever, visible_text};
pub use summarizer::{ExtractiveSummarizer, MIN_RAW_TEXT_CHARS};
