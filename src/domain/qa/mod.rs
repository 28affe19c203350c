//! Q&A domain - stored entries, query types and the store contract

mod config;
mod entry;
mod query_type;
mod repository;

pub use config::{CacheConfig, READ_THRESHOLD, WRITE_THRESHOLD};
pub use entry::{NewQaEntry, QaEntry, QaEntryId};
pub use query_type::QueryType;
pub use repository::{
    CacheStatistics, DEFAULT_CANDIDATE_LIMIT, InsertOutcome, QaRepository, QueryUsage,
    TOP_QUERIES_LIMIT, TypeCount,
};
