//! Q&A store trait and statistics types

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{NewQaEntry, QaEntry, QaEntryId, QueryType};
use crate::domain::DomainError;

/// Default number of keyword-overlap candidates fetched for fuzzy matching
pub const DEFAULT_CANDIDATE_LIMIT: usize = 50;

/// Number of most-used queries reported in statistics
pub const TOP_QUERIES_LIMIT: usize = 5;

/// Result of an insert that may collapse into an existing row
#[derive(Debug, Clone)]
pub struct InsertOutcome {
    /// The row as it stands after the operation
    pub entry: QaEntry,
    /// False when a row with the same hash already existed and was reinforced
    pub created: bool,
}

/// A query and how often it has been used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryUsage {
    pub query: String,
    pub count: i64,
}

/// Number of entries carrying one query type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeCount {
    pub query_type: QueryType,
    pub count: i64,
}

/// Aggregate view of the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub total_entries: i64,
    /// Most-used queries, highest count first
    pub top_queries: Vec<QueryUsage>,
    /// Entry counts per query type, largest first
    pub type_distribution: Vec<TypeCount>,
}

/// Persistent mapping from query identity to answer.
///
/// Every mutation is atomic at the single-entry level: counters are bumped
/// in place by the backend, never read-modify-written by the caller.
#[async_trait]
pub trait QaRepository: Send + Sync + Debug {
    /// Most-used entry with this query hash
    async fn lookup_by_hash(&self, query_hash: &str) -> Result<Option<QaEntry>, DomainError>;

    /// Entries sharing at least one keyword, ordered by use count then recency
    async fn candidates_by_keywords(
        &self,
        keywords: &[String],
        limit: usize,
    ) -> Result<Vec<QaEntry>, DomainError>;

    /// Insert a new entry with a use count of 1
    async fn insert(&self, entry: NewQaEntry) -> Result<QaEntry, DomainError>;

    /// Insert, or bump the use count of the row that already holds this hash
    async fn insert_or_reinforce(&self, entry: NewQaEntry) -> Result<InsertOutcome, DomainError>;

    /// Replace the answer and query type, bumping the use count
    async fn update_answer(
        &self,
        id: QaEntryId,
        answer: &str,
        query_type: QueryType,
    ) -> Result<QaEntry, DomainError>;

    /// Bump the use count, returning the new value
    async fn increment_use(&self, id: QaEntryId) -> Result<i64, DomainError>;

    /// Totals, most-used queries and the type distribution
    async fn stats(&self) -> Result<CacheStatistics, DomainError>;

    /// Cheap round trip to the backend
    async fn ping(&self) -> Result<(), DomainError>;

    /// Release backend resources; the store is unusable afterwards
    async fn close(&self) {}
}
