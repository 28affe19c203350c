//! PostgreSQL Q&A store with connection pooling

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use tracing::{debug, info};

use crate::domain::DomainError;
use crate::domain::qa::{
    CacheStatistics, InsertOutcome, NewQaEntry, QaEntry, QaEntryId, QaRepository, QueryType,
    QueryUsage, TOP_QUERIES_LIMIT, TypeCount,
};

/// Columns selected for every entry, in `entry_from_row` order
const ENTRY_COLUMNS: &str = "id, query, query_hash, query_keywords, answer, use_count, \
                             query_type, created_at, updated_at";

/// PostgreSQL pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// How long a caller waits for a free connection, in seconds
    pub acquire_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/qa_learning_cache".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn with_acquire_timeout(mut self, secs: u64) -> Self {
        self.acquire_timeout_secs = secs;
        self
    }

    pub fn with_idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = secs;
        self
    }

    /// Open a bounded pool; min is raised to 1 and max to at least min
    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        let min_connections = self.min_connections.max(1);
        let max_connections = self.max_connections.max(min_connections);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .connect(&self.url)
            .await
            .map_err(|e| storage_error("Failed to connect to PostgreSQL", &e))?;

        info!(max_connections, min_connections, "PostgreSQL pool opened");

        Ok(pool)
    }
}

/// Map a driver error onto the domain taxonomy.
///
/// Pool and transport failures become `StorageUnavailable` so callers can
/// degrade; anything else is an internal error.
pub fn storage_error(context: &str, error: &sqlx::Error) -> DomainError {
    match error {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => {
            DomainError::storage_unavailable(format!("{}: {}", context, error))
        }
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DomainError::conflict(format!("{}: {}", context, error))
        }
        _ => DomainError::internal(format!("{}: {}", context, error)),
    }
}

fn entry_from_row(row: &PgRow) -> Result<QaEntry, DomainError> {
    let decode = |e: sqlx::Error| storage_error("Failed to decode qa_pairs row", &e);
    let query_type: String = row.try_get("query_type").map_err(decode)?;

    Ok(QaEntry::restore(
        QaEntryId::new(row.try_get("id").map_err(decode)?),
        row.try_get("query").map_err(decode)?,
        row.try_get("query_hash").map_err(decode)?,
        row.try_get("query_keywords").map_err(decode)?,
        row.try_get("answer").map_err(decode)?,
        row.try_get("use_count").map_err(decode)?,
        QueryType::from_tag_lossy(&query_type),
        row.try_get("created_at").map_err(decode)?,
        row.try_get("updated_at").map_err(decode)?,
    ))
}

/// Q&A store backed by the `qa_pairs` table.
///
/// Every mutation is a single statement, so concurrent hits on one row
/// never lose an increment.
pub struct PostgresQaRepository {
    pool: PgPool,
}

impl Debug for PostgresQaRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresQaRepository")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl PostgresQaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl QaRepository for PostgresQaRepository {
    async fn lookup_by_hash(&self, query_hash: &str) -> Result<Option<QaEntry>, DomainError> {
        let query = format!(
            "SELECT {} FROM qa_pairs WHERE query_hash = $1 ORDER BY use_count DESC LIMIT 1",
            ENTRY_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(query_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to look up entry by hash", &e))?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn candidates_by_keywords(
        &self,
        keywords: &[String],
        limit: usize,
    ) -> Result<Vec<QaEntry>, DomainError> {
        if keywords.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let query = format!(
            r#"
            SELECT {}
            FROM qa_pairs
            WHERE query_keywords && $1::text[]
            ORDER BY use_count DESC, updated_at DESC
            LIMIT $2
            "#,
            ENTRY_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(keywords.to_vec())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to fetch candidates", &e))?;

        debug!(keywords = ?keywords, candidates = rows.len(), "Fetched fuzzy candidates");

        rows.iter().map(entry_from_row).collect()
    }

    async fn insert(&self, entry: NewQaEntry) -> Result<QaEntry, DomainError> {
        let query = format!(
            r#"
            INSERT INTO qa_pairs (query, query_hash, query_keywords, answer, query_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(entry.query())
            .bind(entry.query_hash())
            .bind(entry.keywords().to_vec())
            .bind(entry.answer())
            .bind(entry.query_type().as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to insert entry", &e))?;

        entry_from_row(&row)
    }

    async fn insert_or_reinforce(&self, entry: NewQaEntry) -> Result<InsertOutcome, DomainError> {
        // xmax is 0 only for rows created by this statement
        let query = format!(
            r#"
            INSERT INTO qa_pairs (query, query_hash, query_keywords, answer, query_type)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (query_hash) DO UPDATE
            SET use_count = qa_pairs.use_count + 1
            RETURNING {}, (xmax = 0) AS inserted
            "#,
            ENTRY_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(entry.query())
            .bind(entry.query_hash())
            .bind(entry.keywords().to_vec())
            .bind(entry.answer())
            .bind(entry.query_type().as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to insert or reinforce entry", &e))?;

        let created: bool = row
            .try_get("inserted")
            .map_err(|e| storage_error("Failed to decode insert outcome", &e))?;

        Ok(InsertOutcome {
            entry: entry_from_row(&row)?,
            created,
        })
    }

    async fn update_answer(
        &self,
        id: QaEntryId,
        answer: &str,
        query_type: QueryType,
    ) -> Result<QaEntry, DomainError> {
        let query = format!(
            r#"
            UPDATE qa_pairs
            SET answer = $2, query_type = $3, updated_at = NOW(), use_count = use_count + 1
            WHERE id = $1
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id.value())
            .bind(answer)
            .bind(query_type.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to update answer", &e))?;

        match row {
            Some(row) => entry_from_row(&row),
            None => Err(DomainError::not_found(format!("Entry '{}' not found", id))),
        }
    }

    async fn increment_use(&self, id: QaEntryId) -> Result<i64, DomainError> {
        let use_count: Option<i64> = sqlx::query_scalar(
            "UPDATE qa_pairs SET use_count = use_count + 1 WHERE id = $1 RETURNING use_count",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to increment use count", &e))?;

        use_count.ok_or_else(|| DomainError::not_found(format!("Entry '{}' not found", id)))
    }

    async fn stats(&self) -> Result<CacheStatistics, DomainError> {
        let total_entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM qa_pairs")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to count entries", &e))?;

        let top_rows = sqlx::query(
            r#"
            SELECT query, use_count
            FROM qa_pairs
            ORDER BY use_count DESC, updated_at DESC
            LIMIT $1
            "#,
        )
        .bind(TOP_QUERIES_LIMIT as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch top queries", &e))?;

        let type_rows = sqlx::query(
            r#"
            SELECT query_type, COUNT(*) AS count
            FROM qa_pairs
            GROUP BY query_type
            ORDER BY count DESC, query_type
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch type distribution", &e))?;

        let top_queries = top_rows
            .iter()
            .map(|row| -> Result<QueryUsage, sqlx::Error> {
                Ok(QueryUsage {
                    query: row.try_get("query")?,
                    count: row.try_get("use_count")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| storage_error("Failed to decode top queries", &e))?;

        let type_distribution = type_rows
            .iter()
            .map(|row| -> Result<TypeCount, sqlx::Error> {
                let tag: String = row.try_get("query_type")?;
                Ok(TypeCount {
                    query_type: QueryType::from_tag_lossy(&tag),
                    count: row.try_get("count")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| storage_error("Failed to decode type distribution", &e))?;

        Ok(CacheStatistics {
            total_entries,
            top_queries,
            type_distribution,
        })
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("PostgreSQL ping failed", &e))?;

        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_config_default() {
        let config = PostgresConfig::default();

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout_secs, 30);
        assert_eq!(config.idle_timeout_secs, 600);
    }

    #[test]
    fn test_postgres_config_builder() {
        let config = PostgresConfig::new("postgres://localhost/test")
            .with_max_connections(20)
            .with_min_connections(5)
            .with_acquire_timeout(5)
            .with_idle_timeout(300);

        assert_eq!(config.url, "postgres://localhost/test");
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 5);
        assert_eq!(config.acquire_timeout_secs, 5);
        assert_eq!(config.idle_timeout_secs, 300);
    }

    #[test]
    fn test_pool_errors_are_storage_unavailable() {
        let error = storage_error("lookup", &sqlx::Error::PoolTimedOut);
        assert!(error.is_storage_unavailable());

        let error = storage_error("lookup", &sqlx::Error::PoolClosed);
        assert!(error.is_storage_unavailable());

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let error = storage_error("lookup", &sqlx::Error::Io(io));
        assert!(error.is_storage_unavailable());
    }

    #[test]
    fn test_other_errors_are_internal() {
        let error = storage_error("lookup", &sqlx::Error::RowNotFound);
        assert!(matches!(error, DomainError::Internal { .. }));
        assert!(error.to_string().contains("lookup"));
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_database_is_unavailable() {
        let config = PostgresConfig::new("postgres://nobody@127.0.0.1:1/nothing")
            .with_acquire_timeout(1);

        let error = config.connect().await.unwrap_err();
        assert!(error.is_storage_unavailable(), "got {:?}", error);
    }
}
