//! Database migrations and startup schema verification

use std::collections::HashSet;

use sqlx::postgres::PgPool;
use tracing::info;

use super::postgres::storage_error;
use crate::domain::DomainError;

/// Columns the Q&A store reads and writes
pub const QA_PAIRS_COLUMNS: &[&str] = &[
    "id",
    "query",
    "query_hash",
    "query_keywords",
    "answer",
    "use_count",
    "query_type",
    "created_at",
    "updated_at",
];

/// PostgreSQL migrator tracking applied versions in `_migrations`
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the migrations table if it doesn't exist
    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                success BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to create migrations table", &e))?;

        Ok(())
    }

    /// Applies one migration unless it is already recorded; returns whether it ran
    pub async fn run_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
                .bind(migration.version)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| storage_error("Failed to check migration status", &e))?;

        if applied {
            return Ok(false);
        }

        // Multi-statement scripts need the simple query protocol
        sqlx::raw_sql(&migration.up)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                storage_error(
                    &format!("Failed to run migration {}", migration.version),
                    &e,
                )
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                storage_error(
                    &format!("Failed to record migration {}", migration.version),
                    &e,
                )
            })?;

        info!(
            version = migration.version,
            description = %migration.description,
            "Applied migration"
        );

        Ok(true)
    }
}

/// Represents a database migration
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    /// SQL applied once, in a single batch
    pub up: String,
}

impl Migration {
    pub fn new(version: i64, description: impl Into<String>, up: impl Into<String>) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
        }
    }
}

/// Migrations for the Q&A store, in version order
pub fn qa_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "Create qa_pairs table",
            r#"
            CREATE TABLE IF NOT EXISTS qa_pairs (
                id BIGSERIAL PRIMARY KEY,
                query TEXT NOT NULL,
                query_hash VARCHAR(64) NOT NULL,
                query_keywords TEXT[] NOT NULL DEFAULT '{}',
                answer TEXT NOT NULL,
                use_count BIGINT NOT NULL DEFAULT 1 CHECK (use_count >= 1),
                query_type VARCHAR(32) NOT NULL DEFAULT 'informational',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
        ),
        Migration::new(
            2,
            "Index qa_pairs lookups",
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_qa_pairs_query_hash ON qa_pairs(query_hash);
            CREATE INDEX IF NOT EXISTS idx_qa_pairs_keywords ON qa_pairs USING GIN(query_keywords);
            CREATE INDEX IF NOT EXISTS idx_qa_pairs_query_type ON qa_pairs(query_type);
            CREATE INDEX IF NOT EXISTS idx_qa_pairs_popularity
                ON qa_pairs(use_count DESC, updated_at DESC);
            "#,
        ),
    ]
}

/// Runs all pending Q&A store migrations, returning how many were applied
pub async fn run_qa_migrations(pool: &PgPool) -> Result<usize, DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());
    let mut applied = 0;

    for migration in qa_migrations() {
        if migrator.run_migration(&migration).await? {
            applied += 1;
        }
    }

    Ok(applied)
}

/// Expected columns absent from `present`
pub fn missing_columns(present: &HashSet<String>) -> Vec<&'static str> {
    QA_PAIRS_COLUMNS
        .iter()
        .copied()
        .filter(|column| !present.contains(*column))
        .collect()
}

/// Fails with `DomainError::Schema` when `qa_pairs` lacks an expected column
pub async fn verify_schema(pool: &PgPool) -> Result<(), DomainError> {
    let columns: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT column_name::text
        FROM information_schema.columns
        WHERE table_schema = current_schema() AND table_name = 'qa_pairs'
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| storage_error("Failed to read qa_pairs schema", &e))?;

    let present: HashSet<String> = columns.into_iter().collect();
    let missing = missing_columns(&present);

    if !missing.is_empty() {
        return Err(DomainError::schema(format!(
            "qa_pairs is missing columns: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}
