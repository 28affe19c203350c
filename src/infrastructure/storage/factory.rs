//! Store factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::domain::DomainError;
use crate::domain::qa::QaRepository;

use super::in_memory::InMemoryQaRepository;
use super::migrations::{run_qa_migrations, verify_schema};
use super::postgres::{PostgresConfig, PostgresQaRepository};

/// Supported storage types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    InMemory,
    Postgres(PostgresConfig),
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    pub fn postgres(config: PostgresConfig) -> Self {
        Self::Postgres(config)
    }

    /// Creates a PostgreSQL configuration from a URL
    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres(PostgresConfig::new(url))
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Factory for Q&A stores
#[derive(Debug)]
pub struct StoreFactory;

impl StoreFactory {
    /// Opens the configured store.
    ///
    /// PostgreSQL stores are migrated and their schema verified before use;
    /// a schema mismatch is returned as `DomainError::Schema`.
    pub async fn create(config: &StorageConfig) -> Result<Arc<dyn QaRepository>, DomainError> {
        match config {
            StorageConfig::InMemory => {
                info!("Using in-memory Q&A store");
                Ok(Arc::new(InMemoryQaRepository::new()))
            }
            StorageConfig::Postgres(pg_config) => {
                let store = Self::create_postgres(pg_config).await?;
                Ok(store)
            }
        }
    }

    pub fn create_in_memory() -> Arc<InMemoryQaRepository> {
        Arc::new(InMemoryQaRepository::new())
    }

    /// Connects, applies pending migrations and verifies the schema
    pub async fn create_postgres(
        config: &PostgresConfig,
    ) -> Result<Arc<PostgresQaRepository>, DomainError> {
        let pool = config.connect().await?;

        let applied = run_qa_migrations(&pool).await?;
        verify_schema(&pool).await?;

        info!(applied_migrations = applied, "Using PostgreSQL Q&A store");

        Ok(Arc::new(PostgresQaRepository::new(pool)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_type_parse() {
        assert_eq!(StorageType::parse("memory"), Some(StorageType::InMemory));
        assert_eq!(StorageType::parse("In-Memory"), Some(StorageType::InMemory));
        assert_eq!(StorageType::parse("postgres"), Some(StorageType::Postgres));
        assert_eq!(StorageType::parse("PostgreSQL"), Some(StorageType::Postgres));
        assert_eq!(StorageType::parse("pg"), Some(StorageType::Postgres));
        assert_eq!(StorageType::parse("unknown"), None);
    }

    #[test]
    fn test_storage_config_types() {
        assert_eq!(StorageConfig::in_memory().storage_type(), StorageType::InMemory);

        let postgres = StorageConfig::postgres_url("postgres://localhost/test");
        assert_eq!(postgres.storage_type(), StorageType::Postgres);
    }

    #[tokio::test]
    async fn test_create_in_memory_store() {
        let store = StoreFactory::create(&StorageConfig::in_memory()).await.unwrap();

        assert!(store.ping().await.is_ok());
        assert_eq!(store.stats().await.unwrap().total_entries, 0);
    }
}
