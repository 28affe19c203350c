//! Migrate command - prepares the PostgreSQL schema

use tracing::info;

use crate::infrastructure::storage::{StorageConfig, run_qa_migrations, verify_schema};

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let pg_config = match config.storage.to_storage_config()? {
        StorageConfig::Postgres(pg_config) => pg_config,
        StorageConfig::InMemory => {
            info!("In-memory backend configured, nothing to migrate");
            return Ok(());
        }
    };

    let pool = pg_config.connect().await?;
    let applied = run_qa_migrations(&pool).await?;
    verify_schema(&pool).await?;
    pool.close().await;

    println!("Applied {} migration(s); schema verified", applied);

    Ok(())
}
