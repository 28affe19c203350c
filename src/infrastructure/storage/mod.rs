//! Storage infrastructure - Q&A store implementations

mod factory;
mod in_memory;
pub mod migrations;
mod postgres;

pub use factory::{StorageConfig, StorageType, StoreFactory};
pub use in_memory::InMemoryQaRepository;
pub use migrations::{Migration, PostgresMigrator, qa_migrations, run_qa_migrations, verify_schema};
pub use postgres::{PostgresConfig, PostgresQaRepository, storage_error};
