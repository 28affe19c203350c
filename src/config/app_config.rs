use serde::Deserialize;

use crate::domain::CacheConfig;
use crate::infrastructure::observability::MetricsConfig;
use crate::infrastructure::retrieval::RetrievalConfig;
use crate::infrastructure::storage::{PostgresConfig, StorageConfig, StorageType};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Q&A store backend and connection pool settings
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// `memory` or `postgres`
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl StorageSettings {
    /// Resolve the backend selection into a store configuration
    pub fn to_storage_config(&self) -> Result<StorageConfig, config::ConfigError> {
        let storage_type = StorageType::parse(&self.backend).ok_or_else(|| {
            config::ConfigError::Message(format!("Unknown storage backend '{}'", self.backend))
        })?;

        match storage_type {
            StorageType::InMemory => Ok(StorageConfig::in_memory()),
            StorageType::Postgres => {
                let url = self.url.clone().ok_or_else(|| {
                    config::ConfigError::Message(
                        "storage.url (or DATABASE_URL) is required for the postgres backend"
                            .to_string(),
                    )
                })?;

                Ok(StorageConfig::postgres(
                    PostgresConfig::new(url)
                        .with_max_connections(self.max_connections)
                        .with_min_connections(self.min_connections)
                        .with_acquire_timeout(self.acquire_timeout_secs)
                        .with_idle_timeout(self.idle_timeout_secs),
                ))
            }
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app: Self = config.try_deserialize()?;

        if app.storage.url.is_none() {
            app.storage.url = std::env::var("DATABASE_URL").ok();
        }

        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.storage.max_connections, 10);
        assert_eq!(config.storage.min_connections, 1);
        assert_eq!(config.cache.read_threshold(), 0.7);
        assert_eq!(config.cache.write_threshold(), 0.85);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"storage": {"backend": "postgres", "url": "postgres://localhost/qa"},
                "logging": {"level": "debug", "format": "json"}}"#,
        )
        .unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.acquire_timeout_secs, 30);
        assert_eq!(config.retrieval.max_sources, 8);
    }

    #[test]
    fn test_storage_settings_resolve() {
        let memory = StorageSettings::default().to_storage_config().unwrap();
        assert_eq!(memory.storage_type(), StorageType::InMemory);

        let postgres = StorageSettings {
            backend: "postgres".to_string(),
            url: Some("postgres://localhost/qa".to_string()),
            ..Default::default()
        };
        assert_eq!(
            postgres.to_storage_config().unwrap().storage_type(),
            StorageType::Postgres
        );
    }

    #[test]
    fn test_storage_settings_errors() {
        let missing_url = StorageSettings {
            backend: "postgres".to_string(),
            ..Default::default()
        };
        assert!(missing_url.to_storage_config().is_err());

        let unknown = StorageSettings {
            backend: "cassandra".to_string(),
            ..Default::default()
        };
        assert!(unknown.to_storage_config().is_err());
    }
}
