use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    /// Pool exhausted or backend unreachable; callers degrade to generation-only
    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },

    /// Empty or whitespace-only query, rejected before any storage access
    #[error("Malformed input: {message}")]
    MalformedInput { message: String },

    /// Persisted schema is missing something the store depends on
    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    pub fn malformed_input(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the caller should skip caching and fall back to generation
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_unavailable_error() {
        let error = DomainError::storage_unavailable("pool timed out");
        assert_eq!(error.to_string(), "Storage unavailable: pool timed out");
        assert!(error.is_storage_unavailable());
    }

    #[test]
    fn test_malformed_input_error() {
        let error = DomainError::malformed_input("Query cannot be empty");
        assert_eq!(error.to_string(), "Malformed input: Query cannot be empty");
        assert!(!error.is_storage_unavailable());
    }

    #[test]
    fn test_schema_error() {
        let error = DomainError::schema("column qa_pairs.query_hash is missing");
        assert_eq!(
            error.to_string(),
            "Schema error: column qa_pairs.query_hash is missing"
        );
    }

    #[test]
    fn test_conflict_error() {
        let error = DomainError::conflict("Resource already exists");
        assert_eq!(error.to_string(), "Conflict: Resource already exists");
    }
}
