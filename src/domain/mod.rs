//! Domain layer - Core business logic and entities

pub mod error;
pub mod generation;
pub mod matching;
pub mod qa;
pub mod quality;
pub mod text;

pub use error::DomainError;
pub use generation::{Retriever, Summarizer};
pub use matching::{MatchOutcome, SimilarityMatcher, SimilarityWeights};
pub use qa::{
    CacheConfig, CacheStatistics, InsertOutcome, NewQaEntry, QaEntry, QaEntryId, QaRepository,
    QueryType, QueryUsage, TypeCount,
};
pub use quality::{InsertFloor, OverwriteDecision, QualityGate, Rejection};
pub use text::QueryProfile;
