//! Infrastructure services

mod learning_cache_service;

pub use learning_cache_service::{
    AnswerSource, LearnDecision, LearningCacheService, LookupOutcome, ServeResponse,
};
