//! Application state shared by the handlers

use std::sync::Arc;

use crate::domain::QaRepository;
use crate::infrastructure::services::LearningCacheService;

#[derive(Debug, Clone)]
pub struct AppState {
    pub cache: Arc<LearningCacheService>,
}

impl AppState {
    pub fn new(cache: Arc<LearningCacheService>) -> Self {
        Self { cache }
    }

    pub fn store(&self) -> &Arc<dyn QaRepository> {
        self.cache.repository()
    }
}
