//! Statistics endpoint handler

use axum::extract::State;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::CacheStatistics;

/// GET /v1/stats
pub async fn statistics(State(state): State<AppState>) -> Result<Json<CacheStatistics>, ApiError> {
    let stats = state.cache.statistics().await?;

    Ok(Json(stats))
}
