//! Ask endpoint handler

use axum::extract::State;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, AskRequest, Json};
use crate::infrastructure::services::ServeResponse;

/// POST /v1/ask
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<ServeResponse>, ApiError> {
    debug!(query = %request.query, "Serving query");

    let response = state.cache.serve(&request.query).await?;

    Ok(Json(response))
}
