//! Learn endpoint handler

use axum::extract::State;

use crate::api::state::AppState;
use crate::api::types::{Json, LearnRequest, LearnResponse};

/// POST /v1/learn
///
/// Always 200: rejections and storage failures are reported as `success: false`.
pub async fn learn(
    State(state): State<AppState>,
    Json(request): Json<LearnRequest>,
) -> Json<LearnResponse> {
    let query_type = request.resolved_query_type();
    let success = state
        .cache
        .learn(&request.query, &request.answer, query_type)
        .await;

    Json(LearnResponse { success })
}
