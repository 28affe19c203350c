//! v1 Q&A endpoints

pub mod ask;
pub mod learn;
pub mod stats;

use axum::{
    Router,
    routing::{get, post},
};

use super::state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/ask", post(ask::ask))
        .route("/learn", post(learn::learn))
        .route("/stats", get(stats::statistics))
}
