//! HTTP request, response and error types

pub mod error;
pub mod json;
pub mod qa;

pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use qa::{AskRequest, LearnRequest, LearnResponse};
