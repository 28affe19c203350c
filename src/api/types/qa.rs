//! Request and response bodies for the Q&A endpoints

use serde::{Deserialize, Serialize};

use crate::domain::QueryType;

/// POST /v1/ask
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AskRequest {
    pub query: String,
}

/// POST /v1/learn
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LearnRequest {
    pub query: String,
    pub answer: String,
    /// Classified from the query when absent
    #[serde(default)]
    pub query_type: Option<QueryType>,
}

impl LearnRequest {
    pub fn resolved_query_type(&self) -> QueryType {
        self.query_type
            .unwrap_or_else(|| QueryType::classify(&self.query))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LearnResponse {
    pub success: bool,
}
