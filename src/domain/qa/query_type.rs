//! Query type classification

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::text::normalize;

/// Closed set of query categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Person,
    Location,
    Time,
    Reason,
    Process,
    Comparison,
    Recommendation,
    Ranking,
    Definition,
    Quantity,
    #[default]
    Informational,
}

/// Classification order and markers; the first type with a marker contained
/// anywhere in the normalized query wins.
const CLASSIFICATION_MARKERS: &[(QueryType, &[&str])] = &[
    (
        QueryType::Person,
        &["who", "whom", "whose", "person", "people", "someone", "name"],
    ),
    (
        QueryType::Location,
        &["where", "location", "place", "country", "city"],
    ),
    (
        QueryType::Time,
        &["when", "date", "time", "year", "month"],
    ),
    (
        QueryType::Quantity,
        &["how many", "how much", "count", "number", "total"],
    ),
    (
        QueryType::Definition,
        &["what is", "what are", "meaning", "define", "definition"],
    ),
    (
        QueryType::Ranking,
        &[
            "list", "top", "best", "rank", "ranked", "ranking", "rating", "greatest", "largest",
            "cleanest",
        ],
    ),
    (QueryType::Reason, &["why", "reason", "cause", "because"]),
    (
        QueryType::Process,
        &["how", "process", "steps", "way", "method", "procedure"],
    ),
    (
        QueryType::Comparison,
        &["difference", "compare", "versus", "vs", "similarities"],
    ),
    (
        QueryType::Recommendation,
        &["recommend", "suggest", "suggestion", "should"],
    ),
];

impl QueryType {
    pub const ALL: [QueryType; 11] = [
        QueryType::Person,
        QueryType::Location,
        QueryType::Time,
        QueryType::Reason,
        QueryType::Process,
        QueryType::Comparison,
        QueryType::Recommendation,
        QueryType::Ranking,
        QueryType::Definition,
        QueryType::Quantity,
        QueryType::Informational,
    ];

    /// Classify a raw query
    pub fn classify(query: &str) -> Self {
        let clean = normalize(query);

        CLASSIFICATION_MARKERS
            .iter()
            .find(|(_, markers)| markers.iter().any(|marker| clean.contains(marker)))
            .map(|(query_type, _)| *query_type)
            .unwrap_or_default()
    }

    /// Lowercase tag used in storage and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Location => "location",
            Self::Time => "time",
            Self::Reason => "reason",
            Self::Process => "process",
            Self::Comparison => "comparison",
            Self::Recommendation => "recommendation",
            Self::Ranking => "ranking",
            Self::Definition => "definition",
            Self::Quantity => "quantity",
            Self::Informational => "informational",
        }
    }

    /// Parse a stored tag, falling back to `Informational` for anything unknown
    pub fn from_tag_lossy(tag: &str) -> Self {
        tag.parse().unwrap_or_default()
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();

        Self::ALL
            .into_iter()
            .find(|query_type| query_type.as_str() == tag)
            .ok_or_else(|| DomainError::malformed_input(format!("Unknown query type: {}", s)))
    }
}
