//! Q&A entry - the unit of storage

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::QueryType;
use crate::domain::DomainError;
use crate::domain::text::{keywords_of, normalize, query_hash};

/// Surrogate identifier assigned by the store on insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QaEntryId(i64);

impl QaEntryId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for QaEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A (query, answer) pair ready to be inserted.
///
/// Hash and keywords are derived here once; they are never recomputed
/// after the entry is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQaEntry {
    query: String,
    query_hash: String,
    keywords: Vec<String>,
    answer: String,
    query_type: QueryType,
}

impl NewQaEntry {
    /// Prepare a new entry; rejects queries that are blank or have no keywords
    pub fn new(
        query: impl Into<String>,
        answer: impl Into<String>,
        query_type: QueryType,
    ) -> Result<Self, DomainError> {
        let query = query.into().trim().to_string();

        if query.is_empty() {
            return Err(DomainError::malformed_input("Query cannot be empty"));
        }

        let keywords = keywords_of(&normalize(&query));

        if keywords.is_empty() {
            return Err(DomainError::malformed_input(format!(
                "Query '{}' has no keywords",
                query
            )));
        }

        Ok(Self {
            query_hash: query_hash(&query),
            query,
            keywords,
            answer: answer.into(),
            query_type,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn query_hash(&self) -> &str {
        &self.query_hash
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }
}

/// A stored Q&A entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaEntry {
    id: QaEntryId,
    query: String,
    query_hash: String,
    keywords: Vec<String>,
    answer: String,
    use_count: i64,
    query_type: QueryType,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl QaEntry {
    /// Materialize a freshly inserted entry
    pub fn inserted(id: QaEntryId, new_entry: NewQaEntry, now: DateTime<Utc>) -> Self {
        Self {
            id,
            query: new_entry.query,
            query_hash: new_entry.query_hash,
            keywords: new_entry.keywords,
            answer: new_entry.answer,
            use_count: 1,
            query_type: new_entry.query_type,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild an entry loaded from a backend
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: QaEntryId,
        query: String,
        query_hash: String,
        keywords: Vec<String>,
        answer: String,
        use_count: i64,
        query_type: QueryType,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            query,
            query_hash,
            keywords,
            answer,
            use_count,
            query_type,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> QaEntryId {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn query_hash(&self) -> &str {
        &self.query_hash
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn use_count(&self) -> i64 {
        self.use_count
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// True when the entry shares at least one keyword with `keywords`
    pub fn has_any_keyword(&self, keywords: &[String]) -> bool {
        self.keywords.iter().any(|k| keywords.contains(k))
    }

    /// Replace the answer; counts as a use
    pub fn replace_answer(
        &mut self,
        answer: impl Into<String>,
        query_type: QueryType,
        now: DateTime<Utc>,
    ) {
        self.answer = answer.into();
        self.query_type = query_type;
        self.updated_at = now;
        self.use_count += 1;
    }

    /// Record a use without touching the answer
    pub fn reinforce(&mut self) {
        self.use_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANSWER: &str = "Paris is the capital of France. It is on the Seine. It is large.";

    #[test]
    fn test_new_entry_derives_hash_and_keywords() {
        let entry =
            NewQaEntry::new("  What is the capital of France? ", ANSWER, QueryType::Location)
                .unwrap();

        assert_eq!(entry.query(), "What is the capital of France?");
        assert_eq!(entry.query_hash(), query_hash("what is the capital of france?"));
        assert_eq!(entry.keywords(), &["capital", "france"]);
        assert_eq!(entry.query_type(), QueryType::Location);
    }

    #[test]
    fn test_new_entry_rejects_blank_query() {
        let result = NewQaEntry::new("   ", ANSWER, QueryType::Informational);
        assert!(matches!(result, Err(DomainError::MalformedInput { .. })));
    }

    #[test]
    fn test_new_entry_rejects_keywordless_query() {
        let result = NewQaEntry::new("is it?", ANSWER, QueryType::Informational);
        assert!(matches!(result, Err(DomainError::MalformedInput { .. })));
    }

    #[test]
    fn test_inserted_entry_starts_at_one_use() {
        let now = Utc::now();
        let new_entry =
            NewQaEntry::new("capital of France", ANSWER, QueryType::Location).unwrap();
        let entry = QaEntry::inserted(QaEntryId::new(7), new_entry, now);

        assert_eq!(entry.id().value(), 7);
        assert_eq!(entry.use_count(), 1);
        assert_eq!(entry.created_at(), now);
        assert_eq!(entry.updated_at(), now);
    }

    #[test]
    fn test_use_count_only_grows() {
        let now = Utc::now();
        let new_entry =
            NewQaEntry::new("capital of France", ANSWER, QueryType::Location).unwrap();
        let mut entry = QaEntry::inserted(QaEntryId::new(1), new_entry, now);

        entry.reinforce();
        assert_eq!(entry.use_count(), 2);

        let later = now + chrono::Duration::seconds(5);
        entry.replace_answer("A better answer.", QueryType::Definition, later);
        assert_eq!(entry.use_count(), 3);
        assert_eq!(entry.answer(), "A better answer.");
        assert_eq!(entry.query_type(), QueryType::Definition);
        assert_eq!(entry.updated_at(), later);
        assert_eq!(entry.created_at(), now);
        assert_eq!(entry.query(), "capital of France");
    }

    #[test]
    fn test_has_any_keyword() {
        let new_entry =
            NewQaEntry::new("capital of France", ANSWER, QueryType::Location).unwrap();
        let entry = QaEntry::inserted(QaEntryId::new(1), new_entry, Utc::now());

        assert!(entry.has_any_keyword(&["france".to_string(), "wine".to_string()]));
        assert!(!entry.has_any_keyword(&["germany".to_string()]));
    }
}
