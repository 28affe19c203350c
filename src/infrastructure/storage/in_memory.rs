//! In-memory Q&A store

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::DomainError;
use crate::domain::qa::{
    CacheStatistics, InsertOutcome, NewQaEntry, QaEntry, QaEntryId, QaRepository, QueryType,
    QueryUsage, TOP_QUERIES_LIMIT, TypeCount,
};

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<i64, QaEntry>,
    by_hash: HashMap<String, i64>,
    next_id: i64,
}

impl State {
    fn insert(&mut self, new_entry: NewQaEntry) -> QaEntry {
        self.next_id += 1;
        let id = self.next_id;

        let entry = QaEntry::inserted(QaEntryId::new(id), new_entry, Utc::now());
        self.by_hash.insert(entry.query_hash().to_string(), id);
        self.entries.insert(id, entry.clone());

        entry
    }

    fn get_mut(&mut self, id: QaEntryId) -> Result<&mut QaEntry, DomainError> {
        self.entries
            .get_mut(&id.value())
            .ok_or_else(|| DomainError::not_found(format!("Entry '{}' not found", id)))
    }

    /// Entries by use count, then most recently updated
    fn popular(&self) -> Vec<&QaEntry> {
        let mut entries: Vec<&QaEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| (Reverse(e.use_count()), Reverse(e.updated_at()), e.id()));
        entries
    }
}

/// Thread-safe in-memory Q&A store
///
/// Same semantics as the PostgreSQL store, including hash uniqueness.
/// Useful for testing and development. Data is lost when the process terminates.
#[derive(Debug, Default)]
pub struct InMemoryQaRepository {
    state: RwLock<State>,
}

impl InMemoryQaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, DomainError> {
        self.state
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, DomainError> {
        self.state
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))
    }

    /// Number of stored entries
    pub fn len(&self) -> Result<usize, DomainError> {
        Ok(self.read()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.read()?.entries.is_empty())
    }
}

#[async_trait]
impl QaRepository for InMemoryQaRepository {
    async fn lookup_by_hash(&self, query_hash: &str) -> Result<Option<QaEntry>, DomainError> {
        let state = self.read()?;

        Ok(state
            .by_hash
            .get(query_hash)
            .and_then(|id| state.entries.get(id))
            .cloned())
    }

    async fn candidates_by_keywords(
        &self,
        keywords: &[String],
        limit: usize,
    ) -> Result<Vec<QaEntry>, DomainError> {
        let state = self.read()?;

        Ok(state
            .popular()
            .into_iter()
            .filter(|entry| entry.has_any_keyword(keywords))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert(&self, entry: NewQaEntry) -> Result<QaEntry, DomainError> {
        let mut state = self.write()?;

        if state.by_hash.contains_key(entry.query_hash()) {
            return Err(DomainError::conflict(format!(
                "Entry for query '{}' already exists",
                entry.query()
            )));
        }

        Ok(state.insert(entry))
    }

    async fn insert_or_reinforce(&self, entry: NewQaEntry) -> Result<InsertOutcome, DomainError> {
        let mut state = self.write()?;

        if let Some(&id) = state.by_hash.get(entry.query_hash()) {
            let existing = state.get_mut(QaEntryId::new(id))?;
            existing.reinforce();

            return Ok(InsertOutcome {
                entry: existing.clone(),
                created: false,
            });
        }

        Ok(InsertOutcome {
            entry: state.insert(entry),
            created: true,
        })
    }

    async fn update_answer(
        &self,
        id: QaEntryId,
        answer: &str,
        query_type: QueryType,
    ) -> Result<QaEntry, DomainError> {
        let mut state = self.write()?;
        let entry = state.get_mut(id)?;

        entry.replace_answer(answer, query_type, Utc::now());
        Ok(entry.clone())
    }

    async fn increment_use(&self, id: QaEntryId) -> Result<i64, DomainError> {
        let mut state = self.write()?;
        let entry = state.get_mut(id)?;

        entry.reinforce();
        Ok(entry.use_count())
    }

    async fn stats(&self) -> Result<CacheStatistics, DomainError> {
        let state = self.read()?;

        let top_queries = state
            .popular()
            .into_iter()
            .take(TOP_QUERIES_LIMIT)
            .map(|entry| QueryUsage {
                query: entry.query().to_string(),
                count: entry.use_count(),
            })
            .collect();

        let mut counts: HashMap<QueryType, i64> = HashMap::new();
        for entry in state.entries.values() {
            *counts.entry(entry.query_type()).or_insert(0) += 1;
        }

        let mut type_distribution: Vec<TypeCount> = counts
            .into_iter()
            .map(|(query_type, count)| TypeCount { query_type, count })
            .collect();
        type_distribution.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.query_type.as_str().cmp(b.query_type.as_str()))
        });

        Ok(CacheStatistics {
            total_entries: state.entries.len() as i64,
            top_queries,
            type_distribution,
        })
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.read().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    const ANSWER: &str = "Paris is the capital of France. It sits on the Seine. It is large.";

    fn new_entry(query: &str, query_type: QueryType) -> NewQaEntry {
        NewQaEntry::new(query, ANSWER, query_type).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_lookup_by_hash() {
        let repo = InMemoryQaRepository::new();
        let entry = new_entry("What is the capital of France?", QueryType::Location);
        let hash = entry.query_hash().to_string();

        let inserted = repo.insert(entry).await.unwrap();
        assert_eq!(inserted.use_count(), 1);
        assert_eq!(inserted.id().value(), 1);

        let found = repo.lookup_by_hash(&hash).await.unwrap().unwrap();
        assert_eq!(found.id(), inserted.id());

        assert!(repo.lookup_by_hash("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_hash_conflicts() {
        let repo = InMemoryQaRepository::new();
        repo.insert(new_entry("capital of France", QueryType::Location))
            .await
            .unwrap();

        let result = repo
            .insert(new_entry("CAPITAL OF FRANCE", QueryType::Location))
            .await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_insert_or_reinforce() {
        let repo = InMemoryQaRepository::new();

        let first = repo
            .insert_or_reinforce(new_entry("capital of France", QueryType::Location))
            .await
            .unwrap();
        assert!(first.created);
        assert_eq!(first.entry.use_count(), 1);

        let second = repo
            .insert_or_reinforce(new_entry("Capital of France", QueryType::Location))
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.entry.id(), first.entry.id());
        assert_eq!(second.entry.use_count(), 2);
        assert_eq!(repo.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_candidates_ordered_by_use_count() {
        let repo = InMemoryQaRepository::new();
        let a = repo
            .insert(new_entry("capital of France", QueryType::Location))
            .await
            .unwrap();
        let b = repo
            .insert(new_entry("population of France", QueryType::Quantity))
            .await
            .unwrap();
        repo.insert(new_entry("rust borrow checker", QueryType::Informational))
            .await
            .unwrap();

        repo.increment_use(b.id()).await.unwrap();

        let candidates = repo
            .candidates_by_keywords(&["france".to_string()], 50)
            .await
            .unwrap();
        let ids: Vec<_> = candidates.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![b.id(), a.id()]);

        let limited = repo
            .candidates_by_keywords(&["france".to_string()], 1)
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);

        let none = repo
            .candidates_by_keywords(&["germany".to_string()], 50)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_answer_bumps_use_count() {
        let repo = InMemoryQaRepository::new();
        let entry = repo
            .insert(new_entry("capital of France", QueryType::Location))
            .await
            .unwrap();

        let updated = repo
            .update_answer(entry.id(), "A new answer.", QueryType::Definition)
            .await
            .unwrap();

        assert_eq!(updated.answer(), "A new answer.");
        assert_eq!(updated.query_type(), QueryType::Definition);
        assert_eq!(updated.use_count(), 2);
        assert_eq!(updated.query(), entry.query());
        assert!(updated.updated_at() >= entry.updated_at());
    }

    #[tokio::test]
    async fn test_increment_use_leaves_answer() {
        let repo = InMemoryQaRepository::new();
        let entry = repo
            .insert(new_entry("capital of France", QueryType::Location))
            .await
            .unwrap();

        assert_eq!(repo.increment_use(entry.id()).await.unwrap(), 2);
        assert_eq!(repo.increment_use(entry.id()).await.unwrap(), 3);

        let stored = repo
            .lookup_by_hash(entry.query_hash())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.answer(), ANSWER);
        assert_eq!(stored.updated_at(), entry.updated_at());
    }

    #[tokio::test]
    async fn test_unknown_id_not_found() {
        let repo = InMemoryQaRepository::new();

        let result = repo.increment_use(QaEntryId::new(42)).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));

        let result = repo
            .update_answer(QaEntryId::new(42), ANSWER, QueryType::Informational)
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_stats() {
        let repo = InMemoryQaRepository::new();
        let queries = [
            ("capital of France", QueryType::Location),
            ("capital of Spain", QueryType::Location),
            ("who wrote Hamlet", QueryType::Person),
            ("rust borrow checker", QueryType::Informational),
            ("population of Peru", QueryType::Quantity),
            ("tallest mountain", QueryType::Ranking),
        ];

        let mut ids = Vec::new();
        for (query, query_type) in queries {
            ids.push(repo.insert(new_entry(query, query_type)).await.unwrap().id());
        }
        for _ in 0..3 {
            repo.increment_use(ids[2]).await.unwrap();
        }

        let stats = repo.stats().await.unwrap();

        assert_eq!(stats.total_entries, 6);
        assert_eq!(stats.top_queries.len(), TOP_QUERIES_LIMIT);
        assert_eq!(stats.top_queries[0].query, "who wrote Hamlet");
        assert_eq!(stats.top_queries[0].count, 4);
        assert_eq!(stats.type_distribution[0].query_type, QueryType::Location);
        assert_eq!(stats.type_distribution[0].count, 2);
        assert_eq!(
            stats.type_distribution.iter().map(|t| t.count).sum::<i64>(),
            6
        );
    }

    #[tokio::test]
    async fn test_empty_stats() {
        let repo = InMemoryQaRepository::new();
        let stats = repo.stats().await.unwrap();

        assert_eq!(stats, CacheStatistics::default());
        assert!(repo.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let repo = Arc::new(InMemoryQaRepository::new());
        let entry = repo
            .insert(new_entry("capital of France", QueryType::Location))
            .await
            .unwrap();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let repo = Arc::clone(&repo);
                let id = entry.id();
                tokio::spawn(async move { repo.increment_use(id).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = repo
            .lookup_by_hash(entry.query_hash())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.use_count(), 21);
    }
}
