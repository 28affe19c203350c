//! Learning cache service - serves answers from the Q&A store and learns new ones

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::domain::qa::{CacheConfig, CacheStatistics, NewQaEntry, QaEntry, QaRepository, QueryType};
use crate::domain::quality::{QualityGate, Rejection, StorageRule};
use crate::domain::text::{QueryProfile, query_hash};
use crate::domain::{DomainError, Retriever, SimilarityMatcher, Summarizer};
use crate::infrastructure::observability::{record_learn, record_lookup, record_match_score};

/// Where a served answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Cache,
    Generated,
}

/// Answer returned by [`LearningCacheService::serve`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServeResponse {
    pub answer: String,
    pub source: AnswerSource,
    /// Match confidence for cached answers: 1.0 on an exact hit, the fuzzy score otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub query_type: QueryType,
}

/// Result of the read-path lookup
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Exact(QaEntry),
    Fuzzy { entry: QaEntry, score: f64 },
    /// Nothing reached the read threshold; `best_score` is the closest candidate
    Miss { best_score: f64 },
}

impl LookupOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact(_) => "exact",
            Self::Fuzzy { .. } => "fuzzy",
            Self::Miss { .. } => "miss",
        }
    }

    pub fn entry(&self) -> Option<&QaEntry> {
        match self {
            Self::Exact(entry) | Self::Fuzzy { entry, .. } => Some(entry),
            Self::Miss { .. } => None,
        }
    }

    /// Zero on a miss
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Exact(_) => 1.0,
            Self::Fuzzy { score, .. } => *score,
            Self::Miss { .. } => 0.0,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.entry().is_some()
    }
}

/// What the store path did with a (query, answer) pair
#[derive(Debug, Clone, PartialEq)]
pub enum LearnDecision {
    Inserted(QaEntry),
    /// An existing entry took the new answer
    Updated(QaEntry),
    /// An existing entry kept its answer and gained a use
    Reinforced { entry_id: i64, use_count: i64 },
    Rejected(Rejection),
}

impl LearnDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted(_) => "inserted",
            Self::Updated(_) => "updated",
            Self::Reinforced { .. } => "reinforced",
            Self::Rejected(_) => "rejected",
        }
    }

    /// True when the cache absorbed the pair in any form
    pub fn absorbed(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// Orchestrates exact and fuzzy reuse of stored answers, generation on a
/// miss, and quality-gated learning of new answers.
pub struct LearningCacheService {
    store: Arc<dyn QaRepository>,
    retriever: Arc<dyn Retriever>,
    summarizer: Arc<dyn Summarizer>,
    gate: QualityGate,
    matcher: SimilarityMatcher,
    config: CacheConfig,
}

impl fmt::Debug for LearningCacheService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LearningCacheService")
            .field("store", &self.store)
            .field("gate", &self.gate)
            .field("matcher", &self.matcher)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LearningCacheService {
    pub fn new(
        store: Arc<dyn QaRepository>,
        retriever: Arc<dyn Retriever>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self::with_config(store, retriever, summarizer, CacheConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn QaRepository>,
        retriever: Arc<dyn Retriever>,
        summarizer: Arc<dyn Summarizer>,
        config: CacheConfig,
    ) -> Self {
        Self {
            store,
            retriever,
            summarizer,
            gate: QualityGate::new().with_insert_floor(config.insert_floor()),
            matcher: SimilarityMatcher::new(),
            config,
        }
    }

    pub fn repository(&self) -> &Arc<dyn QaRepository> {
        &self.store
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Answer a query from the cache, or generate and learn a new answer.
    ///
    /// A storage outage during lookup degrades to generation without caching.
    pub async fn serve(&self, query: &str) -> Result<ServeResponse, DomainError> {
        let query = validate_query(query)?;
        let query_type = QueryType::classify(query);

        let degraded = match self.lookup(query).await {
            Ok(outcome) => {
                if let Some(entry) = outcome.entry() {
                    return Ok(ServeResponse {
                        answer: entry.answer().to_string(),
                        source: AnswerSource::Cache,
                        confidence: Some(outcome.confidence()),
                        query_type: entry.query_type(),
                    });
                }
                false
            }
            Err(e) if e.is_storage_unavailable() => {
                warn!(error = %e, "Q&A store unavailable, answering without cache");
                true
            }
            Err(e) => return Err(e),
        };

        let raw_text = self.retriever.retrieve(query).await;
        let answer = self.summarizer.summarize(query, &raw_text).await;

        debug!(
            raw_chars = raw_text.len(),
            answer_chars = answer.len(),
            "Generated answer"
        );

        if !degraded {
            self.learn(query, &answer, query_type).await;
        }

        Ok(ServeResponse {
            answer,
            source: AnswerSource::Generated,
            confidence: None,
            query_type,
        })
    }

    /// Read path: exact hash, then fuzzy match at the read threshold.
    ///
    /// A hit bumps the matched entry's use count; nothing else is mutated.
    pub async fn lookup(&self, query: &str) -> Result<LookupOutcome, DomainError> {
        let query = validate_query(query)?;

        if let Some(entry) = self.store.lookup_by_hash(&query_hash(query)).await? {
            self.store.increment_use(entry.id()).await?;
            record_lookup("exact");
            debug!(entry_id = %entry.id(), "Exact cache hit");
            return Ok(LookupOutcome::Exact(entry));
        }

        let profile = QueryProfile::new(query);
        if profile.keywords().is_empty() {
            record_lookup("miss");
            return Ok(LookupOutcome::Miss { best_score: 0.0 });
        }

        let candidates = self
            .store
            .candidates_by_keywords(profile.keywords(), self.config.candidate_limit())
            .await?;

        let outcome =
            self.matcher
                .find_best_match(&profile, &candidates, self.config.read_threshold());

        if !candidates.is_empty() {
            record_match_score(outcome.score());
        }

        match outcome.entry() {
            Some(entry) => {
                self.store.increment_use(entry.id()).await?;
                record_lookup("fuzzy");
                Ok(LookupOutcome::Fuzzy {
                    entry: entry.clone(),
                    score: outcome.score(),
                })
            }
            None => {
                record_lookup("miss");
                Ok(LookupOutcome::Miss {
                    best_score: outcome.score(),
                })
            }
        }
    }

    /// Best-effort ingestion: false when the pair was refused or the store failed.
    ///
    /// Pairs under the insert floor are dropped silently and still count as
    /// handled. Rejections and storage errors are logged, never raised.
    pub async fn learn(&self, query: &str, answer: &str, query_type: QueryType) -> bool {
        match self.store(query, answer, query_type).await {
            Ok(LearnDecision::Rejected(rejection))
                if rejection.rule == StorageRule::BelowInsertFloor =>
            {
                record_learn("dropped");
                debug!(query = %query, reason = %rejection.reason, "Answer below insert floor, not cached");
                true
            }
            Ok(decision) => {
                record_learn(decision.as_str());

                if let LearnDecision::Rejected(rejection) = &decision {
                    warn!(query = %query, rule = %rejection.rule, reason = %rejection.reason, "Answer not cached");
                }

                decision.absorbed()
            }
            Err(DomainError::MalformedInput { message }) => {
                record_learn("rejected");
                warn!(query = %query, reason = %message, "Query not learnable");
                false
            }
            Err(e) => {
                record_learn("failed");
                error!(query = %query, error = %e, "Failed to learn answer");
                false
            }
        }
    }

    /// Write path: exact hash, then fuzzy match at the write threshold,
    /// then a quality-gated insert.
    pub async fn store(
        &self,
        query: &str,
        answer: &str,
        query_type: QueryType,
    ) -> Result<LearnDecision, DomainError> {
        let new_entry = NewQaEntry::new(query, answer, query_type)?;

        if let Some(existing) = self.store.lookup_by_hash(new_entry.query_hash()).await? {
            return self.reconcile(&existing, new_entry).await;
        }

        let profile = QueryProfile::new(new_entry.query());
        let candidates = self
            .store
            .candidates_by_keywords(profile.keywords(), self.config.candidate_limit())
            .await?;

        let outcome =
            self.matcher
                .find_best_match(&profile, &candidates, self.config.write_threshold());

        if let Some(existing) = outcome.entry() {
            return self.reconcile(existing, new_entry).await;
        }

        if let Err(rejection) = self
            .gate
            .assess_new_entry(new_entry.query(), new_entry.answer())
        {
            return Ok(LearnDecision::Rejected(rejection));
        }

        let inserted = self.store.insert_or_reinforce(new_entry).await?;

        if inserted.created {
            info!(
                entry_id = %inserted.entry.id(),
                query_type = %inserted.entry.query_type(),
                "Cached new answer"
            );
            Ok(LearnDecision::Inserted(inserted.entry))
        } else {
            Ok(LearnDecision::Reinforced {
                entry_id: inserted.entry.id().value(),
                use_count: inserted.entry.use_count(),
            })
        }
    }

    /// Overwrite the existing answer when the new one is better, else count a use
    async fn reconcile(
        &self,
        existing: &QaEntry,
        new_entry: NewQaEntry,
    ) -> Result<LearnDecision, DomainError> {
        let decision = self
            .gate
            .decide_overwrite(existing.answer(), new_entry.answer());

        if decision.better {
            let updated = self
                .store
                .update_answer(existing.id(), new_entry.answer(), new_entry.query_type())
                .await?;

            info!(
                entry_id = %existing.id(),
                rule = ?decision.decided_by,
                "Replaced cached answer"
            );

            return Ok(LearnDecision::Updated(updated));
        }

        let use_count = self.store.increment_use(existing.id()).await?;

        Ok(LearnDecision::Reinforced {
            entry_id: existing.id().value(),
            use_count,
        })
    }

    pub async fn statistics(&self) -> Result<CacheStatistics, DomainError> {
        self.store.stats().await
    }
}

fn validate_query(query: &str) -> Result<&str, DomainError> {
    let query = query.trim();

    if query.is_empty() {
        return Err(DomainError::malformed_input("Query cannot be empty"));
    }

    Ok(query)
}
