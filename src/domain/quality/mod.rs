//! Quality gate - storage admission and overwrite heuristics
//!
//! Both halves are ordered rule lists. Admission stops at the first failing
//! [`StorageRule`]; overwrites are settled by the first decisive
//! [`OverwriteRule`], keeping the incumbent when none decides.

mod gate;
mod overwrite_rules;
mod storage_rules;

pub use gate::{
    DEFAULT_MIN_INSERT_ANSWER_CHARS, DEFAULT_MIN_INSERT_QUERY_WORDS, InsertFloor,
    OverwriteDecision, QualityGate,
};
pub use overwrite_rules::{AnswerProfile, MIN_OVERWRITE_CHARS, OVERWRITE_RULES, OverwriteRule};
pub use storage_rules::{
    ERROR_ANSWER_MIN_CHARS, MIN_ANSWER_CHARS, MIN_QUERY_CHARS, MIN_RELEVANCE, MIN_SENTENCES,
    PairProfile, Rejection, STORAGE_RULES, StorageRule,
};
