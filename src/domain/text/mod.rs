//! Text normalization - cleaning, keyword extraction and character n-grams
//!
//! Everything here is a pure function over strings. Malformed input simply
//! yields empty outputs.

mod normalizer;

pub use normalizer::{
    KEYWORD_LIMIT, QueryProfile, jaccard, keywords_of, ngrams, non_space_len, normalize,
    query_hash, words_of,
};
