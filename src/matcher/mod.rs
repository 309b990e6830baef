//! Term handling and scoring for Nano addresses.
//!
//! - `terms`: normalizing raw user input into searchable terms
//! - `score`: ranking addresses by how well they match those terms

mod score;
mod terms;

pub use score::{Score, Scorer, Span, Verdict, DEFAULT_MIN_SCORE};
pub use terms::{
    forbidden_chars, min_search_iterations, sanitize_terms, split_terms, SearchTerm,
};
