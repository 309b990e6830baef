//! Address scoring against the active search terms.

use serde::{Deserialize, Serialize};

use crate::crypto::address::{self, BODY_LEN};

use super::SearchTerm;

/// Score floor used when none is configured: three matched characters.
pub const DEFAULT_MIN_SCORE: u32 = 1300;

const TERM_WEIGHT: u32 = 1000;
const CHAR_WEIGHT: u32 = 100;

/// A matched region of an address, in bytes from the start of the full address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

/// Rank of an address. A value of 0 means nothing matched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub value: u32,
    /// Matched regions ordered by start offset
    pub locations: Vec<Span>,
}

impl Score {
    #[inline]
    pub fn is_match(&self) -> bool {
        self.value > 0
    }
}

/// What a search loop should do with a scored address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No term matched
    Miss,
    /// Matched, but below the quality floor; only counted
    Ignored,
    /// Worth reporting as an individual match
    Reported,
}

/// Scores addresses against a fixed set of terms.
///
/// `value = 1000 * terms_matched + 100 * matched_chars + (60 - earliest_start)`,
/// where `earliest_start` is the body offset of the first match. Each part
/// grows with the quantity it measures.
#[derive(Debug, Clone)]
pub struct Scorer {
    terms: Vec<SearchTerm>,
    min_score: u32,
}

impl Scorer {
    /// Creates a scorer. Duplicate terms are kept once.
    pub fn new(terms: Vec<SearchTerm>, min_score: u32) -> Self {
        let mut unique: Vec<SearchTerm> = Vec::with_capacity(terms.len());
        for term in terms {
            if !unique.contains(&term) {
                unique.push(term);
            }
        }

        Self {
            terms: unique,
            min_score,
        }
    }

    /// Scores an address. The network prefix is never searched.
    pub fn score(&self, address: &str) -> Score {
        let Some(body) = address::body(address) else {
            return Score::default();
        };
        let offset = address.len() - body.len();

        let mut locations: Vec<Span> = self
            .terms
            .iter()
            .filter_map(|term| {
                body.find(term.as_str()).map(|start| Span {
                    start,
                    len: term.len(),
                })
            })
            .collect();

        if locations.is_empty() {
            return Score::default();
        }
        locations.sort_by_key(|span| span.start);

        let matched_chars: usize = locations.iter().map(|span| span.len).sum();
        let earliest = locations[0].start;
        let proximity = BODY_LEN.saturating_sub(earliest);

        let value = TERM_WEIGHT * locations.len() as u32
            + CHAR_WEIGHT * matched_chars as u32
            + proximity as u32;

        for span in &mut locations {
            span.start += offset;
        }

        Score { value, locations }
    }

    /// Classifies a score value against the quality floor.
    #[inline]
    pub fn verdict(&self, value: u32) -> Verdict {
        if value == 0 {
            Verdict::Miss
        } else if value < self.min_score {
            Verdict::Ignored
        } else {
            Verdict::Reported
        }
    }
}
