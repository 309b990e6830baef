//! Search term normalization.

use std::fmt;

use crate::crypto::address::{ALPHABET, BODY_LEN};

/// A lowercase, non-empty term restricted to the address alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchTerm(String);

impl SearchTerm {
    /// Normalizes a raw term. Returns `None` if nothing searchable remains.
    pub fn sanitize(raw: &str) -> Option<Self> {
        let term: String = raw
            .chars()
            .flat_map(char::to_lowercase)
            .filter(|c| is_address_char(*c))
            .collect();

        if term.is_empty() {
            None
        } else {
            Some(Self(term))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[inline]
fn is_address_char(c: char) -> bool {
    c.is_ascii() && ALPHABET.contains(&(c as u8))
}

/// Sanitizes every term, dropping the ones that end up empty. Order is kept.
pub fn sanitize_terms<S: AsRef<str>>(raw: &[S]) -> Vec<SearchTerm> {
    raw.iter()
        .filter_map(|term| SearchTerm::sanitize(term.as_ref()))
        .collect()
}

/// Splits free text into raw terms on whitespace.
pub fn split_terms(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Alphanumeric characters in `text` that can never appear in an address.
///
/// Used by front ends to warn about input the sanitizer will drop.
pub fn forbidden_chars(text: &str) -> Vec<char> {
    let mut found: Vec<char> = text
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_alphanumeric() && !is_address_char(*c))
        .collect();
    found.sort_unstable();
    found.dedup();
    found
}

/// Expected number of random addresses to try before any term shows up.
///
/// Treats every body position as an independent uniform draw from the 32
/// symbol alphabet, so a term of length `n` appears in a body with
/// probability about `(BODY_LEN - n + 1) / 32^n`. Infinite when no term
/// fits in a body at all.
pub fn min_search_iterations(terms: &[SearchTerm]) -> f64 {
    let alphabet = ALPHABET.len() as f64;
    let probability: f64 = terms
        .iter()
        .filter(|term| term.len() <= BODY_LEN)
        .map(|term| {
            let positions = (BODY_LEN - term.len() + 1) as f64;
            (positions / alphabet.powi(term.len() as i32)).min(1.0)
        })
        .sum();

    if probability > 0.0 {
        (1.0 / probability).max(1.0)
    } else {
        f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_removes_forbidden_chars() {
        let term = SearchTerm::sanitize("N0va2L").unwrap();
        assert_eq!(term.as_str(), "na");

        let term = SearchTerm::sanitize("Hello!").unwrap();
        assert_eq!(term.as_str(), "heo");
    }

    #[test]
    fn test_all_forbidden_term_is_dropped() {
        assert_eq!(SearchTerm::sanitize("02lv"), None);
        assert_eq!(SearchTerm::sanitize(""), None);

        let terms = sanitize_terms(&["abc", "0220", "", "XyZ"]);
        let terms: Vec<&str> = terms.iter().map(SearchTerm::as_str).collect();
        assert_eq!(terms, vec!["abc", "xyz"]);
    }

    #[test]
    fn test_split_and_forbidden() {
        assert_eq!(split_terms("  nano   rules "), vec!["nano", "rules"]);
        assert_eq!(forbidden_chars("love 2020"), vec!['0', '2', 'l', 'v']);
        assert!(forbidden_chars("abc 1").is_empty());
    }

    #[test]
    fn test_min_search_iterations() {
        let single = sanitize_terms(&["a"]);
        // 60 positions, 1/32 each: more likely than not
        assert_eq!(min_search_iterations(&single), 1.0);

        let three = sanitize_terms(&["abc"]);
        let expected = 32f64.powi(3) / 58.0;
        assert!((min_search_iterations(&three) - expected).abs() < 1e-6);

        // two terms are found sooner than either alone
        let both = sanitize_terms(&["abc", "xyz"]);
        assert!((min_search_iterations(&both) - expected / 2.0).abs() < 1e-6);

        assert_eq!(min_search_iterations(&[]), f64::INFINITY);
    }

    #[test]
    fn test_overlong_term_never_matches() {
        let long = "a".repeat(BODY_LEN + 1);
        let alone = sanitize_terms(&[long.as_str()]);
        assert_eq!(alone.len(), 1);
        assert_eq!(min_search_iterations(&alone), f64::INFINITY);

        // a term that fits still drives the estimate
        let mixed = sanitize_terms(&[long.as_str(), "abc"]);
        let expected = 32f64.powi(3) / 58.0;
        assert!((min_search_iterations(&mixed) - expected).abs() < 1e-6);
    }
}
