//! Ranked collection of discovered wallets.

use std::collections::HashSet;

use crate::worker::Match;

/// Matches sorted by score, best first. Equal scores keep discovery order.
#[derive(Debug, Clone, Default)]
pub struct MatchStore {
    matches: Vec<Match>,
    addresses: HashSet<String>,
}

impl MatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a match at its rank. Returns false if the address is already stored.
    pub fn insert(&mut self, found: Match) -> bool {
        if !self.addresses.insert(found.wallet.address.clone()) {
            return false;
        }
        let value = found.score.value;
        let at = self
            .matches
            .partition_point(|existing| existing.score.value >= value);
        self.matches.insert(at, found);
        true
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Match> + '_ {
        self.matches.iter()
    }

    pub fn as_slice(&self) -> &[Match] {
        &self.matches
    }

    pub fn best(&self) -> Option<&Match> {
        self.matches.first()
    }

    pub fn get(&self, address: &str) -> Option<&Match> {
        if !self.addresses.contains(address) {
            return None;
        }
        self.matches.iter().find(|m| m.wallet.address == address)
    }
}
