//! Messages exchanged between the coordinator and its workers.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::crypto::Wallet;
use crate::matcher::{Score, SearchTerm};

/// Identifier of one start-to-stop search interval.
pub type SessionId = u64;

/// A discovered wallet together with its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub wallet: Wallet,
    pub score: Score,
}

/// Coordinator to worker.
#[derive(Debug, Clone)]
pub enum Command {
    Start {
        session: SessionId,
        terms: Arc<[SearchTerm]>,
        min_score: u32,
    },
    Stop,
}

/// Worker to coordinator.
#[derive(Debug, Clone)]
pub enum Event {
    Match {
        worker: usize,
        session: SessionId,
        found: Match,
    },
    Stat {
        worker: usize,
        session: SessionId,
        addresses_generated: u64,
        ignored_matches: u64,
        /// When the worker closed this sample
        at: Instant,
    },
}

impl Event {
    pub fn worker(&self) -> usize {
        match self {
            Event::Match { worker, .. } | Event::Stat { worker, .. } => *worker,
        }
    }

    pub fn session(&self) -> SessionId {
        match self {
            Event::Match { session, .. } | Event::Stat { session, .. } => *session,
        }
    }
}
