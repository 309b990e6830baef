//! # nano_vanity
//!
//! Multi-core Nano vanity address generator.
//!
//! ## Architecture
//!
//! - `crypto`: Seed generation, key derivation and address encoding
//! - `matcher`: Term sanitizing and address scoring
//! - `worker`: Worker protocol, search loop and thread pool
//! - `stats`: Rolling throughput and time estimates
//! - `store`: Ranked, deduplicated matches
//! - `coordinator`: Control API tying the pieces together
//! - `config`: Runtime configuration

pub mod config;
pub mod coordinator;
pub mod crypto;
pub mod matcher;
pub mod stats;
pub mod store;
pub mod worker;

pub use config::{Config, SearchSettings};
pub use coordinator::{
    Coordinator, CoordinatorError, DisplayKind, DisplayPayload, ExportedWallet, Snapshot,
};
pub use crypto::{AddressPrefix, Keypair, RandomWalletGenerator, Wallet, WalletGenerator};
pub use matcher::{Score, Scorer, SearchTerm, Span};
pub use stats::{StatsAggregator, StatsSnapshot};
pub use store::MatchStore;
pub use worker::{Match, SessionId};
