//! Cryptographic operations for Nano wallet generation.
//!
//! This module provides:
//! - Nano base32 address encoding with the Blake2b checksum
//! - Seed to keypair derivation (Blake2b + Ed25519)
//! - Random wallet generation from OS entropy

pub mod address;
mod keypair;
mod wallet;

pub use address::AddressPrefix;
pub use keypair::Keypair;
pub use wallet::{RandomWalletGenerator, Wallet, WalletGenerator};
