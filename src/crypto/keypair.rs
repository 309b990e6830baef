//! Nano key derivation.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Blake2b512, Digest};
use ed25519_dalek::hazmat::ExpandedSecretKey;
use ed25519_dalek::VerifyingKey;

use super::address::{self, AddressPrefix};

type Blake2b256 = Blake2b<U32>;

/// A Nano keypair derived from a seed and an account index.
#[derive(Clone)]
pub struct Keypair {
    /// The private key bytes (32 bytes)
    private_key: [u8; 32],
    /// The Ed25519 public key (32 bytes)
    public_key: [u8; 32],
}

impl Keypair {
    /// Derives the keypair for `index` under `seed`.
    ///
    /// Process:
    /// 1. private key = Blake2b-256(seed || index as big-endian u32)
    /// 2. expand the private key with Blake2b-512 (Nano's Ed25519 variant)
    /// 3. public key = clamped lower half of the expansion times the basepoint
    #[inline]
    pub fn from_seed(seed: &[u8; 32], index: u32) -> Self {
        let mut hasher = Blake2b256::new();
        hasher.update(seed);
        hasher.update(index.to_be_bytes());
        let mut private_key = [0u8; 32];
        private_key.copy_from_slice(&hasher.finalize());

        let public_key = Self::derive_public_key(&private_key);

        Self {
            private_key,
            public_key,
        }
    }

    fn derive_public_key(private_key: &[u8; 32]) -> [u8; 32] {
        let mut expanded = [0u8; 64];
        expanded.copy_from_slice(&Blake2b512::digest(private_key));
        let secret = ExpandedSecretKey::from_bytes(&expanded);
        VerifyingKey::from(&secret).to_bytes()
    }

    /// Returns the private key as an uppercase hex string.
    pub fn private_key_hex(&self) -> String {
        hex::encode_upper(self.private_key)
    }

    /// Returns the public key bytes.
    pub fn public_key(&self) -> &[u8; 32] {
        &self.public_key
    }

    /// Encodes the public key as an address.
    pub fn address(&self, prefix: AddressPrefix) -> String {
        address::encode(&self.public_key, prefix)
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &hex::encode_upper(self.public_key))
            .finish_non_exhaustive()
    }
}
