//! Random wallet generation.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::address::{self, AddressPrefix};
use super::Keypair;

/// A generated wallet: the seed, the derivation index and the encoded address.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Root entropy, serialized as uppercase hex
    #[serde(with = "seed_hex")]
    pub seed: [u8; 32],
    /// Account index the address was derived at
    pub index: u32,
    /// Encoded address including the network prefix
    pub address: String,
}

impl Wallet {
    /// Derives the wallet for `seed` at account `index`.
    pub fn from_seed(seed: [u8; 32], index: u32, prefix: AddressPrefix) -> Self {
        let address = Keypair::from_seed(&seed, index).address(prefix);
        Self {
            seed,
            index,
            address,
        }
    }

    /// Returns the seed as an uppercase hex string.
    pub fn seed_hex(&self) -> String {
        hex::encode_upper(self.seed)
    }

    /// Re-derives the keypair behind this wallet.
    pub fn keypair(&self) -> Keypair {
        Keypair::from_seed(&self.seed, self.index)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// Source of candidate wallets for a search worker.
pub trait WalletGenerator: Send {
    /// Produces the next candidate. Must never return an invalid address.
    fn generate(&mut self) -> Wallet;
}

/// Generates wallets from fresh OS entropy on every call.
#[derive(Debug, Clone, Default)]
pub struct RandomWalletGenerator {
    prefix: AddressPrefix,
}

impl RandomWalletGenerator {
    pub fn new(prefix: AddressPrefix) -> Self {
        Self { prefix }
    }
}

impl WalletGenerator for RandomWalletGenerator {
    fn generate(&mut self) -> Wallet {
        loop {
            let mut seed = [0u8; 32];
            OsRng.fill_bytes(&mut seed);

            let wallet = Wallet::from_seed(seed, 0, self.prefix);
            if address::is_valid(&wallet.address) {
                return wallet;
            }
            log::debug!("discarding wallet with invalid checksum: {}", wallet.address);
        }
    }
}

mod seed_hex {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(seed: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode_upper(seed))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(&text).map_err(de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| de::Error::custom("seed must be 32 bytes"))
    }
}
