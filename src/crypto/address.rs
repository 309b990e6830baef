//! Nano address encoding and validation.
//!
//! An address is the network prefix followed by 60 characters of Nano's
//! base32 alphabet: 52 characters for the public key (256 bits left-padded
//! with 4 zero bits) and 8 characters for a 40-bit Blake2b checksum stored
//! in reverse byte order.

use std::fmt;
use std::str::FromStr;

use blake2::digest::consts::U5;
use blake2::{Blake2b, Digest};

/// Nano's base32 alphabet. `0`, `2`, `l` and `v` are not part of it.
pub const ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

const KEY_CHARS: usize = 52;
const CHECKSUM_CHARS: usize = 8;

/// Number of characters after the prefix.
pub const BODY_LEN: usize = KEY_CHARS + CHECKSUM_CHARS;
const KEY_PAD_BITS: usize = 4;

type Blake2b40 = Blake2b<U5>;

/// Network prefix of an encoded address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressPrefix {
    /// Legacy `xrb_` prefix
    #[default]
    Xrb,
    /// Current `nano_` prefix
    Nano,
}

impl AddressPrefix {
    pub const ALL: [AddressPrefix; 2] = [AddressPrefix::Xrb, AddressPrefix::Nano];

    /// Returns the literal prefix including the underscore.
    pub fn as_str(self) -> &'static str {
        match self {
            AddressPrefix::Xrb => "xrb_",
            AddressPrefix::Nano => "nano_",
        }
    }

    /// Detects the prefix an address starts with.
    pub fn of(address: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|prefix| address.starts_with(prefix.as_str()))
    }
}

impl FromStr for AddressPrefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim_end_matches('_') {
            "xrb" => Ok(AddressPrefix::Xrb),
            "nano" => Ok(AddressPrefix::Nano),
            _ => Err(format!("Unknown address prefix: {}", s)),
        }
    }
}

impl fmt::Display for AddressPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Unknown address prefix")]
    UnknownPrefix,
    #[error("Address body must be 60 characters, got {0}")]
    InvalidLength(usize),
    #[error("Invalid address character: {0:?}")]
    InvalidChar(char),
    #[error("Non-zero padding bits")]
    InvalidPadding,
    #[error("Checksum mismatch")]
    ChecksumMismatch,
}

/// Encodes a public key as a full address.
pub fn encode(public_key: &[u8; 32], prefix: AddressPrefix) -> String {
    let mut address = String::with_capacity(prefix.as_str().len() + BODY_LEN);
    address.push_str(prefix.as_str());
    push_base32(&mut address, public_key, KEY_PAD_BITS);
    push_base32(&mut address, &checksum(public_key), 0);
    address
}

/// Decodes an address back into its public key, verifying the checksum.
pub fn decode(address: &str) -> Result<[u8; 32], AddressError> {
    let body = body(address).ok_or(AddressError::UnknownPrefix)?;
    if body.len() != BODY_LEN {
        return Err(AddressError::InvalidLength(body.len()));
    }
    let (key_part, checksum_part) = body.split_at(KEY_CHARS);

    let mut public_key = [0u8; 32];
    if !read_base32(key_part, &mut public_key, KEY_PAD_BITS)? {
        return Err(AddressError::InvalidPadding);
    }

    let mut expected = [0u8; 5];
    read_base32(checksum_part, &mut expected, 0)?;
    if expected != checksum(&public_key) {
        return Err(AddressError::ChecksumMismatch);
    }

    Ok(public_key)
}

/// Returns true if the address decodes and its checksum matches.
#[inline]
pub fn is_valid(address: &str) -> bool {
    decode(address).is_ok()
}

/// Returns the part of the address after a known prefix.
pub fn body(address: &str) -> Option<&str> {
    AddressPrefix::of(address).map(|prefix| &address[prefix.as_str().len()..])
}

/// Blake2b-40 of the public key, byte-reversed.
fn checksum(public_key: &[u8; 32]) -> [u8; 5] {
    let digest = Blake2b40::digest(public_key);
    let mut out = [0u8; 5];
    out.copy_from_slice(&digest);
    out.reverse();
    out
}

fn bit(bytes: &[u8], pos: usize) -> u8 {
    (bytes[pos / 8] >> (7 - pos % 8)) & 1
}

fn push_base32(out: &mut String, bytes: &[u8], pad_bits: usize) {
    let total = bytes.len() * 8 + pad_bits;
    debug_assert_eq!(total % 5, 0);

    for chunk in 0..total / 5 {
        let mut value = 0usize;
        for offset in 0..5 {
            let pos = chunk * 5 + offset;
            let b = if pos < pad_bits {
                0
            } else {
                bit(bytes, pos - pad_bits)
            };
            value = (value << 1) | b as usize;
        }
        out.push(ALPHABET[value] as char);
    }
}

/// Fills `out` from base32 text. Returns false if any padding bit was set.
fn read_base32(text: &str, out: &mut [u8], pad_bits: usize) -> Result<bool, AddressError> {
    let mut padding_clear = true;
    let mut pos = 0usize;

    for c in text.chars() {
        let value = ALPHABET
            .iter()
            .position(|&a| a as char == c)
            .ok_or(AddressError::InvalidChar(c))?;

        for shift in (0..5).rev() {
            let b = ((value >> shift) & 1) as u8;
            if pos < pad_bits {
                padding_clear &= b == 0;
            } else {
                let target = pos - pad_bits;
                out[target / 8] |= b << (7 - target % 8);
            }
            pos += 1;
        }
    }

    Ok(padding_clear)
}
