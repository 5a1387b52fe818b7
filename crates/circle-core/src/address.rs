//! # Account Addresses
//!
//! A 20-byte EVM account identifier. The textual form accepted from callers
//! is `0x` followed by 40 hexadecimal characters in any casing.
//!
//! ## Comparison
//!
//! On-chain addresses are case-insensitive identifiers, so equality, hashing
//! and ordering all operate on the decoded bytes. Ordering the bytes is the
//! same as ordering the lower-cased hex strings lexicographically, which is
//! the final tie-break of the winner resolver. The original string is kept
//! only for display, so a checksummed address submitted by a wallet is echoed
//! back exactly as it arrived.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Length of an account identifier in bytes.
pub const ADDRESS_LEN: usize = 20;

/// EVM account identifier (contract or externally owned account).
#[derive(Debug, Clone)]
pub struct Address {
    bytes: [u8; ADDRESS_LEN],
    display: String,
}

impl Address {
    /// The all-zero address. Contracts return it for "not set".
    pub fn zero() -> Self {
        Self::from_bytes([0u8; ADDRESS_LEN])
    }

    /// Build an address from raw bytes. Displays as lower-case hex.
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self {
            display: format!("0x{}", hex::encode(bytes)),
            bytes,
        }
    }

    /// Parse `0x` + 40 hex characters, keeping the original casing for display.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAddress`] for any other shape.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| ValidationError::InvalidAddress(s.to_string()))?;
        if digits.len() != ADDRESS_LEN * 2 {
            return Err(ValidationError::InvalidAddress(s.to_string()));
        }
        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| ValidationError::InvalidAddress(s.to_string()))?;
        Ok(Self {
            bytes,
            display: s.to_string(),
        })
    }

    /// Raw 20-byte value.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.bytes
    }

    /// The string this address was constructed from.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Canonical lower-case `0x…` form, used as a map key.
    pub fn to_lowercase_hex(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }

    /// Whether this is the zero-address sentinel.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|b| *b == 0)
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
