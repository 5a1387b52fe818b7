//! Serde adapter for [`U256`] as a base-10 string.
//!
//! Vote weights can exceed what a JSON number parsed as an IEEE double can
//! hold exactly, so integers cross the JSON boundary as strings.

use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serializer};

use crate::error::ValidationError;

/// Parse a base-10 unsigned integer.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidInteger`] for empty input, non-digits,
/// or values wider than 256 bits.
pub fn parse(s: &str) -> Result<U256, ValidationError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidInteger(s.to_string()));
    }
    U256::from_dec_str(s).map_err(|_| ValidationError::InvalidInteger(s.to_string()))
}

/// Serialize as a decimal string.
pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

/// Deserialize from a decimal string.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}
