//! # Validation Errors
//!
//! Structured errors for domain primitives, built with `thiserror`.
//! Each variant carries the rejected input.

use thiserror::Error;

/// Validation errors for domain primitive construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Account identifier is not `0x` followed by 40 hex characters.
    #[error("invalid address: \"{0}\" (expected 0x followed by 40 hex characters)")]
    InvalidAddress(String),

    /// Month is not a non-negative integer that fits in 64 bits.
    #[error("invalid month: \"{0}\" (expected a non-negative integer)")]
    InvalidMonth(String),

    /// Integer field is not a base-10 unsigned value within 256 bits.
    #[error("invalid unsigned integer: \"{0}\" (expected a decimal string)")]
    InvalidInteger(String),
}
