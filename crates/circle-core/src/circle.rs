//! # Circle Lifecycle
//!
//! The `status()` enum a `LendingCircle` contract stores as a `uint8`.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a circle contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircleStatus {
    /// Accepting participants; contributions have not started.
    Pending,
    /// Running monthly contribution and payout rounds.
    Active,
    /// Every participant has received a payout.
    Completed,
    /// Closed before completion.
    Cancelled,
}

impl CircleStatus {
    /// Map the contract's enum discriminant. Unknown values yield `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Pending),
            1 => Some(Self::Active),
            2 => Some(Self::Completed),
            3 => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// The contract's enum discriminant.
    pub fn code(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Active => 1,
            Self::Completed => 2,
            Self::Cancelled => 3,
        }
    }

    /// Upper-case label used in JSON and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for CircleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
