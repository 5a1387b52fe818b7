//! # Credit Profiles
//!
//! What a `CreditRegistry` records about one account's history across
//! circles. Every counter is a contract `uint256` and crosses JSON as a
//! decimal string.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Score every account starts from before any circle activity.
pub const BASE_CREDIT_SCORE: u64 = 300;

/// Highest score the registry assigns.
pub const MAX_CREDIT_SCORE: u64 = 1000;

/// `getCreditProfile(account)` as returned by the registry.
///
/// `Default` is the all-zero tuple an unwritten registry slot returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditProfile {
    /// Current score.
    #[serde(with = "crate::decimal")]
    pub credit_score: U256,
    /// Circles the account has joined.
    #[serde(with = "crate::decimal")]
    pub circles_joined: U256,
    /// Circles the account stayed in until completion.
    #[serde(with = "crate::decimal")]
    pub circles_completed: U256,
    /// Contributions paid on time.
    #[serde(with = "crate::decimal")]
    pub on_time_payments: U256,
    /// Contributions paid late.
    #[serde(with = "crate::decimal")]
    pub late_payments: U256,
    /// Contributions never paid.
    #[serde(with = "crate::decimal")]
    pub defaults: U256,
    /// Whether the account has ever defaulted.
    pub has_defaulted: bool,
}

impl CreditProfile {
    /// Profile of an account with no recorded activity.
    pub fn fresh() -> Self {
        Self {
            credit_score: U256::from(BASE_CREDIT_SCORE),
            circles_joined: U256::zero(),
            circles_completed: U256::zero(),
            on_time_payments: U256::zero(),
            late_payments: U256::zero(),
            defaults: U256::zero(),
            has_defaulted: false,
        }
    }

    /// Whether `credit_score` lies within the registry's documented range.
    pub fn score_in_range(&self) -> bool {
        self.credit_score <= U256::from(MAX_CREDIT_SCORE)
    }
}
