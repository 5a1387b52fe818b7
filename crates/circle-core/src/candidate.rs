//! # Payout Candidates
//!
//! One proposed payout recipient for a circle-month, together with the two
//! integers the resolver orders on.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// A proposed payout recipient for one circle-month.
///
/// Serialized as `{"address": "0x…", "votes": "<decimal>", "creditScore": "<decimal>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Candidate account.
    pub address: Address,
    /// Weighted vote total accumulated for the month.
    #[serde(with = "crate::decimal")]
    pub votes: U256,
    /// Candidate's credit score read at resolution time.
    #[serde(with = "crate::decimal")]
    pub credit_score: U256,
}

impl Candidate {
    /// Create a candidate from its three fields.
    pub fn new(address: Address, votes: impl Into<U256>, credit_score: impl Into<U256>) -> Self {
        Self {
            address,
            votes: votes.into(),
            credit_score: credit_score.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn serializes_integers_as_decimal_strings() {
        let c = Candidate::new(
            addr("0x00000000000000000000000000000000000000aA"),
            5u64,
            700u64,
        );
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "address": "0x00000000000000000000000000000000000000aA",
                "votes": "5",
                "creditScore": "700",
            })
        );
    }

    #[test]
    fn deserialize_rejects_numeric_votes() {
        let raw = serde_json::json!({
            "address": "0x00000000000000000000000000000000000000aa",
            "votes": 5,
            "creditScore": "700",
        });
        assert!(serde_json::from_value::<Candidate>(raw).is_err());
    }

    #[test]
    fn large_values_survive_json() {
        let c = Candidate {
            address: addr("0x00000000000000000000000000000000000000aa"),
            votes: U256::MAX,
            credit_score: U256::from(u128::MAX) + U256::one(),
        };
        let back: Candidate = serde_json::from_str(&serde_json::to_string(&c).unwrap()).unwrap();
        assert_eq!(back, c);
    }
}
