//! # Authority Reconciliation
//!
//! Merges the winner a circle contract has finalized on-chain with the
//! winner computed by [`crate::resolver`]. The on-chain value is ground
//! truth: it reflects whatever tie-break the contract executed when the
//! voting period closed.
//!
//! Disagreement between the two is accepted silently. A credit score can
//! legitimately change between vote casting and resolution time, so the
//! computed preview is not expected to match the finalized value.

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// On-chain finalization state of a circle-month payout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizedWinner {
    /// The contract recorded this non-zero winner.
    Finalized(Address),
    /// No winner recorded yet (voting still open or payout not executed).
    Unfinalized,
}

impl FinalizedWinner {
    /// Interpret a `getWinner` return value. The zero address means unset.
    pub fn from_onchain(value: Address) -> Self {
        if value.is_zero() {
            Self::Unfinalized
        } else {
            Self::Finalized(value)
        }
    }

    /// The finalized address, if any.
    pub fn address(&self) -> Option<&Address> {
        match self {
            Self::Finalized(addr) => Some(addr),
            Self::Unfinalized => None,
        }
    }
}

/// Which rule produced the reported winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinnerSource {
    /// Taken from the contract's finalized winner.
    OnChain,
    /// Preview computed by the resolver.
    Computed,
    /// No candidates and nothing finalized.
    None,
}

impl std::fmt::Display for WinnerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OnChain => write!(f, "on_chain"),
            Self::Computed => write!(f, "computed"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Final winner after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledWinner {
    /// The reported winner.
    pub winner: Option<Address>,
    /// Where `winner` came from.
    pub source: WinnerSource,
    /// True when a finalized winner differs from a non-empty computed preview.
    pub diverged: bool,
}

/// Pick the reported winner: the finalized on-chain value when present,
/// otherwise the computed preview.
pub fn reconcile(computed: Option<&Address>, finalized: &FinalizedWinner) -> ReconciledWinner {
    match (finalized.address(), computed) {
        (Some(onchain), computed) => ReconciledWinner {
            winner: Some(onchain.clone()),
            source: WinnerSource::OnChain,
            diverged: computed.is_some_and(|c| c != onchain),
        },
        (None, Some(computed)) => ReconciledWinner {
            winner: Some(computed.clone()),
            source: WinnerSource::Computed,
            diverged: false,
        },
        (None, None) => ReconciledWinner {
            winner: None,
            source: WinnerSource::None,
            diverged: false,
        },
    }
}
