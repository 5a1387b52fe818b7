//! Request scope and result of one winner resolution.

use serde::Serialize;

use crate::address::Address;
use crate::candidate::Candidate;
use crate::reconcile::WinnerSource;

/// Identifies the circle-month being resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    /// The `LendingCircle` contract.
    pub circle: Address,
    /// Zero-based month index.
    pub month: u64,
}

impl ResolutionRequest {
    /// Create a request for `circle` and `month`.
    pub fn new(circle: Address, month: u64) -> Self {
        Self { circle, month }
    }
}

/// Outcome of one resolution: the ordered candidates and the reported winner.
///
/// `winner` is `candidates[0]` unless the contract has already finalized a
/// winner, in which case it is that address (possibly absent from
/// `candidates` after a stale read).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    /// Reported winner.
    pub winner: Option<Address>,
    /// All candidates in resolution order.
    pub candidates: Vec<Candidate>,
    /// Month that was resolved.
    pub month: u64,
    /// Which rule produced `winner`.
    pub source: WinnerSource,
}

impl ResolutionResult {
    /// Result for a month with no candidates.
    pub fn empty(month: u64) -> Self {
        Self {
            winner: None,
            candidates: Vec::new(),
            month,
            source: WinnerSource::None,
        }
    }
}
