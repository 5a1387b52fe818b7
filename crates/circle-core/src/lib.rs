#![deny(missing_docs)]

//! # circle-core: Payout Resolution Primitives
//!
//! Foundational types shared by every crate in the workspace. This crate
//! performs no I/O: it defines what a payout candidate is, how candidates
//! are ordered, and how a locally computed winner is reconciled against the
//! winner a `LendingCircle` contract has already finalized on-chain.
//!
//! ## Design Principles
//!
//! 1. **Newtype for account identifiers.** [`Address`] validates its format at
//!    construction, keeps the caller's casing for display, and compares
//!    case-insensitively.
//!
//! 2. **Integer-only arithmetic.** Vote totals and credit scores are
//!    [`U256`] values (the contracts' `uint256`). They cross JSON boundaries
//!    as decimal strings and are never converted to floating point.
//!
//! 3. **The resolver is pure.** [`resolve`] is deterministic: the same
//!    candidate set always yields the same order and the same winner.
//!
//! 4. **The chain is authoritative.** [`reconcile`] lets a finalized on-chain
//!    winner override the computed preview without treating disagreement as
//!    an error.

pub mod address;
pub mod candidate;
pub mod circle;
pub mod credit;
pub mod decimal;
pub mod error;
pub mod reconcile;
pub mod resolution;
pub mod resolver;

pub use address::Address;
pub use candidate::Candidate;
pub use circle::CircleStatus;
pub use credit::CreditProfile;
pub use error::ValidationError;
pub use primitive_types::U256;
pub use reconcile::{reconcile, FinalizedWinner, ReconciledWinner, WinnerSource};
pub use resolution::{ResolutionRequest, ResolutionResult};
pub use resolver::{compare_candidates, resolve, Resolution};
