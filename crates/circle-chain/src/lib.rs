//! # circle-chain: Contract Reads for Lending Circles
//!
//! Typed, read-only access to the external contract system:
//! - **LendingCircle**: candidates, weighted votes, finalized winner,
//!   voting-period state, configuration and balances, and the circle's
//!   credit-registry pointer
//! - **CreditRegistry**: credit score and profile per account
//! - **LendingCircleFactory**: deployed circles, paged, and per user
//!
//! ## Architecture
//!
//! ```text
//! CandidateFetcher ──▶ resolve() ──▶ reconcile() ──▶ ResolutionResult
//!        │                                ▲
//!        └──────── CircleReader ──────────┘  (getWinner)
//! ```
//!
//! [`CircleReader`] is the seam to the chain. [`RpcCircleReader`] implements
//! it over JSON-RPC `eth_call`; [`mock::StaticCircleReader`] implements it in
//! memory for tests. [`WinnerService`] composes the fetch, the pure resolver
//! from `circle-core`, and the authority reconciliation.
//!
//! ## Failure Policy
//!
//! Fail-fast: the first read that fails (after retrying transient
//! failures) or times out fails the whole resolution. No read result is
//! ever defaulted to zero.

pub mod abi;
pub mod config;
pub mod error;
pub mod fetch;
pub mod mock;
pub mod reader;
pub(crate) mod retry;
pub mod rpc;
pub mod service;

pub use config::{ChainConfig, ConfigError};
pub use error::ChainReadError;
pub use fetch::{CandidateFetcher, FetchError, FetchPolicy};
pub use reader::{CircleReader, CircleUint};
pub use rpc::RpcCircleReader;
pub use service::{CirclePage, CircleSummary, CreditReport, VotingStatus, WinnerService, MAX_PAGE_SIZE};
