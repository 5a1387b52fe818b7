//! The read-only contract interface consumed by the resolution pipeline
//! and the circle browsing reads.

use async_trait::async_trait;
use circle_core::{Address, CircleStatus, CreditProfile, U256};

use crate::abi::{self, Function};
use crate::error::ChainReadError;

/// A no-argument `uint256` getter on `LendingCircle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircleUint {
    /// `currentMonth()`.
    CurrentMonth,
    /// `totalParticipants()`.
    TotalParticipants,
    /// `monthlyContribution()`, in wei.
    MonthlyContribution,
    /// `durationInMonths()`.
    DurationInMonths,
    /// `minParticipants()`.
    MinParticipants,
    /// `maxParticipants()`.
    MaxParticipants,
    /// `reservePercentage()`.
    ReservePercentage,
    /// `poolBalance()`, in wei.
    PoolBalance,
}

impl CircleUint {
    /// The contract function behind this getter.
    pub fn function(self) -> &'static Function {
        match self {
            Self::CurrentMonth => &abi::CURRENT_MONTH,
            Self::TotalParticipants => &abi::TOTAL_PARTICIPANTS,
            Self::MonthlyContribution => &abi::MONTHLY_CONTRIBUTION,
            Self::DurationInMonths => &abi::DURATION_IN_MONTHS,
            Self::MinParticipants => &abi::MIN_PARTICIPANTS,
            Self::MaxParticipants => &abi::MAX_PARTICIPANTS,
            Self::ReservePercentage => &abi::RESERVE_PERCENTAGE,
            Self::PoolBalance => &abi::POOL_BALANCE,
        }
    }

    /// Function name, as used in logs and errors.
    pub fn name(self) -> &'static str {
        self.function().name
    }
}

/// Read access to `LendingCircle`, `CreditRegistry` and
/// `LendingCircleFactory` view functions.
///
/// Every method is one external read. Implementations return typed errors;
/// they never substitute a default value for a failed read.
#[async_trait]
pub trait CircleReader: Send + Sync {
    /// `getCandidates(month)` on `circle`.
    async fn candidates(&self, circle: &Address, month: u64) -> Result<Vec<Address>, ChainReadError>;

    /// `getCandidateVotes(month, candidate)` on `circle`.
    async fn candidate_votes(
        &self,
        circle: &Address,
        month: u64,
        candidate: &Address,
    ) -> Result<U256, ChainReadError>;

    /// `getWinner(month)` on `circle`. The zero address means unset.
    async fn winner(&self, circle: &Address, month: u64) -> Result<Address, ChainReadError>;

    /// `isVotingPeriodEnded(month)` on `circle`.
    async fn voting_period_ended(&self, circle: &Address, month: u64) -> Result<bool, ChainReadError>;

    /// `creditRegistry()` on `circle`.
    async fn credit_registry(&self, circle: &Address) -> Result<Address, ChainReadError>;

    /// One of the circle's `uint256` getters.
    async fn circle_uint(&self, circle: &Address, field: CircleUint) -> Result<U256, ChainReadError>;

    /// `creator()` on `circle`.
    async fn creator(&self, circle: &Address) -> Result<Address, ChainReadError>;

    /// `status()` on `circle`.
    async fn status(&self, circle: &Address) -> Result<CircleStatus, ChainReadError>;

    /// `getCreditScore(account)` on the registry at `registry`.
    async fn credit_score(&self, registry: &Address, account: &Address) -> Result<U256, ChainReadError>;

    /// `getCreditProfile(account)` on the registry at `registry`.
    async fn credit_profile(
        &self,
        registry: &Address,
        account: &Address,
    ) -> Result<CreditProfile, ChainReadError>;

    /// `getCircleCount()` on the factory at `factory`.
    async fn circle_count(&self, factory: &Address) -> Result<U256, ChainReadError>;

    /// `getCircles(offset, limit)` on the factory at `factory`.
    async fn circles(&self, factory: &Address, offset: u64, limit: u64) -> Result<Vec<Address>, ChainReadError>;

    /// `getUserCircles(user)` on the factory at `factory`.
    async fn user_circles(&self, factory: &Address, user: &Address) -> Result<Vec<Address>, ChainReadError>;
}

impl std::fmt::Debug for dyn CircleReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn CircleReader")
    }
}
