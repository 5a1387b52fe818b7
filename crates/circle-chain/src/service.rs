//! # Winner Resolution Service
//!
//! End-to-end resolution for one circle-month: fetch candidates, order them,
//! read the finalized winner, reconcile. Also serves the read-only views the
//! HTTP layer and CLI expose: circle details, voting status, credit
//! profiles, and the factory's circle listings.

use std::sync::Arc;

use circle_core::{
    reconcile, resolve, Address, CircleStatus, CreditProfile, FinalizedWinner, ResolutionRequest,
    ResolutionResult, U256,
};
use serde::Serialize;

use crate::config::ChainConfig;
use crate::error::ChainReadError;
use crate::fetch::{timed, CandidateFetcher, FetchError, FetchPolicy, ReadFailure};
use crate::reader::{CircleReader, CircleUint};
use crate::rpc::RpcCircleReader;

/// Largest page [`WinnerService::list_circles`] reads in one call.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Voting state of one circle-month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingStatus {
    /// Month queried.
    pub month: u64,
    /// Candidate addresses as the circle lists them.
    pub candidates: Vec<Address>,
    /// Winner recorded on-chain, if any.
    pub finalized_winner: Option<Address>,
    /// Whether the voting period for the month has closed.
    pub voting_ended: bool,
}

/// Configuration and live state of a circle contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleSummary {
    /// Circle contract address.
    pub address: Address,
    /// Account that deployed the circle.
    pub creator: Address,
    /// Lifecycle state.
    pub status: CircleStatus,
    /// Contribution each participant pays per month, in wei.
    #[serde(with = "circle_core::decimal")]
    pub monthly_contribution: U256,
    /// Number of monthly rounds.
    #[serde(with = "circle_core::decimal")]
    pub duration_in_months: U256,
    /// Participants required before the circle starts.
    #[serde(with = "circle_core::decimal")]
    pub min_participants: U256,
    /// Participant cap.
    #[serde(with = "circle_core::decimal")]
    pub max_participants: U256,
    /// Share of each contribution held in reserve, in percent.
    #[serde(with = "circle_core::decimal")]
    pub reserve_percentage: U256,
    /// Month the circle is currently in.
    #[serde(with = "circle_core::decimal")]
    pub current_month: U256,
    /// Number of participants.
    #[serde(with = "circle_core::decimal")]
    pub total_participants: U256,
    /// Funds held by the circle, in wei.
    #[serde(with = "circle_core::decimal")]
    pub pool_balance: U256,
    /// Registry the circle reads credit scores from.
    pub credit_registry: Address,
}

/// An account's standing in a credit registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditReport {
    /// Account looked up.
    pub account: Address,
    /// Registry that answered.
    pub registry: Address,
    /// `getCreditScore(account)`.
    #[serde(with = "circle_core::decimal")]
    pub credit_score: U256,
    /// `getCreditProfile(account)`.
    pub profile: CreditProfile,
}

/// One page of the factory's circle listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CirclePage {
    /// Factory that answered.
    pub factory: Address,
    /// Circles the factory has deployed in total.
    #[serde(with = "circle_core::decimal")]
    pub total: U256,
    /// Index of the first circle on this page.
    pub offset: u64,
    /// Circle addresses in deployment order.
    pub circles: Vec<Address>,
}

/// Composes the fetcher, resolver and reconciler over one [`CircleReader`].
#[derive(Debug, Clone)]
pub struct WinnerService {
    fetcher: CandidateFetcher,
    reader: Arc<dyn CircleReader>,
    factory: Option<Address>,
    credit_registry: Option<Address>,
}

impl WinnerService {
    /// Create a service over `reader`.
    pub fn new(reader: Arc<dyn CircleReader>, policy: FetchPolicy) -> Self {
        Self {
            fetcher: CandidateFetcher::new(Arc::clone(&reader), policy),
            reader,
            factory: None,
            credit_registry: None,
        }
    }

    /// Create a service backed by JSON-RPC.
    pub fn from_config(config: &ChainConfig) -> Result<Self, ChainReadError> {
        let reader = RpcCircleReader::new(config)?;
        let mut service = Self::new(Arc::new(reader), config.fetch_policy());
        service.factory = config.factory.clone();
        service.credit_registry = config.credit_registry.clone();
        Ok(service)
    }

    /// Use `factory` for circle listings.
    pub fn with_factory(mut self, factory: Address) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Use `registry` for credit lookups not tied to a circle.
    pub fn with_credit_registry(mut self, registry: Address) -> Self {
        self.credit_registry = Some(registry);
        self
    }

    fn policy(&self) -> FetchPolicy {
        self.fetcher.policy()
    }

    fn configured_factory(&self) -> Result<&Address, FetchError> {
        self.factory
            .as_ref()
            .ok_or(FetchError::NotConfigured("FACTORY_ADDRESS"))
    }

    /// Resolve the winner for `request`.
    ///
    /// An empty candidate set yields `winner: None` without reading the
    /// finalized winner. Otherwise a finalized on-chain winner replaces the
    /// computed one.
    pub async fn resolve(&self, request: &ResolutionRequest) -> Result<ResolutionResult, FetchError> {
        let ResolutionRequest { circle, month } = request;
        let candidates = self.fetcher.fetch(circle, *month).await?;
        if candidates.is_empty() {
            return Ok(ResolutionResult::empty(*month));
        }

        let resolution = resolve(candidates);
        let finalized = self.finalized_winner(circle, *month).await?;
        let reconciled = reconcile(resolution.winner.as_ref(), &finalized);

        if reconciled.diverged {
            tracing::info!(
                %circle,
                month,
                computed = ?resolution.winner.as_ref().map(Address::as_str),
                finalized = ?reconciled.winner.as_ref().map(Address::as_str),
                "finalized winner differs from computed preview"
            );
        }
        tracing::debug!(%circle, month, source = %reconciled.source, "winner resolved");

        Ok(ResolutionResult {
            winner: reconciled.winner,
            candidates: resolution.ordered,
            month: *month,
            source: reconciled.source,
        })
    }

    /// Read the winner the circle has recorded for `month`.
    ///
    /// The zero address and a revert both mean the month is not finalized.
    pub async fn finalized_winner(&self, circle: &Address, month: u64) -> Result<FinalizedWinner, FetchError> {
        match timed("getWinner", self.policy().read_timeout, self.reader.winner(circle, month)).await {
            Ok(value) => Ok(FinalizedWinner::from_onchain(value)),
            Err(failure) => match failure.source {
                ChainReadError::Reverted { ref reason, .. } => {
                    tracing::debug!(%circle, month, %reason, "getWinner reverted, treating as unfinalized");
                    Ok(FinalizedWinner::Unfinalized)
                }
                _ => Err(failure.on_circle(circle)),
            },
        }
    }

    /// Candidates, finalized winner and voting-period state for `month`.
    pub async fn voting_status(&self, circle: &Address, month: u64) -> Result<VotingStatus, FetchError> {
        let limit = self.policy().read_timeout;
        let candidates = timed("getCandidates", limit, self.reader.candidates(circle, month))
            .await
            .map_err(|f| f.on_circle(circle))?;

        let ended = async {
            timed(
                "isVotingPeriodEnded",
                limit,
                self.reader.voting_period_ended(circle, month),
            )
            .await
            .map_err(|f| f.on_circle(circle))
        };
        let (finalized, voting_ended) =
            tokio::try_join!(self.finalized_winner(circle, month), ended)?;

        Ok(VotingStatus {
            month,
            candidates,
            finalized_winner: finalized.address().cloned(),
            voting_ended,
        })
    }

    /// Configuration, lifecycle state and balances of `circle`, read
    /// concurrently.
    pub async fn circle_summary(&self, circle: &Address) -> Result<CircleSummary, FetchError> {
        let limit = self.policy().read_timeout;
        let uint = |field: CircleUint| timed(field.name(), limit, self.reader.circle_uint(circle, field));
        let reads = tokio::try_join!(
            timed("creator", limit, self.reader.creator(circle)),
            timed("status", limit, self.reader.status(circle)),
            uint(CircleUint::MonthlyContribution),
            uint(CircleUint::DurationInMonths),
            uint(CircleUint::MinParticipants),
            uint(CircleUint::MaxParticipants),
            uint(CircleUint::ReservePercentage),
            uint(CircleUint::CurrentMonth),
            uint(CircleUint::TotalParticipants),
            uint(CircleUint::PoolBalance),
            timed("creditRegistry", limit, self.reader.credit_registry(circle)),
        );
        let (
            creator,
            status,
            monthly_contribution,
            duration_in_months,
            min_participants,
            max_participants,
            reserve_percentage,
            current_month,
            total_participants,
            pool_balance,
            credit_registry,
        ) = reads.map_err(|f| f.on_circle(circle))?;

        Ok(CircleSummary {
            address: circle.clone(),
            creator,
            status,
            monthly_contribution,
            duration_in_months,
            min_participants,
            max_participants,
            reserve_percentage,
            current_month,
            total_participants,
            pool_balance,
            credit_registry,
        })
    }

    /// Credit score and profile of `account`.
    ///
    /// With `circle` the registry is the one that circle reads scores from;
    /// without it the configured registry is used.
    pub async fn credit_report(
        &self,
        account: &Address,
        circle: Option<&Address>,
    ) -> Result<CreditReport, FetchError> {
        let limit = self.policy().read_timeout;
        let registry = match circle {
            Some(circle) => timed("creditRegistry", limit, self.reader.credit_registry(circle))
                .await
                .map_err(|f| f.on_circle(circle))?,
            None => self
                .credit_registry
                .clone()
                .ok_or(FetchError::NotConfigured("CREDIT_REGISTRY_ADDRESS"))?,
        };

        let (credit_score, profile) = tokio::try_join!(
            timed("getCreditScore", limit, self.reader.credit_score(&registry, account)),
            timed("getCreditProfile", limit, self.reader.credit_profile(&registry, account)),
        )
        .map_err(ReadFailure::into_fetch_error)?;

        if !profile.score_in_range() {
            tracing::warn!(%account, %registry, score = %profile.credit_score, "credit score above registry maximum");
        }

        Ok(CreditReport {
            account: account.clone(),
            registry,
            credit_score,
            profile,
        })
    }

    /// Up to `limit` circles from the factory, starting at `offset`.
    ///
    /// `limit` is capped at [`MAX_PAGE_SIZE`]. An offset at or past the end
    /// yields an empty page without calling `getCircles`.
    pub async fn list_circles(&self, offset: u64, limit: u64) -> Result<CirclePage, FetchError> {
        let factory = self.configured_factory()?;
        let read_timeout = self.policy().read_timeout;

        let total = timed("getCircleCount", read_timeout, self.reader.circle_count(factory))
            .await
            .map_err(ReadFailure::into_fetch_error)?;

        let remaining = total.saturating_sub(U256::from(offset));
        let take = limit.min(MAX_PAGE_SIZE);
        let take = if remaining < U256::from(take) { remaining.low_u64() } else { take };

        let circles = if take == 0 {
            Vec::new()
        } else {
            timed("getCircles", read_timeout, self.reader.circles(factory, offset, take))
                .await
                .map_err(ReadFailure::into_fetch_error)?
        };
        tracing::debug!(%factory, offset, returned = circles.len(), %total, "listed circles");

        Ok(CirclePage {
            factory: factory.clone(),
            total,
            offset,
            circles,
        })
    }

    /// Circles the factory records `user` as participating in.
    pub async fn user_circles(&self, user: &Address) -> Result<Vec<Address>, FetchError> {
        let factory = self.configured_factory()?;
        timed(
            "getUserCircles",
            self.policy().read_timeout,
            self.reader.user_circles(factory, user),
        )
        .await
        .map_err(ReadFailure::into_fetch_error)
    }
}
