//! In-memory [`CircleReader`] for tests and local development.
//!
//! State is fixed at construction through builder methods. Reads against an
//! unknown circle, registry or factory fail with
//! [`ChainReadError::NoContract`], like an `eth_call` to an address with no
//! code. Known contracts return zero for anything not configured, matching
//! uninitialised contract storage.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use circle_core::{Address, CircleStatus, CreditProfile, U256};
use parking_lot::Mutex;

use crate::error::ChainReadError;
use crate::reader::{CircleReader, CircleUint};

/// A failure to return from every call of one contract function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    /// Execution reverted.
    Reverted,
    /// The read timed out at the transport.
    Timeout,
    /// JSON-RPC error from the node.
    Rpc,
    /// The endpoint answered with HTTP 503.
    Unavailable,
    /// Return data did not decode.
    Decode,
}

impl InjectedFailure {
    fn into_error(self, call: &str) -> ChainReadError {
        let call = call.to_string();
        match self {
            Self::Reverted => ChainReadError::Reverted {
                call,
                reason: "execution reverted".into(),
            },
            Self::Timeout => ChainReadError::Timeout { call },
            Self::Rpc => ChainReadError::Rpc {
                call,
                code: -32000,
                message: "header not found".into(),
            },
            Self::Unavailable => ChainReadError::HttpStatus {
                call,
                status: 503,
                body: "service unavailable".into(),
            },
            Self::Decode => ChainReadError::Decode {
                call,
                reason: "return data too short".into(),
            },
        }
    }
}

#[derive(Debug, Default, Clone)]
struct CircleState {
    registry: Address,
    candidates: HashMap<u64, Vec<Address>>,
    votes: HashMap<(u64, Address), U256>,
    winners: HashMap<u64, Address>,
    voting_ended: HashMap<u64, bool>,
    uints: HashMap<CircleUint, U256>,
    creator: Address,
    status: Option<CircleStatus>,
}

#[derive(Debug, Default, Clone)]
struct RegistryState {
    scores: HashMap<Address, U256>,
    profiles: HashMap<Address, CreditProfile>,
}

#[derive(Debug, Default, Clone)]
struct FactoryState {
    circles: Vec<Address>,
    by_user: HashMap<Address, Vec<Address>>,
}

/// Static, in-memory contract state.
#[derive(Debug, Default)]
pub struct StaticCircleReader {
    circles: HashMap<Address, CircleState>,
    registries: HashMap<Address, RegistryState>,
    factories: HashMap<Address, FactoryState>,
    failures: HashMap<&'static str, InjectedFailure>,
    stalls: HashSet<&'static str>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl StaticCircleReader {
    /// A reader with no contracts deployed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy `circle` with `registry` as its credit registry. Deploys the
    /// registry too.
    pub fn with_circle(mut self, circle: Address, registry: Address) -> Self {
        self.registries.entry(registry.clone()).or_default();
        self.circles.entry(circle).or_default().registry = registry;
        self
    }

    /// Add `candidate` to `month` on `circle` with `votes`. Deploys the
    /// circle if needed.
    pub fn with_candidate(
        mut self,
        circle: &Address,
        month: u64,
        candidate: Address,
        votes: impl Into<U256>,
    ) -> Self {
        let state = self.circles.entry(circle.clone()).or_default();
        state
            .candidates
            .entry(month)
            .or_default()
            .push(candidate.clone());
        state.votes.insert((month, candidate), votes.into());
        self
    }

    /// Mark `month` on `circle` as having no candidates. Deploys the circle
    /// if needed.
    pub fn with_empty_month(mut self, circle: &Address, month: u64) -> Self {
        self.circles
            .entry(circle.clone())
            .or_default()
            .candidates
            .entry(month)
            .or_default();
        self
    }

    /// Set the credit score `registry` holds for `account`. Deploys the
    /// registry if needed.
    pub fn with_credit_score(mut self, registry: &Address, account: Address, score: impl Into<U256>) -> Self {
        self.registries
            .entry(registry.clone())
            .or_default()
            .scores
            .insert(account, score.into());
        self
    }

    /// Set the credit profile `registry` holds for `account`. Deploys the
    /// registry if needed.
    pub fn with_credit_profile(mut self, registry: &Address, account: Address, profile: CreditProfile) -> Self {
        self.registries
            .entry(registry.clone())
            .or_default()
            .profiles
            .insert(account, profile);
        self
    }

    /// Record `winner` as finalized for `month` on `circle`.
    pub fn with_winner(mut self, circle: &Address, month: u64, winner: Address) -> Self {
        self.circles
            .entry(circle.clone())
            .or_default()
            .winners
            .insert(month, winner);
        self
    }

    /// Set whether the voting period for `month` has ended.
    pub fn with_voting_ended(mut self, circle: &Address, month: u64, ended: bool) -> Self {
        self.circles
            .entry(circle.clone())
            .or_default()
            .voting_ended
            .insert(month, ended);
        self
    }

    /// Set one of the circle's `uint256` getters.
    pub fn with_circle_uint(mut self, circle: &Address, field: CircleUint, value: impl Into<U256>) -> Self {
        self.circles
            .entry(circle.clone())
            .or_default()
            .uints
            .insert(field, value.into());
        self
    }

    /// Set `currentMonth()` on `circle`.
    pub fn with_current_month(self, circle: &Address, month: impl Into<U256>) -> Self {
        self.with_circle_uint(circle, CircleUint::CurrentMonth, month)
    }

    /// Set `totalParticipants()` on `circle`.
    pub fn with_total_participants(self, circle: &Address, count: impl Into<U256>) -> Self {
        self.with_circle_uint(circle, CircleUint::TotalParticipants, count)
    }

    /// Set `creator()` on `circle`.
    pub fn with_creator(mut self, circle: &Address, creator: Address) -> Self {
        self.circles.entry(circle.clone()).or_default().creator = creator;
        self
    }

    /// Set `status()` on `circle`. Unset circles report `Pending`.
    pub fn with_status(mut self, circle: &Address, status: CircleStatus) -> Self {
        self.circles.entry(circle.clone()).or_default().status = Some(status);
        self
    }

    /// Deploy a factory at `factory` and append `circle` to its listing.
    pub fn with_factory_circle(mut self, factory: &Address, circle: Address) -> Self {
        self.factories
            .entry(factory.clone())
            .or_default()
            .circles
            .push(circle);
        self
    }

    /// Record `user` as a participant of `circle` in the factory's index.
    pub fn with_user_circle(mut self, factory: &Address, user: Address, circle: Address) -> Self {
        self.factories
            .entry(factory.clone())
            .or_default()
            .by_user
            .entry(user)
            .or_default()
            .push(circle);
        self
    }

    /// Fail every call of `function` (e.g. `"getCreditScore"`).
    pub fn with_failure(mut self, function: &'static str, failure: InjectedFailure) -> Self {
        self.failures.insert(function, failure);
        self
    }

    /// Never complete calls of `function`.
    pub fn stall_on(mut self, function: &'static str) -> Self {
        self.stalls.insert(function);
        self
    }

    /// Number of times `function` has been called.
    pub fn calls(&self, function: &str) -> usize {
        self.calls.lock().get(function).copied().unwrap_or(0)
    }

    async fn enter(&self, function: &'static str) -> Result<(), ChainReadError> {
        *self.calls.lock().entry(function).or_insert(0) += 1;
        if self.stalls.contains(function) {
            std::future::pending::<()>().await;
        }
        match self.failures.get(function) {
            Some(failure) => Err(failure.into_error(function)),
            None => Ok(()),
        }
    }

    fn circle(&self, circle: &Address) -> Result<&CircleState, ChainReadError> {
        deployed(&self.circles, circle)
    }

    fn registry(&self, registry: &Address) -> Result<&RegistryState, ChainReadError> {
        deployed(&self.registries, registry)
    }

    fn factory(&self, factory: &Address) -> Result<&FactoryState, ChainReadError> {
        deployed(&self.factories, factory)
    }
}

fn deployed<'a, S>(contracts: &'a HashMap<Address, S>, address: &Address) -> Result<&'a S, ChainReadError> {
    contracts.get(address).ok_or_else(|| ChainReadError::NoContract {
        address: address.to_string(),
    })
}

#[async_trait]
impl CircleReader for StaticCircleReader {
    async fn candidates(&self, circle: &Address, month: u64) -> Result<Vec<Address>, ChainReadError> {
        self.enter("getCandidates").await?;
        Ok(self
            .circle(circle)?
            .candidates
            .get(&month)
            .cloned()
            .unwrap_or_default())
    }

    async fn candidate_votes(
        &self,
        circle: &Address,
        month: u64,
        candidate: &Address,
    ) -> Result<U256, ChainReadError> {
        self.enter("getCandidateVotes").await?;
        let state = self.circle(circle)?;
        Ok(state
            .votes
            .get(&(month, candidate.clone()))
            .copied()
            .unwrap_or_default())
    }

    async fn winner(&self, circle: &Address, month: u64) -> Result<Address, ChainReadError> {
        self.enter("getWinner").await?;
        Ok(self
            .circle(circle)?
            .winners
            .get(&month)
            .cloned()
            .unwrap_or_else(Address::zero))
    }

    async fn voting_period_ended(&self, circle: &Address, month: u64) -> Result<bool, ChainReadError> {
        self.enter("isVotingPeriodEnded").await?;
        Ok(self
            .circle(circle)?
            .voting_ended
            .get(&month)
            .copied()
            .unwrap_or(false))
    }

    async fn credit_registry(&self, circle: &Address) -> Result<Address, ChainReadError> {
        self.enter("creditRegistry").await?;
        Ok(self.circle(circle)?.registry.clone())
    }

    async fn circle_uint(&self, circle: &Address, field: CircleUint) -> Result<U256, ChainReadError> {
        self.enter(field.name()).await?;
        Ok(self
            .circle(circle)?
            .uints
            .get(&field)
            .copied()
            .unwrap_or_default())
    }

    async fn creator(&self, circle: &Address) -> Result<Address, ChainReadError> {
        self.enter("creator").await?;
        Ok(self.circle(circle)?.creator.clone())
    }

    async fn status(&self, circle: &Address) -> Result<CircleStatus, ChainReadError> {
        self.enter("status").await?;
        Ok(self.circle(circle)?.status.unwrap_or(CircleStatus::Pending))
    }

    async fn credit_score(&self, registry: &Address, account: &Address) -> Result<U256, ChainReadError> {
        self.enter("getCreditScore").await?;
        Ok(self
            .registry(registry)?
            .scores
            .get(account)
            .copied()
            .unwrap_or_default())
    }

    async fn credit_profile(
        &self,
        registry: &Address,
        account: &Address,
    ) -> Result<CreditProfile, ChainReadError> {
        self.enter("getCreditProfile").await?;
        Ok(self
            .registry(registry)?
            .profiles
            .get(account)
            .cloned()
            .unwrap_or_default())
    }

    async fn circle_count(&self, factory: &Address) -> Result<U256, ChainReadError> {
        self.enter("getCircleCount").await?;
        Ok(U256::from(self.factory(factory)?.circles.len()))
    }

    async fn circles(&self, factory: &Address, offset: u64, limit: u64) -> Result<Vec<Address>, ChainReadError> {
        self.enter("getCircles").await?;
        let all = &self.factory(factory)?.circles;
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(all.len());
        let end = start.saturating_add(usize::try_from(limit).unwrap_or(usize::MAX)).min(all.len());
        Ok(all[start..end].to_vec())
    }

    async fn user_circles(&self, factory: &Address, user: &Address) -> Result<Vec<Address>, ChainReadError> {
        self.enter("getUserCircles").await?;
        Ok(self
            .factory(factory)?
            .by_user
            .get(user)
            .cloned()
            .unwrap_or_default())
    }
}
