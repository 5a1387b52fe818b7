//! # Candidate Data Fetch
//!
//! Produces the unsorted [`Candidate`] set for one circle-month:
//!
//! 1. `getCandidates(month)` on the circle. A missing contract or a revert
//!    means the circle does not exist ([`FetchError::NotFound`]).
//! 2. An empty list returns immediately. Nothing else is read.
//! 3. `creditRegistry()` once, then per candidate `getCandidateVotes` and
//!    `getCreditScore` concurrently.
//!
//! Every read runs under [`FetchPolicy::read_timeout`]. The first failed or
//! timed-out read fails the whole fetch and aborts the reads still in flight.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use circle_core::{Address, Candidate};
use tokio::task::JoinSet;

use crate::error::ChainReadError;
use crate::reader::CircleReader;

/// Limits applied to each contract read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Upper bound on one read, transport retries included.
    pub read_timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(10),
        }
    }
}

/// Why a fetch could not produce a candidate set.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The address does not resolve to a deployed circle, or the circle
    /// rejected the month.
    #[error("circle {circle} not found: {reason}")]
    NotFound { circle: String, reason: String },
    /// A read timed out or the transport/node failed after retries.
    #[error("{read} read failed: {source}")]
    TransientReadFailure {
        read: &'static str,
        source: ChainReadError,
    },
    /// A read completed but its result was unusable.
    #[error("{read} returned an invalid response: {source}")]
    InvalidResponse {
        read: &'static str,
        source: ChainReadError,
    },
    /// A fan-out task panicked or was cancelled.
    #[error("candidate read task failed: {0}")]
    TaskFailed(String),
    /// The read needs a contract address this deployment was not given.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl FetchError {
    /// Whether retrying the whole request later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientReadFailure { .. })
    }
}

/// A failed read together with the name of the function that was called.
#[derive(Debug)]
pub(crate) struct ReadFailure {
    pub(crate) read: &'static str,
    pub(crate) source: ChainReadError,
}

impl ReadFailure {
    /// Classify a read on the circle itself, where a missing contract or a
    /// revert means the circle is unknown.
    pub(crate) fn on_circle(self, circle: &Address) -> FetchError {
        match self.source {
            ChainReadError::NoContract { .. } | ChainReadError::Reverted { .. } => {
                FetchError::NotFound {
                    circle: circle.to_string(),
                    reason: self.source.to_string(),
                }
            }
            _ => self.into_fetch_error(),
        }
    }

    pub(crate) fn into_fetch_error(self) -> FetchError {
        if self.source.is_transient() {
            FetchError::TransientReadFailure {
                read: self.read,
                source: self.source,
            }
        } else {
            FetchError::InvalidResponse {
                read: self.read,
                source: self.source,
            }
        }
    }
}

/// Run one read under `limit`, naming it for error reporting.
pub(crate) async fn timed<T, F>(read: &'static str, limit: Duration, fut: F) -> Result<T, ReadFailure>
where
    F: Future<Output = Result<T, ChainReadError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(ReadFailure { read, source }),
        Err(_) => Err(ReadFailure {
            read,
            source: ChainReadError::Timeout { call: read.into() },
        }),
    }
}

/// Fetches candidate data through a [`CircleReader`].
#[derive(Debug, Clone)]
pub struct CandidateFetcher {
    reader: Arc<dyn CircleReader>,
    policy: FetchPolicy,
}

impl CandidateFetcher {
    /// Create a fetcher over `reader`.
    pub fn new(reader: Arc<dyn CircleReader>, policy: FetchPolicy) -> Self {
        Self { reader, policy }
    }

    /// The policy this fetcher applies.
    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }

    /// Fetch every candidate for `month` with its votes and credit score,
    /// in the order `getCandidates` returned them.
    pub async fn fetch(&self, circle: &Address, month: u64) -> Result<Vec<Candidate>, FetchError> {
        let limit = self.policy.read_timeout;

        let addresses = timed("getCandidates", limit, self.reader.candidates(circle, month))
            .await
            .map_err(|f| f.on_circle(circle))?;
        if addresses.is_empty() {
            tracing::debug!(%circle, month, "no candidates for month");
            return Ok(Vec::new());
        }

        let registry = timed("creditRegistry", limit, self.reader.credit_registry(circle))
            .await
            .map_err(|f| f.on_circle(circle))?;
        tracing::debug!(
            %circle,
            month,
            %registry,
            candidates = addresses.len(),
            "reading votes and credit scores"
        );

        let mut tasks = JoinSet::new();
        for (index, candidate) in addresses.iter().cloned().enumerate() {
            let reader = Arc::clone(&self.reader);
            let circle = circle.clone();
            let registry = registry.clone();
            tasks.spawn(async move {
                let (votes, credit_score) = tokio::try_join!(
                    timed(
                        "getCandidateVotes",
                        limit,
                        reader.candidate_votes(&circle, month, &candidate)
                    ),
                    timed("getCreditScore", limit, reader.credit_score(&registry, &candidate)),
                )?;
                Ok::<_, ReadFailure>((index, Candidate::new(candidate, votes, credit_score)))
            });
        }

        // Returning early drops the JoinSet, which aborts the remaining reads.
        let mut slots: Vec<Option<Candidate>> = vec![None; addresses.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, candidate) = joined
                .map_err(|e| FetchError::TaskFailed(e.to_string()))?
                .map_err(|failure| {
                    tracing::warn!(%circle, month, read = failure.read, "candidate read failed: {}", failure.source);
                    failure.into_fetch_error()
                })?;
            slots[index] = Some(candidate);
        }

        slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| FetchError::TaskFailed("candidate slot left empty".into())))
            .collect()
    }
}
