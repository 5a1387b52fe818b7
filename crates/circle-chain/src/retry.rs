//! Bounded retry for contract reads.
//!
//! A read is attempted again only when its error reports
//! [`ChainReadError::is_transient`]. Reverts, missing contracts and
//! undecodable data describe contract state and surface on the first
//! attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::ChainReadError;

/// Delay before the first retry. Each later retry waits twice as long.
const BASE_DELAY: Duration = Duration::from_millis(200);

/// Delay before retry number `retry` (zero-based).
pub(crate) fn backoff(retry: u32) -> Duration {
    BASE_DELAY.saturating_mul(2u32.saturating_pow(retry))
}

/// Sum of every backoff delay when all `max_retries` retries are used.
pub(crate) fn total_backoff(max_retries: u32) -> Duration {
    (0..max_retries).fold(Duration::ZERO, |sum, retry| sum.saturating_add(backoff(retry)))
}

/// Run `attempt` until it succeeds, fails permanently, or `max_retries`
/// retries have been spent. The last error is returned unchanged.
pub(crate) async fn with_retry<T, F, Fut>(
    call: &str,
    max_retries: u32,
    mut attempt: F,
) -> Result<T, ChainReadError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ChainReadError>>,
{
    let mut retry = 0;
    loop {
        match attempt().await {
            Err(err) if err.is_transient() && retry < max_retries => {
                let delay = backoff(retry);
                retry += 1;
                tracing::warn!(call, retry, max_retries, ?delay, "transient read failure, retrying: {err}");
                tokio::time::sleep(delay).await;
            }
            outcome => return outcome,
        }
    }
}
