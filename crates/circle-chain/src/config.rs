//! Chain connection configuration.
//!
//! Defaults point at the Creditcoin testnet public RPC endpoint. Override via
//! environment variables or explicit construction for other networks and
//! for local mock servers.

use std::time::Duration;

use circle_core::Address;
use url::Url;

use crate::fetch::FetchPolicy;
use crate::retry::total_backoff;

/// Public JSON-RPC endpoint of the Creditcoin testnet.
pub const DEFAULT_RPC_URL: &str = "https://rpc.cc3-testnet.creditcoin.network";

/// EVM chain id of the Creditcoin testnet.
pub const DEFAULT_CHAIN_ID: u64 = 102_031;

/// Configuration for reading circle and registry contracts.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: Url,
    /// Expected EVM chain id.
    pub chain_id: u64,
    /// Per-HTTP-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after the first attempt of a read that failed transiently.
    pub max_retries: u32,
    /// Upper bound on a single contract read, retries included, in seconds.
    pub read_timeout_secs: u64,
    /// `LendingCircleFactory` used for circle listings.
    pub factory: Option<Address>,
    /// `CreditRegistry` used for credit lookups not tied to a circle.
    pub credit_registry: Option<Address>,
}

impl ChainConfig {
    /// Configuration for `rpc_url` with default chain id and timeouts.
    pub fn new(rpc_url: Url) -> Self {
        let timeout_secs = 10;
        let max_retries = 3;
        Self {
            rpc_url,
            chain_id: DEFAULT_CHAIN_ID,
            timeout_secs,
            max_retries,
            read_timeout_secs: Self::read_budget_secs(timeout_secs, max_retries),
            factory: None,
            credit_registry: None,
        }
    }

    /// Read timeout that fits every attempt at its full HTTP timeout plus
    /// the backoff between them, rounded up to whole seconds.
    pub fn read_budget_secs(timeout_secs: u64, max_retries: u32) -> u64 {
        let backoff = total_backoff(max_retries);
        let backoff_secs = backoff.as_secs() + u64::from(backoff.subsec_nanos() > 0);
        timeout_secs
            .saturating_mul(u64::from(max_retries) + 1)
            .saturating_add(backoff_secs)
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `RPC_URL` (default: `https://rpc.cc3-testnet.creditcoin.network`)
    /// - `CHAIN_ID` (default: 102031)
    /// - `RPC_TIMEOUT_SECS` (default: 10)
    /// - `RPC_MAX_RETRIES` (default: 3)
    /// - `READ_TIMEOUT_SECS` (default: enough for every retry, 42 with the
    ///   defaults above)
    /// - `FACTORY_ADDRESS` (default: unset, circle listings disabled)
    /// - `CREDIT_REGISTRY_ADDRESS` (default: unset)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::new(env_url("RPC_URL", DEFAULT_RPC_URL)?);
        let timeout_secs = env_number("RPC_TIMEOUT_SECS", defaults.timeout_secs)?;
        let max_retries = env_number("RPC_MAX_RETRIES", defaults.max_retries)?;
        Ok(Self {
            chain_id: env_number("CHAIN_ID", defaults.chain_id)?,
            timeout_secs,
            max_retries,
            read_timeout_secs: env_number(
                "READ_TIMEOUT_SECS",
                Self::read_budget_secs(timeout_secs, max_retries),
            )?,
            factory: env_address("FACTORY_ADDRESS")?,
            credit_registry: env_address("CREDIT_REGISTRY_ADDRESS")?,
            ..defaults
        })
    }

    /// Configuration pointing at a local mock RPC server (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the URL cannot be parsed.
    pub fn local_mock(uri: &str) -> Result<Self, ConfigError> {
        let rpc_url =
            Url::parse(uri).map_err(|e| ConfigError::InvalidUrl(uri.to_string(), e.to_string()))?;
        Ok(Self {
            timeout_secs: 2,
            max_retries: 0,
            read_timeout_secs: 2,
            ..Self::new(rpc_url)
        })
    }

    /// Fetch policy derived from this configuration.
    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            read_timeout: Duration::from_secs(self.read_timeout_secs),
        }
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Unset, blank and zero addresses all mean "not configured".
fn env_address(var: &str) -> Result<Option<Address>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => {
            let address = Address::parse(raw.trim()).map_err(|_| ConfigError::InvalidAddress {
                var: var.to_string(),
                value: raw.clone(),
            })?;
            Ok(Some(address).filter(|a| !a.is_zero()))
        }
        _ => Ok(None),
    }
}

fn env_number<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
            var: var.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid value for {var}: \"{value}\" (expected a non-negative integer)")]
    InvalidNumber { var: String, value: String },
    #[error("invalid value for {var}: \"{value}\" (expected a 0x-prefixed 20-byte address)")]
    InvalidAddress { var: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_testnet_defaults() {
        let cfg = ChainConfig::new(Url::parse(DEFAULT_RPC_URL).unwrap());
        assert_eq!(cfg.chain_id, 102_031);
        assert_eq!(cfg.timeout_secs, 10);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.factory, None);
        assert_eq!(cfg.fetch_policy().read_timeout, Duration::from_secs(42));
    }

    #[test]
    fn default_read_timeout_outlasts_every_attempt() {
        let cfg = ChainConfig::new(Url::parse(DEFAULT_RPC_URL).unwrap());
        let attempts = Duration::from_secs(cfg.timeout_secs) * (cfg.max_retries + 1);
        assert!(cfg.fetch_policy().read_timeout >= attempts + total_backoff(cfg.max_retries));
    }

    #[test]
    fn read_budget_without_retries_is_one_timeout() {
        assert_eq!(ChainConfig::read_budget_secs(2, 0), 2);
        assert_eq!(ChainConfig::read_budget_secs(5, 1), 11);
    }

    #[test]
    fn local_mock_disables_retries() {
        let cfg = ChainConfig::local_mock("http://127.0.0.1:8545").unwrap();
        assert_eq!(cfg.max_retries, 0);
        assert_eq!(cfg.rpc_url.as_str(), "http://127.0.0.1:8545/");
    }

    #[test]
    fn local_mock_rejects_invalid_url() {
        assert!(ChainConfig::local_mock("not a url").is_err());
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("CIRCLE_NONEXISTENT_VAR_93817", "https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn env_number_rejects_garbage() {
        std::env::set_var("CIRCLE_TEST_BAD_NUMBER", "ten");
        let result: Result<u64, _> = env_number("CIRCLE_TEST_BAD_NUMBER", 1);
        std::env::remove_var("CIRCLE_TEST_BAD_NUMBER");
        assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));
    }

    #[test]
    fn env_address_treats_zero_as_unset() {
        std::env::set_var("CIRCLE_TEST_ZERO_FACTORY", "0x0000000000000000000000000000000000000000");
        let result = env_address("CIRCLE_TEST_ZERO_FACTORY");
        std::env::remove_var("CIRCLE_TEST_ZERO_FACTORY");
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn env_address_rejects_garbage() {
        std::env::set_var("CIRCLE_TEST_BAD_FACTORY", "factory");
        let result = env_address("CIRCLE_TEST_BAD_FACTORY");
        std::env::remove_var("CIRCLE_TEST_BAD_FACTORY");
        assert!(matches!(result, Err(ConfigError::InvalidAddress { .. })));
    }

    #[test]
    fn env_number_uses_default_when_absent() {
        let value: u32 = env_number("CIRCLE_NONEXISTENT_NUMBER_4411", 7).unwrap();
        assert_eq!(value, 7);
    }
}
