//! # Connection Flags and Endpoint Check
//!
//! Global flags describing the JSON-RPC endpoint, and the `circle check`
//! subcommand.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use url::Url;

use circle_chain::config::{DEFAULT_CHAIN_ID, DEFAULT_RPC_URL};
use circle_chain::{ChainConfig, RpcCircleReader};
use circle_core::Address;

use crate::print_json;

/// JSON-RPC connection flags, shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ChainArgs {
    /// JSON-RPC endpoint.
    #[arg(long, env = "RPC_URL", default_value = DEFAULT_RPC_URL, global = true)]
    pub rpc_url: Url,

    /// Expected EVM chain id.
    #[arg(long, env = "CHAIN_ID", default_value_t = DEFAULT_CHAIN_ID, global = true)]
    pub chain_id: u64,

    /// Per-HTTP-request timeout in seconds.
    #[arg(long = "timeout", env = "RPC_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub timeout_secs: u64,

    /// Transport retries after the first attempt.
    #[arg(long = "retries", env = "RPC_MAX_RETRIES", default_value_t = 3, global = true)]
    pub max_retries: u32,

    /// Upper bound on a single contract read, retries included, in seconds.
    /// Defaults to enough for every attempt plus the backoff between them.
    #[arg(long = "read-timeout", env = "READ_TIMEOUT_SECS", global = true)]
    pub read_timeout_secs: Option<u64>,

    /// `CircleFactory` contract used for circle listings.
    #[arg(long, env = "FACTORY_ADDRESS", value_parser = Address::parse, global = true)]
    pub factory: Option<Address>,

    /// `CreditRegistry` contract used when no circle is given.
    #[arg(long = "credit-registry", env = "CREDIT_REGISTRY_ADDRESS", value_parser = Address::parse, global = true)]
    pub credit_registry: Option<Address>,
}

impl ChainArgs {
    /// Chain configuration described by these flags.
    pub fn config(&self) -> ChainConfig {
        ChainConfig {
            rpc_url: self.rpc_url.clone(),
            chain_id: self.chain_id,
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
            read_timeout_secs: self
                .read_timeout_secs
                .unwrap_or_else(|| ChainConfig::read_budget_secs(self.timeout_secs, self.max_retries)),
            factory: self.factory.clone(),
            credit_registry: self.credit_registry.clone(),
        }
    }
}

/// Output of `circle check`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    /// Endpoint queried.
    pub rpc_url: String,
    /// Chain id the endpoint reported.
    pub chain_id: u64,
    /// Chain id the flags expected.
    pub expected_chain_id: u64,
    /// Whether the two agree.
    pub matches: bool,
}

/// Query `eth_chainId` and compare it against `--chain-id`.
///
/// Exit code 0 when the ids agree, 2 when they differ.
pub async fn run_check(args: &ChainArgs, out: &mut impl Write) -> Result<u8> {
    let config = args.config();
    let reader = RpcCircleReader::new(&config)?;
    let chain_id = reader
        .chain_id()
        .await
        .with_context(|| format!("querying chain id from {}", config.rpc_url))?;

    let report = CheckReport {
        rpc_url: config.rpc_url.to_string(),
        chain_id,
        expected_chain_id: config.chain_id,
        matches: chain_id == config.chain_id,
    };
    if !report.matches {
        tracing::warn!(
            expected = config.chain_id,
            actual = chain_id,
            "endpoint serves a different chain"
        );
    }
    print_json(out, &report)?;
    Ok(if report.matches { 0 } else { 2 })
}
