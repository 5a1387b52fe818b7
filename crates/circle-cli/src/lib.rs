//! # circle-cli: Command-Line Tool for Lending Circles
//!
//! Provides the `circle` binary: read a `LendingCircle` contract over
//! JSON-RPC and print the result as JSON on stdout. Logs go to stderr.
//!
//! ## Subcommands
//!
//! - `circle resolve --circle 0x… --month 3`: Ordered candidates and the
//!   payout winner for a month.
//! - `circle status --circle 0x… --month 3`: Candidates, finalized winner
//!   and voting-period state.
//! - `circle summary --circle 0x…`: Configuration, lifecycle state and
//!   balances.
//! - `circle circles --offset 0 --limit 50`: Circles the factory deployed.
//! - `circle user-circles 0x…`: Circles an account participates in.
//! - `circle credit 0x… [--circle 0x…]`: Credit score and payment history.
//! - `circle check`: Confirm the endpoint serves the expected chain id.
//!
//! Connection flags (`--rpc-url`, `--chain-id`, `--timeout`, `--retries`,
//! `--read-timeout`, `--factory`, `--credit-registry`) fall back to the same environment variables the API
//! server reads.

pub mod browse;
pub mod chain;
pub mod status;
pub mod winner;

use std::io::Write;

use serde::Serialize;

/// Write `value` as pretty JSON followed by a newline.
pub fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
