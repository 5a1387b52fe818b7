//! # Status Subcommands
//!
//! `circle status` and `circle summary`: read-only views of a circle.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use circle_chain::WinnerService;
use circle_core::Address;

use crate::print_json;

/// Arguments for `circle status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// `LendingCircle` contract address.
    #[arg(long, value_parser = Address::parse)]
    pub circle: Address,

    /// Zero-based month index.
    #[arg(long)]
    pub month: u64,
}

/// Arguments for `circle summary`.
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// `LendingCircle` contract address.
    #[arg(long, value_parser = Address::parse)]
    pub circle: Address,
}

/// Print candidates, finalized winner and voting-period state of a month.
pub async fn run_status(args: &StatusArgs, service: &WinnerService, out: &mut impl Write) -> Result<u8> {
    let status = service
        .voting_status(&args.circle, args.month)
        .await
        .with_context(|| format!("reading status of month {} of circle {}", args.month, args.circle))?;
    print_json(out, &status)?;
    Ok(0)
}

/// Print the circle's configuration, lifecycle state and balances.
pub async fn run_summary(args: &SummaryArgs, service: &WinnerService, out: &mut impl Write) -> Result<u8> {
    let summary = service
        .circle_summary(&args.circle)
        .await
        .with_context(|| format!("reading circle {}", args.circle))?;
    print_json(out, &summary)?;
    Ok(0)
}
