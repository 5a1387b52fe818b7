//! # Resolve Subcommand
//!
//! `circle resolve` prints the ordered candidates and the payout winner of
//! one circle-month, in the same shape the API returns plus the `source`
//! of the winner (`on_chain`, `computed` or `none`).

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use circle_chain::WinnerService;
use circle_core::{Address, ResolutionRequest};

use crate::print_json;

/// Arguments for `circle resolve`.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// `LendingCircle` contract address.
    #[arg(long, value_parser = Address::parse)]
    pub circle: Address,

    /// Zero-based month index.
    #[arg(long)]
    pub month: u64,
}

/// Resolve the winner and print the result.
pub async fn run_resolve(
    args: &ResolveArgs,
    service: &WinnerService,
    out: &mut impl Write,
) -> Result<u8> {
    let request = ResolutionRequest::new(args.circle.clone(), args.month);
    let result = service
        .resolve(&request)
        .await
        .with_context(|| format!("resolving month {} of circle {}", args.month, args.circle))?;

    tracing::info!(
        circle = %args.circle,
        month = args.month,
        source = %result.source,
        candidates = result.candidates.len(),
        "resolved"
    );
    print_json(out, &result)?;
    Ok(0)
}
