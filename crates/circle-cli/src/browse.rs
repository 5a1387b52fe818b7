//! # Factory and Credit Subcommands
//!
//! `circle circles`, `circle user-circles` and `circle credit`. The first
//! two need `--factory`; `credit` needs `--circle` or `--credit-registry`.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use circle_chain::{WinnerService, MAX_PAGE_SIZE};
use circle_core::Address;

use crate::print_json;

/// Arguments for `circle circles`.
#[derive(Args, Debug)]
pub struct CirclesArgs {
    /// Index of the first circle to list.
    #[arg(long, default_value_t = 0)]
    pub offset: u64,

    /// Circles per page.
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..=MAX_PAGE_SIZE as u64))]
    pub limit: u64,
}

/// Arguments for `circle user-circles`.
#[derive(Args, Debug)]
pub struct UserCirclesArgs {
    /// Participant account.
    #[arg(value_parser = Address::parse)]
    pub address: Address,
}

/// Arguments for `circle credit`.
#[derive(Args, Debug)]
pub struct CreditArgs {
    /// Account to look up.
    #[arg(value_parser = Address::parse)]
    pub address: Address,

    /// Read the registry this circle scores candidates with.
    #[arg(long, value_parser = Address::parse)]
    pub circle: Option<Address>,
}

#[derive(Debug, Serialize)]
struct UserCircles<'a> {
    address: &'a Address,
    circles: Vec<Address>,
}

/// Print one page of the factory's circles.
pub async fn run_circles(args: &CirclesArgs, service: &WinnerService, out: &mut impl Write) -> Result<u8> {
    let page = service
        .list_circles(args.offset, args.limit)
        .await
        .with_context(|| format!("listing circles from offset {}", args.offset))?;
    print_json(out, &page)?;
    Ok(0)
}

/// Print the circles an account participates in.
pub async fn run_user_circles(
    args: &UserCirclesArgs,
    service: &WinnerService,
    out: &mut impl Write,
) -> Result<u8> {
    let circles = service
        .user_circles(&args.address)
        .await
        .with_context(|| format!("reading circles of {}", args.address))?;
    print_json(
        out,
        &UserCircles {
            address: &args.address,
            circles,
        },
    )?;
    Ok(0)
}

/// Print an account's credit score and profile.
pub async fn run_credit(args: &CreditArgs, service: &WinnerService, out: &mut impl Write) -> Result<u8> {
    let report = service
        .credit_report(&args.address, args.circle.as_ref())
        .await
        .with_context(|| format!("reading credit of {}", args.address))?;
    print_json(out, &report)?;
    Ok(0)
}
