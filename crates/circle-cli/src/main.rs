//! # circle CLI entry point
//!
//! Parses command-line arguments, initialises logging on stderr, and
//! dispatches to subcommand handlers. Results are printed to stdout as JSON.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use circle_chain::WinnerService;
use circle_cli::browse::{run_circles, run_credit, run_user_circles, CirclesArgs, CreditArgs, UserCirclesArgs};
use circle_cli::chain::{run_check, ChainArgs};
use circle_cli::status::{run_status, run_summary, StatusArgs, SummaryArgs};
use circle_cli::winner::{run_resolve, ResolveArgs};

/// Lending circle CLI
///
/// Reads `LendingCircle`, `LendingCircleFactory` and `CreditRegistry`
/// contracts over JSON-RPC: resolves a month's payout winner, shows circle
/// and credit state, and checks the endpoint.
#[derive(Parser, Debug)]
#[command(name = "circle", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    chain: ChainArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Order a month's candidates and report the payout winner.
    Resolve(ResolveArgs),

    /// Show candidates, finalized winner and voting-period state of a month.
    Status(StatusArgs),

    /// Show a circle's configuration, lifecycle state and balances.
    Summary(SummaryArgs),

    /// List circles deployed by the factory.
    Circles(CirclesArgs),

    /// List the circles an account participates in.
    UserCircles(UserCirclesArgs),

    /// Show an account's credit score and payment history.
    Credit(CreditArgs),

    /// Check that the RPC endpoint serves the expected chain.
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(rpc_url = %cli.chain.rpc_url, "circle CLI starting");

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let mut out = std::io::stdout();
    let service = || WinnerService::from_config(&cli.chain.config());
    match cli.command {
        Commands::Resolve(args) => run_resolve(&args, &service()?, &mut out).await,
        Commands::Status(args) => run_status(&args, &service()?, &mut out).await,
        Commands::Summary(args) => run_summary(&args, &service()?, &mut out).await,
        Commands::Circles(args) => run_circles(&args, &service()?, &mut out).await,
        Commands::UserCircles(args) => run_user_circles(&args, &service()?, &mut out).await,
        Commands::Credit(args) => run_credit(&args, &service()?, &mut out).await,
        Commands::Check => run_check(&cli.chain, &mut out).await,
    }
}
