//! # circle-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Chain settings come from `RPC_URL`,
//! `CHAIN_ID`, `RPC_TIMEOUT_SECS`, `RPC_MAX_RETRIES`, `READ_TIMEOUT_SECS`,
//! `FACTORY_ADDRESS` and `CREDIT_REGISTRY_ADDRESS`; server settings from
//! `PORT`, `CHAT_HISTORY_LIMIT`, `CHAT_MAX_CIRCLES` and `CORS_ALLOW_ORIGIN`.
//! `LOG_FORMAT=json` switches to JSON log lines.

use circle_api::state::{AppConfig, AppState};
use circle_chain::{ChainConfig, RpcCircleReader, WinnerService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let chain = ChainConfig::from_env().map_err(|e| {
        tracing::error!("Invalid chain configuration: {e}");
        e
    })?;
    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Invalid server configuration: {e}");
        e
    })?;

    // Chain id mismatch or an unreachable endpoint is logged; startup continues.
    match RpcCircleReader::new(&chain)?.chain_id().await {
        Ok(id) if id == chain.chain_id => tracing::info!(chain_id = id, "connected to RPC endpoint"),
        Ok(id) => tracing::warn!(expected = chain.chain_id, actual = id, "RPC endpoint reports a different chain id"),
        Err(e) => tracing::warn!("Could not read chain id from {}: {e}", chain.rpc_url),
    }

    if chain.factory.is_none() {
        tracing::info!("FACTORY_ADDRESS unset, circle listing routes will answer 503");
    }

    let winners = WinnerService::from_config(&chain)?;
    let port = config.port;
    let app = circle_api::app(AppState::with_config(winners, config));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Lending circle API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
