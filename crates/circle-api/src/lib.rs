//! # circle-api: HTTP and WebSocket Service for Lending Circles
//!
//! Thin Axum layer over `circle-chain`: every resolution request reads the
//! circle and registry contracts fresh, orders the candidates, and defers
//! to a winner the circle has already finalized on-chain.
//!
//! ## API Surface
//!
//! | Route | Module | Purpose |
//! |-------|--------|---------|
//! | `POST /api/calculate-winner` | [`routes::winner`] | Winner resolution |
//! | `GET /api/circles` | [`routes::circles`] | Factory circle listing |
//! | `GET /api/circles/:circle` | [`routes::circles`] | Circle details |
//! | `GET /api/circles/:circle/months/:month/status` | [`routes::circles`] | Voting status |
//! | `GET /api/users/:address/circles` | [`routes::circles`] | Circles of one account |
//! | `GET /api/credit/:address` | [`routes::credit`] | Credit score and profile |
//! | `GET, POST /api/chat/:circle` | [`routes::chat`] | Chat history |
//! | `GET /ws` | [`routes::chat`] | Chat relay (WebSocket) |
//! | `GET /openapi.json` | [`openapi`] | OpenAPI document |
//! | `GET /health/*`, `GET /metrics` | this module | Health checks and counters |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! CorsLayer → TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! Every error response body is `{"error": "<message>"}`.

pub mod chat;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::http::HeaderValue;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::{Extension, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::ApiMetrics;
use crate::state::{AppConfig, AppState};

pub use error::AppError;

/// Assemble the full application router with all routes and middleware.
///
/// Health checks and `/metrics` are mounted outside the metrics middleware
/// so scrapes do not count as traffic.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();
    let cors = cors_layer(&state.config);

    let api = Router::new()
        .merge(routes::winner::router())
        .merge(routes::circles::router())
        .merge(routes::credit::router())
        .merge(routes::chat::router())
        .merge(openapi::router())
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(metrics.clone()))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(middleware::metrics::metrics_handler))
        .layer(Extension(metrics));

    Router::new().merge(health).merge(api).layer(cors)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origin = match config.cors_allow_origin.as_deref() {
        None => AllowOrigin::any(),
        Some(raw) => match HeaderValue::from_str(raw) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                tracing::warn!(origin = raw, error = %e, "invalid CORS_ALLOW_ORIGIN, rejecting cross-origin requests");
                AllowOrigin::list(Vec::<HeaderValue>::new())
            }
        },
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Liveness check: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check: returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
