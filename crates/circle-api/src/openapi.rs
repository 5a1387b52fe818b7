//! # OpenAPI Document
//!
//! Assembles all utoipa-documented routes into a single OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI document for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lending Circle API",
        description = "Winner resolution, circle and credit reads, and chat for on-chain lending circles.",
        license(name = "MIT")
    ),
    paths(
        crate::routes::winner::calculate_winner,
        crate::routes::circles::list_circles,
        crate::routes::circles::get_circle,
        crate::routes::circles::get_voting_status,
        crate::routes::circles::get_user_circles,
        crate::routes::credit::get_credit,
        crate::routes::chat::get_history,
        crate::routes::chat::post_message,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::chat::ChatMessage,
        crate::middleware::metrics::MetricsSnapshot,
        crate::routes::winner::CalculateWinnerRequest,
        crate::routes::winner::CandidateView,
        crate::routes::winner::WinnerResponse,
        crate::routes::circles::CircleSummaryResponse,
        crate::routes::circles::VotingStatusResponse,
        crate::routes::circles::CirclePageResponse,
        crate::routes::circles::UserCirclesResponse,
        crate::routes::credit::CreditResponse,
        crate::routes::credit::CreditProfileView,
        crate::routes::chat::ChatHistoryResponse,
        crate::routes::chat::PostMessageRequest,
    )),
    tags(
        (name = "winner", description = "Payout winner resolution"),
        (name = "circles", description = "Circle contract status and listings"),
        (name = "credit", description = "Credit registry lookups"),
        (name = "chat", description = "Per-circle chat"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
