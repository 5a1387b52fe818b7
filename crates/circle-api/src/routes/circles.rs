//! # Circle Status Reads
//!
//! Read-only views of circle contracts for the voting UI: configuration and
//! balances, per-month voting status, and the factory's circle listings.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use circle_chain::{CirclePage, CircleSummary, VotingStatus, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::extractors::{extract_validated_query, parse_address, parse_month, Validate};
use crate::state::AppState;

/// Page size when the request names none.
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Configuration and live state of a circle. Amounts are wei, decimal.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CircleSummaryResponse {
    /// Circle contract address.
    pub address: String,
    /// Account that deployed the circle.
    pub creator: String,
    /// `PENDING`, `ACTIVE`, `COMPLETED` or `CANCELLED`.
    #[schema(example = "ACTIVE")]
    pub status: String,
    /// Monthly contribution per participant, wei.
    #[schema(example = "1000000000000000000")]
    pub monthly_contribution: String,
    /// Number of monthly rounds.
    #[schema(example = "6")]
    pub duration_in_months: String,
    /// Participants required to start.
    pub min_participants: String,
    /// Participant cap.
    pub max_participants: String,
    /// Reserve share of each contribution, percent.
    #[schema(example = "10")]
    pub reserve_percentage: String,
    /// Month the circle is currently in, decimal.
    #[schema(example = "2")]
    pub current_month: String,
    /// Participant count, decimal.
    #[schema(example = "6")]
    pub total_participants: String,
    /// Funds held by the circle, wei.
    pub pool_balance: String,
    /// Credit registry contract the circle reads scores from.
    pub credit_registry: String,
}

impl From<CircleSummary> for CircleSummaryResponse {
    fn from(s: CircleSummary) -> Self {
        Self {
            address: s.address.to_string(),
            creator: s.creator.to_string(),
            status: s.status.to_string(),
            monthly_contribution: s.monthly_contribution.to_string(),
            duration_in_months: s.duration_in_months.to_string(),
            min_participants: s.min_participants.to_string(),
            max_participants: s.max_participants.to_string(),
            reserve_percentage: s.reserve_percentage.to_string(),
            current_month: s.current_month.to_string(),
            total_participants: s.total_participants.to_string(),
            pool_balance: s.pool_balance.to_string(),
            credit_registry: s.credit_registry.to_string(),
        }
    }
}

/// Paging for `GET /api/circles`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Index of the first circle (default 0).
    pub offset: Option<u64>,
    /// Circles per page, 1 to 100 (default 50).
    pub limit: Option<u64>,
}

impl Validate for PageQuery {
    fn validate(&self) -> Result<(), AppError> {
        match self.limit {
            Some(limit) if limit == 0 || limit > MAX_PAGE_SIZE => Err(AppError::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}, got {limit}"
            ))),
            _ => Ok(()),
        }
    }
}

/// One page of deployed circles.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CirclePageResponse {
    /// Factory contract that was read.
    pub factory: String,
    /// Circles deployed in total, decimal.
    #[schema(example = "12")]
    pub total: String,
    /// Index of the first circle on this page.
    pub offset: u64,
    /// Circle addresses in deployment order.
    pub circles: Vec<String>,
}

impl From<CirclePage> for CirclePageResponse {
    fn from(p: CirclePage) -> Self {
        Self {
            factory: p.factory.to_string(),
            total: p.total.to_string(),
            offset: p.offset,
            circles: p.circles.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Circles one account participates in.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCirclesResponse {
    /// Account queried.
    pub address: String,
    /// Circle addresses from the factory's per-user index.
    pub circles: Vec<String>,
}

/// Voting status of one circle-month.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VotingStatusResponse {
    /// Month queried.
    pub month: u64,
    /// Candidate addresses in contract order (not ranked).
    pub candidates: Vec<String>,
    /// Winner recorded on-chain, or null while unfinalized.
    pub finalized_winner: Option<String>,
    /// Whether the voting period has closed.
    pub voting_ended: bool,
}

impl From<VotingStatus> for VotingStatusResponse {
    fn from(s: VotingStatus) -> Self {
        Self {
            month: s.month,
            candidates: s.candidates.iter().map(ToString::to_string).collect(),
            finalized_winner: s.finalized_winner.map(|a| a.to_string()),
            voting_ended: s.voting_ended,
        }
    }
}

/// Build the circles router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/circles", get(list_circles))
        .route("/api/circles/:circle", get(get_circle))
        .route("/api/circles/:circle/months/:month/status", get(get_voting_status))
        .route("/api/users/:address/circles", get(get_user_circles))
}

/// GET /api/circles: One page of circles deployed by the factory.
#[utoipa::path(
    get,
    path = "/api/circles",
    params(PageQuery),
    responses(
        (status = 200, description = "Circle page", body = CirclePageResponse),
        (status = 422, description = "Limit out of range", body = crate::error::ErrorBody),
        (status = 503, description = "Factory not configured or unreachable", body = crate::error::ErrorBody),
    ),
    tag = "circles"
)]
pub(crate) async fn list_circles(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<CirclePageResponse>, AppError> {
    let query = extract_validated_query(query)?;
    let page = state
        .winners
        .list_circles(query.offset.unwrap_or(0), query.limit.unwrap_or(DEFAULT_PAGE_SIZE))
        .await?;
    Ok(Json(page.into()))
}

/// GET /api/users/:address/circles: Circles `address` participates in.
#[utoipa::path(
    get,
    path = "/api/users/{address}/circles",
    params(("address" = String, Path, description = "Participant account address")),
    responses(
        (status = 200, description = "Circles of the account", body = UserCirclesResponse),
        (status = 422, description = "Invalid address", body = crate::error::ErrorBody),
        (status = 503, description = "Factory not configured or unreachable", body = crate::error::ErrorBody),
    ),
    tag = "circles"
)]
pub(crate) async fn get_user_circles(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<UserCirclesResponse>, AppError> {
    let user = parse_address(&address)?;
    let circles = state.winners.user_circles(&user).await?;
    Ok(Json(UserCirclesResponse {
        address: user.to_string(),
        circles: circles.iter().map(ToString::to_string).collect(),
    }))
}

/// GET /api/circles/:circle: Configuration, lifecycle state and balances.
#[utoipa::path(
    get,
    path = "/api/circles/{circle}",
    params(("circle" = String, Path, description = "Circle contract address")),
    responses(
        (status = 200, description = "Circle found", body = CircleSummaryResponse),
        (status = 404, description = "Circle not found", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid address", body = crate::error::ErrorBody),
    ),
    tag = "circles"
)]
pub(crate) async fn get_circle(
    State(state): State<AppState>,
    Path(circle): Path<String>,
) -> Result<Json<CircleSummaryResponse>, AppError> {
    let circle = parse_address(&circle)?;
    let summary = state.winners.circle_summary(&circle).await?;
    Ok(Json(summary.into()))
}

/// GET /api/circles/:circle/months/:month/status: Candidates, finalized
/// winner and voting-period state.
#[utoipa::path(
    get,
    path = "/api/circles/{circle}/months/{month}/status",
    params(
        ("circle" = String, Path, description = "Circle contract address"),
        ("month" = u64, Path, description = "Zero-based month index"),
    ),
    responses(
        (status = 200, description = "Voting status", body = VotingStatusResponse),
        (status = 404, description = "Circle not found", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid address or month", body = crate::error::ErrorBody),
    ),
    tag = "circles"
)]
pub(crate) async fn get_voting_status(
    State(state): State<AppState>,
    Path((circle, month)): Path<(String, String)>,
) -> Result<Json<VotingStatusResponse>, AppError> {
    let circle = parse_address(&circle)?;
    let month = parse_month(&month)?;
    let status = state.winners.voting_status(&circle, month).await?;
    Ok(Json(status.into()))
}
