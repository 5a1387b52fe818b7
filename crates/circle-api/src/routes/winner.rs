//! # Winner Calculation
//!
//! `POST /api/calculate-winner`: orders a circle-month's candidates by
//! votes, credit score and address, and reports the winner. A winner the
//! circle has already finalized on-chain takes precedence over the
//! computed one.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use circle_core::{Candidate, ResolutionRequest, ResolutionResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, month_from_json, parse_address, Validate};
use crate::state::AppState;

/// Winner calculation request.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateWinnerRequest {
    /// `LendingCircle` contract address.
    #[schema(example = "0x5fbdb2315678afecb367f032d93f642f64180aa3")]
    pub circle_address: Option<String>,
    /// Zero-based month index, as a JSON integer or decimal string.
    #[schema(value_type = u64, example = 0)]
    pub month: Option<serde_json::Value>,
}

impl Validate for CalculateWinnerRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self
            .circle_address
            .as_deref()
            .map_or(true, |s| s.trim().is_empty())
        {
            return Err(AppError::MissingParameter("circleAddress".into()));
        }
        if self.month.is_none() {
            return Err(AppError::MissingParameter("month".into()));
        }
        Ok(())
    }
}

impl CalculateWinnerRequest {
    fn into_request(self) -> Result<ResolutionRequest, AppError> {
        let circle = parse_address(self.circle_address.as_deref().unwrap_or_default().trim())?;
        let month = match &self.month {
            Some(value) => month_from_json(value)?,
            None => return Err(AppError::MissingParameter("month".into())),
        };
        Ok(ResolutionRequest::new(circle, month))
    }
}

/// One candidate in resolution order.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateView {
    /// Candidate account.
    pub address: String,
    /// Weighted vote total, decimal.
    #[schema(example = "1200")]
    pub votes: String,
    /// Current credit score, decimal.
    #[schema(example = "650")]
    pub credit_score: String,
}

impl From<Candidate> for CandidateView {
    fn from(c: Candidate) -> Self {
        Self {
            address: c.address.to_string(),
            votes: c.votes.to_string(),
            credit_score: c.credit_score.to_string(),
        }
    }
}

/// Winner calculation response.
#[derive(Debug, Serialize, ToSchema)]
pub struct WinnerResponse {
    /// Finalized winner if the circle recorded one, else the top candidate.
    pub winner: Option<String>,
    /// Candidates sorted by votes, credit score, then address.
    pub candidates: Vec<CandidateView>,
    /// Month that was resolved.
    pub month: u64,
}

impl From<ResolutionResult> for WinnerResponse {
    fn from(result: ResolutionResult) -> Self {
        Self {
            winner: result.winner.map(|a| a.to_string()),
            candidates: result.candidates.into_iter().map(CandidateView::from).collect(),
            month: result.month,
        }
    }
}

/// Build the winner router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/calculate-winner", post(calculate_winner))
}

/// POST /api/calculate-winner: Resolve the payout winner for a circle-month.
#[utoipa::path(
    post,
    path = "/api/calculate-winner",
    request_body = CalculateWinnerRequest,
    responses(
        (status = 200, description = "Winner resolved", body = WinnerResponse),
        (status = 400, description = "Missing or unparseable field", body = crate::error::ErrorBody),
        (status = 404, description = "Circle not found", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid address or month", body = crate::error::ErrorBody),
        (status = 503, description = "Contract read failed", body = crate::error::ErrorBody),
    ),
    tag = "winner"
)]
pub(crate) async fn calculate_winner(
    State(state): State<AppState>,
    body: Result<Json<CalculateWinnerRequest>, JsonRejection>,
) -> Result<Json<WinnerResponse>, AppError> {
    let request = extract_validated_json(body)?.into_request()?;
    let result = state.winners.resolve(&request).await?;

    tracing::info!(
        circle = %request.circle,
        month = request.month,
        winner = ?result.winner.as_ref().map(|a| a.as_str()),
        source = %result.source,
        candidates = result.candidates.len(),
        "winner calculated"
    );
    Ok(Json(result.into()))
}
