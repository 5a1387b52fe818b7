//! # Credit Lookups
//!
//! An account's score and payment history as a `CreditRegistry` records
//! them. With `?circle=` the registry is the one that circle scores its
//! candidates with; otherwise the deployment's configured registry.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use circle_chain::CreditReport;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::extractors::{extract_validated_query, parse_address, Validate};
use crate::state::AppState;

/// Optional circle whose registry to read.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CreditQuery {
    /// Circle contract address.
    pub circle: Option<String>,
}

impl Validate for CreditQuery {
    fn validate(&self) -> Result<(), AppError> {
        match &self.circle {
            Some(raw) => parse_address(raw).map(|_| ()),
            None => Ok(()),
        }
    }
}

/// `getCreditProfile` counters, decimal.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditProfileView {
    /// Score as stored in the profile.
    pub credit_score: String,
    /// Circles joined.
    pub circles_joined: String,
    /// Circles completed.
    pub circles_completed: String,
    /// Contributions paid on time.
    pub on_time_payments: String,
    /// Contributions paid late.
    pub late_payments: String,
    /// Contributions never paid.
    pub defaults: String,
    /// Whether the account has ever defaulted.
    pub has_defaulted: bool,
}

/// Credit standing of one account.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditResponse {
    /// Account looked up.
    pub address: String,
    /// Registry that answered.
    pub registry: String,
    /// `getCreditScore`, decimal.
    #[schema(example = "700")]
    pub credit_score: String,
    /// Payment history.
    pub profile: CreditProfileView,
}

impl From<CreditReport> for CreditResponse {
    fn from(r: CreditReport) -> Self {
        let p = r.profile;
        Self {
            address: r.account.to_string(),
            registry: r.registry.to_string(),
            credit_score: r.credit_score.to_string(),
            profile: CreditProfileView {
                credit_score: p.credit_score.to_string(),
                circles_joined: p.circles_joined.to_string(),
                circles_completed: p.circles_completed.to_string(),
                on_time_payments: p.on_time_payments.to_string(),
                late_payments: p.late_payments.to_string(),
                defaults: p.defaults.to_string(),
                has_defaulted: p.has_defaulted,
            },
        }
    }
}

/// Build the credit router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/credit/:address", get(get_credit))
}

/// GET /api/credit/:address: Credit score and profile.
#[utoipa::path(
    get,
    path = "/api/credit/{address}",
    params(
        ("address" = String, Path, description = "Account address"),
        CreditQuery,
    ),
    responses(
        (status = 200, description = "Credit standing", body = CreditResponse),
        (status = 404, description = "Circle not found", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid address", body = crate::error::ErrorBody),
        (status = 503, description = "No registry configured or registry unreachable", body = crate::error::ErrorBody),
    ),
    tag = "credit"
)]
pub(crate) async fn get_credit(
    State(state): State<AppState>,
    Path(address): Path<String>,
    query: Result<Query<CreditQuery>, QueryRejection>,
) -> Result<Json<CreditResponse>, AppError> {
    let account = parse_address(&address)?;
    let query = extract_validated_query(query)?;
    let circle = query.circle.as_deref().map(parse_address).transpose()?;
    let report = state.winners.credit_report(&account, circle.as_ref()).await?;
    Ok(Json(report.into()))
}
