//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs and helpers to extract
//! and validate JSON bodies, query strings and path segments in handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use circle_core::Address;

use crate::error::AppError;

/// Trait for request types that check business rules beyond what serde
/// deserialization checks.
pub trait Validate {
    /// Validate business rules.
    fn validate(&self) -> Result<(), AppError>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
///     // use req...
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate()?;
    Ok(value)
}

/// Extract a query string, mapping deserialization errors to
/// [`AppError::BadRequest`], then validate it.
pub fn extract_validated_query<T: Validate>(
    result: Result<Query<T>, QueryRejection>,
) -> Result<T, AppError> {
    let Query(value) = result.map_err(|err| AppError::BadRequest(err.body_text()))?;
    value.validate()?;
    Ok(value)
}

/// Parse a circle or account address taken from a path segment.
pub fn parse_address(raw: &str) -> Result<Address, AppError> {
    Address::parse(raw).map_err(AppError::from)
}

/// Parse a zero-based month index from a path segment or JSON string.
pub fn parse_month(raw: &str) -> Result<u64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| circle_core::ValidationError::InvalidMonth(raw.to_string()).into())
}

/// Read a month from a JSON value: a non-negative integer or a decimal string.
pub fn month_from_json(value: &serde_json::Value) -> Result<u64, AppError> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| circle_core::ValidationError::InvalidMonth(n.to_string()).into()),
        serde_json::Value::String(s) => parse_month(s),
        other => Err(circle_core::ValidationError::InvalidMonth(other.to_string()).into()),
    }
}
