use std::sync::Arc;

use axum::{extract::OriginalUri, Router};

use crate::error::{AppError, AppResult, ErrorCode};
use crate::AppState;

pub mod auth;
pub mod check;
pub mod extract;
pub mod schedule;
pub mod schools;
pub mod users;

/// Every kiosk endpoint. Unknown paths and unsupported methods on known
/// paths both answer `ENDPOINT_NOT_FOUND`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(check::router())
        .merge(schools::router())
        .merge(users::router())
        .merge(schedule::router())
        .fallback(not_found)
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::new(ErrorCode::EndpointNotFound)
        .with_details(format!("Endpoint {} not found", uri.path()))
}

/// Parse a numeric path segment.
pub(crate) fn parse_id(name: &str, value: &str) -> AppResult<i64> {
    value.trim().parse::<i64>().map_err(|_| {
        AppError::new(ErrorCode::ParameterInvalid)
            .with_details(format!("De parameter '{}' moet een getal zijn", name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_numeric() {
        assert_eq!(parse_id("id", "42").unwrap(), 42);
        let err = parse_id("schoolInSchoolYearId", "abc").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ParameterInvalid);
        assert!(err.details().contains("schoolInSchoolYearId"));
    }
}
