use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Router,
};

use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{current_school_year, RawSchool, School};
use crate::response::ApiResponse;
use crate::routes::{auth::DeviceAuth, extract::ApiPath, not_found, parse_id};
use crate::services::UpstreamResponse;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/schools", get(list_schools).fallback(not_found))
        .route(
            "/v1/schools/:school_in_school_year_id",
            get(get_school).fallback(not_found),
        )
}

/// Schools the configured Zermelo token has access to this school year.
async fn list_schools(
    _auth: DeviceAuth,
    State(state): State<Arc<AppState>>,
) -> AppResult<ApiResponse> {
    let reply = state
        .zermelo
        .get_schools_assigned_to_token(current_school_year())
        .await?;

    ApiResponse::ok(&schools_from(reply, state.zermelo.debug())?)
}

async fn get_school(
    _auth: DeviceAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<ApiResponse> {
    let id = parse_id("schoolInSchoolYearId", &id)?;

    let reply = state
        .zermelo
        .get_school_in_school_year(id, current_school_year())
        .await?;

    ApiResponse::ok(&schools_from(reply, state.zermelo.debug())?)
}

/// A 404 upstream and an empty list both mean the school is unknown.
fn schools_from(reply: UpstreamResponse<RawSchool>, debug: bool) -> AppResult<Vec<School>> {
    if reply.status == 404 {
        return Err(AppError::new(ErrorCode::SchoolNotFound));
    }
    if !reply.is_success() {
        return Err(AppError::from_zermelo(&reply, debug));
    }
    if reply.data.is_empty() {
        return Err(AppError::new(ErrorCode::SchoolNotFound));
    }

    Ok(reply.data.into_iter().map(School::from).collect())
}
