use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use serde::Serialize;

use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::routes::{auth::DeviceAuth, not_found};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/v1/check", get(check).fallback(not_found))
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub tenant: String,
    pub version: String,
}

/// Lets a kiosk confirm its token and see which school it is attached to.
async fn check(_auth: DeviceAuth, State(state): State<Arc<AppState>>) -> AppResult<ApiResponse> {
    let body = CheckResponse {
        tenant: state.config.tenant_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Ok(ApiResponse::ok(&body)?.with_message("Device is connected to the API"))
}
