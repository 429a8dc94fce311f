use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, Response},
    middleware::Next,
};

use crate::AppState;

/// In debug mode, log every incoming request with its headers.
pub async fn request_log_middleware(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response<Body> {
    if state.config.debug_mode {
        tracing::debug!(
            method = %req.method(),
            uri = %req.uri(),
            headers = ?redacted_headers(req.headers()),
            "Incoming request"
        );
    }

    next.run(req).await
}

/// Header pairs with the `Authorization` value masked.
pub fn redacted_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if name == header::AUTHORIZATION {
                "[redacted]".to_string()
            } else {
                value.to_str().unwrap_or("[binary]").to_string()
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}
