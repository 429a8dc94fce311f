use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::AppState;

/// Extractor that admits only provisioned kiosk devices.
pub struct DeviceAuth;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for DeviceAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state.auth.authenticate(&parts.headers)?;
        Ok(DeviceAuth)
    }
}
