//! Kiosk timetable proxy in front of the Zermelo school API.

use std::sync::Arc;

use axum::{middleware::from_fn, middleware::from_fn_with_state, Router};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;

use config::Config;
use error::{AppError, AppResult};
use services::{DeviceAuthenticator, Transport, ZermeloClient};

pub struct AppState {
    pub config: Config,
    pub auth: DeviceAuthenticator,
    pub zermelo: ZermeloClient,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let zermelo = ZermeloClient::from_config(&config.zermelo, config.debug_mode)?;
        let auth = DeviceAuthenticator::new(&config.auth)?;
        Ok(Self {
            config,
            auth,
            zermelo,
        })
    }

    /// Same as [`AppState::new`] with a caller supplied upstream transport.
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> AppResult<Self> {
        let zermelo = ZermeloClient::new(transport, config.debug_mode);
        let auth = DeviceAuthenticator::new(&config.auth)?;
        Ok(Self {
            config,
            auth,
            zermelo,
        })
    }
}

/// The full kiosk API.
pub fn app(state: Arc<AppState>) -> Router {
    routes::router()
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_log::request_log_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(middleware::cors::cors_middleware))
}

/// Served when configuration could not be loaded: every request gets the
/// configuration error instead of a refused connection.
pub fn degraded_app(error: AppError) -> Router {
    Router::new()
        .fallback(move || {
            let error = error.clone();
            async move { error }
        })
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(middleware::cors::cors_middleware))
}
