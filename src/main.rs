use std::env;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rooster_api::config::{AuthScheme, Config};
use rooster_api::error::AppResult;
use rooster_api::services::{auth::device_token, ConfigCheck};
use rooster_api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let check = ConfigCheck::from_env();
    // Early load so LOG_FORMAT and RUST_LOG from the file apply to logging.
    dotenvy::from_path(check.live_path()).ok();

    init_tracing();

    if env::args().nth(1).as_deref() == Some("device-token") {
        return print_device_token(&check);
    }

    tracing::info!("Starting rooster-api {}", env!("CARGO_PKG_VERSION"));

    let (app, addr) = match boot(&check) {
        Ok(state) => {
            let addr = state.config.bind_address();
            tracing::info!(
                "Serving tenant {:?} (debug mode: {})",
                state.config.tenant_name,
                state.config.debug_mode
            );
            (rooster_api::app(Arc::new(state)), addr)
        }
        Err(e) => {
            tracing::error!("Configuration error, serving degraded API: {}", e);
            (rooster_api::degraded_app(e), fallback_bind_address())
        }
    };

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rooster_api=debug,tower_http=debug".into());

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Self-heal the config file, then load the typed config.
fn boot(check: &ConfigCheck) -> AppResult<AppState> {
    let report = check.run()?;
    if !report.migrated.is_empty() {
        tracing::info!("Migrated config keys: {}", report.migrated.join(", "));
    }

    let config = Config::from_env()?;
    AppState::new(config)
}

fn print_device_token(check: &ConfigCheck) -> anyhow::Result<()> {
    check.run()?;
    let config = Config::from_env()?;

    match &config.auth {
        AuthScheme::ConnectCode { code, secret } => {
            println!("{}", device_token(code, secret)?);
        }
        AuthScheme::StaticToken(_) => {
            println!("API_TOKEN is configured; kiosks use that value as their token");
        }
    }
    Ok(())
}

/// Bind address when the config could not be loaded.
fn fallback_bind_address() -> String {
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);
    format!("{}:{}", host, port)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to bind SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
