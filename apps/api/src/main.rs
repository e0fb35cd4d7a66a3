//! Herbarium registry API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use herbarium_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_router::build_router;
use crate::api_services::{build_app_state, build_postgres_session_layer, connect_and_migrate};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = connect_and_migrate(&config.database_url, config.database_max_connections).await?;
    if config.migrate_only {
        return Ok(());
    }

    let session_layer = build_postgres_session_layer(
        pool.clone(),
        config.cookie_secure,
        config.user_policy.session_timeout_minutes,
    )
    .await?;

    let app_state = build_app_state(pool, &config);
    let app = build_router(
        app_state,
        &config.frontend_url,
        config.max_upload_bytes,
        session_layer,
    )?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, code_prefix = config.code_prefix.as_str(), "herbarium-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
