use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use herbarium_application::NewUserInput;
use herbarium_core::{AppError, UserRole};
use tower_sessions::Session;
use tracing::info;

use crate::dto::{BootstrapRequest, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::session_helpers::{establish_session, request_metadata};

/// POST /auth/bootstrap - Create the first curator of an empty registry.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    if payload.token != state.bootstrap_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let identity = state
        .user_service
        .bootstrap(
            &request_metadata(&headers),
            NewUserInput {
                email: payload.email,
                display_name: payload.display_name,
                password: payload.password,
                role: UserRole::Curator,
            },
        )
        .await?;

    establish_session(&session, &identity).await?;
    info!(subject = %identity.subject(), "initial curator bootstrapped");

    Ok(Json(UserIdentityResponse::from(identity)))
}
