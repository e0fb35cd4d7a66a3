use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use herbarium_application::AuthOutcome;
use herbarium_core::AppError;
use tower_sessions::Session;

use crate::dto::{AuthLoginRequest, AuthLoginResponse, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::session_helpers::{establish_session, request_metadata};

/// POST /auth/login - Authenticate with email+password.
pub async fn login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    session: Session,
    Json(payload): Json<AuthLoginRequest>,
) -> ApiResult<Json<AuthLoginResponse>> {
    let request = request_metadata(&headers);

    let outcome = state
        .user_service
        .login(&payload.email, &payload.password, &request)
        .await?;

    match outcome {
        AuthOutcome::Authenticated(identity) => {
            establish_session(&session, &identity).await?;

            Ok(Json(AuthLoginResponse {
                status: "authenticated".to_owned(),
                user: UserIdentityResponse::from(identity),
            }))
        }
        AuthOutcome::Locked => Err(AppError::Forbidden(
            "account locked after too many failed sign-in attempts".to_owned(),
        )
        .into()),
        // Same message for unknown, wrong password and inactive accounts.
        AuthOutcome::Failed => {
            Err(AppError::Unauthorized("invalid email or password".to_owned()).into())
        }
    }
}
