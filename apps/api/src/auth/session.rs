use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use herbarium_core::AppError;
use tower_sessions::Session;
use tracing::info;

use crate::dto::{SessionResponse, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::session_helpers::session_identity;

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    let subject = session_identity(&session)
        .await?
        .map(|identity| identity.subject().to_owned());

    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    if let Some(subject) = subject {
        info!(%subject, "user signed out");
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<SessionResponse>> {
    let identity = session_identity(&session)
        .await?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    Ok(Json(SessionResponse {
        user: UserIdentityResponse::from(identity),
        session_timeout_minutes: state.user_service.policy().session_timeout_minutes,
    }))
}
