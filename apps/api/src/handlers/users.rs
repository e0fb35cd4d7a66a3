use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode};
use herbarium_application::NewUserInput;
use herbarium_core::UserIdentity;
use herbarium_domain::UserId;
use tracing::info;

use crate::auth::request_metadata;
use crate::dto::{
    AccountPolicyResponse, CreateUserRequest, UpdateUserActiveRequest, UpdateUserRoleRequest,
    UserActivityResponse, UserResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let max_login_attempts = state.user_service.policy().max_login_attempts;
    let users = state
        .user_service
        .list_users(&user)
        .await?
        .into_iter()
        .map(|record| UserResponse::from_record(record, max_login_attempts))
        .collect();

    Ok(Json(users))
}

pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let record = state
        .user_service
        .create_user(
            &user,
            &request_metadata(&headers),
            NewUserInput {
                email: payload.email,
                display_name: payload.display_name,
                password: payload.password,
                role: payload.role,
            },
        )
        .await?;

    info!(user_id = %record.user_id, role = record.role.as_str(), "user created");
    let max_login_attempts = state.user_service.policy().max_login_attempts;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse::from_record(record, max_login_attempts)),
    ))
}

pub async fn update_user_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
    Json(payload): Json<UpdateUserRoleRequest>,
) -> ApiResult<Json<UserResponse>> {
    let record = state
        .user_service
        .change_role(&user, &request_metadata(&headers), user_id, payload.role)
        .await?;

    let max_login_attempts = state.user_service.policy().max_login_attempts;
    Ok(Json(UserResponse::from_record(record, max_login_attempts)))
}

pub async fn update_user_active_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
    Json(payload): Json<UpdateUserActiveRequest>,
) -> ApiResult<Json<UserResponse>> {
    let record = state
        .user_service
        .set_user_active(&user, &request_metadata(&headers), user_id, payload.is_active)
        .await?;

    let max_login_attempts = state.user_service.policy().max_login_attempts;
    Ok(Json(UserResponse::from_record(record, max_login_attempts)))
}

pub async fn unlock_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
) -> ApiResult<StatusCode> {
    state
        .user_service
        .unlock_user(&user, &request_metadata(&headers), user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn user_activity_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<UserActivityResponse>> {
    let activity = state.user_service.user_activity(&user, user_id).await?;

    Ok(Json(UserActivityResponse::from(activity)))
}

pub async fn account_policy_handler(
    State(state): State<AppState>,
) -> Json<AccountPolicyResponse> {
    Json(AccountPolicyResponse::from(state.user_service.policy()))
}
