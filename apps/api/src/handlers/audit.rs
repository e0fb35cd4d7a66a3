use axum::Json;
use axum::extract::{Extension, Query, State};
use herbarium_application::AuditLogQuery;
use herbarium_core::UserIdentity;

use crate::dto::{AuditEntryResponse, AuditLogQueryParams};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<AuditLogQueryParams>,
) -> ApiResult<Json<Vec<AuditEntryResponse>>> {
    let defaults = AuditLogQuery::default();
    let entries = state
        .audit_logger
        .list_entries(
            &user,
            AuditLogQuery {
                target_type: query.target_type,
                target_id: query.target_id,
                action: query.action,
                actor_subject: query.actor,
                limit: query.limit.unwrap_or(defaults.limit),
                offset: query.offset.unwrap_or(defaults.offset),
            },
        )
        .await?
        .into_iter()
        .map(AuditEntryResponse::from)
        .collect();

    Ok(Json(entries))
}
