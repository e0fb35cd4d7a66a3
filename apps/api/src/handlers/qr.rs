use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use herbarium_application::QrOptions;
use herbarium_core::UserIdentity;
use herbarium_domain::{QrCodeId, SpecimenId};
use tracing::info;

use crate::auth::request_metadata;
use crate::dto::{QrCodeResponse, QrOptionsRequest, QrScanResponse, QrScansParams};
use crate::error::ApiResult;
use crate::handlers::images::sanitize_filename;
use crate::state::AppState;

const DEFAULT_SCAN_PAGE: usize = 50;

pub async fn list_specimen_qr_codes_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(specimen_id): Path<SpecimenId>,
) -> ApiResult<Json<Vec<QrCodeResponse>>> {
    let codes = state
        .qr_service
        .list_for_specimen(&user, specimen_id)
        .await?
        .into_iter()
        .map(QrCodeResponse::from)
        .collect();

    Ok(Json(codes))
}

pub async fn generate_qr_code_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(specimen_id): Path<SpecimenId>,
    Json(payload): Json<QrOptionsRequest>,
) -> ApiResult<(StatusCode, Json<QrCodeResponse>)> {
    let options = QrOptions::try_from(payload)?;
    let qr = state
        .qr_service
        .generate_for_specimen(&user, &request_metadata(&headers), specimen_id, options)
        .await?;

    info!(qr_id = %qr.qr_id, %specimen_id, version = qr.version, "qr code generated");
    Ok((StatusCode::CREATED, Json(QrCodeResponse::from(qr))))
}

/// Retires a label and issues its next version as a draft.
pub async fn regenerate_qr_code_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(qr_id): Path<QrCodeId>,
    Json(payload): Json<QrOptionsRequest>,
) -> ApiResult<(StatusCode, Json<QrCodeResponse>)> {
    let options = QrOptions::try_from(payload)?;
    let qr = state
        .qr_service
        .regenerate(&user, &request_metadata(&headers), qr_id, options)
        .await?;

    info!(previous_qr_id = %qr_id, qr_id = %qr.qr_id, version = qr.version, "qr code regenerated");
    Ok((StatusCode::CREATED, Json(QrCodeResponse::from(qr))))
}

pub async fn activate_qr_code_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(qr_id): Path<QrCodeId>,
) -> ApiResult<Json<QrCodeResponse>> {
    let qr = state
        .qr_service
        .activate(&user, &request_metadata(&headers), qr_id)
        .await?;

    Ok(Json(QrCodeResponse::from(qr)))
}

pub async fn deactivate_qr_code_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(qr_id): Path<QrCodeId>,
) -> ApiResult<Json<QrCodeResponse>> {
    let qr = state
        .qr_service
        .deactivate(&user, &request_metadata(&headers), qr_id)
        .await?;

    Ok(Json(QrCodeResponse::from(qr)))
}

pub async fn deprecate_qr_code_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(qr_id): Path<QrCodeId>,
) -> ApiResult<Json<QrCodeResponse>> {
    let qr = state
        .qr_service
        .deprecate(&user, &request_metadata(&headers), qr_id)
        .await?;

    Ok(Json(QrCodeResponse::from(qr)))
}

/// Returns the label PNG as an attachment and counts the download.
pub async fn download_qr_code_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(qr_id): Path<QrCodeId>,
) -> ApiResult<impl IntoResponse> {
    let download = state.qr_service.download(&user, qr_id).await?;

    Ok((
        [
            (CONTENT_TYPE, "image/png".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"{}\"",
                    sanitize_filename(&download.filename)
                ),
            ),
        ],
        download.png,
    ))
}

pub async fn list_qr_scans_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(qr_id): Path<QrCodeId>,
    Query(params): Query<QrScansParams>,
) -> ApiResult<Json<Vec<QrScanResponse>>> {
    let scans = state
        .qr_service
        .list_scans(&user, qr_id, params.limit.unwrap_or(DEFAULT_SCAN_PAGE))
        .await?
        .into_iter()
        .map(QrScanResponse::from)
        .collect();

    Ok(Json(scans))
}
