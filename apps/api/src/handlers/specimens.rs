use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use herbarium_application::{CollectionSiteInput, SpecimenInput, SpecimenListQuery};
use herbarium_core::UserIdentity;
use herbarium_domain::{SiteId, SpecimenId};
use tracing::info;

use crate::auth::request_metadata;
use crate::dto::{
    AuditEntryResponse, CollectionSiteRequest, NextCodeResponse, SiteResponse,
    SpecimenDetailResponse, SpecimenListParams, SpecimenRequest, SpecimenResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_specimens_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<SpecimenListParams>,
) -> ApiResult<Json<Vec<SpecimenResponse>>> {
    let defaults = SpecimenListQuery::default();
    let specimens = state
        .specimen_service
        .list_specimens(
            &user,
            SpecimenListQuery {
                search: params.search,
                status: params.status,
                taxon_id: params.taxon_id,
                limit: params.limit.unwrap_or(defaults.limit),
                offset: params.offset.unwrap_or(defaults.offset),
            },
        )
        .await?
        .into_iter()
        .map(SpecimenResponse::from)
        .collect();

    Ok(Json(specimens))
}

/// Code the next created specimen will probably receive.
pub async fn next_code_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<NextCodeResponse>> {
    let code = state.specimen_service.next_code_preview(&user).await?;

    Ok(Json(NextCodeResponse { code }))
}

pub async fn create_specimen_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Json(payload): Json<SpecimenRequest>,
) -> ApiResult<(StatusCode, Json<SpecimenResponse>)> {
    let specimen = state
        .specimen_service
        .create_specimen(
            &user,
            &request_metadata(&headers),
            SpecimenInput::from(payload),
        )
        .await?;

    info!(
        specimen_id = %specimen.specimen_id,
        code = specimen.code.as_str(),
        "specimen created"
    );
    Ok((StatusCode::CREATED, Json(SpecimenResponse::from(specimen))))
}

pub async fn get_specimen_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(specimen_id): Path<SpecimenId>,
) -> ApiResult<Json<SpecimenDetailResponse>> {
    let detail = state
        .specimen_service
        .get_specimen(&user, specimen_id)
        .await?;

    Ok(Json(SpecimenDetailResponse::from(detail)))
}

pub async fn update_specimen_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(specimen_id): Path<SpecimenId>,
    Json(payload): Json<SpecimenRequest>,
) -> ApiResult<Json<SpecimenResponse>> {
    let specimen = state
        .specimen_service
        .update_specimen(
            &user,
            &request_metadata(&headers),
            specimen_id,
            SpecimenInput::from(payload),
        )
        .await?;

    Ok(Json(SpecimenResponse::from(specimen)))
}

pub async fn delete_specimen_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(specimen_id): Path<SpecimenId>,
) -> ApiResult<StatusCode> {
    state
        .specimen_service
        .delete_specimen(&user, &request_metadata(&headers), specimen_id)
        .await?;

    info!(%specimen_id, "specimen deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn specimen_history_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(specimen_id): Path<SpecimenId>,
) -> ApiResult<Json<Vec<AuditEntryResponse>>> {
    let entries = state
        .specimen_service
        .history(&user, specimen_id)
        .await?
        .into_iter()
        .map(AuditEntryResponse::from)
        .collect();

    Ok(Json(entries))
}

pub async fn list_sites_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(specimen_id): Path<SpecimenId>,
) -> ApiResult<Json<Vec<SiteResponse>>> {
    let sites = state
        .specimen_service
        .list_sites(&user, specimen_id)
        .await?
        .into_iter()
        .map(SiteResponse::from)
        .collect();

    Ok(Json(sites))
}

pub async fn add_site_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(specimen_id): Path<SpecimenId>,
    Json(payload): Json<CollectionSiteRequest>,
) -> ApiResult<(StatusCode, Json<SiteResponse>)> {
    let site = state
        .specimen_service
        .add_site(
            &user,
            &request_metadata(&headers),
            specimen_id,
            CollectionSiteInput::from(payload),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(SiteResponse::from(site))))
}

pub async fn update_site_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(site_id): Path<SiteId>,
    Json(payload): Json<CollectionSiteRequest>,
) -> ApiResult<Json<SiteResponse>> {
    let site = state
        .specimen_service
        .update_site(
            &user,
            &request_metadata(&headers),
            site_id,
            CollectionSiteInput::from(payload),
        )
        .await?;

    Ok(Json(SiteResponse::from(site)))
}

pub async fn remove_site_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(site_id): Path<SiteId>,
) -> ApiResult<StatusCode> {
    state
        .specimen_service
        .remove_site(&user, &request_metadata(&headers), site_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_primary_site_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(site_id): Path<SiteId>,
) -> ApiResult<Json<SiteResponse>> {
    let site = state
        .specimen_service
        .set_primary_site(&user, &request_metadata(&headers), site_id)
        .await?;

    Ok(Json(SiteResponse::from(site)))
}

/// Fills the site coordinate from its vicinity's first reference point.
pub async fn copy_vicinity_coordinates_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(site_id): Path<SiteId>,
) -> ApiResult<Json<SiteResponse>> {
    let site = state
        .specimen_service
        .copy_coordinates_from_vicinity(&user, &request_metadata(&headers), site_id)
        .await?;

    Ok(Json(SiteResponse::from(site)))
}
