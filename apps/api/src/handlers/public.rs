use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use herbarium_application::{PublicFilterSelection, PublicSearchQuery};
use herbarium_domain::SpecimenId;
use tower_sessions::Session;

use crate::auth::{request_metadata, session_identity};
use crate::dto::{
    CatalogStatisticsResponse, CatalogSummaryResponse, FilterOptionsResponse,
    FilterSelectionParams, GalleryItemResponse, GalleryParams, PublicSearchParams,
    PublicSearchResponse, PublicSpecimenDetailParams, PublicSpecimenDetailResponse,
    SuggestionParams, SuggestionResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_GALLERY_PAGE: usize = 24;

pub async fn catalog_summary_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<CatalogSummaryResponse>> {
    let summary = state.public_catalog_service.summary().await?;

    Ok(Json(CatalogSummaryResponse::from(summary)))
}

pub async fn catalog_statistics_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<CatalogStatisticsResponse>> {
    let statistics = state.public_catalog_service.statistics().await?;

    Ok(Json(CatalogStatisticsResponse::from(statistics)))
}

pub async fn public_search_handler(
    State(state): State<AppState>,
    Query(params): Query<PublicSearchParams>,
) -> ApiResult<Json<PublicSearchResponse>> {
    let query = PublicSearchQuery::from(params);
    let (limit, offset) = (query.limit, query.offset);
    let page = state.public_catalog_service.search(query).await?;

    Ok(Json(PublicSearchResponse::from_page(page, limit, offset)))
}

pub async fn filter_options_handler(
    State(state): State<AppState>,
    Query(params): Query<FilterSelectionParams>,
) -> ApiResult<Json<FilterOptionsResponse>> {
    let options = state
        .public_catalog_service
        .filter_options(PublicFilterSelection::from(params))
        .await?;

    Ok(Json(FilterOptionsResponse::from(options)))
}

pub async fn gallery_handler(
    State(state): State<AppState>,
    Query(params): Query<GalleryParams>,
) -> ApiResult<Json<Vec<GalleryItemResponse>>> {
    let items = state
        .public_catalog_service
        .gallery(
            params.limit.unwrap_or(DEFAULT_GALLERY_PAGE),
            params.offset.unwrap_or(0),
        )
        .await?
        .into_iter()
        .map(GalleryItemResponse::from)
        .collect();

    Ok(Json(items))
}

pub async fn suggestions_handler(
    State(state): State<AppState>,
    Query(params): Query<SuggestionParams>,
) -> ApiResult<Json<Vec<SuggestionResponse>>> {
    let suggestions = state
        .public_catalog_service
        .suggestions(&params.q)
        .await?
        .into_iter()
        .map(SuggestionResponse::from)
        .collect();

    Ok(Json(suggestions))
}

/// Public specimen page. Label scans arrive with `from_qr` set.
pub async fn public_specimen_handler(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(specimen_id): Path<SpecimenId>,
    Query(params): Query<PublicSpecimenDetailParams>,
) -> ApiResult<Json<PublicSpecimenDetailResponse>> {
    let viewer = session_identity(&session).await?;
    let detail = state
        .public_catalog_service
        .specimen_detail(
            specimen_id,
            params.from_qr,
            &request_metadata(&headers),
            viewer.as_ref(),
        )
        .await?;

    Ok(Json(PublicSpecimenDetailResponse::from(detail)))
}
