use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use herbarium_core::UserIdentity;
use herbarium_domain::TaxonId;

use crate::auth::request_metadata;
use crate::dto::{
    ContributorQuery, ContributorResponse, CreateContributorRequest, CreateFamilyRequest,
    CreateHerbariumRequest, CreateTaxonRequest, FamilyResponse, HerbariumResponse, TaxaQuery,
    TaxonResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_families_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<FamilyResponse>>> {
    let families = state
        .taxonomy_service
        .list_families(&user)
        .await?
        .into_iter()
        .map(FamilyResponse::from)
        .collect();

    Ok(Json(families))
}

pub async fn create_family_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Json(payload): Json<CreateFamilyRequest>,
) -> ApiResult<(StatusCode, Json<FamilyResponse>)> {
    let family = state
        .taxonomy_service
        .create_family(&user, &request_metadata(&headers), &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(FamilyResponse::from(family))))
}

pub async fn list_taxa_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<TaxaQuery>,
) -> ApiResult<Json<Vec<TaxonResponse>>> {
    let taxa = state
        .taxonomy_service
        .list_taxa(&user, query.family_id)
        .await?
        .into_iter()
        .map(TaxonResponse::from)
        .collect();

    Ok(Json(taxa))
}

pub async fn create_taxon_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Json(payload): Json<CreateTaxonRequest>,
) -> ApiResult<(StatusCode, Json<TaxonResponse>)> {
    let taxon = state
        .taxonomy_service
        .create_taxon(
            &user,
            &request_metadata(&headers),
            &payload.genus,
            &payload.species,
            payload.family_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TaxonResponse::from(taxon))))
}

pub async fn get_taxon_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(taxon_id): Path<TaxonId>,
) -> ApiResult<Json<TaxonResponse>> {
    let taxon = state.taxonomy_service.get_taxon(&user, taxon_id).await?;

    Ok(Json(TaxonResponse::from(taxon)))
}

pub async fn list_contributors_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<ContributorQuery>,
) -> ApiResult<Json<Vec<ContributorResponse>>> {
    let contributors = state
        .taxonomy_service
        .list_contributors(&user, query.kind)
        .await?
        .into_iter()
        .map(ContributorResponse::from)
        .collect();

    Ok(Json(contributors))
}

pub async fn create_contributor_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Json(payload): Json<CreateContributorRequest>,
) -> ApiResult<(StatusCode, Json<ContributorResponse>)> {
    let contributor = state
        .taxonomy_service
        .create_contributor(&user, &request_metadata(&headers), payload.kind, &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(ContributorResponse::from(contributor))))
}

pub async fn list_herbaria_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<HerbariumResponse>>> {
    let herbaria = state
        .taxonomy_service
        .list_herbaria(&user)
        .await?
        .into_iter()
        .map(HerbariumResponse::from)
        .collect();

    Ok(Json(herbaria))
}

pub async fn create_herbarium_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Json(payload): Json<CreateHerbariumRequest>,
) -> ApiResult<(StatusCode, Json<HerbariumResponse>)> {
    let herbarium = state
        .taxonomy_service
        .create_herbarium(
            &user,
            &request_metadata(&headers),
            &payload.name,
            payload.acronym,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(HerbariumResponse::from(herbarium))))
}
