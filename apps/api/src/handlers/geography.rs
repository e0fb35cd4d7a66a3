use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use herbarium_application::{CreateGeoNodeInput, CreateReferencePointInput};
use herbarium_core::UserIdentity;
use herbarium_domain::GeoNodeId;

use crate::auth::request_metadata;
use crate::dto::{
    CoordinatePreviewRequest, CoordinatePreviewResponse, CoordinateResponse,
    CreateGeoNodeRequest, CreateReferencePointRequest, GeoNodeResponse, GeoNodesQuery,
    LocationPreviewRequest, LocationPreviewResponse, ReferencePointResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_geo_nodes_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<GeoNodesQuery>,
) -> ApiResult<Json<Vec<GeoNodeResponse>>> {
    let nodes = state
        .geography_service
        .list_nodes(&user, query.level, query.parent_id)
        .await?
        .into_iter()
        .map(GeoNodeResponse::from)
        .collect();

    Ok(Json(nodes))
}

pub async fn create_geo_node_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Json(payload): Json<CreateGeoNodeRequest>,
) -> ApiResult<(StatusCode, Json<GeoNodeResponse>)> {
    let node = state
        .geography_service
        .create_node(
            &user,
            &request_metadata(&headers),
            CreateGeoNodeInput {
                level: payload.level,
                name: payload.name,
                code: payload.code,
                parent_id: payload.parent_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(GeoNodeResponse::from(node))))
}

pub async fn list_reference_points_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(vicinity_id): Path<GeoNodeId>,
) -> ApiResult<Json<Vec<ReferencePointResponse>>> {
    let points = state
        .geography_service
        .list_reference_points(&user, vicinity_id)
        .await?
        .into_iter()
        .map(ReferencePointResponse::from)
        .collect();

    Ok(Json(points))
}

pub async fn create_reference_point_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(vicinity_id): Path<GeoNodeId>,
    Json(payload): Json<CreateReferencePointRequest>,
) -> ApiResult<(StatusCode, Json<ReferencePointResponse>)> {
    let point = state
        .geography_service
        .create_reference_point(
            &user,
            &request_metadata(&headers),
            vicinity_id,
            CreateReferencePointInput {
                name: payload.name,
                kind: payload.kind,
                coordinate: payload.coordinate,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ReferencePointResponse::from(point))))
}

/// Normalizes an edited location selection without saving it.
pub async fn preview_location_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<LocationPreviewRequest>,
) -> ApiResult<Json<LocationPreviewResponse>> {
    let preview = state
        .geography_service
        .preview_location(&user, &payload.previous, &payload.submitted)
        .await?;

    Ok(Json(LocationPreviewResponse::from(preview)))
}

/// Interprets coordinate input the way a save would.
pub async fn preview_coordinate_handler(
    Json(payload): Json<CoordinatePreviewRequest>,
) -> ApiResult<Json<CoordinatePreviewResponse>> {
    let coordinate = payload.coordinate.resolve()?;

    Ok(Json(CoordinatePreviewResponse {
        coordinate: coordinate.as_ref().map(CoordinateResponse::from),
    }))
}
