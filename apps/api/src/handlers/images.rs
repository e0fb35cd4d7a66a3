use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Extension, Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use herbarium_application::{UpdateImageInput, UploadImageInput};
use herbarium_core::{AppError, UserIdentity};
use herbarium_domain::{ImageId, ImageVariant, TaxonId};
use tracing::info;

use crate::auth::request_metadata;
use crate::dto::{ImageResponse, ImageVariantParams, UpdateImageRequest, UploadImageParams};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_images_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(taxon_id): Path<TaxonId>,
) -> ApiResult<Json<Vec<ImageResponse>>> {
    let images = state
        .image_service
        .list_images(&user, taxon_id)
        .await?
        .into_iter()
        .map(ImageResponse::from)
        .collect();

    Ok(Json(images))
}

/// Stores the request body as a new image of the taxon.
pub async fn upload_image_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(taxon_id): Path<TaxonId>,
    Query(params): Query<UploadImageParams>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<(StatusCode, Json<ImageResponse>)> {
    let bytes = upload_bytes(body)?;
    let image = state
        .image_service
        .upload_image(
            &user,
            &request_metadata(&headers),
            taxon_id,
            UploadImageInput {
                filename: params.filename,
                bytes,
                description: params.description,
                is_primary: params.is_primary,
                display_order: params.display_order,
            },
        )
        .await?;

    info!(
        image_id = %image.image_id,
        %taxon_id,
        file_size = image.file_size,
        "taxon image uploaded"
    );
    Ok((StatusCode::CREATED, Json(ImageResponse::from(image))))
}

pub async fn update_image_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(image_id): Path<ImageId>,
    Json(payload): Json<UpdateImageRequest>,
) -> ApiResult<Json<ImageResponse>> {
    let image = state
        .image_service
        .update_image(
            &user,
            &request_metadata(&headers),
            image_id,
            UpdateImageInput {
                description: payload.description,
                is_primary: payload.is_primary,
                display_order: payload.display_order,
            },
        )
        .await?;

    Ok(Json(ImageResponse::from(image)))
}

pub async fn set_primary_image_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(image_id): Path<ImageId>,
) -> ApiResult<Json<ImageResponse>> {
    let image = state
        .image_service
        .set_primary_image(&user, &request_metadata(&headers), image_id)
        .await?;

    Ok(Json(ImageResponse::from(image)))
}

pub async fn remove_image_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(image_id): Path<ImageId>,
) -> ApiResult<StatusCode> {
    state
        .image_service
        .remove_image(&user, &request_metadata(&headers), image_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Serves one rendition of an image inline.
pub async fn image_content_handler(
    State(state): State<AppState>,
    Path(image_id): Path<ImageId>,
    Query(params): Query<ImageVariantParams>,
) -> ApiResult<impl IntoResponse> {
    let content = state
        .image_service
        .image_content(image_id, params.variant.unwrap_or(ImageVariant::Original))
        .await?;

    Ok((
        [
            (CONTENT_TYPE, content.mime_type),
            (
                CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", sanitize_filename(&content.filename)),
            ),
            (CACHE_CONTROL, "public, max-age=3600".to_owned()),
        ],
        content.bytes,
    ))
}

/// Reads an upload body, reporting an oversized file as a validation error.
pub(crate) fn upload_bytes(body: Result<Bytes, BytesRejection>) -> Result<Vec<u8>, AppError> {
    match body {
        Ok(bytes) => Ok(bytes.to_vec()),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => Err(
            AppError::Validation("image file exceeds the upload size limit".to_owned()),
        ),
        Err(rejection) => Err(AppError::Validation(format!(
            "unreadable image upload: {}",
            rejection.body_text()
        ))),
    }
}

/// Keeps a filename safe to quote inside a header value.
pub(crate) fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|character| match character {
            '"' | '\\' | '/' => '_',
            character if character.is_ascii_graphic() || character == ' ' => character,
            _ => '_',
        })
        .collect()
}
