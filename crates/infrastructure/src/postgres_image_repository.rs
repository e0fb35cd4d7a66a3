//! PostgreSQL-backed taxon image repository. Image bytes and thumbnails are
//! stored alongside the metadata.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use herbarium_application::{ImageBinaries, ImageRepository};
use herbarium_core::{AppError, AppResult};
use herbarium_domain::{AuditEntry, ImageId, ImageVariant, TaxonId, TaxonImage};

use crate::audit_rows::{begin, commit, conflict_or_internal, insert_audit_entries};

/// PostgreSQL implementation of the image repository port.
#[derive(Clone)]
pub struct PostgresImageRepository {
    pool: PgPool,
}

impl PostgresImageRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ImageRow {
    id: uuid::Uuid,
    taxon_id: uuid::Uuid,
    original_filename: String,
    stored_filename: String,
    file_size: i64,
    width: i32,
    height: i32,
    mime_type: String,
    file_hash: String,
    camera: Option<String>,
    captured_at: Option<NaiveDateTime>,
    description: Option<String>,
    is_primary: bool,
    display_order: i32,
    uploaded_by: Option<String>,
    uploaded_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ImageRow> for TaxonImage {
    fn from(row: ImageRow) -> Self {
        Self {
            image_id: ImageId::from_uuid(row.id),
            taxon_id: TaxonId::from_uuid(row.taxon_id),
            original_filename: row.original_filename,
            stored_filename: row.stored_filename,
            file_size: row.file_size,
            width: row.width,
            height: row.height,
            mime_type: row.mime_type,
            file_hash: row.file_hash,
            camera: row.camera,
            captured_at: row.captured_at,
            description: row.description,
            is_primary: row.is_primary,
            display_order: row.display_order,
            uploaded_by: row.uploaded_by,
            uploaded_at: row.uploaded_at,
            deleted_at: row.deleted_at,
        }
    }
}

const IMAGE_COLUMNS: &str = r#"
    id,
    taxon_id,
    original_filename,
    stored_filename,
    file_size,
    width,
    height,
    mime_type,
    file_hash,
    camera,
    captured_at,
    description,
    is_primary,
    display_order,
    uploaded_by,
    uploaded_at,
    deleted_at
"#;

async fn demote_other_primaries(
    transaction: &mut Transaction<'_, Postgres>,
    image: &TaxonImage,
) -> AppResult<()> {
    if !image.is_primary || image.deleted_at.is_some() {
        return Ok(());
    }

    sqlx::query(
        r#"
        UPDATE taxon_images
        SET is_primary = FALSE
        WHERE taxon_id = $1 AND id <> $2 AND is_primary
        "#,
    )
    .bind(image.taxon_id.as_uuid())
    .bind(image.image_id.as_uuid())
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to demote cover image: {error}")))?;

    Ok(())
}

#[async_trait]
impl ImageRepository for PostgresImageRepository {
    async fn insert_image(
        &self,
        image: &TaxonImage,
        binaries: &ImageBinaries,
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;
        demote_other_primaries(&mut transaction, image).await?;

        sqlx::query(
            r#"
            INSERT INTO taxon_images (
                id,
                taxon_id,
                original_filename,
                stored_filename,
                file_size,
                width,
                height,
                mime_type,
                file_hash,
                camera,
                captured_at,
                description,
                is_primary,
                display_order,
                uploaded_by,
                uploaded_at,
                deleted_at,
                content,
                thumbnail_small,
                thumbnail_medium
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            "#,
        )
        .bind(image.image_id.as_uuid())
        .bind(image.taxon_id.as_uuid())
        .bind(image.original_filename.as_str())
        .bind(image.stored_filename.as_str())
        .bind(image.file_size)
        .bind(image.width)
        .bind(image.height)
        .bind(image.mime_type.as_str())
        .bind(image.file_hash.as_str())
        .bind(image.camera.as_deref())
        .bind(image.captured_at)
        .bind(image.description.as_deref())
        .bind(image.is_primary)
        .bind(image.display_order)
        .bind(image.uploaded_by.as_deref())
        .bind(image.uploaded_at)
        .bind(image.deleted_at)
        .bind(binaries.original.as_slice())
        .bind(binaries.small.as_slice())
        .bind(binaries.medium.as_slice())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            conflict_or_internal(error, "insert taxon image", || {
                "this image is already attached to the taxon".to_owned()
            })
        })?;

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    async fn update_image(&self, image: &TaxonImage, audit: &[AuditEntry]) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;
        demote_other_primaries(&mut transaction, image).await?;

        let result = sqlx::query(
            r#"
            UPDATE taxon_images
            SET description = $2,
                is_primary = $3,
                display_order = $4,
                deleted_at = $5
            WHERE id = $1
            "#,
        )
        .bind(image.image_id.as_uuid())
        .bind(image.description.as_deref())
        .bind(image.is_primary)
        .bind(image.display_order)
        .bind(image.deleted_at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            conflict_or_internal(error, "update taxon image", || {
                "another image of this taxon is already the cover".to_owned()
            })
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "image '{}' does not exist",
                image.image_id
            )));
        }

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    async fn find_image(&self, image_id: ImageId) -> AppResult<Option<TaxonImage>> {
        let sql = format!("SELECT {IMAGE_COLUMNS} FROM taxon_images WHERE id = $1");

        let row = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(image_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to find image: {error}")))?;

        Ok(row.map(TaxonImage::from))
    }

    async fn list_images(&self, taxon_id: TaxonId) -> AppResult<Vec<TaxonImage>> {
        let sql = format!(
            r#"
            SELECT {IMAGE_COLUMNS}
            FROM taxon_images
            WHERE taxon_id = $1 AND deleted_at IS NULL
            ORDER BY is_primary DESC, display_order, uploaded_at
            "#
        );

        let rows = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(taxon_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list images: {error}")))?;

        Ok(rows.into_iter().map(TaxonImage::from).collect())
    }

    async fn find_by_hash(
        &self,
        taxon_id: TaxonId,
        file_hash: &str,
    ) -> AppResult<Option<TaxonImage>> {
        let sql = format!(
            r#"
            SELECT {IMAGE_COLUMNS}
            FROM taxon_images
            WHERE taxon_id = $1 AND file_hash = $2 AND deleted_at IS NULL
            "#
        );

        let row = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(taxon_id.as_uuid())
            .bind(file_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to find image by hash: {error}"))
            })?;

        Ok(row.map(TaxonImage::from))
    }

    async fn load_content(
        &self,
        image_id: ImageId,
        variant: ImageVariant,
    ) -> AppResult<Option<Vec<u8>>> {
        let column = match variant {
            ImageVariant::Original => "content",
            ImageVariant::Small => "thumbnail_small",
            ImageVariant::Medium => "thumbnail_medium",
        };
        let sql = format!(
            "SELECT {column} FROM taxon_images WHERE id = $1 AND deleted_at IS NULL"
        );

        sqlx::query_scalar::<_, Vec<u8>>(&sql)
            .bind(image_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to load image content: {error}")))
    }

    async fn count_uploaded_by(&self, subject: &str) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM taxon_images WHERE uploaded_by = $1")
            .bind(subject)
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to count uploads: {error}")))
    }
}
