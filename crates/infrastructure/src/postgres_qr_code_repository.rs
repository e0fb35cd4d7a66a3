//! PostgreSQL-backed QR code repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use herbarium_application::QrCodeRepository;
use herbarium_core::{AppError, AppResult};
use herbarium_domain::{
    AuditEntry, QrCode, QrCodeId, QrResolution, QrScan, QrScanId, SpecimenId,
};

use crate::audit_rows::{begin, commit, conflict_or_internal, insert_audit_entries};

const SCAN_MAX_LIMIT: usize = 200;

/// PostgreSQL implementation of the QR code repository port.
#[derive(Clone)]
pub struct PostgresQrCodeRepository {
    pool: PgPool,
}

impl PostgresQrCodeRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct QrCodeRow {
    id: uuid::Uuid,
    specimen_id: uuid::Uuid,
    url: String,
    payload: String,
    resolution: i32,
    error_correction: String,
    box_size: i32,
    border: i32,
    checksum: String,
    version: i32,
    status: String,
    is_obsolete: bool,
    download_count: i64,
    last_downloaded_at: Option<DateTime<Utc>>,
    scan_count: i64,
    last_scanned_at: Option<DateTime<Utc>>,
    generated_by: Option<String>,
    generated_at: DateTime<Utc>,
}

impl TryFrom<QrCodeRow> for QrCode {
    type Error = AppError;

    fn try_from(row: QrCodeRow) -> AppResult<Self> {
        let pixels = u32::try_from(row.resolution).map_err(|_| {
            AppError::Internal(format!("stored QR resolution {} is negative", row.resolution))
        })?;

        Ok(Self {
            qr_id: QrCodeId::from_uuid(row.id),
            specimen_id: SpecimenId::from_uuid(row.specimen_id),
            url: row.url,
            payload: row.payload,
            resolution: QrResolution::from_pixels(pixels)?,
            error_correction: row.error_correction.parse()?,
            box_size: row.box_size,
            border: row.border,
            checksum: row.checksum,
            version: row.version,
            status: row.status.parse()?,
            is_obsolete: row.is_obsolete,
            download_count: row.download_count,
            last_downloaded_at: row.last_downloaded_at,
            scan_count: row.scan_count,
            last_scanned_at: row.last_scanned_at,
            generated_by: row.generated_by,
            generated_at: row.generated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct QrScanRow {
    id: uuid::Uuid,
    qr_id: uuid::Uuid,
    scanned_at: DateTime<Utc>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    user_subject: Option<String>,
}

impl From<QrScanRow> for QrScan {
    fn from(row: QrScanRow) -> Self {
        Self {
            scan_id: QrScanId::from_uuid(row.id),
            qr_id: QrCodeId::from_uuid(row.qr_id),
            scanned_at: row.scanned_at,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            user_subject: row.user_subject,
        }
    }
}

const QR_COLUMNS: &str = r#"
    id,
    specimen_id,
    url,
    payload,
    resolution,
    error_correction,
    box_size,
    border,
    checksum,
    version,
    status,
    is_obsolete,
    download_count,
    last_downloaded_at,
    scan_count,
    last_scanned_at,
    generated_by,
    generated_at
"#;

fn active_conflict(error: sqlx::Error, operation: &str) -> AppError {
    conflict_or_internal(error, operation, || {
        "the specimen already has an active QR code".to_owned()
    })
}

async fn insert_row(
    transaction: &mut Transaction<'_, Postgres>,
    qr: &QrCode,
    image: &[u8],
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO qr_codes (
            id,
            specimen_id,
            url,
            payload,
            resolution,
            error_correction,
            box_size,
            border,
            checksum,
            version,
            status,
            is_obsolete,
            download_count,
            last_downloaded_at,
            scan_count,
            last_scanned_at,
            generated_by,
            generated_at,
            image
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
            $11, $12, $13, $14, $15, $16, $17, $18, $19
        )
        "#,
    )
    .bind(qr.qr_id.as_uuid())
    .bind(qr.specimen_id.as_uuid())
    .bind(qr.url.as_str())
    .bind(qr.payload.as_str())
    .bind(qr.resolution.pixels() as i32)
    .bind(qr.error_correction.as_str())
    .bind(qr.box_size)
    .bind(qr.border)
    .bind(qr.checksum.as_str())
    .bind(qr.version)
    .bind(qr.status.as_str())
    .bind(qr.is_obsolete)
    .bind(qr.download_count)
    .bind(qr.last_downloaded_at)
    .bind(qr.scan_count)
    .bind(qr.last_scanned_at)
    .bind(qr.generated_by.as_deref())
    .bind(qr.generated_at)
    .bind(image)
    .execute(&mut **transaction)
    .await
    .map_err(|error| active_conflict(error, "insert QR code"))?;

    Ok(())
}

async fn update_row(transaction: &mut Transaction<'_, Postgres>, qr: &QrCode) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE qr_codes
        SET status = $2,
            is_obsolete = $3
        WHERE id = $1
        "#,
    )
    .bind(qr.qr_id.as_uuid())
    .bind(qr.status.as_str())
    .bind(qr.is_obsolete)
    .execute(&mut **transaction)
    .await
    .map_err(|error| active_conflict(error, "update QR code"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "QR code '{}' does not exist",
            qr.qr_id
        )));
    }

    Ok(())
}

#[async_trait]
impl QrCodeRepository for PostgresQrCodeRepository {
    async fn insert_qr(&self, qr: &QrCode, image: &[u8], audit: &[AuditEntry]) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;
        insert_row(&mut transaction, qr, image).await?;
        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    async fn update_qr(&self, qr: &QrCode, audit: &[AuditEntry]) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;
        update_row(&mut transaction, qr).await?;
        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    async fn replace_qr(
        &self,
        superseded: &QrCode,
        replacement: &QrCode,
        image: &[u8],
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;
        update_row(&mut transaction, superseded).await?;
        insert_row(&mut transaction, replacement, image).await?;
        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    async fn find_qr(&self, qr_id: QrCodeId) -> AppResult<Option<QrCode>> {
        let sql = format!("SELECT {QR_COLUMNS} FROM qr_codes WHERE id = $1");

        sqlx::query_as::<_, QrCodeRow>(&sql)
            .bind(qr_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to find QR code: {error}")))?
            .map(QrCode::try_from)
            .transpose()
    }

    async fn find_active_for_specimen(&self, specimen_id: SpecimenId) -> AppResult<Option<QrCode>> {
        let sql = format!(
            "SELECT {QR_COLUMNS} FROM qr_codes WHERE specimen_id = $1 AND status = 'active'"
        );

        sqlx::query_as::<_, QrCodeRow>(&sql)
            .bind(specimen_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to find active QR code: {error}"))
            })?
            .map(QrCode::try_from)
            .transpose()
    }

    async fn list_for_specimen(&self, specimen_id: SpecimenId) -> AppResult<Vec<QrCode>> {
        let sql = format!(
            "SELECT {QR_COLUMNS} FROM qr_codes WHERE specimen_id = $1 ORDER BY version DESC"
        );

        sqlx::query_as::<_, QrCodeRow>(&sql)
            .bind(specimen_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list QR codes: {error}")))?
            .into_iter()
            .map(QrCode::try_from)
            .collect()
    }

    async fn load_image(&self, qr_id: QrCodeId) -> AppResult<Option<Vec<u8>>> {
        sqlx::query_scalar::<_, Vec<u8>>("SELECT image FROM qr_codes WHERE id = $1")
            .bind(qr_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to load QR image: {error}")))
    }

    async fn record_download(
        &self,
        qr_id: QrCodeId,
        downloaded_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE qr_codes
            SET download_count = download_count + 1,
                last_downloaded_at = $2
            WHERE id = $1
            "#,
        )
        .bind(qr_id.as_uuid())
        .bind(downloaded_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to record QR download: {error}")))?;

        Ok(())
    }

    async fn record_scan(&self, scan: &QrScan) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        sqlx::query(
            r#"
            INSERT INTO qr_scans (id, qr_id, scanned_at, ip_address, user_agent, user_subject)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(scan.scan_id.as_uuid())
        .bind(scan.qr_id.as_uuid())
        .bind(scan.scanned_at)
        .bind(scan.ip_address.as_deref())
        .bind(scan.user_agent.as_deref())
        .bind(scan.user_subject.as_deref())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to record QR scan: {error}")))?;

        sqlx::query(
            r#"
            UPDATE qr_codes
            SET scan_count = scan_count + 1,
                last_scanned_at = $2
            WHERE id = $1
            "#,
        )
        .bind(scan.qr_id.as_uuid())
        .bind(scan.scanned_at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count QR scan: {error}")))?;

        commit(transaction).await
    }

    async fn list_scans(&self, qr_id: QrCodeId, limit: usize) -> AppResult<Vec<QrScan>> {
        let rows = sqlx::query_as::<_, QrScanRow>(
            r#"
            SELECT id, qr_id, scanned_at, ip_address, user_agent, user_subject
            FROM qr_scans
            WHERE qr_id = $1
            ORDER BY scanned_at DESC, id
            LIMIT $2
            "#,
        )
        .bind(qr_id.as_uuid())
        .bind(limit.clamp(1, SCAN_MAX_LIMIT) as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list QR scans: {error}")))?;

        Ok(rows.into_iter().map(QrScan::from).collect())
    }
}
