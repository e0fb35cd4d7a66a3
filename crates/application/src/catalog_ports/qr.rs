use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herbarium_core::AppResult;
use herbarium_domain::{
    AuditEntry, QrCode, QrCodeId, QrErrorCorrection, QrResolution, QrScan, SpecimenId,
};

/// Port for drawing QR symbols.
pub trait QrRenderer: Send + Sync {
    /// Renders `payload` as a square PNG of the requested resolution.
    fn render(
        &self,
        payload: &str,
        error_correction: QrErrorCorrection,
        resolution: QrResolution,
        border: i32,
    ) -> AppResult<Vec<u8>>;
}

/// Repository port for QR codes and their scans.
///
/// A second active code for the same specimen fails with a conflict.
#[async_trait]
pub trait QrCodeRepository: Send + Sync {
    /// Inserts a code with its PNG.
    async fn insert_qr(&self, qr: &QrCode, image: &[u8], audit: &[AuditEntry]) -> AppResult<()>;

    /// Replaces the mutable state of a code.
    async fn update_qr(&self, qr: &QrCode, audit: &[AuditEntry]) -> AppResult<()>;

    /// Stores the superseded version and inserts its replacement atomically.
    async fn replace_qr(
        &self,
        superseded: &QrCode,
        replacement: &QrCode,
        image: &[u8],
        audit: &[AuditEntry],
    ) -> AppResult<()>;

    /// Finds a code.
    async fn find_qr(&self, qr_id: QrCodeId) -> AppResult<Option<QrCode>>;

    /// Finds the active code of a specimen.
    async fn find_active_for_specimen(&self, specimen_id: SpecimenId) -> AppResult<Option<QrCode>>;

    /// Lists every version for a specimen, newest first.
    async fn list_for_specimen(&self, specimen_id: SpecimenId) -> AppResult<Vec<QrCode>>;

    /// Loads the PNG of a code.
    async fn load_image(&self, qr_id: QrCodeId) -> AppResult<Option<Vec<u8>>>;

    /// Increments the download counter.
    async fn record_download(&self, qr_id: QrCodeId, downloaded_at: DateTime<Utc>)
    -> AppResult<()>;

    /// Stores a scan and increments the scan counter.
    async fn record_scan(&self, scan: &QrScan) -> AppResult<()>;

    /// Lists scans of a code, newest first.
    async fn list_scans(&self, qr_id: QrCodeId, limit: usize) -> AppResult<Vec<QrScan>>;
}
