use std::sync::Arc;

use chrono::Utc;
use herbarium_core::{AppError, AppResult, RequestMetadata, UserIdentity};
use herbarium_domain::{
    AuditAction, AuditEntry, AuditTarget, AuditTargetType, DEFAULT_QR_BORDER, DEFAULT_QR_BOX_SIZE,
    FieldChange, Permission, QrCode, QrCodeId, QrErrorCorrection, QrResolution, QrScan, QrScanId,
    QrStatus, Specimen, SpecimenId, qr_filename, render_flag, specimen_public_url,
};
use sha2::{Digest, Sha256};

use crate::{AuditLogger, AuthorizationService, QrCodeRepository, QrRenderer, SpecimenRepository};

const MAX_SCAN_PAGE: usize = 200;

/// Rendering options of a QR label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrOptions {
    /// Output size.
    pub resolution: QrResolution,
    /// Error correction level.
    pub error_correction: QrErrorCorrection,
    /// Quiet zone in modules.
    pub border: i32,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            resolution: QrResolution::default(),
            error_correction: QrErrorCorrection::default(),
            border: DEFAULT_QR_BORDER,
        }
    }
}

/// A rendered label ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrDownload {
    /// Suggested filename.
    pub filename: String,
    /// PNG bytes.
    pub png: Vec<u8>,
}

/// Application service for specimen QR labels.
#[derive(Clone)]
pub struct QrService {
    qr_repository: Arc<dyn QrCodeRepository>,
    specimen_repository: Arc<dyn SpecimenRepository>,
    renderer: Arc<dyn QrRenderer>,
    authorization_service: AuthorizationService,
    audit_logger: AuditLogger,
    public_base_url: String,
}

impl QrService {
    /// Creates a new QR service linking labels to pages under `public_base_url`.
    #[must_use]
    pub fn new(
        qr_repository: Arc<dyn QrCodeRepository>,
        specimen_repository: Arc<dyn SpecimenRepository>,
        renderer: Arc<dyn QrRenderer>,
        authorization_service: AuthorizationService,
        audit_logger: AuditLogger,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            qr_repository,
            specimen_repository,
            renderer,
            authorization_service,
            audit_logger,
            public_base_url: public_base_url.into(),
        }
    }

    /// Returns the specimen's active label, creating the next version when
    /// none is active.
    pub async fn generate_for_specimen(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        specimen_id: SpecimenId,
        options: QrOptions,
    ) -> AppResult<QrCode> {
        self.require(actor, Permission::CatalogWrite).await?;
        let specimen = self.require_specimen(specimen_id).await?;

        if let Some(active) = self
            .qr_repository
            .find_active_for_specimen(specimen_id)
            .await?
        {
            return Ok(active);
        }

        let version = self.next_version(specimen_id).await?;
        let (qr, image) = self.render(&specimen, version, options, QrStatus::Active, actor)?;

        let audit = self.audit_logger.draft(
            &qr_target(qr.qr_id),
            AuditAction::Created,
            &format!(
                "QR code v{} generated for specimen {}",
                qr.version, specimen.code
            ),
            None,
            actor,
            request,
        );
        self.qr_repository.insert_qr(&qr, &image, &audit).await?;

        Ok(qr)
    }

    /// Supersedes a label with a new draft version.
    ///
    /// The old label becomes obsolete and, unless deprecated, inactive.
    pub async fn regenerate(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        qr_id: QrCodeId,
        options: QrOptions,
    ) -> AppResult<QrCode> {
        self.require(actor, Permission::CatalogWrite).await?;
        let current = self.require_qr(qr_id).await?;
        if current.is_obsolete {
            return Err(AppError::Validation(format!(
                "QR code version {} was already superseded",
                current.version
            )));
        }
        let specimen = self.require_specimen(current.specimen_id).await?;

        let mut superseded = current.clone();
        superseded.is_obsolete = true;
        if superseded.status != QrStatus::Deprecated {
            superseded.status = QrStatus::Inactive;
        }

        let version = self.next_version(current.specimen_id).await?;
        let (replacement, image) =
            self.render(&specimen, version, options, QrStatus::Draft, actor)?;

        let mut audit: Vec<AuditEntry> = self.audit_logger.draft(
            &qr_target(superseded.qr_id),
            AuditAction::Updated,
            &format!("QR code v{} superseded", superseded.version),
            Some(&status_changes(&current, &superseded)),
            actor,
            request,
        );
        audit.extend(self.audit_logger.draft(
            &qr_target(replacement.qr_id),
            AuditAction::Created,
            &format!(
                "QR code v{} generated for specimen {}",
                replacement.version, specimen.code
            ),
            None,
            actor,
            request,
        ));
        self.qr_repository
            .replace_qr(&superseded, &replacement, &image, &audit)
            .await?;

        Ok(replacement)
    }

    /// Activates a label. A specimen has at most one active label.
    pub async fn activate(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        qr_id: QrCodeId,
    ) -> AppResult<QrCode> {
        self.change_status(actor, request, qr_id, QrStatus::Active)
            .await
    }

    /// Withdraws an active label temporarily.
    pub async fn deactivate(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        qr_id: QrCodeId,
    ) -> AppResult<QrCode> {
        self.change_status(actor, request, qr_id, QrStatus::Inactive)
            .await
    }

    /// Withdraws a label permanently.
    pub async fn deprecate(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        qr_id: QrCodeId,
    ) -> AppResult<QrCode> {
        self.change_status(actor, request, qr_id, QrStatus::Deprecated)
            .await
    }

    /// Returns the PNG of a label and counts the download.
    pub async fn download(&self, actor: &UserIdentity, qr_id: QrCodeId) -> AppResult<QrDownload> {
        self.require(actor, Permission::CatalogRead).await?;
        let qr = self.require_qr(qr_id).await?;
        let specimen = self.require_specimen(qr.specimen_id).await?;

        let png = self
            .qr_repository
            .load_image(qr_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("QR code '{qr_id}' has no image")))?;
        self.qr_repository
            .record_download(qr_id, Utc::now())
            .await?;

        Ok(QrDownload {
            filename: qr_filename(specimen.code.as_str(), qr.version),
            png,
        })
    }

    /// Lists every label version of a specimen, newest first.
    pub async fn list_for_specimen(
        &self,
        actor: &UserIdentity,
        specimen_id: SpecimenId,
    ) -> AppResult<Vec<QrCode>> {
        self.require(actor, Permission::CatalogRead).await?;
        self.qr_repository.list_for_specimen(specimen_id).await
    }

    /// Recent scans of a label, newest first.
    pub async fn list_scans(
        &self,
        actor: &UserIdentity,
        qr_id: QrCodeId,
        limit: usize,
    ) -> AppResult<Vec<QrScan>> {
        self.require(actor, Permission::CatalogRead).await?;
        self.qr_repository
            .list_scans(qr_id, limit.clamp(1, MAX_SCAN_PAGE))
            .await
    }

    /// Records a scan of the specimen's active label, if it has one.
    pub async fn register_scan_for_specimen(
        &self,
        specimen_id: SpecimenId,
        request: &RequestMetadata,
        viewer: Option<&UserIdentity>,
    ) -> AppResult<()> {
        let Some(active) = self
            .qr_repository
            .find_active_for_specimen(specimen_id)
            .await?
        else {
            return Ok(());
        };

        self.qr_repository
            .record_scan(&QrScan {
                scan_id: QrScanId::new(),
                qr_id: active.qr_id,
                scanned_at: Utc::now(),
                ip_address: request.ip_address.clone(),
                user_agent: request.user_agent.clone(),
                user_subject: viewer.map(|viewer| viewer.subject().to_owned()),
            })
            .await
    }

    async fn change_status(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        qr_id: QrCodeId,
        target: QrStatus,
    ) -> AppResult<QrCode> {
        self.require(actor, Permission::CatalogWrite).await?;
        let before = self.require_qr(qr_id).await?;

        let mut after = before.clone();
        after.transition_to(target)?;

        if target == QrStatus::Active
            && let Some(active) = self
                .qr_repository
                .find_active_for_specimen(after.specimen_id)
                .await?
            && active.qr_id != qr_id
        {
            return Err(AppError::Conflict(format!(
                "QR code version {} is already active for this specimen",
                active.version
            )));
        }

        let audit = self.audit_logger.draft(
            &qr_target(qr_id),
            AuditAction::Updated,
            &format!("QR code v{} {}", after.version, target.as_str()),
            Some(&status_changes(&before, &after)),
            actor,
            request,
        );
        self.qr_repository.update_qr(&after, &audit).await?;

        Ok(after)
    }

    fn render(
        &self,
        specimen: &Specimen,
        version: i32,
        options: QrOptions,
        status: QrStatus,
        actor: &UserIdentity,
    ) -> AppResult<(QrCode, Vec<u8>)> {
        if !(0..=20).contains(&options.border) {
            return Err(AppError::Validation(format!(
                "QR border {} must be between 0 and 20 modules",
                options.border
            )));
        }

        let url = specimen_public_url(&self.public_base_url, specimen.specimen_id);
        let image = self.renderer.render(
            &url,
            options.error_correction,
            options.resolution,
            options.border,
        )?;

        let qr = QrCode {
            qr_id: QrCodeId::new(),
            specimen_id: specimen.specimen_id,
            payload: url.clone(),
            url,
            resolution: options.resolution,
            error_correction: options.error_correction,
            box_size: DEFAULT_QR_BOX_SIZE,
            border: options.border,
            checksum: format!("{:x}", Sha256::digest(&image)),
            version,
            status,
            is_obsolete: false,
            download_count: 0,
            last_downloaded_at: None,
            scan_count: 0,
            last_scanned_at: None,
            generated_by: Some(actor.subject().to_owned()),
            generated_at: Utc::now(),
        };

        Ok((qr, image))
    }

    async fn next_version(&self, specimen_id: SpecimenId) -> AppResult<i32> {
        Ok(self
            .qr_repository
            .list_for_specimen(specimen_id)
            .await?
            .iter()
            .map(|qr| qr.version)
            .max()
            .unwrap_or(0)
            + 1)
    }

    async fn require(&self, actor: &UserIdentity, permission: Permission) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, permission)
            .await
    }

    async fn require_qr(&self, qr_id: QrCodeId) -> AppResult<QrCode> {
        self.qr_repository
            .find_qr(qr_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("QR code '{qr_id}' does not exist")))
    }

    async fn require_specimen(&self, specimen_id: SpecimenId) -> AppResult<Specimen> {
        self.specimen_repository
            .find_specimen(specimen_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("specimen '{specimen_id}' does not exist")))
    }
}

fn qr_target(qr_id: QrCodeId) -> AuditTarget {
    AuditTarget::new(AuditTargetType::QrCode, qr_id)
}

fn status_changes(before: &QrCode, after: &QrCode) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    if before.status != after.status {
        changes.push(FieldChange::new(
            "status",
            before.status.as_str(),
            after.status.as_str(),
        ));
    }
    if before.is_obsolete != after.is_obsolete {
        changes.push(FieldChange::new(
            "is_obsolete",
            render_flag(before.is_obsolete),
            render_flag(after.is_obsolete),
        ));
    }
    changes
}

#[cfg(test)]
mod tests;
