use std::sync::Arc;

use chrono::Utc;
use herbarium_core::{AppError, AppResult, RequestMetadata, UserIdentity};
use herbarium_domain::{
    AuditAction, AuditTarget, AuditTargetType, FieldChange, ImageId, ImageVariant, Permission,
    TaxonId, TaxonImage, default_image_filename, render_flag, render_text,
};
use sha2::{Digest, Sha256};

use crate::{
    AuditLogger, AuthorizationService, ImageBinaries, ImageInspector, ImageRepository,
    TaxonomyRepository,
};

/// Upload of a new taxon image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadImageInput {
    /// Filename supplied by the client.
    pub filename: Option<String>,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
    /// Caption.
    pub description: Option<String>,
    /// Request to make this the cover image.
    pub is_primary: bool,
    /// Gallery position; appended when absent.
    pub display_order: Option<i32>,
}

/// Editable metadata of a stored image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateImageInput {
    /// Caption.
    pub description: Option<String>,
    /// Cover image flag.
    pub is_primary: bool,
    /// Gallery position.
    pub display_order: i32,
}

/// Bytes of one image rendition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageContent {
    /// Payload.
    pub bytes: Vec<u8>,
    /// MIME type of the payload.
    pub mime_type: String,
    /// Suggested download filename.
    pub filename: String,
}

/// Application service for taxon images.
#[derive(Clone)]
pub struct ImageService {
    image_repository: Arc<dyn ImageRepository>,
    taxonomy_repository: Arc<dyn TaxonomyRepository>,
    image_inspector: Arc<dyn ImageInspector>,
    authorization_service: AuthorizationService,
    audit_logger: AuditLogger,
}

impl ImageService {
    /// Creates a new image service.
    #[must_use]
    pub fn new(
        image_repository: Arc<dyn ImageRepository>,
        taxonomy_repository: Arc<dyn TaxonomyRepository>,
        image_inspector: Arc<dyn ImageInspector>,
        authorization_service: AuthorizationService,
        audit_logger: AuditLogger,
    ) -> Self {
        Self {
            image_repository,
            taxonomy_repository,
            image_inspector,
            authorization_service,
            audit_logger,
        }
    }

    /// Stores an image for a taxon with its thumbnails and EXIF metadata.
    ///
    /// The same file cannot be attached twice to one taxon. The first image
    /// of a taxon becomes its cover.
    pub async fn upload_image(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        taxon_id: TaxonId,
        input: UploadImageInput,
    ) -> AppResult<TaxonImage> {
        self.authorization_service
            .require_permission(actor, Permission::CatalogWrite)
            .await?;

        let taxon = self
            .taxonomy_repository
            .find_taxon(taxon_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("taxon '{taxon_id}' does not exist")))?;

        if input.bytes.is_empty() {
            return Err(AppError::Validation("image file is empty".to_owned()));
        }

        let file_hash = format!("{:x}", Sha256::digest(&input.bytes));
        if self
            .image_repository
            .find_by_hash(taxon_id, &file_hash)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "this image is already attached to '{}'",
                taxon.scientific_name()
            )));
        }

        let inspected = self.image_inspector.inspect(&input.bytes)?;
        let existing = self.image_repository.list_images(taxon_id).await?;
        let uploaded_at = Utc::now();
        let image_id = ImageId::new();

        let original_filename = input
            .filename
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| {
                format!(
                    "{}.{}",
                    default_image_filename(uploaded_at),
                    inspected.extension
                )
            });

        let image = TaxonImage {
            image_id,
            taxon_id,
            original_filename,
            stored_filename: format!("{image_id}.{}", inspected.extension),
            file_size: i64::try_from(input.bytes.len()).unwrap_or(i64::MAX),
            width: inspected.width,
            height: inspected.height,
            mime_type: inspected.mime_type,
            file_hash,
            camera: inspected.camera,
            captured_at: inspected.captured_at,
            description: clean_text(input.description),
            is_primary: input.is_primary || existing.is_empty(),
            display_order: input
                .display_order
                .unwrap_or_else(|| i32::try_from(existing.len()).unwrap_or(i32::MAX)),
            uploaded_by: Some(actor.subject().to_owned()),
            uploaded_at,
            deleted_at: None,
        };

        let audit = self.audit_logger.draft(
            &taxon_target(taxon_id),
            AuditAction::Updated,
            &format!(
                "image '{}' added ({}, {})",
                image.original_filename,
                image.resolution(),
                image.file_size_human()
            ),
            None,
            actor,
            request,
        );
        let binaries = ImageBinaries {
            original: input.bytes,
            small: inspected.thumbnail_small,
            medium: inspected.thumbnail_medium,
        };
        self.image_repository
            .insert_image(&image, &binaries, &audit)
            .await?;

        Ok(image)
    }

    /// Updates caption, cover flag and position.
    pub async fn update_image(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        image_id: ImageId,
        input: UpdateImageInput,
    ) -> AppResult<TaxonImage> {
        self.authorization_service
            .require_permission(actor, Permission::CatalogWrite)
            .await?;

        let before = self.require_live_image(image_id).await?;
        let after = TaxonImage {
            description: clean_text(input.description),
            is_primary: input.is_primary,
            display_order: input.display_order,
            ..before.clone()
        };

        let changes = image_changes(&before, &after);
        if changes.is_empty() {
            return Ok(before);
        }

        let audit = self.audit_logger.draft(
            &taxon_target(after.taxon_id),
            AuditAction::Updated,
            &format!("image '{}' modified", after.original_filename),
            Some(&changes),
            actor,
            request,
        );
        self.image_repository.update_image(&after, &audit).await?;

        Ok(after)
    }

    /// Makes an image the cover of its taxon.
    pub async fn set_primary_image(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        image_id: ImageId,
    ) -> AppResult<TaxonImage> {
        let image = self.require_live_image(image_id).await?;
        self.update_image(
            actor,
            request,
            image_id,
            UpdateImageInput {
                description: image.description,
                is_primary: true,
                display_order: image.display_order,
            },
        )
        .await
    }

    /// Soft deletes an image.
    pub async fn remove_image(
        &self,
        actor: &UserIdentity,
        request: &RequestMetadata,
        image_id: ImageId,
    ) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, Permission::CatalogWrite)
            .await?;

        let image = self.require_live_image(image_id).await?;
        let removed = TaxonImage {
            is_primary: false,
            deleted_at: Some(Utc::now()),
            ..image
        };

        let audit = self.audit_logger.draft(
            &taxon_target(removed.taxon_id),
            AuditAction::Updated,
            &format!("image '{}' removed", removed.original_filename),
            None,
            actor,
            request,
        );
        self.image_repository.update_image(&removed, &audit).await
    }

    /// Lists the live images of a taxon, cover first.
    pub async fn list_images(
        &self,
        actor: &UserIdentity,
        taxon_id: TaxonId,
    ) -> AppResult<Vec<TaxonImage>> {
        self.authorization_service
            .require_permission(actor, Permission::CatalogRead)
            .await?;

        self.image_repository.list_images(taxon_id).await
    }

    /// Returns one rendition of a live image. Served without a session.
    pub async fn image_content(
        &self,
        image_id: ImageId,
        variant: ImageVariant,
    ) -> AppResult<ImageContent> {
        let image = self.require_live_image(image_id).await?;
        let bytes = self
            .image_repository
            .load_content(image_id, variant)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("image '{image_id}' has no content")))?;

        let (mime_type, filename) = match variant {
            ImageVariant::Original => (image.mime_type, image.original_filename),
            ImageVariant::Small | ImageVariant::Medium => (
                "image/png".to_owned(),
                format!("{image_id}_{}.png", variant.as_str()),
            ),
        };

        Ok(ImageContent {
            bytes,
            mime_type,
            filename,
        })
    }

    async fn require_live_image(&self, image_id: ImageId) -> AppResult<TaxonImage> {
        self.image_repository
            .find_image(image_id)
            .await?
            .filter(|image| image.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("image '{image_id}' does not exist")))
    }
}

fn taxon_target(taxon_id: TaxonId) -> AuditTarget {
    AuditTarget::new(AuditTargetType::Taxon, taxon_id)
}

fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn image_changes(before: &TaxonImage, after: &TaxonImage) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if before.description != after.description {
        changes.push(FieldChange::new(
            "description",
            render_text(before.description.as_deref()),
            render_text(after.description.as_deref()),
        ));
    }
    if before.is_primary != after.is_primary {
        changes.push(FieldChange::new(
            "is_primary",
            render_flag(before.is_primary),
            render_flag(after.is_primary),
        ));
    }
    if before.display_order != after.display_order {
        changes.push(FieldChange::new(
            "display_order",
            before.display_order.to_string(),
            after.display_order.to_string(),
        ));
    }

    changes
}
