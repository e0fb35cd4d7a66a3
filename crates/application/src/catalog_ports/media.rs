use async_trait::async_trait;
use chrono::NaiveDateTime;
use herbarium_core::AppResult;
use herbarium_domain::{AuditEntry, ImageId, ImageVariant, TaxonId, TaxonImage};

/// Facts extracted from uploaded image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectedImage {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Detected MIME type.
    pub mime_type: String,
    /// File extension matching the MIME type.
    pub extension: String,
    /// 80x80 PNG thumbnail.
    pub thumbnail_small: Vec<u8>,
    /// 200x200 PNG thumbnail.
    pub thumbnail_medium: Vec<u8>,
    /// Camera make and model.
    pub camera: Option<String>,
    /// Capture time.
    pub captured_at: Option<NaiveDateTime>,
}

/// Port for decoding images, rendering thumbnails and reading EXIF.
pub trait ImageInspector: Send + Sync {
    /// Inspects the bytes of an upload; undecodable input is a validation error.
    fn inspect(&self, bytes: &[u8]) -> AppResult<InspectedImage>;
}

/// Stored renditions of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBinaries {
    /// Uploaded bytes.
    pub original: Vec<u8>,
    /// 80x80 PNG thumbnail.
    pub small: Vec<u8>,
    /// 200x200 PNG thumbnail.
    pub medium: Vec<u8>,
}

/// Repository port for taxon images.
///
/// When a written image is primary every other image of the same taxon is
/// demoted in the same transaction as the write and its audit entries.
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Inserts an image. A hash already stored for the taxon fails with a
    /// conflict.
    async fn insert_image(
        &self,
        image: &TaxonImage,
        binaries: &ImageBinaries,
        audit: &[AuditEntry],
    ) -> AppResult<()>;

    /// Replaces image metadata, including soft deletion.
    async fn update_image(&self, image: &TaxonImage, audit: &[AuditEntry]) -> AppResult<()>;

    /// Finds an image, soft-deleted ones included.
    async fn find_image(&self, image_id: ImageId) -> AppResult<Option<TaxonImage>>;

    /// Lists live images of a taxon by display order.
    async fn list_images(&self, taxon_id: TaxonId) -> AppResult<Vec<TaxonImage>>;

    /// Finds a live image of the taxon with the given hash.
    async fn find_by_hash(&self, taxon_id: TaxonId, file_hash: &str)
    -> AppResult<Option<TaxonImage>>;

    /// Loads the bytes of one rendition of a live image.
    async fn load_content(
        &self,
        image_id: ImageId,
        variant: ImageVariant,
    ) -> AppResult<Option<Vec<u8>>>;

    /// Counts images uploaded by a subject.
    async fn count_uploaded_by(&self, subject: &str) -> AppResult<i64>;
}
