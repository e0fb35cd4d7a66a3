use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use herbarium_application::QrOptions;
use herbarium_core::AppError;
use herbarium_domain::{
    ImageId, ImageVariant, QrCode, QrErrorCorrection, QrResolution, QrScan, TaxonImage,
};
use serde::{Deserialize, Serialize};

/// Metadata sent alongside the raw bytes of an uploaded image.
#[derive(Debug, Deserialize)]
pub struct UploadImageParams {
    pub filename: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    pub display_order: Option<i32>,
}

/// Incoming payload for image metadata edits.
#[derive(Debug, Deserialize)]
pub struct UpdateImageRequest {
    pub description: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub display_order: i32,
}

/// Requested rendition of an image, the original by default.
#[derive(Debug, Deserialize)]
pub struct ImageVariantParams {
    pub variant: Option<ImageVariant>,
}

/// API representation of a taxon image.
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub image_id: String,
    pub taxon_id: String,
    pub original_filename: String,
    pub stored_filename: String,
    pub file_size: i64,
    pub file_size_human: String,
    pub width: i32,
    pub height: i32,
    pub resolution: String,
    pub mime_type: String,
    pub file_hash: String,
    pub camera: Option<String>,
    pub captured_at: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub is_primary: bool,
    pub display_order: i32,
    pub uploaded_by: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub urls: ImageUrls,
}

/// Public addresses of every rendition of an image.
#[derive(Debug, Serialize)]
pub struct ImageUrls {
    pub original: String,
    pub small: String,
    pub medium: String,
}

impl ImageUrls {
    /// Builds the public content addresses of `image_id`.
    #[must_use]
    pub fn for_image(image_id: ImageId) -> Self {
        let url = |variant: ImageVariant| {
            format!("/public/images/{image_id}?variant={}", variant.as_str())
        };
        Self {
            original: url(ImageVariant::Original),
            small: url(ImageVariant::Small),
            medium: url(ImageVariant::Medium),
        }
    }
}

impl From<TaxonImage> for ImageResponse {
    fn from(image: TaxonImage) -> Self {
        Self {
            image_id: image.image_id.to_string(),
            taxon_id: image.taxon_id.to_string(),
            file_size_human: image.file_size_human(),
            resolution: image.resolution(),
            urls: ImageUrls::for_image(image.image_id),
            original_filename: image.original_filename,
            stored_filename: image.stored_filename,
            file_size: image.file_size,
            width: image.width,
            height: image.height,
            mime_type: image.mime_type,
            file_hash: image.file_hash,
            camera: image.camera,
            captured_at: image.captured_at,
            description: image.description,
            is_primary: image.is_primary,
            display_order: image.display_order,
            uploaded_by: image.uploaded_by,
            uploaded_at: image.uploaded_at,
        }
    }
}

/// Rendering options for a QR label. Omitted fields keep their defaults.
#[derive(Debug, Default, Deserialize)]
pub struct QrOptionsRequest {
    /// Side length in pixels: 300, 600, 1200 or 2400.
    pub resolution: Option<u32>,
    /// One of `L`, `M`, `Q`, `H`.
    pub error_correction: Option<String>,
    pub border: Option<i32>,
}

impl TryFrom<QrOptionsRequest> for QrOptions {
    type Error = AppError;

    fn try_from(request: QrOptionsRequest) -> Result<Self, Self::Error> {
        let defaults = QrOptions::default();
        Ok(Self {
            resolution: request
                .resolution
                .map(QrResolution::from_pixels)
                .transpose()?
                .unwrap_or(defaults.resolution),
            error_correction: request
                .error_correction
                .as_deref()
                .map(|value| QrErrorCorrection::from_str(value.trim()))
                .transpose()?
                .unwrap_or(defaults.error_correction),
            border: request.border.unwrap_or(defaults.border),
        })
    }
}

/// API representation of a QR label.
#[derive(Debug, Serialize)]
pub struct QrCodeResponse {
    pub qr_id: String,
    pub specimen_id: String,
    pub url: String,
    pub resolution: u32,
    pub error_correction: String,
    pub box_size: i32,
    pub border: i32,
    pub checksum: String,
    pub version: i32,
    pub status: String,
    pub is_obsolete: bool,
    pub download_count: i64,
    pub last_downloaded_at: Option<DateTime<Utc>>,
    pub scan_count: i64,
    pub last_scanned_at: Option<DateTime<Utc>>,
    pub generated_by: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl From<QrCode> for QrCodeResponse {
    fn from(qr: QrCode) -> Self {
        Self {
            qr_id: qr.qr_id.to_string(),
            specimen_id: qr.specimen_id.to_string(),
            url: qr.url,
            resolution: qr.resolution.pixels(),
            error_correction: qr.error_correction.as_str().to_owned(),
            box_size: qr.box_size,
            border: qr.border,
            checksum: qr.checksum,
            version: qr.version,
            status: qr.status.as_str().to_owned(),
            is_obsolete: qr.is_obsolete,
            download_count: qr.download_count,
            last_downloaded_at: qr.last_downloaded_at,
            scan_count: qr.scan_count,
            last_scanned_at: qr.last_scanned_at,
            generated_by: qr.generated_by,
            generated_at: qr.generated_at,
        }
    }
}

/// Page size for scan listings.
#[derive(Debug, Deserialize)]
pub struct QrScansParams {
    pub limit: Option<usize>,
}

/// API representation of one label scan.
#[derive(Debug, Serialize)]
pub struct QrScanResponse {
    pub scan_id: String,
    pub scanned_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub user_subject: Option<String>,
}

impl From<QrScan> for QrScanResponse {
    fn from(scan: QrScan) -> Self {
        Self {
            scan_id: scan.scan_id.to_string(),
            scanned_at: scan.scanned_at,
            ip_address: scan.ip_address,
            user_agent: scan.user_agent,
            user_subject: scan.user_subject,
        }
    }
}
