use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use herbarium_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{ImageId, TaxonId};

/// Stored rendition of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageVariant {
    /// Uploaded bytes.
    Original,
    /// 80x80 PNG thumbnail.
    Small,
    /// 200x200 PNG thumbnail.
    Medium,
}

impl ImageVariant {
    /// Returns a stable transport value for this variant.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Small => "small",
            Self::Medium => "medium",
        }
    }

    /// Bounding box of the thumbnail variants.
    #[must_use]
    pub const fn thumbnail_size(self) -> Option<u32> {
        match self {
            Self::Original => None,
            Self::Small => Some(80),
            Self::Medium => Some(200),
        }
    }
}

impl FromStr for ImageVariant {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "original" => Ok(Self::Original),
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            _ => Err(AppError::Validation(format!(
                "unknown image variant '{value}'"
            ))),
        }
    }
}

/// Metadata of an image attached to a taxon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonImage {
    /// Image identifier.
    pub image_id: ImageId,
    /// Owning taxon.
    pub taxon_id: TaxonId,
    /// Filename supplied at upload.
    pub original_filename: String,
    /// Filename under which the bytes are stored.
    pub stored_filename: String,
    /// Size of the original in bytes.
    pub file_size: i64,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// MIME type of the original.
    pub mime_type: String,
    /// SHA-256 of the original, hex encoded.
    pub file_hash: String,
    /// Camera make and model from EXIF.
    pub camera: Option<String>,
    /// Capture time from EXIF.
    pub captured_at: Option<NaiveDateTime>,
    /// Caption.
    pub description: Option<String>,
    /// Whether this is the taxon's cover image.
    pub is_primary: bool,
    /// Position in the gallery.
    pub display_order: i32,
    /// Subject of the uploader.
    pub uploaded_by: Option<String>,
    /// Upload time.
    pub uploaded_at: DateTime<Utc>,
    /// Soft deletion time.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TaxonImage {
    /// `"{width}x{height}"`.
    #[must_use]
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// Size of the original in human units.
    #[must_use]
    pub fn file_size_human(&self) -> String {
        human_file_size(u64::try_from(self.file_size).unwrap_or_default())
    }
}

/// Formats a byte count with two decimals in B, KB, MB, GB or TB.
#[must_use]
pub fn human_file_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.2} {unit}");
        }
        size /= 1024.0;
    }

    format!("{size:.2} TB")
}

/// Filename given to uploads that arrive without one.
#[must_use]
pub fn default_image_filename(uploaded_at: DateTime<Utc>) -> String {
    uploaded_at.format("imagen_%Y%m%d_%H%M%S").to_string()
}
