//! QR labels linking a physical sheet to its public catalogue page.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use herbarium_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{QrCodeId, QrScanId, SpecimenId};

/// Module size in pixels used when rendering.
pub const DEFAULT_QR_BOX_SIZE: i32 = 10;

/// Quiet zone width in modules.
pub const DEFAULT_QR_BORDER: i32 = 4;

/// Output size of a rendered QR image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QrResolution {
    /// 300 px.
    Low,
    /// 600 px.
    #[default]
    Standard,
    /// 1200 px.
    High,
    /// 2400 px.
    Print,
}

impl QrResolution {
    /// Side length in pixels.
    #[must_use]
    pub const fn pixels(self) -> u32 {
        match self {
            Self::Low => 300,
            Self::Standard => 600,
            Self::High => 1200,
            Self::Print => 2400,
        }
    }

    /// Parses a side length in pixels.
    pub fn from_pixels(pixels: u32) -> AppResult<Self> {
        match pixels {
            300 => Ok(Self::Low),
            600 => Ok(Self::Standard),
            1200 => Ok(Self::High),
            2400 => Ok(Self::Print),
            _ => Err(AppError::Validation(format!(
                "QR resolution {pixels} must be 300, 600, 1200 or 2400"
            ))),
        }
    }
}

/// Reed-Solomon error correction level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QrErrorCorrection {
    /// About 7% recovery.
    L,
    /// About 15% recovery.
    M,
    /// About 25% recovery.
    Q,
    /// About 30% recovery.
    #[default]
    H,
}

impl QrErrorCorrection {
    /// Returns a stable storage value for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        }
    }
}

impl FromStr for QrErrorCorrection {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "L" => Ok(Self::L),
            "M" => Ok(Self::M),
            "Q" => Ok(Self::Q),
            "H" => Ok(Self::H),
            _ => Err(AppError::Validation(format!(
                "unknown QR error correction level '{value}'"
            ))),
        }
    }
}

/// Lifecycle status of a QR code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QrStatus {
    /// Generated but not yet in use.
    #[default]
    Draft,
    /// The label currently printed for the specimen.
    Active,
    /// Temporarily withdrawn.
    Inactive,
    /// Permanently withdrawn.
    Deprecated,
}

impl QrStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Deprecated => "deprecated",
        }
    }
}

impl FromStr for QrStatus {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "deprecated" => Ok(Self::Deprecated),
            _ => Err(AppError::Validation(format!(
                "unknown QR status '{value}'"
            ))),
        }
    }
}

/// Generated QR label of a specimen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCode {
    /// QR identifier.
    pub qr_id: QrCodeId,
    /// Specimen the label points to.
    pub specimen_id: SpecimenId,
    /// Public URL encoded in the symbol.
    pub url: String,
    /// Encoded payload.
    pub payload: String,
    /// Output size.
    pub resolution: QrResolution,
    /// Error correction level.
    pub error_correction: QrErrorCorrection,
    /// Module size in pixels.
    pub box_size: i32,
    /// Quiet zone in modules.
    pub border: i32,
    /// SHA-256 of the PNG, hex encoded.
    pub checksum: String,
    /// Label version, starting at 1.
    pub version: i32,
    /// Lifecycle status.
    pub status: QrStatus,
    /// Whether a newer version superseded this one.
    pub is_obsolete: bool,
    /// Number of downloads.
    pub download_count: i64,
    /// Last download time.
    pub last_downloaded_at: Option<DateTime<Utc>>,
    /// Number of recorded scans.
    pub scan_count: i64,
    /// Last scan time.
    pub last_scanned_at: Option<DateTime<Utc>>,
    /// Subject that generated the label.
    pub generated_by: Option<String>,
    /// Generation time.
    pub generated_at: DateTime<Utc>,
}

impl QrCode {
    /// Moves the label to `target`, enforcing the allowed transitions.
    ///
    /// Deprecated and obsolete labels cannot be reactivated.
    pub fn transition_to(&mut self, target: QrStatus) -> AppResult<()> {
        let allowed = match (self.status, target) {
            (current, target) if current == target => false,
            (QrStatus::Deprecated, _) => false,
            (_, QrStatus::Active) => !self.is_obsolete,
            (QrStatus::Active, QrStatus::Inactive) => true,
            (_, QrStatus::Deprecated) => true,
            _ => false,
        };

        if !allowed {
            return Err(AppError::Validation(format!(
                "QR code version {} cannot move from {} to {}",
                self.version,
                self.status.as_str(),
                target.as_str()
            )));
        }

        self.status = target;
        Ok(())
    }
}

/// One scan of a QR label from the public catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrScan {
    /// Scan identifier.
    pub scan_id: QrScanId,
    /// Scanned label.
    pub qr_id: QrCodeId,
    /// Scan time.
    pub scanned_at: DateTime<Utc>,
    /// Origin address.
    pub ip_address: Option<String>,
    /// Client identifier.
    pub user_agent: Option<String>,
    /// Signed-in user, if any.
    pub user_subject: Option<String>,
}

/// Public page URL of a specimen under `base_url`.
#[must_use]
pub fn specimen_public_url(base_url: &str, specimen_id: SpecimenId) -> String {
    format!(
        "{}/herbario/specimen/{specimen_id}",
        base_url.trim_end_matches('/')
    )
}

/// Download filename, `QR_{code}_v{version}.png` with unsafe characters removed.
#[must_use]
pub fn qr_filename(code: &str, version: i32) -> String {
    let safe_code: String = code
        .chars()
        .filter(|character| {
            character.is_ascii_alphanumeric() || *character == '-' || *character == '_'
        })
        .collect();

    format!("QR_{safe_code}_v{version}.png")
}
