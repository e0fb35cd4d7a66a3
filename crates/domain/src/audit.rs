//! Field-level audit trail entries.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use herbarium_core::{AppError, AppResult, RequestMetadata, UserIdentity};
use serde::{Deserialize, Serialize};

use crate::AuditEntryId;

/// Rendered value of an empty single reference.
pub const EMPTY_REFERENCE_LABEL: &str = "No asignado";

/// Rendered value of an empty multi reference.
pub const EMPTY_REFERENCES_LABEL: &str = "Vacío";

/// Kind of change recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A record was created.
    Created,
    /// A record was modified.
    Updated,
    /// A record was removed.
    Deleted,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "deleted" => Ok(Self::Deleted),
            _ => Err(AppError::Validation(format!(
                "unknown audit action '{value}'"
            ))),
        }
    }
}

/// Record types tracked by the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditTargetType {
    /// Specimen records, including their collection sites.
    Specimen,
    /// Taxon records, including their images.
    Taxon,
    /// Botanical families.
    Family,
    /// Authors, collectors and determiners.
    Contributor,
    /// Herbaria.
    Herbarium,
    /// Geographic hierarchy nodes and their reference points.
    GeoNode,
    /// Generated QR codes.
    QrCode,
    /// User accounts.
    User,
}

impl AuditTargetType {
    /// Returns a stable storage value for this target type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Specimen => "specimen",
            Self::Taxon => "taxon",
            Self::Family => "family",
            Self::Contributor => "contributor",
            Self::Herbarium => "herbarium",
            Self::GeoNode => "geo_node",
            Self::QrCode => "qr_code",
            Self::User => "user",
        }
    }
}

impl FromStr for AuditTargetType {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "specimen" => Ok(Self::Specimen),
            "taxon" => Ok(Self::Taxon),
            "family" => Ok(Self::Family),
            "contributor" => Ok(Self::Contributor),
            "herbarium" => Ok(Self::Herbarium),
            "geo_node" => Ok(Self::GeoNode),
            "qr_code" => Ok(Self::QrCode),
            "user" => Ok(Self::User),
            _ => Err(AppError::Validation(format!(
                "unknown audit target type '{value}'"
            ))),
        }
    }
}

/// The record an audit entry refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditTarget {
    /// Record type.
    pub target_type: AuditTargetType,
    /// Record identifier in its textual form.
    pub target_id: String,
}

impl AuditTarget {
    /// Creates a target from any displayable identifier.
    #[must_use]
    pub fn new(target_type: AuditTargetType, target_id: impl ToString) -> Self {
        Self {
            target_type,
            target_id: target_id.to_string(),
        }
    }
}

/// One changed field with display-rendered values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Stable field key.
    pub field: String,
    /// Value before the write.
    pub old: String,
    /// Value after the write.
    pub new: String,
}

impl FieldChange {
    /// Creates a field change.
    #[must_use]
    pub fn new(field: impl Into<String>, old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            old: old.into(),
            new: new.into(),
        }
    }
}

/// Immutable audit log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Row identifier.
    pub entry_id: AuditEntryId,
    /// Audited record.
    pub target: AuditTarget,
    /// Kind of change.
    pub action: AuditAction,
    /// Human readable summary.
    pub description: String,
    /// Changed field, for diffed updates.
    pub field_name: Option<String>,
    /// Rendered value before the change.
    pub old_value: Option<String>,
    /// Rendered value after the change.
    pub new_value: Option<String>,
    /// Subject of the acting user.
    pub actor_subject: String,
    /// Display name of the acting user.
    pub actor_display_name: String,
    /// Origin address of the triggering request.
    pub ip_address: Option<String>,
    /// Client identifier of the triggering request.
    pub user_agent: Option<String>,
    /// Time the change was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Builds the audit rows for one change.
///
/// Produces one row per entry in `changes`, or a single summary row when
/// `changes` is `None` or empty. Actor and request metadata are copied onto
/// every row.
#[must_use]
pub fn draft_entries(
    target: &AuditTarget,
    action: AuditAction,
    description: &str,
    changes: Option<&[FieldChange]>,
    actor: &UserIdentity,
    request: &RequestMetadata,
    recorded_at: DateTime<Utc>,
) -> Vec<AuditEntry> {
    let entry = |field: Option<&FieldChange>| AuditEntry {
        entry_id: AuditEntryId::new(),
        target: target.clone(),
        action,
        description: description.to_owned(),
        field_name: field.map(|change| change.field.clone()),
        old_value: field.map(|change| change.old.clone()),
        new_value: field.map(|change| change.new.clone()),
        actor_subject: actor.subject().to_owned(),
        actor_display_name: actor.display_name().to_owned(),
        ip_address: request.ip_address.clone(),
        user_agent: request.user_agent.clone(),
        recorded_at,
    };

    match changes {
        Some(changes) if !changes.is_empty() => {
            changes.iter().map(|change| entry(Some(change))).collect()
        }
        _ => vec![entry(None)],
    }
}

/// Renders a single reference by its display name.
#[must_use]
pub fn render_reference(name: Option<&str>) -> String {
    name.map_or_else(|| EMPTY_REFERENCE_LABEL.to_owned(), str::to_owned)
}

/// Renders a multi reference as comma separated display names.
#[must_use]
pub fn render_references(names: &[String]) -> String {
    if names.is_empty() {
        return EMPTY_REFERENCES_LABEL.to_owned();
    }

    names.join(", ")
}

/// Renders a boolean flag.
#[must_use]
pub fn render_flag(value: bool) -> String {
    if value { "Sí" } else { "No" }.to_owned()
}

/// Renders optional free text.
#[must_use]
pub fn render_text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_owned()
}
