use chrono::{DateTime, Utc};
use herbarium_domain::{AuditAction, AuditEntry, AuditTargetType};
use serde::{Deserialize, Serialize};

/// Filters for the audit log.
#[derive(Debug, Deserialize)]
pub struct AuditLogQueryParams {
    pub target_type: Option<AuditTargetType>,
    pub target_id: Option<String>,
    pub action: Option<AuditAction>,
    pub actor: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// API representation of one audit entry.
#[derive(Debug, Serialize)]
pub struct AuditEntryResponse {
    pub entry_id: String,
    pub target_type: String,
    pub target_id: String,
    pub action: String,
    pub description: String,
    pub field_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub actor_subject: String,
    pub actor_display_name: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl From<AuditEntry> for AuditEntryResponse {
    fn from(entry: AuditEntry) -> Self {
        Self {
            entry_id: entry.entry_id.to_string(),
            target_type: entry.target.target_type.as_str().to_owned(),
            target_id: entry.target.target_id,
            action: entry.action.as_str().to_owned(),
            description: entry.description,
            field_name: entry.field_name,
            old_value: entry.old_value,
            new_value: entry.new_value,
            actor_subject: entry.actor_subject,
            actor_display_name: entry.actor_display_name,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            recorded_at: entry.recorded_at,
        }
    }
}
