use async_trait::async_trait;
use herbarium_core::AppResult;
use herbarium_domain::{AuditAction, AuditEntry, AuditTargetType};

/// Upper bound of rows returned by one audit log query.
pub const AUDIT_LOG_MAX_LIMIT: usize = 200;

/// Filters for reading the audit trail, newest entries first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// Restricts to one record type.
    pub target_type: Option<AuditTargetType>,
    /// Restricts to one record.
    pub target_id: Option<String>,
    /// Restricts to one action.
    pub action: Option<AuditAction>,
    /// Restricts to one acting subject.
    pub actor_subject: Option<String>,
    /// Page size.
    pub limit: usize,
    /// Page offset.
    pub offset: usize,
}

impl Default for AuditLogQuery {
    fn default() -> Self {
        Self {
            target_type: None,
            target_id: None,
            action: None,
            actor_subject: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// Port for the append-only audit trail.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists entries that are not tied to another write.
    async fn append_entries(&self, entries: &[AuditEntry]) -> AppResult<()>;

    /// Lists entries matching the query.
    async fn list_entries(&self, query: &AuditLogQuery) -> AppResult<Vec<AuditEntry>>;
}
