use std::sync::Arc;

use chrono::Utc;
use herbarium_core::{AppResult, RequestMetadata, UserIdentity};
use herbarium_domain::{
    AuditAction, AuditEntry, AuditTarget, FieldChange, Permission, draft_entries,
};

use crate::{AUDIT_LOG_MAX_LIMIT, AuditLogQuery, AuditRepository, AuthorizationService};

/// Records and reads the field-level audit trail.
///
/// Services that mutate tracked records call [`AuditLogger::draft`] and hand
/// the entries to the repository write, which stores both in one
/// transaction. [`AuditLogger::log_change`] stores entries on their own.
#[derive(Clone)]
pub struct AuditLogger {
    audit_repository: Arc<dyn AuditRepository>,
    authorization_service: AuthorizationService,
}

impl AuditLogger {
    /// Creates a new audit logger.
    #[must_use]
    pub fn new(
        audit_repository: Arc<dyn AuditRepository>,
        authorization_service: AuthorizationService,
    ) -> Self {
        Self {
            audit_repository,
            authorization_service,
        }
    }

    /// Builds the entries for one change without storing them.
    #[must_use]
    pub fn draft(
        &self,
        target: &AuditTarget,
        action: AuditAction,
        description: &str,
        changes: Option<&[FieldChange]>,
        actor: &UserIdentity,
        request: &RequestMetadata,
    ) -> Vec<AuditEntry> {
        draft_entries(
            target,
            action,
            description,
            changes,
            actor,
            request,
            Utc::now(),
        )
    }

    /// Builds and stores the entries for one change. Storage failures are
    /// returned to the caller.
    pub async fn log_change(
        &self,
        target: &AuditTarget,
        action: AuditAction,
        description: &str,
        changes: Option<&[FieldChange]>,
        actor: &UserIdentity,
        request: &RequestMetadata,
    ) -> AppResult<()> {
        let entries = self.draft(target, action, description, changes, actor, request);
        self.audit_repository.append_entries(&entries).await
    }

    /// Lists audit entries for an actor allowed to read the trail.
    pub async fn list_entries(
        &self,
        actor: &UserIdentity,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditEntry>> {
        self.authorization_service
            .require_permission(actor, Permission::AuditRead)
            .await?;

        let query = AuditLogQuery {
            limit: query.limit.clamp(1, AUDIT_LOG_MAX_LIMIT),
            ..query
        };

        self.audit_repository.list_entries(&query).await
    }
}
