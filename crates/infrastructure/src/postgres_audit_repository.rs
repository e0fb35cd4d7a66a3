use async_trait::async_trait;
use sqlx::PgPool;

use herbarium_application::{AUDIT_LOG_MAX_LIMIT, AuditLogQuery, AuditRepository};
use herbarium_core::{AppError, AppResult};
use herbarium_domain::AuditEntry;

use crate::audit_rows::{AuditEntryRow, begin, commit, insert_audit_entries};

/// PostgreSQL-backed append-only audit repository.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_entries(&self, entries: &[AuditEntry]) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;
        insert_audit_entries(&mut transaction, entries).await?;
        commit(transaction).await
    }

    async fn list_entries(&self, query: &AuditLogQuery) -> AppResult<Vec<AuditEntry>> {
        let capped_limit = query.limit.clamp(1, AUDIT_LOG_MAX_LIMIT) as i64;
        let capped_offset = query.offset.min(50_000) as i64;

        let rows = sqlx::query_as::<_, AuditEntryRow>(
            r#"
            SELECT
                id,
                target_type,
                target_id,
                action,
                description,
                field_name,
                old_value,
                new_value,
                actor_subject,
                actor_display_name,
                ip_address,
                user_agent,
                recorded_at
            FROM audit_log_entries
            WHERE ($1::TEXT IS NULL OR target_type = $1)
                AND ($2::TEXT IS NULL OR target_id = $2)
                AND ($3::TEXT IS NULL OR action = $3)
                AND ($4::TEXT IS NULL OR actor_subject = $4)
            ORDER BY recorded_at DESC, id
            LIMIT $5
            OFFSET $6
            "#,
        )
        .bind(query.target_type.map(|target_type| target_type.as_str()))
        .bind(query.target_id.as_deref())
        .bind(query.action.map(|action| action.as_str()))
        .bind(query.actor_subject.as_deref())
        .bind(capped_limit)
        .bind(capped_offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list audit log entries: {error}"))
        })?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }
}

#[cfg(test)]
mod tests;
