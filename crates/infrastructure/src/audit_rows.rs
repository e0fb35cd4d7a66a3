//! Audit rows written inside the transaction of the change they describe.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, Transaction};

use herbarium_core::{AppError, AppResult};
use herbarium_domain::{AuditEntry, AuditEntryId, AuditTarget};

#[derive(Debug, FromRow)]
pub(crate) struct AuditEntryRow {
    id: uuid::Uuid,
    target_type: String,
    target_id: String,
    action: String,
    description: String,
    field_name: Option<String>,
    old_value: Option<String>,
    new_value: Option<String>,
    actor_subject: String,
    actor_display_name: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<AuditEntryRow> for AuditEntry {
    type Error = AppError;

    fn try_from(row: AuditEntryRow) -> AppResult<Self> {
        Ok(Self {
            entry_id: AuditEntryId::from_uuid(row.id),
            target: AuditTarget::new(row.target_type.parse()?, row.target_id),
            action: row.action.parse()?,
            description: row.description,
            field_name: row.field_name,
            old_value: row.old_value,
            new_value: row.new_value,
            actor_subject: row.actor_subject,
            actor_display_name: row.actor_display_name,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            recorded_at: row.recorded_at,
        })
    }
}

/// Inserts audit rows; a failure aborts the surrounding transaction.
pub(crate) async fn insert_audit_entries(
    transaction: &mut Transaction<'_, Postgres>,
    entries: &[AuditEntry],
) -> AppResult<()> {
    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO audit_log_entries (
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
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(entry.entry_id.as_uuid())
        .bind(entry.target.target_type.as_str())
        .bind(entry.target.target_id.as_str())
        .bind(entry.action.as_str())
        .bind(entry.description.as_str())
        .bind(entry.field_name.as_deref())
        .bind(entry.old_value.as_deref())
        .bind(entry.new_value.as_deref())
        .bind(entry.actor_subject.as_str())
        .bind(entry.actor_display_name.as_str())
        .bind(entry.ip_address.as_deref())
        .bind(entry.user_agent.as_deref())
        .bind(entry.recorded_at)
        .execute(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to write audit entry: {error}")))?;
    }

    Ok(())
}

/// Maps unique violations to a conflict with the given message.
pub(crate) fn conflict_or_internal(
    error: sqlx::Error,
    operation: &str,
    conflict_message: impl FnOnce() -> String,
) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(conflict_message());
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}

pub(crate) async fn begin(pool: &sqlx::PgPool) -> AppResult<Transaction<'static, Postgres>> {
    pool.begin()
        .await
        .map_err(|error| AppError::Internal(format!("failed to start transaction: {error}")))
}

pub(crate) async fn commit(transaction: Transaction<'_, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
}
