use super::*;

impl PostgresUserRepository {
    pub(super) async fn create_user_impl(
        &self,
        user: &UserRecord,
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                id,
                email,
                display_name,
                password_hash,
                role,
                is_active,
                failed_login_count,
                created_at
            )
            VALUES ($1, LOWER($2), $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.display_name.as_str())
        .bind(user.password_hash.as_str())
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.failed_login_count)
        .bind(user.created_at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| email_conflict_or_internal(error, "create user"))?;

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    pub(super) async fn update_user_impl(
        &self,
        user: &UserRecord,
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET role = $2, is_active = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.role.as_str())
        .bind(user.is_active)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update user: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "user '{}' does not exist",
                user.user_id
            )));
        }

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }

    pub(super) async fn record_failed_login_impl(
        &self,
        user_id: UserId,
        lock_threshold: i32,
        lock_audit: &[AuditEntry],
    ) -> AppResult<i32> {
        let mut transaction = begin(&self.pool).await?;

        let failures = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE users
            SET failed_login_count = failed_login_count + 1, updated_at = now()
            WHERE id = $1
            RETURNING failed_login_count
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to record failed login: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))?;

        // Row lock serializes concurrent increments, so exactly one reaches the threshold.
        if failures == lock_threshold {
            insert_audit_entries(&mut transaction, lock_audit).await?;
        }

        commit(transaction).await?;
        Ok(failures)
    }

    pub(super) async fn reset_failed_logins_impl(
        &self,
        user_id: UserId,
        audit: &[AuditEntry],
    ) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        sqlx::query(
            r#"
            UPDATE users
            SET failed_login_count = 0, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to reset failed logins: {error}")))?;

        insert_audit_entries(&mut transaction, audit).await?;
        commit(transaction).await
    }
}
