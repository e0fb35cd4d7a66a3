//! PostgreSQL-backed user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use herbarium_application::{UserRecord, UserRepository};
use herbarium_core::{AppError, AppResult, UserRole};
use herbarium_domain::{AuditEntry, UserId};

use crate::audit_rows::{begin, commit, conflict_or_internal, insert_audit_entries};

/// PostgreSQL implementation of the user repository port.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: uuid::Uuid,
    email: String,
    display_name: String,
    password_hash: String,
    role: String,
    is_active: bool,
    failed_login_count: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = AppError;

    fn try_from(row: UserRow) -> AppResult<Self> {
        Ok(Self {
            user_id: UserId::from_uuid(row.id),
            email: row.email,
            display_name: row.display_name,
            password_hash: row.password_hash,
            role: row.role.parse()?,
            is_active: row.is_active,
            failed_login_count: row.failed_login_count,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str = r#"
    id,
    email,
    display_name,
    password_hash,
    role,
    is_active,
    failed_login_count,
    created_at
"#;

mod account;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn count_users(&self) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to count users: {error}")))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = LOWER($1)");

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to find user by email: {error}"))
            })?
            .map(UserRecord::try_from)
            .transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to find user by id: {error}")))?
            .map(UserRecord::try_from)
            .transpose()
    }

    async fn list_users(&self) -> AppResult<Vec<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY display_name, email");

        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list users: {error}")))?
            .into_iter()
            .map(UserRecord::try_from)
            .collect()
    }

    async fn create_user(&self, user: &UserRecord, audit: &[AuditEntry]) -> AppResult<()> {
        self.create_user_impl(user, audit).await
    }

    async fn update_user(&self, user: &UserRecord, audit: &[AuditEntry]) -> AppResult<()> {
        self.update_user_impl(user, audit).await
    }

    async fn count_active_with_role(&self, role: UserRole) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE role = $1 AND is_active",
        )
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count users by role: {error}")))
    }

    async fn record_failed_login(
        &self,
        user_id: UserId,
        lock_threshold: i32,
        lock_audit: &[AuditEntry],
    ) -> AppResult<i32> {
        self.record_failed_login_impl(user_id, lock_threshold, lock_audit)
            .await
    }

    async fn reset_failed_logins(&self, user_id: UserId, audit: &[AuditEntry]) -> AppResult<()> {
        self.reset_failed_logins_impl(user_id, audit).await
    }
}

fn email_conflict_or_internal(error: sqlx::Error, operation: &str) -> AppError {
    conflict_or_internal(error, operation, || {
        "an account with this email already exists".to_owned()
    })
}
