use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herbarium_core::{AppResult, UserIdentity, UserRole};
use herbarium_domain::{AuditEntry, UserId};

/// User record returned by repository queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Unique user identifier.
    pub user_id: UserId,
    /// Canonical email address.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Argon2id password hash.
    pub password_hash: String,
    /// Granted role.
    pub role: UserRole,
    /// Whether the account may sign in.
    pub is_active: bool,
    /// Consecutive failed sign-ins.
    pub failed_login_count: i32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Session identity of this user.
    #[must_use]
    pub fn identity(&self) -> UserIdentity {
        UserIdentity::new(
            self.user_id.to_string(),
            self.display_name.clone(),
            Some(self.email.clone()),
            self.role,
        )
    }
}

/// Repository port for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Counts every account.
    async fn count_users(&self) -> AppResult<i64>;

    /// Finds a user by canonical email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;

    /// Finds a user by identifier.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>>;

    /// Lists users ordered by display name.
    async fn list_users(&self) -> AppResult<Vec<UserRecord>>;

    /// Inserts a user with its audit entries. A taken email fails with a
    /// conflict.
    async fn create_user(&self, user: &UserRecord, audit: &[AuditEntry]) -> AppResult<()>;

    /// Replaces role and active flag with their audit entries.
    async fn update_user(&self, user: &UserRecord, audit: &[AuditEntry]) -> AppResult<()>;

    /// Counts active accounts holding a role.
    async fn count_active_with_role(&self, role: UserRole) -> AppResult<i64>;

    /// Increments the failed sign-in counter and returns the new value.
    ///
    /// The increment that brings the counter to `lock_threshold` locks the
    /// account; `lock_audit` is written in the same transaction as that
    /// increment and never otherwise.
    async fn record_failed_login(
        &self,
        user_id: UserId,
        lock_threshold: i32,
        lock_audit: &[AuditEntry],
    ) -> AppResult<i32>;

    /// Resets the failed sign-in counter together with its audit entries.
    async fn reset_failed_logins(&self, user_id: UserId, audit: &[AuditEntry]) -> AppResult<()>;
}

/// Port for password hashing operations.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password using Argon2id.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}
