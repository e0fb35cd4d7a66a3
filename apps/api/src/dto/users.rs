use chrono::{DateTime, Utc};
use herbarium_application::{UserActivity, UserPolicy, UserRecord};
use herbarium_core::UserRole;
use serde::{Deserialize, Serialize};

/// Incoming payload for account creation.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub role: UserRole,
}

/// Incoming payload for a role change.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRoleRequest {
    pub role: UserRole,
}

/// Incoming payload activating or deactivating an account.
#[derive(Debug, Deserialize)]
pub struct UpdateUserActiveRequest {
    pub is_active: bool,
}

/// API representation of an account. The password hash never leaves the server.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub is_active: bool,
    pub failed_login_count: i32,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    /// Builds the response, flagging accounts at the lockout threshold.
    #[must_use]
    pub fn from_record(record: UserRecord, max_login_attempts: i32) -> Self {
        Self {
            user_id: record.user_id.to_string(),
            is_locked: record.failed_login_count >= max_login_attempts,
            email: record.email,
            display_name: record.display_name,
            role: record.role.as_str().to_owned(),
            is_active: record.is_active,
            failed_login_count: record.failed_login_count,
            created_at: record.created_at,
        }
    }
}

/// Counts of records created by one user.
#[derive(Debug, Serialize)]
pub struct UserActivityResponse {
    pub specimens_created: i64,
    pub sites_added: i64,
    pub images_uploaded: i64,
}

impl From<UserActivity> for UserActivityResponse {
    fn from(value: UserActivity) -> Self {
        Self {
            specimens_created: value.specimens_created,
            sites_added: value.sites_added,
            images_uploaded: value.images_uploaded,
        }
    }
}

/// Account policy in force.
#[derive(Debug, Serialize)]
pub struct AccountPolicyResponse {
    pub max_login_attempts: i32,
    pub require_strong_password: bool,
    pub institutional_email_domain: Option<String>,
    pub session_timeout_minutes: i64,
    pub password_expiry_days: i64,
}

impl From<&UserPolicy> for AccountPolicyResponse {
    fn from(policy: &UserPolicy) -> Self {
        Self {
            max_login_attempts: policy.max_login_attempts,
            require_strong_password: policy.require_strong_password,
            institutional_email_domain: policy.institutional_domain.clone(),
            session_timeout_minutes: policy.session_timeout_minutes,
            password_expiry_days: policy.password_expiry_days,
        }
    }
}
