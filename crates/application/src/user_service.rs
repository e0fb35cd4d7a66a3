//! User accounts, sign-in and account administration.
//!
//! Sign-in failures return a generic outcome so callers cannot tell unknown
//! emails from wrong passwords. Consecutive failures lock the account until
//! an administrator unlocks it.

use std::sync::Arc;

use chrono::Utc;
use herbarium_core::{
    AppError, AppResult, NonEmptyString, RequestMetadata, UserIdentity, UserRole,
};
use herbarium_domain::{
    AuditAction, AuditTarget, AuditTargetType, EmailAddress, FieldChange, Permission, UserId,
    render_flag, validate_password,
};

use crate::{
    AuditLogger, AuthorizationService, ImageRepository, PasswordHasher, SpecimenRepository,
    UserRecord, UserRepository,
};

mod admin;
mod login;

/// Account policy loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPolicy {
    /// Consecutive failed sign-ins that lock an account.
    pub max_login_attempts: i32,
    /// Whether new passwords must be long and mixed.
    pub require_strong_password: bool,
    /// Domain new accounts must belong to, when enforced.
    pub institutional_domain: Option<String>,
    /// Session inactivity timeout.
    pub session_timeout_minutes: i64,
    /// Password lifetime shown in the settings page.
    pub password_expiry_days: i64,
}

impl Default for UserPolicy {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            require_strong_password: true,
            institutional_domain: None,
            session_timeout_minutes: 30,
            password_expiry_days: 90,
        }
    }
}

/// Result of a sign-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Credentials accepted. A session can be established.
    Authenticated(UserIdentity),
    /// Unknown email, wrong password or inactive account.
    Failed,
    /// Too many consecutive failures.
    Locked,
}

/// Fields of a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserInput {
    /// Email used to sign in.
    pub email: String,
    /// Name shown in the audit trail.
    pub display_name: String,
    /// Plaintext password.
    pub password: String,
    /// Granted role.
    pub role: UserRole,
}

/// Records created by one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserActivity {
    /// Specimens created.
    pub specimens_created: i64,
    /// Collection sites added.
    pub sites_added: i64,
    /// Images uploaded.
    pub images_uploaded: i64,
}

/// Application service for user accounts.
#[derive(Clone)]
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    specimen_repository: Arc<dyn SpecimenRepository>,
    image_repository: Arc<dyn ImageRepository>,
    authorization_service: AuthorizationService,
    audit_logger: AuditLogger,
    policy: UserPolicy,
}

impl UserService {
    /// Creates a new user service.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        specimen_repository: Arc<dyn SpecimenRepository>,
        image_repository: Arc<dyn ImageRepository>,
        authorization_service: AuthorizationService,
        audit_logger: AuditLogger,
        policy: UserPolicy,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            specimen_repository,
            image_repository,
            authorization_service,
            audit_logger,
            policy,
        }
    }

    /// Account policy in force.
    #[must_use]
    pub fn policy(&self) -> &UserPolicy {
        &self.policy
    }

    fn build_record(&self, input: NewUserInput) -> AppResult<UserRecord> {
        let email = EmailAddress::new(input.email)?;
        if let Some(domain) = self.policy.institutional_domain.as_deref()
            && !email.belongs_to(domain)
        {
            return Err(AppError::Validation(format!(
                "email must belong to the institutional domain '{}'",
                domain.trim_start_matches('@')
            )));
        }

        let display_name = NonEmptyString::for_field("display name", input.display_name)?;
        validate_password(&input.password, self.policy.require_strong_password)?;
        let password_hash = self.password_hasher.hash_password(&input.password)?;

        Ok(UserRecord {
            user_id: UserId::new(),
            email: email.into(),
            display_name: display_name.into(),
            password_hash,
            role: input.role,
            is_active: true,
            failed_login_count: 0,
            created_at: Utc::now(),
        })
    }

    async fn require_user(&self, user_id: UserId) -> AppResult<UserRecord> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))
    }
}

fn user_target(user_id: UserId) -> AuditTarget {
    AuditTarget::new(AuditTargetType::User, user_id)
}
