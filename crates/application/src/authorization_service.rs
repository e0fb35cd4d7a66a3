use std::sync::Arc;

use herbarium_core::{AppError, AppResult, UserIdentity};
use herbarium_domain::{Permission, UserId};
use uuid::Uuid;

use crate::UserRepository;

/// Application service for role based authorization checks.
///
/// Roles are re-read from the store on every check, so role changes and
/// deactivations apply to sessions that are already open.
#[derive(Clone)]
pub struct AuthorizationService {
    user_repository: Arc<dyn UserRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    /// Ensures the actor currently holds `permission`.
    pub async fn require_permission(
        &self,
        actor: &UserIdentity,
        permission: Permission,
    ) -> AppResult<()> {
        if self.has_permission(actor, permission).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{}' is missing permission '{}'",
            actor.subject(),
            permission.as_str()
        )))
    }

    /// Returns whether the actor currently holds `permission`.
    pub async fn has_permission(
        &self,
        actor: &UserIdentity,
        permission: Permission,
    ) -> AppResult<bool> {
        let user_id = Uuid::parse_str(actor.subject())
            .map(UserId::from_uuid)
            .map_err(|_| AppError::Unauthorized("unknown session subject".to_owned()))?;

        let Some(user) = self.user_repository.find_by_id(user_id).await? else {
            return Err(AppError::Unauthorized("unknown session subject".to_owned()));
        };

        if !user.is_active {
            return Err(AppError::Unauthorized("account is deactivated".to_owned()));
        }

        Ok(permission.is_granted_to(user.role))
    }
}
