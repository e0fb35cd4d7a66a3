use std::str::FromStr;

use herbarium_core::{AppError, UserRole};
use serde::{Deserialize, Serialize};

/// Permissions enforced by application policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows reading catalogue records, including non-public ones.
    CatalogRead,
    /// Allows creating, updating and deleting catalogue records.
    CatalogWrite,
    /// Allows reading the audit trail.
    AuditRead,
    /// Allows managing user accounts.
    UserManage,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CatalogRead => "catalog.read",
            Self::CatalogWrite => "catalog.write",
            Self::AuditRead => "audit.read",
            Self::UserManage => "user.manage",
        }
    }

    /// Returns the permissions granted to a role.
    #[must_use]
    pub fn granted_to(role: UserRole) -> &'static [Self] {
        const CURATOR: &[Permission] = &[
            Permission::CatalogRead,
            Permission::CatalogWrite,
            Permission::AuditRead,
            Permission::UserManage,
        ];
        const IT_ADMIN: &[Permission] = &[
            Permission::CatalogRead,
            Permission::AuditRead,
            Permission::UserManage,
        ];
        const USER: &[Permission] = &[Permission::CatalogRead];

        match role {
            UserRole::Curator => CURATOR,
            UserRole::ItAdmin => IT_ADMIN,
            UserRole::User => USER,
        }
    }

    /// Whether `role` holds this permission.
    #[must_use]
    pub fn is_granted_to(self, role: UserRole) -> bool {
        Self::granted_to(role).contains(&self)
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "catalog.read" => Ok(Self::CatalogRead),
            "catalog.write" => Ok(Self::CatalogWrite),
            "audit.read" => Ok(Self::AuditRead),
            "user.manage" => Ok(Self::UserManage),
            _ => Err(AppError::Validation(format!(
                "unknown permission value '{value}'"
            ))),
        }
    }
}
