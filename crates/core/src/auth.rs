use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

/// Role granted to a registry account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Herbarium curator with full catalog control.
    Curator,
    /// IT administrator managing accounts.
    ItAdmin,
    /// Regular read-only user.
    User,
}

impl UserRole {
    /// Returns stable storage value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Curator => "curator",
            Self::ItAdmin => "it_admin",
            Self::User => "user",
        }
    }

    /// All roles in display order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Curator, Self::ItAdmin, Self::User]
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "curator" => Ok(Self::Curator),
            "it_admin" => Ok(Self::ItAdmin),
            "user" => Ok(Self::User),
            _ => Err(AppError::Validation(format!("unknown user role '{value}'"))),
        }
    }
}

/// User information persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    display_name: String,
    email: Option<String>,
    role: UserRole,
}

impl UserIdentity {
    /// Creates a user identity from authentication data.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        email: Option<String>,
        role: UserRole,
    ) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            email,
            role,
        }
    }

    /// Returns the stable subject (the account id).
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if known.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the role carried by the session.
    #[must_use]
    pub fn role(&self) -> UserRole {
        self.role
    }
}

/// Best-effort context of the request that triggered a change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    /// Origin address, usually the first `x-forwarded-for` hop.
    pub ip_address: Option<String>,
    /// Client identifier from the `user-agent` header.
    pub user_agent: Option<String>,
}

impl RequestMetadata {
    /// Metadata for calls made outside of an HTTP request.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{RequestMetadata, UserRole};

    #[test]
    fn role_storage_values_round_trip() {
        for role in UserRole::all() {
            assert_eq!(UserRole::from_str(role.as_str()).ok(), Some(role));
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(UserRole::from_str("encargado").is_err());
    }

    #[test]
    fn request_metadata_none_is_empty() {
        let metadata = RequestMetadata::none();
        assert!(metadata.ip_address.is_none());
        assert!(metadata.user_agent.is_none());
    }
}
