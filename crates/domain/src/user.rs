//! User validation rules.
//!
//! Follows the OWASP Authentication and Password Storage cheat sheets for
//! password length and email validation.

use herbarium_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Validated, lowercased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: exactly one `@`, non-empty local
    /// part, and a domain containing at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || domain.contains('@') || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether the address belongs to `domain` (with or without leading `@`).
    #[must_use]
    pub fn belongs_to(&self, domain: &str) -> bool {
        let domain = domain.trim().trim_start_matches('@').to_lowercase();
        self.0
            .rsplit_once('@')
            .is_some_and(|(_, own_domain)| own_domain == domain)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Minimum password length.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Minimum password length when strong passwords are required.
pub const STRONG_PASSWORD_MIN_LENGTH: usize = 12;

/// Maximum password length (protects against Argon2id DoS).
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// Validates a plaintext password.
///
/// With `require_strong` the password must also be at least
/// [`STRONG_PASSWORD_MIN_LENGTH`] characters and mix upper case, lower case
/// and digits.
pub fn validate_password(password: &str, require_strong: bool) -> AppResult<()> {
    let char_count = password.chars().count();
    let min_length = if require_strong {
        STRONG_PASSWORD_MIN_LENGTH
    } else {
        PASSWORD_MIN_LENGTH
    };

    if char_count < min_length {
        return Err(AppError::Validation(format!(
            "password must be at least {min_length} characters"
        )));
    }

    if char_count > PASSWORD_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "password must not exceed {PASSWORD_MAX_LENGTH} characters"
        )));
    }

    if COMMON_PASSWORDS.contains(&password.to_lowercase().as_str()) {
        return Err(AppError::Validation(
            "this password is too common and has appeared in data breaches".to_owned(),
        ));
    }

    if require_strong {
        let has_upper = password.chars().any(char::is_uppercase);
        let has_lower = password.chars().any(char::is_lowercase);
        let has_digit = password.chars().any(|character| character.is_ascii_digit());
        if !(has_upper && has_lower && has_digit) {
            return Err(AppError::Validation(
                "password must mix upper case, lower case and digits".to_owned(),
            ));
        }
    }

    Ok(())
}

/// Top breached passwords (subset for a fast embedded check).
static COMMON_PASSWORDS: &[&str] = &[
    "password",
    "12345678",
    "123456789",
    "1234567890",
    "qwertyuiop",
    "password1",
    "password123",
    "passw0rd",
    "iloveyou",
    "sunshine",
    "princess",
    "football",
    "baseball",
    "superman",
    "trustno1",
    "welcome1",
    "letmein1",
    "qwerty123",
    "whatever",
    "herbario",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_is_lowercased() {
        let email = EmailAddress::new("Curador@ESPOCH.edu.ec").unwrap_or_else(|_| unreachable!());
        assert_eq!(email.as_str(), "curador@espoch.edu.ec");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        assert!(EmailAddress::new("noatsign").is_err());
        assert!(EmailAddress::new("user@nodot").is_err());
        assert!(EmailAddress::new("a@b@c.com").is_err());
        assert!(EmailAddress::new("").is_err());
    }

    #[test]
    fn institutional_domain_check() {
        let email = EmailAddress::new("ana@espoch.edu.ec").unwrap_or_else(|_| unreachable!());
        assert!(email.belongs_to("@espoch.edu.ec"));
        assert!(email.belongs_to("espoch.edu.ec"));
        assert!(!email.belongs_to("edu.ec"));
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(validate_password("short", false).is_err());
    }

    #[test]
    fn relaxed_policy_accepts_long_enough_passphrase() {
        assert!(validate_password("paramo andino", false).is_ok());
    }

    #[test]
    fn strong_policy_requires_character_mix() {
        assert!(validate_password("paramoandino", true).is_err());
        assert!(validate_password("ParamoAndino2024", true).is_ok());
    }

    #[test]
    fn common_password_is_rejected() {
        assert!(validate_password("password123", false).is_err());
    }

    #[test]
    fn very_long_password_is_rejected() {
        let long = "a".repeat(PASSWORD_MAX_LENGTH + 1);
        assert!(validate_password(&long, false).is_err());
    }
}
