use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use herbarium_application::UserPolicy;
use herbarium_core::AppError;
use herbarium_domain::{CodePrefix, DEFAULT_CODE_PREFIX};
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_INSTITUTIONAL_DOMAIN: &str = "espoch.edu.ec";
const BYTES_PER_MEGABYTE: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub database_max_connections: u32,
    pub frontend_url: String,
    pub public_base_url: String,
    pub bootstrap_token: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub max_upload_bytes: usize,
    pub code_prefix: CodePrefix,
    pub user_policy: UserPolicy,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let database_url = required_env(&lookup, "DATABASE_URL")?;
        let database_max_connections = parsed_env(&lookup, "DATABASE_MAX_CONNECTIONS", 10_u32)?;
        if database_max_connections == 0 {
            return Err(AppError::Validation(
                "DATABASE_MAX_CONNECTIONS must be at least 1".to_owned(),
            ));
        }
        let frontend_url = required_non_empty_env(&lookup, "FRONTEND_URL")?;

        let public_base_url = required_non_empty_env(&lookup, "PUBLIC_BASE_URL")?;
        Url::parse(&public_base_url).map_err(|error| {
            AppError::Validation(format!("invalid PUBLIC_BASE_URL '{public_base_url}': {error}"))
        })?;

        let bootstrap_token = required_non_empty_env(&lookup, "AUTH_BOOTSTRAP_TOKEN")?;

        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = parsed_env(&lookup, "API_PORT", 3001_u16)?;
        let cookie_secure = flag_env(&lookup, "SESSION_COOKIE_SECURE", false)?;

        let max_upload_megabytes = parsed_env(&lookup, "MAX_UPLOAD_MB", 20_usize)?;
        let max_upload_bytes = max_upload_megabytes
            .checked_mul(BYTES_PER_MEGABYTE)
            .filter(|bytes| *bytes > 0)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "MAX_UPLOAD_MB must be between 1 and {}",
                    usize::MAX / BYTES_PER_MEGABYTE
                ))
            })?;

        let code_prefix = CodePrefix::new(
            lookup("SPECIMEN_CODE_PREFIX").unwrap_or_else(|| DEFAULT_CODE_PREFIX.to_owned()),
        )
        .map_err(|error| AppError::Validation(format!("invalid SPECIMEN_CODE_PREFIX: {error}")))?;

        let max_login_attempts = parsed_env(&lookup, "MAX_LOGIN_ATTEMPTS", 5_i32)?;
        if max_login_attempts < 1 {
            return Err(AppError::Validation(
                "MAX_LOGIN_ATTEMPTS must be at least 1".to_owned(),
            ));
        }

        let session_timeout_minutes = parsed_env(&lookup, "SESSION_TIMEOUT_MINUTES", 30_i64)?;
        if session_timeout_minutes < 1 {
            return Err(AppError::Validation(
                "SESSION_TIMEOUT_MINUTES must be at least 1".to_owned(),
            ));
        }

        let institutional_domain = if flag_env(&lookup, "REQUIRE_INSTITUTIONAL_EMAIL", false)? {
            let domain = lookup("INSTITUTIONAL_EMAIL_DOMAIN")
                .map(|value| value.trim().trim_start_matches('@').to_owned())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_INSTITUTIONAL_DOMAIN.to_owned());
            Some(domain)
        } else {
            None
        };

        let user_policy = UserPolicy {
            max_login_attempts,
            require_strong_password: flag_env(&lookup, "REQUIRE_STRONG_PASSWORD", true)?,
            institutional_domain,
            session_timeout_minutes,
            password_expiry_days: parsed_env(&lookup, "PASSWORD_EXPIRY_DAYS", 90_i64)?,
        };

        Ok(Self {
            migrate_only,
            database_url,
            database_max_connections,
            frontend_url,
            public_base_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            max_upload_bytes,
            code_prefix,
            user_policy,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String, AppError> {
    lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    let value = required_env(lookup, name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parsed_env<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name).filter(|value| !value.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}"))),
        None => Ok(default),
    }
}

fn flag_env(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: bool,
) -> Result<bool, AppError> {
    match lookup(name).map(|value| value.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(value) if value.is_empty() => Ok(default),
        Some(value) if matches!(value.as_str(), "true" | "1" | "yes") => Ok(true),
        Some(value) if matches!(value.as_str(), "false" | "0" | "no") => Ok(false),
        Some(value) => Err(AppError::Validation(format!(
            "{name} must be true or false, got '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use herbarium_core::AppError;

    use super::ApiConfig;

    fn load(overrides: &[(&str, &str)]) -> Result<ApiConfig, AppError> {
        let mut values: HashMap<String, String> = [
            ("DATABASE_URL", "postgres://herbario@localhost/herbario"),
            ("FRONTEND_URL", "http://localhost:3000"),
            ("PUBLIC_BASE_URL", "https://herbario.espoch.edu.ec"),
            ("AUTH_BOOTSTRAP_TOKEN", "bootstrap-secret"),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .collect();
        for (name, value) in overrides {
            values.insert((*name).to_owned(), (*value).to_owned());
        }

        ApiConfig::from_lookup(false, |name| values.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_settings_are_absent() {
        let config = load(&[]).unwrap_or_else(|_| unreachable!());

        assert_eq!(config.api_port, 3001);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.code_prefix.as_str(), "CHEP");
        assert!(!config.cookie_secure);
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.user_policy.max_login_attempts, 5);
        assert_eq!(config.user_policy.session_timeout_minutes, 30);
        assert_eq!(config.user_policy.password_expiry_days, 90);
        assert!(config.user_policy.require_strong_password);
        assert!(config.user_policy.institutional_domain.is_none());
    }

    #[test]
    fn institutional_email_uses_the_default_domain() {
        let config = load(&[("REQUIRE_INSTITUTIONAL_EMAIL", "true")])
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(
            config.user_policy.institutional_domain.as_deref(),
            Some("espoch.edu.ec")
        );

        let custom = load(&[
            ("REQUIRE_INSTITUTIONAL_EMAIL", "true"),
            ("INSTITUTIONAL_EMAIL_DOMAIN", "@herbario.test"),
        ])
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(
            custom.user_policy.institutional_domain.as_deref(),
            Some("herbario.test")
        );
    }

    #[test]
    fn invalid_values_are_rejected_at_startup() {
        assert!(matches!(
            load(&[("PUBLIC_BASE_URL", "not a url")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[("API_PORT", "seventy")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[("DATABASE_MAX_CONNECTIONS", "0")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[("MAX_LOGIN_ATTEMPTS", "0")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[("MAX_UPLOAD_MB", "0")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[("SESSION_COOKIE_SECURE", "maybe")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[("AUTH_BOOTSTRAP_TOKEN", "  ")]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn socket_address_requires_an_ip_host() {
        let config = load(&[("API_HOST", "0.0.0.0"), ("API_PORT", "8080")])
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(
            config
                .socket_address()
                .map(|address| address.to_string())
                .ok(),
            Some("0.0.0.0:8080".to_owned())
        );

        let named = load(&[("API_HOST", "localhost")]).unwrap_or_else(|_| unreachable!());
        assert!(named.socket_address().is_err());
    }
}
