use axum::http::HeaderMap;
use herbarium_core::{AppError, RequestMetadata, UserIdentity};
use tower_sessions::Session;

use super::{SESSION_CREATED_AT_KEY, SESSION_USER_KEY};

/// Client address and agent of the request, as recorded in the audit trail.
pub fn request_metadata(headers: &HeaderMap) -> RequestMetadata {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    let user_agent = headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    RequestMetadata {
        ip_address,
        user_agent,
    }
}

pub(super) async fn establish_session(
    session: &Session,
    identity: &UserIdentity,
) -> Result<(), AppError> {
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    Ok(())
}

pub async fn session_identity(session: &Session) -> Result<Option<UserIdentity>, AppError> {
    session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};

    use super::request_metadata;

    #[test]
    fn first_forwarded_hop_and_agent_are_recorded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 190.15.128.4 , 10.0.0.2"),
        );
        headers.insert("user-agent", HeaderValue::from_static("Mozilla/5.0"));

        let metadata = request_metadata(&headers);
        assert_eq!(metadata.ip_address.as_deref(), Some("190.15.128.4"));
        assert_eq!(metadata.user_agent.as_deref(), Some("Mozilla/5.0"));
    }

    #[test]
    fn missing_or_blank_headers_are_left_empty() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" , 10.0.0.2"));
        headers.insert("user-agent", HeaderValue::from_static(""));

        let metadata = request_metadata(&headers);
        assert!(metadata.ip_address.is_none());
        assert!(metadata.user_agent.is_none());
        assert_eq!(request_metadata(&HeaderMap::new()), Default::default());
    }
}
