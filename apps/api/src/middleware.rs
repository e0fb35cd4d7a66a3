use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use herbarium_core::AppError;
use tower_sessions::Session;

use crate::auth::session_identity;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session_identity(&session)
        .await?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        let headers = request.headers();

        if let Some(fetch_site) = headers.get("sec-fetch-site")
            && fetch_site == HeaderValue::from_static("cross-site")
        {
            return Err(AppError::Unauthorized("cross-site request blocked".to_owned()).into());
        }

        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let referer = headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if !origin_is_allowed(origin, referer, &state.frontend_url) {
            return Err(AppError::Unauthorized("origin validation failed".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

fn origin_is_allowed(origin: &str, referer: &str, allowed_origin: &str) -> bool {
    origin == allowed_origin || (!referer.is_empty() && referer.starts_with(allowed_origin))
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

#[cfg(test)]
mod tests {
    use axum::http::Method;

    use super::{is_state_changing_method, origin_is_allowed};

    #[test]
    fn only_mutations_are_origin_checked() {
        assert!(is_state_changing_method(&Method::POST));
        assert!(is_state_changing_method(&Method::DELETE));
        assert!(!is_state_changing_method(&Method::GET));
        assert!(!is_state_changing_method(&Method::OPTIONS));
    }

    #[test]
    fn origin_or_referer_must_match_the_frontend() {
        let frontend = "http://localhost:3000";

        assert!(origin_is_allowed(frontend, "", frontend));
        assert!(origin_is_allowed(
            "",
            "http://localhost:3000/especimenes/nuevo",
            frontend
        ));
        assert!(!origin_is_allowed("https://evil.example", "", frontend));
        assert!(!origin_is_allowed("", "", frontend));
    }
}
