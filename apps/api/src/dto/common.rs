use herbarium_core::UserIdentity;
use herbarium_domain::{Coordinate, Permission};
use serde::Serialize;

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub postgres: HealthDependencyStatus,
}

/// One runtime dependency health status.
#[derive(Debug, Serialize)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize)]
pub struct UserIdentityResponse {
    pub subject: String,
    pub display_name: String,
    pub email: Option<String>,
    pub role: String,
    /// Permissions granted by the role (e.g. `["catalog.read"]`).
    pub permissions: Vec<String>,
}

impl From<UserIdentity> for UserIdentityResponse {
    fn from(identity: UserIdentity) -> Self {
        let role = identity.role();
        Self {
            subject: identity.subject().to_owned(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().map(ToOwned::to_owned),
            role: role.as_str().to_owned(),
            permissions: Permission::granted_to(role)
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}

/// Current session with the inactivity window the client should honour.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserIdentityResponse,
    pub session_timeout_minutes: i64,
}

/// Stored coordinate with its derived text and map link.
#[derive(Debug, Serialize)]
pub struct CoordinateResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub utm: Option<String>,
    pub description: Option<String>,
    pub text: String,
    pub maps_url: Option<String>,
}

impl From<&Coordinate> for CoordinateResponse {
    fn from(coordinate: &Coordinate) -> Self {
        Self {
            latitude: coordinate.latitude(),
            longitude: coordinate.longitude(),
            elevation: coordinate.elevation(),
            utm: coordinate.utm().map(ToOwned::to_owned),
            description: coordinate.description().map(ToOwned::to_owned),
            text: coordinate.text(),
            maps_url: coordinate.maps_url(),
        }
    }
}
