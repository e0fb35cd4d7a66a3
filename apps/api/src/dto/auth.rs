use serde::{Deserialize, Serialize};

use super::UserIdentityResponse;

/// Incoming payload for email/password login.
#[derive(Debug, Deserialize)]
pub struct AuthLoginRequest {
    pub email: String,
    pub password: String,
}

/// Auth status response for login.
#[derive(Debug, Serialize)]
pub struct AuthLoginResponse {
    pub status: String,
    pub user: UserIdentityResponse,
}

/// Incoming payload creating the first curator.
#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub token: String,
    pub email: String,
    pub display_name: String,
    pub password: String,
}
