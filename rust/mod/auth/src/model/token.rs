use serde::{Deserialize, Serialize};

use crate::model::User;

/// Claims carried by an access token.
///
/// `permissions` is the sorted effective permission set at issue time. It is
/// compared against the live set on every request; a token whose snapshot
/// has drifted is refused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject: user id.
    pub sub: String,

    #[serde(default)]
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,

    /// Permission snapshot.
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Issued at (unix timestamp).
    pub iat: i64,

    /// Expires at (unix timestamp).
    pub exp: i64,
}

/// Body of `POST /v1/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Authorization code handed out by the identity provider.
    pub code: String,
}

/// Result of a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub permissions: Vec<String>,
    pub token: String,
}
