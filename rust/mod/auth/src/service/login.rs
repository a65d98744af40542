//! Login through the external identity provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{LoginResponse, User};
use crate::service::{AuthError, AuthService};

/// Profile returned by the identity provider for an authorization code.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalIdentity {
    /// Stable account id at the provider.
    pub uid: String,
    pub username: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub github: Option<String>,
}

impl ExternalIdentity {
    pub fn new(uid: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            username: username.into(),
            email: None,
            avatar: None,
            github: None,
        }
    }
}

/// Pluggable identity provider. Turns a login code into a profile.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    async fn exchange(&self, code: &str) -> Result<ExternalIdentity, AuthError>;
}

/// Endpoints and credentials of the OAuth identity provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Code-for-token exchange endpoint (POST).
    pub access_api: String,
    /// Profile endpoint (GET, bearer token).
    pub user_api: String,
}

/// HTTP implementation of [`IdentityProvider`].
///
/// 1. POST `{client_id, client_secret, code}` to `access_api`, expecting
///    `{"status": 200, "data": {"token": ...}}`
/// 2. GET `user_api` with that token, expecting
///    `{"status": 200, "data": {"uid", "user_name", "email", "avatar", "github"}}`
pub struct OAuthProvider {
    http: reqwest::Client,
    config: OAuthConfig,
}

#[derive(Serialize)]
struct AccessTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct Envelope<T> {
    status: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct AccessToken {
    token: String,
}

#[derive(Deserialize)]
struct ProviderUser {
    uid: serde_json::Value,
    #[serde(default)]
    user_name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    github: Option<String>,
}

/// Empty strings from the provider mean "not set".
fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

impl OAuthProvider {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<Envelope<T>, AuthError> {
        let resp = request
            .send()
            .await
            .map_err(|e| AuthError::Internal(format!("{} request failed: {}", what, e)))?;
        resp.json()
            .await
            .map_err(|e| AuthError::Internal(format!("{} response parse failed: {}", what, e)))
    }
}

#[async_trait]
impl IdentityProvider for OAuthProvider {
    async fn exchange(&self, code: &str) -> Result<ExternalIdentity, AuthError> {
        let token: Envelope<AccessToken> = Self::fetch(
            self.http.post(&self.config.access_api).json(&AccessTokenRequest {
                client_id: &self.config.client_id,
                client_secret: &self.config.client_secret,
                code,
            }),
            "token exchange",
        )
        .await?;
        let token = match token {
            Envelope { status: 200, data: Some(data), .. } => data.token,
            Envelope { status, message, .. } => {
                return Err(AuthError::Unauthorized(format!(
                    "identity provider rejected code ({}): {}",
                    status, message
                )));
            }
        };

        let user: Envelope<ProviderUser> = Self::fetch(
            self.http.get(&self.config.user_api).bearer_auth(&token),
            "user info",
        )
        .await?;
        let user = match user {
            Envelope { status: 200, data: Some(data), .. } => data,
            Envelope { status, message, .. } => {
                return Err(AuthError::Internal(format!(
                    "user info returned {}: {}",
                    status, message
                )));
            }
        };

        let uid = match user.uid {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(AuthError::Internal(format!("unexpected uid: {}", other)));
            }
        };

        Ok(ExternalIdentity {
            uid,
            username: user.user_name,
            email: non_empty(user.email),
            avatar: non_empty(user.avatar),
            github: non_empty(user.github),
        })
    }
}

impl AuthService {
    /// Log in with an identity provider code.
    ///
    /// Upserts the user, snapshots their effective permissions and issues a
    /// token carrying the snapshot. Any failure aborts the login.
    pub async fn login(&self, code: &str) -> Result<LoginResponse, AuthError> {
        if code.trim().is_empty() {
            return Err(AuthError::Validation("code is required".into()));
        }
        let identity = self.identity.exchange(code).await?;
        let user = self.upsert_identity(&identity)?;
        let permissions = self.permission_list(&user.id).map_err(|e| {
            tracing::error!(user = %user.id, "permission lookup at login failed: {}", e);
            AuthError::Internal("get permissions error".into())
        })?;
        let token = self.tokens.issue(&user, permissions.clone())?;
        tracing::info!(user = %user.id, permissions = permissions.len(), "login");
        Ok(LoginResponse {
            user,
            permissions,
            token,
        })
    }

    /// Issue a fresh token with the user's current permission snapshot.
    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let permissions = self
            .permission_list(&user.id)
            .map_err(|e| AuthError::Internal(format!("get permissions error: {}", e)))?;
        self.tokens.issue(user, permissions)
    }
}
