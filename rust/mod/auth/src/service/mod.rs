pub mod authorize;
pub mod login;
pub mod permission;
pub mod role;
pub mod schema;
pub mod seed;
pub mod token;
pub mod user;

use std::sync::Arc;

use thiserror::Error;

use devplaza_sql::{SQLError, SQLStore};

pub use login::{ExternalIdentity, IdentityProvider, OAuthConfig, OAuthProvider};
pub use permission::resolve_permissions;
pub use token::TokenCodec;

/// Auth service error type.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The token's permission snapshot differs from the live set.
    #[error("permissions changed: {0}")]
    PermissionsChanged(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<SQLError> for AuthError {
    fn from(e: SQLError) -> Self {
        match e {
            SQLError::Constraint(m) => AuthError::Conflict(m),
            SQLError::ForeignKey(m) => AuthError::NotFound(m),
            other => AuthError::Storage(other.to_string()),
        }
    }
}

impl From<AuthError> for devplaza_core::ServiceError {
    fn from(e: AuthError) -> Self {
        use devplaza_core::ServiceError;
        match e {
            AuthError::NotFound(m) => ServiceError::NotFound(m),
            AuthError::Conflict(m) => ServiceError::Conflict(m),
            AuthError::Validation(m) => ServiceError::Validation(m),
            AuthError::Unauthorized(m) => ServiceError::Unauthorized(m),
            AuthError::PermissionsChanged(m) => ServiceError::PermissionsChanged(m),
            AuthError::Forbidden(m) => ServiceError::PermissionDenied(m),
            AuthError::Storage(m) => ServiceError::Storage(m),
            AuthError::Internal(m) => ServiceError::Internal(m),
        }
    }
}

/// Role given to users on their first login.
pub const DEFAULT_ROLE: &str = "content_creator";

/// Configuration for the auth service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Access token lifetime in seconds (default: 7 days).
    pub token_ttl: i64,
    /// Role assigned to newly created users.
    pub default_role: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "devplaza-dev-secret-change-me".to_string(),
            token_ttl: 604800,
            default_role: DEFAULT_ROLE.to_string(),
        }
    }
}

/// The Auth service. Holds storage, the token codec and the identity provider.
pub struct AuthService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) tokens: TokenCodec,
    pub(crate) identity: Arc<dyn IdentityProvider>,
    pub(crate) config: AuthConfig,
}

impl AuthService {
    /// Create a new AuthService, initializing the DB schema.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        identity: Arc<dyn IdentityProvider>,
        config: AuthConfig,
    ) -> Result<Arc<Self>, AuthError> {
        schema::init_schema(sql.as_ref())?;
        let tokens = TokenCodec::new(&config.jwt_secret, config.token_ttl);
        Ok(Arc::new(Self {
            sql,
            tokens,
            identity,
            config,
        }))
    }

    /// The token codec used to sign and verify access tokens.
    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use devplaza_sql::SqliteStore;

    /// Identity provider that treats the code as the external uid.
    pub struct StubIdentity;

    #[async_trait]
    impl IdentityProvider for StubIdentity {
        async fn exchange(&self, code: &str) -> Result<ExternalIdentity, AuthError> {
            if code == "bad" {
                return Err(AuthError::Unauthorized("code rejected".into()));
            }
            Ok(identity(code))
        }
    }

    pub fn identity(uid: &str) -> ExternalIdentity {
        ExternalIdentity {
            uid: uid.to_string(),
            username: format!("user-{}", uid),
            email: Some(format!("{}@devplaza.test", uid)),
            avatar: None,
            github: Some(format!("gh-{}", uid)),
        }
    }

    /// In-memory service with the role catalogue seeded.
    pub fn test_service() -> Arc<AuthService> {
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let svc = AuthService::new(sql, Arc::new(StubIdentity), AuthConfig::default()).unwrap();
        svc.seed_catalogue().unwrap();
        svc
    }
}
