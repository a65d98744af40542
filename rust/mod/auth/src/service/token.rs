use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::model::{Claims, User};
use crate::service::AuthError;

/// Signs and verifies HS256 access tokens.
///
/// The codec only proves a token is authentic and unexpired. Whether its
/// permission snapshot is still current is decided in `authorize`.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: i64,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Token lifetime in seconds.
    pub fn ttl(&self) -> i64 {
        self.ttl
    }

    /// Issue a token for `user` carrying the given permission snapshot.
    pub fn issue(&self, user: &User, permissions: Vec<String>) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            github: user.github.clone(),
            permissions,
            iat: now,
            exp: now + self.ttl,
        };
        self.encode(&claims)
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("JWT encode failed: {}", e)))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        // Expiry is exact; no grace window.
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::Unauthorized(format!("invalid token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u1".into(),
            uid: "100".into(),
            username: "alice".into(),
            email: Some("alice@devplaza.test".into()),
            avatar: None,
            github: Some("alice-gh".into()),
            twitter: None,
            role_id: Some("blog_writer".into()),
            created_at: "2025-01-01T00:00:00.000000Z".into(),
            updated_at: "2025-01-01T00:00:00.000000Z".into(),
        }
    }

    #[test]
    fn test_issue_and_decode() {
        let codec = TokenCodec::new("secret", 3600);
        let token = codec
            .issue(&user(), vec!["blog:delete".into(), "blog:write".into()])
            .unwrap();
        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.github.as_deref(), Some("alice-gh"));
        assert_eq!(claims.permissions, vec!["blog:delete", "blog:write"]);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenCodec::new("one", 3600).issue(&user(), vec![]).unwrap();
        let err = TokenCodec::new("two", 3600).decode(&token).unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_rejected() {
        let codec = TokenCodec::new("secret", 3600);
        let now = chrono::Utc::now().timestamp();
        let token = codec
            .encode(&Claims {
                sub: "u1".into(),
                username: "alice".into(),
                email: None,
                avatar: None,
                github: None,
                permissions: vec![],
                iat: now - 7200,
                exp: now - 60,
            })
            .unwrap();
        assert!(matches!(codec.decode(&token), Err(AuthError::Unauthorized(_))));
    }
}
