use std::collections::BTreeSet;

use axum::http::HeaderMap;

use devplaza_core::auth::bearer_token;
use devplaza_core::{Authenticator, ServiceError, Viewer};

use crate::model::Claims;
use crate::service::{AuthError, AuthService};

impl AuthService {
    /// Authorize a request holding `token`.
    ///
    /// 1. Verify the token signature and expiry.
    /// 2. Recompute the holder's effective permissions.
    /// 3. Refuse with `PermissionsChanged` if they differ from the token's
    ///    snapshot, compared as sets.
    /// 4. If `required` is given, refuse with `Forbidden` when the live set
    ///    lacks it.
    pub fn authorize(&self, token: &str, required: Option<&str>) -> Result<Viewer, AuthError> {
        let claims = self.tokens.decode(token)?;
        let live = self.effective_permissions(&claims.sub).map_err(|e| {
            tracing::warn!(user = %claims.sub, "permission lookup failed: {}", e);
            AuthError::Unauthorized("cannot resolve permissions".into())
        })?;

        check_snapshot(&claims, &live)?;

        if let Some(permission) = required {
            if !live.contains(permission) {
                return Err(AuthError::Forbidden(format!(
                    "missing permission '{}'",
                    permission
                )));
            }
        }

        Ok(Viewer {
            user_id: claims.sub,
            permissions: live,
        })
    }
}

/// Compare the token's permission snapshot with the live set.
fn check_snapshot(claims: &Claims, live: &BTreeSet<String>) -> Result<(), AuthError> {
    let snapshot: BTreeSet<&str> = claims.permissions.iter().map(String::as_str).collect();
    let current: BTreeSet<&str> = live.iter().map(String::as_str).collect();
    if snapshot != current {
        tracing::info!(user = %claims.sub, "rejecting token with stale permissions");
        return Err(AuthError::PermissionsChanged("permission change".into()));
    }
    Ok(())
}

impl Authenticator for AuthService {
    fn authenticate(
        &self,
        headers: &HeaderMap,
        permission: Option<&str>,
    ) -> Result<Viewer, ServiceError> {
        let token = bearer_token(headers)
            .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".into()))?;
        Ok(self.authorize(token, permission)?)
    }
}
