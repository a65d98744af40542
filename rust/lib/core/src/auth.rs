//! Authentication seam shared by all modules.
//!
//! Business modules do NOT depend on the auth module. They only know the
//! [`Authenticator`] trait; the concrete implementation (token decoding plus
//! the live permission check) is injected at startup time.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::ServiceError;

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    /// User id.
    pub user_id: String,
    /// Live effective permissions, recomputed for this request.
    pub permissions: BTreeSet<String>,
}

impl Viewer {
    pub fn can(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Pluggable authenticator, called for every endpoint behind a [`Gate`].
pub trait Authenticator: Send + Sync + 'static {
    /// Authenticate a request and, if given, check one capability.
    ///
    /// - `headers`: the HTTP request headers (bearer token lives here)
    /// - `permission`: the capability the endpoint requires, if any
    /// - Returns the [`Viewer`] if allowed, `Err(ServiceError)` if denied.
    fn authenticate(
        &self,
        headers: &HeaderMap,
        permission: Option<&str>,
    ) -> Result<Viewer, ServiceError>;
}

/// Middleware state: which authenticator to use and what it must check.
#[derive(Clone)]
pub struct Gate {
    auth: Arc<dyn Authenticator>,
    permission: Option<&'static str>,
}

impl Gate {
    /// Any authenticated user passes.
    pub fn authenticated(auth: Arc<dyn Authenticator>) -> Self {
        Self { auth, permission: None }
    }

    /// Only users whose live permission set contains `permission` pass.
    pub fn permission(auth: Arc<dyn Authenticator>, permission: &'static str) -> Self {
        Self {
            auth,
            permission: Some(permission),
        }
    }
}

/// Middleware that requires a valid bearer token.
///
/// Stores the [`Viewer`] as a request extension for handlers to access via
/// `Extension<Viewer>`.
pub async fn require_viewer(
    State(gate): State<Gate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let viewer = gate.auth.authenticate(request.headers(), gate.permission)?;
    request.extensions_mut().insert(viewer);
    Ok(next.run(request).await)
}

/// Middleware for endpoints that serve anonymous callers too.
///
/// Without an `Authorization` header the request proceeds anonymously. A
/// header that is present is verified exactly as in [`require_viewer`].
/// Handlers read `Extension<Option<Viewer>>`.
pub async fn optional_viewer(
    State(gate): State<Gate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let viewer = if request.headers().contains_key("authorization") {
        Some(gate.auth.authenticate(request.headers(), gate.permission)?)
    } else {
        None
    };
    request.extensions_mut().insert(viewer);
    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty() && !t.contains(' '))
}
