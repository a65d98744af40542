mod login;
mod me;
mod users;

use std::sync::Arc;

use axum::Router;

use devplaza_core::Authenticator;

use crate::service::AuthService;

/// Shared application state.
pub type AppState = Arc<AuthService>;

/// Build the auth API router. Paths are absolute (`/v1/...`).
pub fn build_router(svc: Arc<AuthService>) -> Router {
    let auth: Arc<dyn Authenticator> = svc.clone();
    Router::new()
        .merge(login::routes())
        .merge(users::routes(auth.clone()))
        .merge(me::routes(auth))
        .with_state(svc)
}
