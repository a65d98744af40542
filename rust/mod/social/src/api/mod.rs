mod follows;
mod posts;

use std::sync::Arc;

use axum::Router;

use devplaza_core::Authenticator;

use crate::service::SocialService;

/// Shared application state.
pub type AppState = Arc<SocialService>;

/// Build the social API router. Paths are absolute (`/v1/...`).
pub fn build_router(svc: Arc<SocialService>, auth: Arc<dyn Authenticator>) -> Router {
    Router::new()
        .merge(posts::routes(auth.clone()))
        .merge(follows::routes(auth))
        .with_state(svc)
}
