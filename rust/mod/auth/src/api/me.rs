use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Json, Router};

use devplaza_core::{Authenticator, Gate, ServiceError, Viewer, require_viewer};

use crate::api::AppState;
use crate::model::User;

pub fn routes(auth: Arc<dyn Authenticator>) -> Router<AppState> {
    Router::new()
        .route("/v1/me", get(me))
        .route("/v1/me/permissions", get(my_permissions))
        .route_layer(from_fn_with_state(Gate::authenticated(auth), require_viewer))
}

/// GET /v1/me: the caller's profile.
async fn me(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<User>, ServiceError> {
    let user = svc.get_user(&viewer.user_id).map_err(ServiceError::from)?;
    Ok(Json(user))
}

/// GET /v1/me/permissions: live effective permissions, as checked for this request.
async fn my_permissions(Extension(viewer): Extension<Viewer>) -> Json<serde_json::Value> {
    Json(serde_json::json!({"permissions": viewer.permissions}))
}
