use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, put};
use axum::{Json, Router};

use devplaza_core::{Authenticator, Gate, ServiceError, Viewer, require_viewer};

use crate::api::AppState;
use crate::model::{UpdateUser, User};

pub fn routes(auth: Arc<dyn Authenticator>) -> Router<AppState> {
    Router::new()
        .route("/v1/users/{id}", get(get_user))
        .route(
            "/v1/users/{id}",
            put(update_user).route_layer(from_fn_with_state(
                Gate::authenticated(auth),
                require_viewer,
            )),
        )
}

async fn get_user(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ServiceError> {
    let user = svc.get_user(&id).map_err(ServiceError::from)?;
    Ok(Json(user))
}

async fn update_user(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<User>, ServiceError> {
    let user = svc
        .update_user(&id, &viewer.user_id, input)
        .map_err(ServiceError::from)?;
    Ok(Json(user))
}
