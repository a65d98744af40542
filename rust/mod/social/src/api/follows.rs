use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::post;
use axum::{Json, Router};

use devplaza_core::{Authenticator, Gate, ServiceError, Viewer, require_viewer};

use crate::api::AppState;
use crate::model::{FollowState, FollowStatesRequest};

pub fn routes(auth: Arc<dyn Authenticator>) -> Router<AppState> {
    Router::new()
        .route("/v1/users/follow/states", post(follow_states))
        .route("/v1/users/follow/{id}", post(follow))
        .route("/v1/users/unfollow/{id}", post(unfollow))
        .route_layer(from_fn_with_state(Gate::authenticated(auth), require_viewer))
}

async fn follow(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.follow(&viewer.user_id, &id).map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unfollow(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.unfollow(&viewer.user_id, &id).map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/users/follow/states: whether the caller follows each user.
async fn follow_states(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(input): Json<FollowStatesRequest>,
) -> Result<Json<Vec<FollowState>>, ServiceError> {
    let states = svc
        .follow_states(&viewer.user_id, &input.user_ids)
        .map_err(ServiceError::from)?;
    Ok(Json(states))
}
