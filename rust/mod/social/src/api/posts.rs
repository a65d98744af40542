use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use devplaza_core::{Authenticator, Gate, ServiceError, Viewer, optional_viewer, require_viewer};

use crate::api::AppState;
use crate::model::{CreatePost, FeedPage, FeedQuery, Post, PostStats, StatusReport, UpdatePost};
use crate::service::Reaction;

/// Entries per list in `GET /v1/posts/stats`.
const STATS_LIMIT: i64 = 6;

pub fn routes(auth: Arc<dyn Authenticator>) -> Router<AppState> {
    let signed_in = || from_fn_with_state(Gate::authenticated(auth.clone()), require_viewer);
    let writer = from_fn_with_state(Gate::permission(auth.clone(), "blog:write"), require_viewer);
    let deleter = from_fn_with_state(Gate::permission(auth.clone(), "blog:delete"), require_viewer);

    Router::new()
        .route(
            "/v1/posts",
            get(list_posts).route_layer(from_fn_with_state(
                Gate::authenticated(auth.clone()),
                optional_viewer,
            )),
        )
        .route("/v1/posts", post(create_post).route_layer(writer.clone()))
        .route("/v1/posts/stats", get(post_stats))
        .route("/v1/posts/status", get(post_status).route_layer(signed_in()))
        .route("/v1/posts/{id}", get(get_post))
        .route("/v1/posts/{id}", put(update_post).route_layer(writer))
        .route("/v1/posts/{id}", delete(delete_post).route_layer(deleter.clone()))
        .route("/v1/posts/{id}/restore", post(restore_post).route_layer(deleter))
        .route("/v1/posts/{id}/like", post(like).route_layer(signed_in()))
        .route("/v1/posts/{id}/unlike", post(unlike).route_layer(signed_in()))
        .route("/v1/posts/{id}/favorite", post(favorite).route_layer(signed_in()))
        .route("/v1/posts/{id}/unfavorite", post(unfavorite).route_layer(signed_in()))
}

/// GET /v1/posts: the feed; hybrid for signed-in viewers.
async fn list_posts(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Option<Viewer>>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedPage>, ServiceError> {
    let viewer = viewer.as_ref().map(|v| v.user_id.as_str());
    let page = svc.compose_feed(&query, viewer).map_err(ServiceError::from)?;
    Ok(Json(page))
}

async fn create_post(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(input): Json<CreatePost>,
) -> Result<(StatusCode, Json<Post>), ServiceError> {
    let post = svc
        .create_post(&viewer.user_id, input)
        .map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Post>, ServiceError> {
    let post = svc.get_post(&id).map_err(ServiceError::from)?;
    Ok(Json(post))
}

async fn update_post(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePost>,
) -> Result<Json<Post>, ServiceError> {
    let post = svc
        .update_post(&id, &viewer.user_id, input)
        .map_err(ServiceError::from)?;
    Ok(Json(post))
}

async fn delete_post(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_post(&id, &viewer.user_id)
        .map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn restore_post(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<Json<Post>, ServiceError> {
    let post = svc
        .restore_post(&id, &viewer.user_id)
        .map_err(ServiceError::from)?;
    Ok(Json(post))
}

async fn post_stats(State(svc): State<AppState>) -> Result<Json<PostStats>, ServiceError> {
    let stats = svc.post_stats(STATS_LIMIT).map_err(ServiceError::from)?;
    Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
struct StatusParams {
    #[serde(default)]
    ids: String,
}

/// GET /v1/posts/status?ids=a,b,c: the caller's flags on each post.
async fn post_status(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Query(params): Query<StatusParams>,
) -> Result<Json<StatusReport>, ServiceError> {
    let ids: Vec<String> = params
        .ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    if ids.is_empty() {
        return Err(ServiceError::Validation("ids is required".into()));
    }
    let report = svc
        .post_statuses(&viewer.user_id, &ids)
        .map_err(ServiceError::from)?;
    Ok(Json(report))
}

async fn like(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.react(Reaction::Like, &id, &viewer.user_id)
        .map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unlike(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.retract(Reaction::Like, &id, &viewer.user_id)
        .map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn favorite(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.react(Reaction::Favorite, &id, &viewer.user_id)
        .map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unfavorite(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.retract(Reaction::Favorite, &id, &viewer.user_id)
        .map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
