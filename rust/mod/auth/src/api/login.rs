use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use devplaza_core::ServiceError;

use crate::api::AppState;
use crate::model::{LoginRequest, LoginResponse};

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/login", post(login))
}

/// POST /v1/login: exchange a provider code for a token.
async fn login(
    State(svc): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    let resp = svc.login(&input.code).await.map_err(ServiceError::from)?;
    Ok(Json(resp))
}
