use serde::{Deserialize, Serialize};

/// Whether the caller follows `user_id`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FollowState {
    pub user_id: String,
    pub is_following: bool,
}

/// Body of `POST /v1/users/follow/states`.
#[derive(Debug, Clone, Deserialize)]
pub struct FollowStatesRequest {
    pub user_ids: Vec<String>,
}
