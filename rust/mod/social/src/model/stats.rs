use serde::Serialize;

use crate::model::Post;

/// An author ranked by number of live posts.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuthorActivity {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub post_count: i64,
}

/// Post statistics for the community dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct PostStats {
    pub total_posts: i64,
    /// Distinct authors with at least one live post.
    pub active_user_count: i64,
    /// Posts created in the last seven days, today included.
    pub weekly_post_count: i64,
    pub weekly_hot_posts: Vec<Post>,
    pub all_time_hot_posts: Vec<Post>,
    pub top_active_users: Vec<AuthorActivity>,
}
