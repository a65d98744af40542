use serde::Serialize;

/// The viewer's interaction with one post.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PostStatus {
    pub post_id: String,
    pub liked: bool,
    pub favorited: bool,
}

/// Per-post flags for a batch of posts, plus which of their authors the
/// viewer follows.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusReport {
    /// One entry per requested post, in request order.
    pub status: Vec<PostStatus>,
    /// Followed author ids, sorted.
    pub followed: Vec<String>,
}
