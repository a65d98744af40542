use serde::{Deserialize, Serialize};

/// Public profile of a post's author, embedded in post listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// A short community post.
///
/// `like_count` and `favorite_count` are maintained only by the counter
/// operations and always equal the number of active reactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Author user id.
    pub user_id: String,

    pub title: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub view_count: i64,
    pub like_count: i64,
    pub favorite_count: i64,

    /// Author profile, filled in by reads that join users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,

    /// Set while the post is soft-deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
}

/// Input for creating a post.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for editing a post. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePost {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}
