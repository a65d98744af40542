use serde::{Deserialize, Serialize};

use crate::model::Post;

/// How the feed is composed for a signed-in viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    /// Blend followed authors with everyone else, roughly 70/30.
    #[default]
    Hybrid,
    /// One ranked listing, as anonymous callers see it.
    Latest,
}

/// Recency direction for the single ranked listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Desc,
    Asc,
}

/// Feed filter, as read from the query string.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedQuery {
    /// Case-insensitive substring of title, description or author name.
    #[serde(default)]
    pub keyword: Option<String>,

    /// Only posts by this author.
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub order: SortOrder,

    #[serde(default = "default_page")]
    pub page: i64,

    #[serde(default = "default_page_size")]
    pub page_size: i64,

    /// `YYYY-MM-DD`; used only together with a valid `end_date`.
    #[serde(default)]
    pub start_date: Option<String>,

    /// `YYYY-MM-DD`, inclusive of the whole day.
    #[serde(default)]
    pub end_date: Option<String>,

    #[serde(default)]
    pub mode: FeedMode,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    6
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            user_id: None,
            order: SortOrder::Desc,
            page: default_page(),
            page_size: default_page_size(),
            start_date: None,
            end_date: None,
            mode: FeedMode::Hybrid,
        }
    }
}

/// One page of the feed.
///
/// In hybrid mode `total` is the number of posts returned, not the number
/// of matching posts.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}
