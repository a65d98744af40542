//! Status Aggregator: a viewer's interaction state over a batch of posts.

use std::collections::BTreeSet;

use devplaza_sql::{Value, placeholders};

use crate::model::{PostStatus, StatusReport};
use crate::service::{Reaction, SocialError, SocialService};

impl SocialService {
    /// Like/favorite flags for each of `post_ids`, plus the authors of those
    /// posts that `viewer` follows.
    ///
    /// Unknown or deleted post ids get both flags unset and contribute no
    /// author. Read-only.
    pub fn post_statuses(&self, viewer: &str, post_ids: &[String]) -> Result<StatusReport, SocialError> {
        let liked = self.active_reactions(Reaction::Like, viewer, post_ids)?;
        let favorited = self.active_reactions(Reaction::Favorite, viewer, post_ids)?;

        let authors = self.authors_of(post_ids)?;
        let followed: BTreeSet<String> = self.following_set_of(viewer, &authors)?.into_iter().collect();

        let status = post_ids
            .iter()
            .map(|id| PostStatus {
                post_id: id.clone(),
                liked: liked.contains(id),
                favorited: favorited.contains(id),
            })
            .collect();

        Ok(StatusReport {
            status,
            followed: followed.into_iter().collect(),
        })
    }

    /// Distinct authors of the live posts among `post_ids`.
    fn authors_of(&self, post_ids: &[String]) -> Result<Vec<String>, SocialError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT DISTINCT user_id FROM posts WHERE deleted_at IS NULL AND id IN ({})",
            placeholders(1, post_ids.len())
        );
        let params: Vec<Value> = post_ids.iter().map(|id| Value::from(id.as_str())).collect();
        let rows = self.sql.query(&sql, &params)?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get_str("user_id").map(str::to_string))
            .collect())
    }
}
