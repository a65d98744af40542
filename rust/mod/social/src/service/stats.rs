//! Community post statistics.

use chrono::{DateTime, Days, Utc};

use devplaza_core::rfc3339;
use devplaza_sql::Value;

use crate::model::{AuthorActivity, PostStats};
use crate::service::post::{POST_SELECT, posts_from_rows};
use crate::service::{SocialError, SocialService};

/// Start of the seven-day window ending today.
fn week_start(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    now.date_naive()
        .checked_sub_days(Days::new(6))?
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
}

impl SocialService {
    /// Post totals, hot posts and the most active authors, each list capped
    /// at `limit`. Soft-deleted posts are not counted.
    pub fn post_stats(&self, limit: i64) -> Result<PostStats, SocialError> {
        self.post_stats_at(limit, Utc::now())
    }

    pub(crate) fn post_stats_at(&self, limit: i64, now: DateTime<Utc>) -> Result<PostStats, SocialError> {
        let since = week_start(now)
            .map(rfc3339)
            .ok_or_else(|| SocialError::Internal("date out of range".into()))?;

        let rows = self.sql.query(
            "SELECT \
                (SELECT COUNT(*) FROM posts WHERE deleted_at IS NULL) AS total_posts, \
                (SELECT COUNT(*) FROM posts WHERE deleted_at IS NULL AND created_at >= ?1) AS weekly_posts, \
                (SELECT COUNT(DISTINCT user_id) FROM posts WHERE deleted_at IS NULL) AS active_users",
            &[Value::from(since.as_str())],
        )?;
        let totals = rows
            .first()
            .ok_or_else(|| SocialError::Internal("empty stats row".into()))?;

        let weekly_hot_posts = posts_from_rows(&self.sql.query(
            &format!(
                "{} WHERE p.deleted_at IS NULL AND p.created_at >= ?1 \
                 ORDER BY p.view_count DESC, p.created_at DESC LIMIT ?2",
                POST_SELECT
            ),
            &[Value::from(since.as_str()), Value::Integer(limit)],
        )?)?;

        let all_time_hot_posts = posts_from_rows(&self.sql.query(
            &format!(
                "{} WHERE p.deleted_at IS NULL ORDER BY p.view_count DESC, p.created_at DESC LIMIT ?1",
                POST_SELECT
            ),
            &[Value::Integer(limit)],
        )?)?;

        let top_active_users = self
            .sql
            .query(
                "SELECT u.id, u.username, u.avatar, COUNT(p.id) AS post_count \
                 FROM users u JOIN posts p ON p.user_id = u.id \
                 WHERE p.deleted_at IS NULL \
                 GROUP BY u.id, u.username, u.avatar \
                 ORDER BY post_count DESC, u.username ASC LIMIT ?1",
                &[Value::Integer(limit)],
            )?
            .iter()
            .map(|r| AuthorActivity {
                id: r.get_str("id").unwrap_or_default().to_string(),
                username: r.get_str("username").unwrap_or_default().to_string(),
                avatar: r.get_str("avatar").map(str::to_string),
                post_count: r.get_i64("post_count").unwrap_or(0),
            })
            .collect();

        Ok(PostStats {
            total_posts: totals.get_i64("total_posts").unwrap_or(0),
            active_user_count: totals.get_i64("active_users").unwrap_or(0),
            weekly_post_count: totals.get_i64("weekly_posts").unwrap_or(0),
            weekly_hot_posts,
            all_time_hot_posts,
            top_active_users,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::Fixture;
    use chrono::TimeZone;

    #[test]
    fn test_week_start() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 15, 30, 0).unwrap();
        assert_eq!(
            week_start(now).map(rfc3339).as_deref(),
            Some("2025-03-04T00:00:00.000000Z")
        );
    }

    #[test]
    fn test_post_stats() {
        let fx = Fixture::new();
        let alice = fx.user("alice");
        let bob = fx.user("bob");
        let _carol = fx.user("carol");

        let old = fx.post_at(&alice, "old", "2025-02-01T08:00:00.000000Z");
        let fresh = fx.post_at(&alice, "fresh", "2025-03-09T08:00:00.000000Z");
        fx.post_at(&bob, "bob's", "2025-03-05T08:00:00.000000Z");
        let gone = fx.post_at(&bob, "gone", "2025-03-08T08:00:00.000000Z");
        fx.social.delete_post(&gone, &bob).unwrap();

        for _ in 0..3 {
            fx.social.get_post(&old).unwrap();
        }
        fx.social.get_post(&fresh).unwrap();

        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let stats = fx.social.post_stats_at(6, now).unwrap();
        assert_eq!(stats.total_posts, 3);
        assert_eq!(stats.weekly_post_count, 2);
        assert_eq!(stats.active_user_count, 2);

        assert_eq!(stats.all_time_hot_posts[0].id, old);
        assert_eq!(stats.all_time_hot_posts.len(), 3);
        assert_eq!(stats.weekly_hot_posts[0].id, fresh);
        assert_eq!(stats.weekly_hot_posts.len(), 2);

        assert_eq!(stats.top_active_users.len(), 2);
        assert_eq!(stats.top_active_users[0].id, alice);
        assert_eq!(stats.top_active_users[0].post_count, 2);
        assert_eq!(stats.top_active_users[1].post_count, 1);
    }

    #[test]
    fn test_limit_caps_lists() {
        let fx = Fixture::new();
        let alice = fx.user("alice");
        for i in 0..4 {
            fx.post(&alice, &format!("p{}", i));
        }
        let stats = fx.social.post_stats(2).unwrap();
        assert_eq!(stats.total_posts, 4);
        assert_eq!(stats.all_time_hot_posts.len(), 2);
        assert_eq!(stats.top_active_users.len(), 1);
    }
}
