//! Feed Composer.
//!
//! Anonymous callers (and `mode=latest`) get one ranked listing. A signed-in
//! viewer gets the hybrid feed: up to 50 recent posts from followed authors
//! and up to 50 from everyone else, blended roughly 70/30.

use chrono::{Days, NaiveDate};

use devplaza_core::rfc3339;
use devplaza_sql::Value;

use crate::model::{FeedMode, FeedPage, FeedQuery, Post, SortOrder};
use crate::service::post::{POST_SELECT, posts_from_rows};
use crate::service::{SocialError, SocialService};

/// Candidates fetched per stream in hybrid mode.
const HYBRID_CANDIDATES: i64 = 50;

/// Largest page served. A hybrid page can never hold more than both
/// candidate streams.
const MAX_PAGE_SIZE: i64 = 2 * HYBRID_CANDIDATES;

/// Merge the two hybrid streams into one page.
///
/// Each round takes the next followed post while fewer than
/// `floor(page_size * 0.7)` followed posts have been taken, then the next
/// global post while the page is not full. Rounds continue until the page is
/// full or nothing more can be taken. Followed posts beyond the cap are never
/// used to fill the page.
pub fn blend<T>(following: Vec<T>, global: Vec<T>, page_size: usize) -> Vec<T> {
    let follow_limit = page_size / 10 * 7 + page_size % 10 * 7 / 10;
    let mut out = Vec::with_capacity(page_size.min(following.len() + global.len()));
    let mut following = following.into_iter().peekable();
    let mut global = global.into_iter().peekable();
    let mut taken = 0;

    while out.len() < page_size {
        let before = out.len();
        if taken < follow_limit {
            if let Some(post) = following.next() {
                out.push(post);
                taken += 1;
            }
        }
        if out.len() < page_size {
            if let Some(post) = global.next() {
                out.push(post);
            }
        }
        if following.peek().is_none() && global.peek().is_none() {
            break;
        }
        // Cap reached with only followed posts left.
        if out.len() == before {
            break;
        }
    }
    out
}

/// WHERE clauses with numbered parameters.
struct Conditions {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Conditions {
    fn new() -> Self {
        Self {
            clauses: vec!["p.deleted_at IS NULL".to_string()],
            params: Vec::new(),
        }
    }

    /// Add a parameter, returning its placeholder.
    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("?{}", self.params.len())
    }

    fn filter(query: &FeedQuery) -> Self {
        let mut c = Self::new();
        if let Some(keyword) = query.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            let p = c.bind(Value::Text(format!("%{}%", keyword.to_lowercase())));
            c.clauses.push(format!(
                "(LOWER(p.title) LIKE {p} OR LOWER(p.description) LIKE {p} OR LOWER(u.username) LIKE {p})"
            ));
        }
        if let Some(user_id) = query.user_id.as_deref().filter(|u| !u.is_empty()) {
            let p = c.bind(Value::from(user_id));
            c.clauses.push(format!("p.user_id = {}", p));
        }
        if let Some((start, end)) = date_range(query.start_date.as_deref(), query.end_date.as_deref()) {
            let s = c.bind(Value::Text(start));
            let e = c.bind(Value::Text(end));
            c.clauses.push(format!("p.created_at >= {} AND p.created_at < {}", s, e));
        }
        c
    }

    fn where_sql(&self) -> String {
        format!(" WHERE {}", self.clauses.join(" AND "))
    }
}

/// `[start 00:00, day after end 00:00)` as stored timestamps. Only applied
/// when both dates parse as `YYYY-MM-DD`.
fn date_range(start: Option<&str>, end: Option<&str>) -> Option<(String, String)> {
    let start = NaiveDate::parse_from_str(start?.trim(), "%Y-%m-%d").ok()?;
    let end = NaiveDate::parse_from_str(end?.trim(), "%Y-%m-%d").ok()?;
    let end = end.checked_add_days(Days::new(1))?;
    Some((
        rfc3339(start.and_hms_opt(0, 0, 0)?.and_utc()),
        rfc3339(end.and_hms_opt(0, 0, 0)?.and_utc()),
    ))
}

impl SocialService {
    /// Compose one page of the post feed for an optional viewer.
    pub fn compose_feed(&self, query: &FeedQuery, viewer: Option<&str>) -> Result<FeedPage, SocialError> {
        let page_size = if query.page_size <= 0 {
            10
        } else {
            query.page_size.min(MAX_PAGE_SIZE)
        };
        let page = query.page.max(1);

        let (posts, total) = match viewer {
            Some(viewer) if query.mode == FeedMode::Hybrid => {
                let posts = self.hybrid_feed(query, viewer, page_size)?;
                let total = posts.len() as i64;
                (posts, total)
            }
            _ => self.latest_feed(query, page, page_size)?,
        };

        Ok(FeedPage {
            posts,
            page,
            page_size,
            total,
        })
    }

    fn latest_feed(&self, query: &FeedQuery, page: i64, page_size: i64) -> Result<(Vec<Post>, i64), SocialError> {
        let mut c = Conditions::filter(query);
        let where_sql = c.where_sql();

        let count_rows = self.sql.query(
            &format!(
                "SELECT COUNT(*) AS cnt FROM posts p JOIN users u ON u.id = p.user_id{}",
                where_sql
            ),
            &c.params,
        )?;
        let total = count_rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0);

        let direction = match query.order {
            SortOrder::Desc => "DESC",
            SortOrder::Asc => "ASC",
        };
        let limit = c.bind(Value::Integer(page_size));
        let offset = c.bind(Value::Integer((page - 1).saturating_mul(page_size)));
        let rows = self.sql.query(
            &format!(
                "{}{} ORDER BY p.created_at {}, p.view_count DESC LIMIT {} OFFSET {}",
                POST_SELECT, where_sql, direction, limit, offset
            ),
            &c.params,
        )?;
        Ok((posts_from_rows(&rows)?, total))
    }

    fn hybrid_feed(&self, query: &FeedQuery, viewer: &str, page_size: i64) -> Result<Vec<Post>, SocialError> {
        let following = self.hybrid_stream(query, viewer, true)?;
        let global = self.hybrid_stream(query, viewer, false)?;
        tracing::debug!(
            viewer,
            following = following.len(),
            global = global.len(),
            "hybrid feed candidates"
        );
        Ok(blend(following, global, page_size as usize))
    }

    /// Recent posts by authors the viewer follows (or does not follow).
    fn hybrid_stream(&self, query: &FeedQuery, viewer: &str, followed: bool) -> Result<Vec<Post>, SocialError> {
        let mut c = Conditions::filter(query);
        let v = c.bind(Value::from(viewer));
        c.clauses.push(format!(
            "p.user_id {} (SELECT following_id FROM follows WHERE follower_id = {})",
            if followed { "IN" } else { "NOT IN" },
            v
        ));
        let limit = c.bind(Value::Integer(HYBRID_CANDIDATES));
        let rows = self.sql.query(
            &format!(
                "{}{} ORDER BY p.created_at DESC, p.view_count DESC LIMIT {}",
                POST_SELECT,
                c.where_sql(),
                limit
            ),
            &c.params,
        )?;
        posts_from_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::Fixture;

    fn tagged(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    #[test]
    fn test_blend_five_following_twenty_global() {
        let page = blend(tagged("f", 5), tagged("g", 20), 10);
        assert_eq!(page.len(), 10);
        assert_eq!(page.iter().filter(|p| p.starts_with('f')).count(), 5);
        assert_eq!(
            page,
            vec!["f0", "g0", "f1", "g1", "f2", "g2", "f3", "g3", "f4", "g4"]
        );
    }

    #[test]
    fn test_blend_no_following() {
        let page = blend(Vec::new(), tagged("g", 12), 10);
        assert_eq!(page, tagged("g", 10));
    }

    #[test]
    fn test_blend_caps_following_share() {
        // Followed posts alternate with global ones until the page fills.
        let page = blend(tagged("f", 20), tagged("g", 20), 10);
        assert_eq!(page.len(), 10);
        assert_eq!(page.iter().filter(|p| p.starts_with('f')).count(), 5);

        // Global runs dry after one post: followed posts stop at the cap of 7.
        let page = blend(tagged("f", 20), tagged("g", 1), 10);
        assert_eq!(page.iter().filter(|p| p.starts_with('f')).count(), 7);
        assert_eq!(page.len(), 8);

        // Only followed posts: the page stays short of full.
        let page = blend(tagged("f", 20), Vec::new(), 10);
        assert_eq!(page, tagged("f", 7));
    }

    #[test]
    fn test_blend_follow_limit_floors() {
        assert_eq!(blend(tagged("f", 20), Vec::new(), 6).len(), 4);
        assert_eq!(blend(tagged("f", 20), Vec::new(), 3).len(), 2);
        assert_eq!(blend(tagged("f", 20), Vec::new(), 100).len(), 20);
    }

    #[test]
    fn test_blend_huge_page_size() {
        let page = blend(tagged("f", 3), tagged("g", 3), usize::MAX);
        assert_eq!(page.len(), 6);
    }

    #[test]
    fn test_blend_small_streams() {
        assert!(blend::<String>(Vec::new(), Vec::new(), 10).is_empty());
        assert_eq!(blend(tagged("f", 3), tagged("g", 2), 10).len(), 5);
        // page_size 1: the follow cap is 0.
        assert_eq!(blend(tagged("f", 3), tagged("g", 2), 1), vec!["g0"]);
    }

    #[test]
    fn test_date_range() {
        assert_eq!(
            date_range(Some("2025-03-01"), Some("2025-03-31")),
            Some((
                "2025-03-01T00:00:00.000000Z".to_string(),
                "2025-04-01T00:00:00.000000Z".to_string()
            ))
        );
        assert_eq!(date_range(Some("2025-03-01"), None), None);
        assert_eq!(date_range(Some("yesterday"), Some("2025-03-31")), None);
    }

    fn ts(day: u32, hour: u32) -> String {
        format!("2025-03-{:02}T{:02}:00:00.000000Z", day, hour)
    }

    #[test]
    fn test_hybrid_feed_blends_streams() {
        let fx = Fixture::new();
        let viewer = fx.user("viewer");
        let friend = fx.user("friend");
        let stranger = fx.user("stranger");
        fx.social.follow(&viewer, &friend).unwrap();

        for i in 0..5 {
            fx.post_at(&friend, &format!("friend {}", i), &ts(10, i));
        }
        for i in 0..20 {
            fx.post_at(&stranger, &format!("stranger {}", i), &ts(11, i));
        }

        let query = FeedQuery {
            page_size: 10,
            ..Default::default()
        };
        let page = fx.social.compose_feed(&query, Some(&viewer)).unwrap();
        assert_eq!(page.posts.len(), 10);
        assert_eq!(page.total, 10);
        let from_friend: Vec<&Post> = page.posts.iter().filter(|p| p.user_id == friend).collect();
        assert_eq!(from_friend.len(), 5);
        // Newest first within each stream.
        assert_eq!(page.posts[0].title, "friend 4");
        assert_eq!(page.posts[1].title, "stranger 19");
    }

    #[test]
    fn test_hybrid_without_follows_is_global() {
        let fx = Fixture::new();
        let viewer = fx.user("viewer");
        let other = fx.user("other");
        for i in 0..12 {
            fx.post_at(&other, &format!("p{}", i), &ts(1, i));
        }
        let query = FeedQuery {
            page_size: 10,
            ..Default::default()
        };
        let page = fx.social.compose_feed(&query, Some(&viewer)).unwrap();
        assert_eq!(page.posts.len(), 10);
        assert!(page.posts.iter().all(|p| p.user_id == other));
    }

    #[test]
    fn test_latest_feed_pagination_and_order() {
        let fx = Fixture::new();
        let alice = fx.user("alice");
        for i in 0..7 {
            fx.post_at(&alice, &format!("p{}", i), &ts(2, i));
        }

        let mut query = FeedQuery {
            page: 2,
            page_size: 3,
            ..Default::default()
        };
        let page = fx.social.compose_feed(&query, None).unwrap();
        assert_eq!(page.total, 7);
        let titles: Vec<&str> = page.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["p3", "p2", "p1"]);

        query.order = SortOrder::Asc;
        query.page = 0;
        let page = fx.social.compose_feed(&query, None).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.posts[0].title, "p0");

        // A viewer asking for latest gets the same listing.
        query.mode = FeedMode::Latest;
        let viewed = fx.social.compose_feed(&query, Some(&alice)).unwrap();
        assert_eq!(viewed.total, 7);
    }

    #[test]
    fn test_view_count_breaks_ties() {
        let fx = Fixture::new();
        let alice = fx.user("alice");
        let quiet = fx.post_at(&alice, "quiet", &ts(3, 0));
        let busy = fx.post_at(&alice, "busy", &ts(3, 0));
        fx.social.get_post(&busy).unwrap();

        let page = fx.social.compose_feed(&FeedQuery::default(), None).unwrap();
        assert_eq!(page.posts[0].id, busy);
        assert_eq!(page.posts[1].id, quiet);
    }

    #[test]
    fn test_filters() {
        let fx = Fixture::new();
        let alice = fx.user("alice");
        let bob = fx.user("Bobby");
        fx.post_at(&alice, "Rust tips", &ts(5, 1));
        fx.post_at(&alice, "Go tips", &ts(6, 1));
        fx.post_at(&bob, "misc", &ts(7, 1));
        let gone = fx.post_at(&bob, "rusty", &ts(7, 2));
        fx.social.delete_post(&gone, &bob).unwrap();

        let search = |q: FeedQuery| {
            let mut titles: Vec<String> = fx
                .social
                .compose_feed(&q, None)
                .unwrap()
                .posts
                .into_iter()
                .map(|p| p.title)
                .collect();
            titles.sort();
            titles
        };

        assert_eq!(
            search(FeedQuery { keyword: Some("RUST".into()), ..Default::default() }),
            vec!["Rust tips"]
        );
        // Author name matches too.
        assert_eq!(
            search(FeedQuery { keyword: Some("bob".into()), ..Default::default() }),
            vec!["misc"]
        );
        assert_eq!(
            search(FeedQuery { user_id: Some(alice.clone()), ..Default::default() }),
            vec!["Go tips", "Rust tips"]
        );
        assert_eq!(
            search(FeedQuery {
                start_date: Some("2025-03-06".into()),
                end_date: Some("2025-03-07".into()),
                ..Default::default()
            }),
            vec!["Go tips", "misc"]
        );
        // Half a range is ignored.
        assert_eq!(
            search(FeedQuery { start_date: Some("2025-03-06".into()), ..Default::default() }).len(),
            3
        );
    }

    #[test]
    fn test_oversized_paging_is_clamped() {
        let fx = Fixture::new();
        let viewer = fx.user("viewer");
        let alice = fx.user("alice");
        for i in 0..3 {
            fx.post_at(&alice, &format!("p{}", i), &ts(8, i));
        }

        let huge = FeedQuery {
            page_size: i64::MAX,
            ..Default::default()
        };
        let page = fx.social.compose_feed(&huge, Some(&viewer)).unwrap();
        assert_eq!(page.page_size, 100);
        assert_eq!(page.posts.len(), 3);

        let page = fx.social.compose_feed(&huge, None).unwrap();
        assert_eq!(page.page_size, 100);
        assert_eq!(page.total, 3);

        let far = FeedQuery {
            page: i64::MAX,
            page_size: 10,
            ..Default::default()
        };
        let page = fx.social.compose_feed(&far, None).unwrap();
        assert!(page.posts.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_page_size_defaults_to_ten() {
        let fx = Fixture::new();
        let alice = fx.user("alice");
        for i in 0..12 {
            fx.post_at(&alice, &format!("p{}", i), &ts(4, i));
        }
        let page = fx
            .social
            .compose_feed(&FeedQuery { page_size: 0, ..Default::default() }, None)
            .unwrap();
        assert_eq!(page.page_size, 10);
        assert_eq!(page.posts.len(), 10);
    }
}
