//! Follow Graph: directed follower -> following edges.

use std::collections::HashSet;

use devplaza_core::now_rfc3339;
use devplaza_sql::{Value, placeholders};

use crate::model::FollowState;
use crate::service::{SocialError, SocialService};

impl SocialService {
    /// Make `follower` follow `following`.
    pub fn follow(&self, follower: &str, following: &str) -> Result<(), SocialError> {
        if follower == following {
            return Err(SocialError::Conflict("cannot follow yourself".into()));
        }
        let tx = self.sql.begin()?;

        let target = tx.query("SELECT id FROM users WHERE id = ?1", &[Value::from(following)])?;
        if target.is_empty() {
            return Err(SocialError::NotFound(format!("user '{}'", following)));
        }
        let edge = tx.query(
            "SELECT 1 AS one FROM follows WHERE follower_id = ?1 AND following_id = ?2",
            &[Value::from(follower), Value::from(following)],
        )?;
        if !edge.is_empty() {
            return Err(SocialError::Conflict(format!("already following '{}'", following)));
        }
        tx.exec(
            "INSERT INTO follows (follower_id, following_id, created_at) VALUES (?1, ?2, ?3)",
            &[Value::from(follower), Value::from(following), Value::from(now_rfc3339())],
        )?;
        tx.commit()?;

        tracing::debug!(follower, following, "followed");
        Ok(())
    }

    /// Remove the edge `follower` -> `following`.
    pub fn unfollow(&self, follower: &str, following: &str) -> Result<(), SocialError> {
        let affected = self.sql.exec(
            "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
            &[Value::from(follower), Value::from(following)],
        )?;
        if affected == 0 {
            return Err(SocialError::NotFound(format!("not following '{}'", following)));
        }
        tracing::debug!(follower, following, "unfollowed");
        Ok(())
    }

    pub fn is_following(&self, follower: &str, following: &str) -> Result<bool, SocialError> {
        let rows = self.sql.query(
            "SELECT 1 AS one FROM follows WHERE follower_id = ?1 AND following_id = ?2",
            &[Value::from(follower), Value::from(following)],
        )?;
        Ok(!rows.is_empty())
    }

    /// The members of `candidates` that `follower` follows.
    pub fn following_set_of(
        &self,
        follower: &str,
        candidates: &[String],
    ) -> Result<HashSet<String>, SocialError> {
        if candidates.is_empty() {
            return Ok(HashSet::new());
        }
        let sql = format!(
            "SELECT following_id FROM follows WHERE follower_id = ?1 AND following_id IN ({})",
            placeholders(2, candidates.len())
        );
        let mut params = vec![Value::from(follower)];
        params.extend(candidates.iter().map(|id| Value::from(id.as_str())));

        let rows = self.sql.query(&sql, &params)?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get_str("following_id").map(str::to_string))
            .collect())
    }

    /// Follow state of each of `user_ids`, in input order.
    pub fn follow_states(
        &self,
        follower: &str,
        user_ids: &[String],
    ) -> Result<Vec<FollowState>, SocialError> {
        let followed = self.following_set_of(follower, user_ids)?;
        Ok(user_ids
            .iter()
            .map(|id| FollowState {
                user_id: id.clone(),
                is_following: followed.contains(id),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::Fixture;

    #[test]
    fn test_follow_rules() {
        let fx = Fixture::new();
        let a = fx.user("a");
        let b = fx.user("b");

        assert!(matches!(fx.social.follow(&a, &a), Err(SocialError::Conflict(_))));
        assert!(matches!(
            fx.social.unfollow(&a, &b),
            Err(SocialError::NotFound(_))
        ));

        fx.social.follow(&a, &b).unwrap();
        assert!(matches!(fx.social.follow(&a, &b), Err(SocialError::Conflict(_))));
        assert!(fx.social.is_following(&a, &b).unwrap());
        assert!(!fx.social.is_following(&b, &a).unwrap());

        fx.social.unfollow(&a, &b).unwrap();
        assert!(!fx.social.is_following(&a, &b).unwrap());
    }

    #[test]
    fn test_follow_unknown_user() {
        let fx = Fixture::new();
        let a = fx.user("a");
        assert!(matches!(
            fx.social.follow(&a, "ghost"),
            Err(SocialError::NotFound(_))
        ));
    }

    #[test]
    fn test_following_set_restricted_to_candidates() {
        let fx = Fixture::new();
        let a = fx.user("a");
        let b = fx.user("b");
        let c = fx.user("c");
        let d = fx.user("d");
        fx.social.follow(&a, &b).unwrap();
        fx.social.follow(&a, &c).unwrap();

        let set = fx
            .social
            .following_set_of(&a, &[b.clone(), d.clone()])
            .unwrap();
        assert_eq!(set, HashSet::from([b.clone()]));
        assert!(fx.social.following_set_of(&a, &[]).unwrap().is_empty());

        let states = fx.social.follow_states(&a, &[d.clone(), c.clone()]).unwrap();
        assert_eq!(
            states,
            vec![
                FollowState { user_id: d, is_following: false },
                FollowState { user_id: c, is_following: true },
            ]
        );
    }
}
