//! Counter Store: likes and favorites.
//!
//! Each (post, user) pair owns at most one reaction row for its whole
//! history. The row's state says whether it currently counts:
//!
//! | current   | react          | retract     |
//! |-----------|----------------|-------------|
//! | absent    | insert, +1     | no-op       |
//! | active    | Conflict       | retract, -1 |
//! | retracted | reactivate, +1 | no-op       |
//!
//! The row change and the post counter change commit together.

use std::collections::HashSet;

use devplaza_core::{new_id, now_rfc3339};
use devplaza_sql::{SQLTransaction, Value, placeholders};

use crate::service::{SocialError, SocialService};

/// The two kinds of reaction. They behave identically on different tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Favorite,
}

impl Reaction {
    fn table(self) -> &'static str {
        match self {
            Reaction::Like => "post_likes",
            Reaction::Favorite => "post_favorites",
        }
    }

    fn counter(self) -> &'static str {
        match self {
            Reaction::Like => "like_count",
            Reaction::Favorite => "favorite_count",
        }
    }

    fn past(self) -> &'static str {
        match self {
            Reaction::Like => "liked",
            Reaction::Favorite => "favorited",
        }
    }
}

/// Lifecycle state of a reaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReactionState {
    Active,
    Retracted,
}

impl ReactionState {
    fn as_str(self) -> &'static str {
        match self {
            ReactionState::Active => "active",
            ReactionState::Retracted => "retracted",
        }
    }

    fn parse(s: &str) -> Result<Self, SocialError> {
        match s {
            "active" => Ok(ReactionState::Active),
            "retracted" => Ok(ReactionState::Retracted),
            other => Err(SocialError::Internal(format!("unknown reaction state '{}'", other))),
        }
    }
}

fn current_state(
    tx: &dyn SQLTransaction,
    reaction: Reaction,
    post_id: &str,
    user_id: &str,
) -> Result<Option<ReactionState>, SocialError> {
    let rows = tx.query(
        &format!(
            "SELECT state FROM {} WHERE post_id = ?1 AND user_id = ?2",
            reaction.table()
        ),
        &[Value::from(post_id), Value::from(user_id)],
    )?;
    rows.first()
        .and_then(|r| r.get_str("state"))
        .map(ReactionState::parse)
        .transpose()
}

impl SocialService {
    /// Record an active reaction of `user_id` on a live post.
    pub fn react(&self, reaction: Reaction, post_id: &str, user_id: &str) -> Result<(), SocialError> {
        let tx = self.sql.begin()?;

        let live = tx.query(
            "SELECT id FROM posts WHERE id = ?1 AND deleted_at IS NULL",
            &[Value::from(post_id)],
        )?;
        if live.is_empty() {
            return Err(SocialError::NotFound(format!("post '{}'", post_id)));
        }

        let now = now_rfc3339();
        match current_state(&*tx, reaction, post_id, user_id)? {
            Some(ReactionState::Active) => {
                return Err(SocialError::Conflict(format!(
                    "post '{}' already {}",
                    post_id,
                    reaction.past()
                )));
            }
            Some(ReactionState::Retracted) => {
                tx.exec(
                    &format!(
                        "UPDATE {} SET state = ?1, updated_at = ?2 WHERE post_id = ?3 AND user_id = ?4",
                        reaction.table()
                    ),
                    &[
                        Value::from(ReactionState::Active.as_str()),
                        Value::from(now),
                        Value::from(post_id),
                        Value::from(user_id),
                    ],
                )?;
            }
            None => {
                tx.exec(
                    &format!(
                        "INSERT INTO {} (id, post_id, user_id, state, created_at, updated_at) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                        reaction.table()
                    ),
                    &[
                        Value::from(new_id()),
                        Value::from(post_id),
                        Value::from(user_id),
                        Value::from(ReactionState::Active.as_str()),
                        Value::from(now),
                    ],
                )?;
            }
        }

        tx.exec(
            &format!(
                "UPDATE posts SET {0} = {0} + 1 WHERE id = ?1",
                reaction.counter()
            ),
            &[Value::from(post_id)],
        )?;
        tx.commit()?;

        tracing::debug!(post = post_id, user = user_id, "{}", reaction.past());
        Ok(())
    }

    /// Retract an active reaction. Nothing to retract is not an error.
    pub fn retract(&self, reaction: Reaction, post_id: &str, user_id: &str) -> Result<(), SocialError> {
        let tx = self.sql.begin()?;

        let affected = tx.exec(
            &format!(
                "UPDATE {} SET state = ?1, updated_at = ?2 \
                 WHERE post_id = ?3 AND user_id = ?4 AND state = ?5",
                reaction.table()
            ),
            &[
                Value::from(ReactionState::Retracted.as_str()),
                Value::from(now_rfc3339()),
                Value::from(post_id),
                Value::from(user_id),
                Value::from(ReactionState::Active.as_str()),
            ],
        )?;
        if affected > 0 {
            tx.exec(
                &format!(
                    "UPDATE posts SET {0} = {0} - 1 WHERE id = ?1",
                    reaction.counter()
                ),
                &[Value::from(post_id)],
            )?;
        }
        tx.commit()?;

        if affected > 0 {
            tracing::debug!(post = post_id, user = user_id, "un{}", reaction.past());
        }
        Ok(())
    }

    pub fn like(&self, post_id: &str, user_id: &str) -> Result<(), SocialError> {
        self.react(Reaction::Like, post_id, user_id)
    }

    pub fn unlike(&self, post_id: &str, user_id: &str) -> Result<(), SocialError> {
        self.retract(Reaction::Like, post_id, user_id)
    }

    pub fn favorite(&self, post_id: &str, user_id: &str) -> Result<(), SocialError> {
        self.react(Reaction::Favorite, post_id, user_id)
    }

    pub fn unfavorite(&self, post_id: &str, user_id: &str) -> Result<(), SocialError> {
        self.retract(Reaction::Favorite, post_id, user_id)
    }

    /// The subset of `post_ids` on which `user_id` has an active reaction.
    pub fn active_reactions(
        &self,
        reaction: Reaction,
        user_id: &str,
        post_ids: &[String],
    ) -> Result<HashSet<String>, SocialError> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let sql = format!(
            "SELECT post_id FROM {} WHERE user_id = ?1 AND state = ?2 AND post_id IN ({})",
            reaction.table(),
            placeholders(3, post_ids.len())
        );
        let mut params = vec![
            Value::from(user_id),
            Value::from(ReactionState::Active.as_str()),
        ];
        params.extend(post_ids.iter().map(|id| Value::from(id.as_str())));

        let rows = self.sql.query(&sql, &params)?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get_str("post_id").map(str::to_string))
            .collect())
    }
}
