use devplaza_core::{new_id, now_rfc3339};
use devplaza_sql::{Row, SQLError, Value};

use crate::model::{Author, CreatePost, Post, UpdatePost};
use crate::service::{SocialError, SocialService};

/// Post columns joined with the author profile. Callers append filters.
pub(crate) const POST_SELECT: &str = "SELECT p.id, p.user_id, p.title, p.description, p.twitter, \
     p.tags, p.view_count, p.like_count, p.favorite_count, p.created_at, p.updated_at, \
     p.deleted_at, u.username AS author_username, u.avatar AS author_avatar \
     FROM posts p JOIN users u ON u.id = p.user_id";

fn text(row: &Row, name: &str) -> Result<String, SocialError> {
    row.get_str(name)
        .map(str::to_string)
        .ok_or_else(|| SocialError::Internal(format!("posts.{} is missing", name)))
}

pub(crate) fn post_from_row(row: &Row) -> Result<Post, SocialError> {
    let tags = match row.get_str("tags") {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| SocialError::Internal(format!("bad tags column: {}", e)))?,
        None => Vec::new(),
    };
    let user_id = text(row, "user_id")?;
    let author = row.get_str("author_username").map(|username| Author {
        id: user_id.clone(),
        username: username.to_string(),
        avatar: row.get_str("author_avatar").map(str::to_string),
    });
    Ok(Post {
        id: text(row, "id")?,
        user_id,
        title: text(row, "title")?,
        description: text(row, "description")?,
        twitter: row.get_str("twitter").map(str::to_string),
        tags,
        view_count: row.get_i64("view_count").unwrap_or(0),
        like_count: row.get_i64("like_count").unwrap_or(0),
        favorite_count: row.get_i64("favorite_count").unwrap_or(0),
        author,
        created_at: text(row, "created_at")?,
        updated_at: text(row, "updated_at")?,
        deleted_at: row.get_str("deleted_at").map(str::to_string),
    })
}

pub(crate) fn posts_from_rows(rows: &[Row]) -> Result<Vec<Post>, SocialError> {
    rows.iter().map(post_from_row).collect()
}

fn required(field: &str, value: &str) -> Result<(), SocialError> {
    if value.trim().is_empty() {
        return Err(SocialError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn tags_json(tags: &[String]) -> Result<String, SocialError> {
    serde_json::to_string(tags).map_err(|e| SocialError::Internal(e.to_string()))
}

impl SocialService {
    /// Create a post authored by `author`.
    pub fn create_post(&self, author: &str, input: CreatePost) -> Result<Post, SocialError> {
        required("title", &input.title)?;
        required("description", &input.description)?;

        let now = now_rfc3339();
        let id = new_id();
        self.sql
            .exec(
                "INSERT INTO posts (id, user_id, title, description, twitter, tags, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                &[
                    Value::from(id.as_str()),
                    Value::from(author),
                    Value::from(input.title),
                    Value::from(input.description),
                    Value::from(input.twitter),
                    Value::Text(tags_json(&input.tags)?),
                    Value::from(now),
                ],
            )
            .map_err(|e| match e {
                SQLError::ForeignKey(_) => {
                    SocialError::NotFound(format!("user '{}'", author))
                }
                other => other.into(),
            })?;
        tracing::debug!(post = %id, author, "post created");
        self.load_post(&id, false)
    }

    /// Read a live post and count the view.
    pub fn get_post(&self, id: &str) -> Result<Post, SocialError> {
        let affected = self.sql.exec(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = ?1 AND deleted_at IS NULL",
            &[Value::from(id)],
        )?;
        if affected == 0 {
            return Err(SocialError::NotFound(format!("post '{}'", id)));
        }
        self.load_post(id, false)
    }

    /// Edit a live post. Only its author may.
    pub fn update_post(&self, id: &str, editor: &str, input: UpdatePost) -> Result<Post, SocialError> {
        let mut post = self.authored_post(id, editor, false)?;

        if let Some(title) = input.title {
            required("title", &title)?;
            post.title = title;
        }
        if let Some(description) = input.description {
            required("description", &description)?;
            post.description = description;
        }
        if input.twitter.is_some() {
            post.twitter = input.twitter;
        }
        if let Some(tags) = input.tags {
            post.tags = tags;
        }
        post.updated_at = now_rfc3339();

        self.sql.exec(
            "UPDATE posts SET title = ?1, description = ?2, twitter = ?3, tags = ?4, updated_at = ?5 \
             WHERE id = ?6",
            &[
                Value::from(post.title.as_str()),
                Value::from(post.description.as_str()),
                Value::from(post.twitter.clone()),
                Value::Text(tags_json(&post.tags)?),
                Value::from(post.updated_at.as_str()),
                Value::from(id),
            ],
        )?;
        Ok(post)
    }

    /// Soft-delete a post. Only its author may.
    pub fn delete_post(&self, id: &str, editor: &str) -> Result<(), SocialError> {
        self.authored_post(id, editor, false)?;
        self.sql.exec(
            "UPDATE posts SET deleted_at = ?1 WHERE id = ?2",
            &[Value::from(now_rfc3339()), Value::from(id)],
        )?;
        tracing::debug!(post = id, "post deleted");
        Ok(())
    }

    /// Undo a soft delete. Only the author may.
    pub fn restore_post(&self, id: &str, editor: &str) -> Result<Post, SocialError> {
        let post = self.authored_post(id, editor, true)?;
        if post.deleted_at.is_none() {
            return Err(SocialError::Conflict(format!("post '{}' is not deleted", id)));
        }
        self.sql.exec(
            "UPDATE posts SET deleted_at = NULL, updated_at = ?1 WHERE id = ?2",
            &[Value::from(now_rfc3339()), Value::from(id)],
        )?;
        self.load_post(id, false)
    }

    fn authored_post(&self, id: &str, editor: &str, include_deleted: bool) -> Result<Post, SocialError> {
        let post = self.load_post(id, include_deleted)?;
        if post.user_id != editor {
            return Err(SocialError::Forbidden(format!("post '{}' belongs to another author", id)));
        }
        Ok(post)
    }

    pub(crate) fn load_post(&self, id: &str, include_deleted: bool) -> Result<Post, SocialError> {
        let live = if include_deleted { "" } else { " AND p.deleted_at IS NULL" };
        let rows = self.sql.query(
            &format!("{} WHERE p.id = ?1{}", POST_SELECT, live),
            &[Value::from(id)],
        )?;
        let row = rows
            .first()
            .ok_or_else(|| SocialError::NotFound(format!("post '{}'", id)))?;
        post_from_row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::Fixture;

    #[test]
    fn test_post_lifecycle() {
        let fx = Fixture::new();
        let alice = fx.user("alice");

        let post = fx
            .social
            .create_post(
                &alice,
                CreatePost {
                    title: "Hello".into(),
                    description: "first post".into(),
                    twitter: None,
                    tags: vec!["intro".into()],
                },
            )
            .unwrap();
        assert_eq!(post.author.as_ref().unwrap().username, "alice");
        assert_eq!(post.tags, vec!["intro"]);
        assert_eq!(post.view_count, 0);

        let read = fx.social.get_post(&post.id).unwrap();
        assert_eq!(read.view_count, 1);
        assert_eq!(fx.social.get_post(&post.id).unwrap().view_count, 2);

        let updated = fx
            .social
            .update_post(
                &post.id,
                &alice,
                UpdatePost {
                    title: Some("Hello again".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Hello again");
        assert_eq!(updated.description, "first post");

        fx.social.delete_post(&post.id, &alice).unwrap();
        assert!(matches!(fx.social.get_post(&post.id), Err(SocialError::NotFound(_))));

        let restored = fx.social.restore_post(&post.id, &alice).unwrap();
        assert!(restored.deleted_at.is_none());
        assert!(matches!(
            fx.social.restore_post(&post.id, &alice),
            Err(SocialError::Conflict(_))
        ));
    }

    #[test]
    fn test_only_author_edits() {
        let fx = Fixture::new();
        let alice = fx.user("alice");
        let bob = fx.user("bob");
        let post = fx.post(&alice, "mine");

        assert!(matches!(
            fx.social.update_post(&post, &bob, UpdatePost::default()),
            Err(SocialError::Forbidden(_))
        ));
        assert!(matches!(
            fx.social.delete_post(&post, &bob),
            Err(SocialError::Forbidden(_))
        ));
        fx.social.delete_post(&post, &alice).unwrap();
        assert!(matches!(
            fx.social.restore_post(&post, &bob),
            Err(SocialError::Forbidden(_))
        ));
    }

    #[test]
    fn test_create_requires_text() {
        let fx = Fixture::new();
        let alice = fx.user("alice");
        let err = fx
            .social
            .create_post(
                &alice,
                CreatePost {
                    title: " ".into(),
                    description: "x".into(),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, SocialError::Validation(_)));
    }
}
