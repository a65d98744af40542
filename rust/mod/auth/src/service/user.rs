use devplaza_core::now_rfc3339;
use devplaza_core::new_id;
use devplaza_sql::{Row, SQLTransaction, Value};

use crate::model::{UpdateUser, User};
use crate::service::{AuthError, AuthService, ExternalIdentity};

const USER_COLUMNS: &str =
    "id, uid, username, email, avatar, github, twitter, role_id, created_at, updated_at";

fn opt(row: &Row, name: &str) -> Option<String> {
    row.get_str(name).map(str::to_string)
}

pub(crate) fn user_from_row(row: &Row) -> Result<User, AuthError> {
    let required = |name: &str| {
        opt(row, name).ok_or_else(|| AuthError::Internal(format!("users.{} is missing", name)))
    };
    Ok(User {
        id: required("id")?,
        uid: required("uid")?,
        username: required("username")?,
        email: opt(row, "email"),
        avatar: opt(row, "avatar"),
        github: opt(row, "github"),
        twitter: opt(row, "twitter"),
        role_id: opt(row, "role_id"),
        created_at: required("created_at")?,
        updated_at: required("updated_at")?,
    })
}

fn find_by_uid(tx: &dyn SQLTransaction, uid: &str) -> Result<Option<User>, AuthError> {
    let rows = tx.query(
        &format!("SELECT {} FROM users WHERE uid = ?1", USER_COLUMNS),
        &[Value::from(uid)],
    )?;
    rows.first().map(user_from_row).transpose()
}

impl AuthService {
    /// Get a user by id.
    pub fn get_user(&self, id: &str) -> Result<User, AuthError> {
        let rows = self.sql.query(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            &[Value::from(id)],
        )?;
        let row = rows
            .first()
            .ok_or_else(|| AuthError::NotFound(format!("user '{}'", id)))?;
        user_from_row(row)
    }

    /// Create or refresh the user behind an external identity.
    ///
    /// A returning user gets email and github refreshed; username and avatar
    /// stay as the user last set them. A new user gets the default role.
    pub fn upsert_identity(&self, identity: &ExternalIdentity) -> Result<User, AuthError> {
        if identity.uid.is_empty() {
            return Err(AuthError::Validation("identity has no uid".into()));
        }
        let now = now_rfc3339();
        let tx = self.sql.begin()?;

        let user = match find_by_uid(&*tx, &identity.uid)? {
            Some(mut user) => {
                user.email = identity.email.clone();
                user.github = identity.github.clone();
                user.updated_at = now.clone();
                tx.exec(
                    "UPDATE users SET email = ?1, github = ?2, updated_at = ?3 WHERE id = ?4",
                    &[
                        Value::from(user.email.clone()),
                        Value::from(user.github.clone()),
                        Value::from(now),
                        Value::from(user.id.as_str()),
                    ],
                )?;
                user
            }
            None => {
                let role = &self.config.default_role;
                if tx
                    .query("SELECT id FROM roles WHERE id = ?1", &[Value::from(role.as_str())])?
                    .is_empty()
                {
                    return Err(AuthError::Internal(format!("default role '{}' is missing", role)));
                }
                let user = User {
                    id: new_id(),
                    uid: identity.uid.clone(),
                    username: identity.username.clone(),
                    email: identity.email.clone(),
                    avatar: identity.avatar.clone(),
                    github: identity.github.clone(),
                    twitter: None,
                    role_id: Some(role.clone()),
                    created_at: now.clone(),
                    updated_at: now,
                };
                tx.exec(
                    &format!(
                        "INSERT INTO users ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                        USER_COLUMNS
                    ),
                    &[
                        Value::from(user.id.as_str()),
                        Value::from(user.uid.as_str()),
                        Value::from(user.username.as_str()),
                        Value::from(user.email.clone()),
                        Value::from(user.avatar.clone()),
                        Value::from(user.github.clone()),
                        Value::Null,
                        Value::from(user.role_id.clone()),
                        Value::from(user.created_at.as_str()),
                        Value::from(user.updated_at.as_str()),
                    ],
                )?;
                tracing::info!(user = %user.id, uid = %user.uid, "created user");
                user
            }
        };

        tx.commit()?;
        Ok(user)
    }

    /// Update a user's own profile. Only the user themself may do this.
    pub fn update_user(&self, id: &str, editor: &str, input: UpdateUser) -> Result<User, AuthError> {
        if id != editor {
            return Err(AuthError::Forbidden("cannot edit another user's profile".into()));
        }
        let mut user = self.get_user(id)?;

        if let Some(username) = input.username {
            if username.trim().is_empty() {
                return Err(AuthError::Validation("username cannot be empty".into()));
            }
            user.username = username;
        }
        if input.email.is_some() {
            user.email = input.email;
        }
        if input.avatar.is_some() {
            user.avatar = input.avatar;
        }
        if input.github.is_some() {
            user.github = input.github;
        }
        if input.twitter.is_some() {
            user.twitter = input.twitter;
        }
        user.updated_at = now_rfc3339();

        self.sql.exec(
            "UPDATE users SET username = ?1, email = ?2, avatar = ?3, github = ?4, twitter = ?5, \
             updated_at = ?6 WHERE id = ?7",
            &[
                Value::from(user.username.as_str()),
                Value::from(user.email.clone()),
                Value::from(user.avatar.clone()),
                Value::from(user.github.clone()),
                Value::from(user.twitter.clone()),
                Value::from(user.updated_at.as_str()),
                Value::from(id),
            ],
        )?;
        Ok(user)
    }

    /// Give a user a role, or take it away with `None`.
    pub fn assign_role(&self, user_id: &str, role_id: Option<&str>) -> Result<(), AuthError> {
        if let Some(role) = role_id {
            self.get_role(role)?;
        }
        let affected = self.sql.exec(
            "UPDATE users SET role_id = ?1, updated_at = ?2 WHERE id = ?3",
            &[Value::from(role_id), Value::from(now_rfc3339()), Value::from(user_id)],
        )?;
        if affected == 0 {
            return Err(AuthError::NotFound(format!("user '{}'", user_id)));
        }
        tracing::info!(user = user_id, role = ?role_id, "role assigned");
        Ok(())
    }
}
