//! Built-in permission catalogue, installed on first start.

use devplaza_sql::Value;

use crate::service::{AuthError, AuthService};

const ACTIONS: [&str; 4] = ["write", "review", "delete", "publish"];

const RESOURCES: [(&str, &str); 4] = [
    ("blog", "blog posts"),
    ("tutorial", "tutorials"),
    ("event", "events"),
    ("dapp", "dapps"),
];

/// (group id, name, permissions). Every group backs the role of the same id.
const GROUPS: [(&str, &str, &[&str]); 10] = [
    ("blog_writer", "Blog author", &["blog:write", "blog:delete"]),
    ("blog_admin", "Blog admin", &["blog:*"]),
    ("tutorial_writer", "Tutorial author", &["tutorial:write", "tutorial:delete"]),
    ("tutorial_admin", "Tutorial admin", &["tutorial:*"]),
    ("event_creator", "Event creator", &["event:write"]),
    ("event_admin", "Event admin", &["event:*"]),
    (
        "content_creator",
        "Content creator",
        &["blog:write", "blog:delete", "tutorial:write", "tutorial:delete"],
    ),
    ("content_admin", "Content admin", &["blog:*", "tutorial:*"]),
    ("dapp_admin", "Dapp admin", &["dapp:*"]),
    ("super_admin", "Super admin", &["blog:*", "tutorial:*", "event:*", "dapp:*"]),
];

/// Expand `resource:*` into every action on that resource.
fn expand(patterns: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    for p in patterns {
        match p.strip_suffix(":*") {
            Some(resource) => out.extend(ACTIONS.iter().map(|a| format!("{}:{}", resource, a))),
            None => out.push(p.to_string()),
        }
    }
    out
}

impl AuthService {
    /// Install the default permissions, groups and roles.
    ///
    /// Does nothing if any permission is already registered, so edits made
    /// after the first start survive restarts. Returns whether it seeded.
    pub fn seed_catalogue(&self) -> Result<bool, AuthError> {
        let rows = self.sql.query("SELECT COUNT(*) AS cnt FROM permissions", &[])?;
        if rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) > 0 {
            return Ok(false);
        }

        let tx = self.sql.begin()?;
        for (resource, label) in RESOURCES {
            for action in ACTIONS {
                tx.exec(
                    "INSERT INTO permissions (name, description) VALUES (?1, ?2)",
                    &[
                        Value::Text(format!("{}:{}", resource, action)),
                        Value::Text(format!("{} {}", action, label)),
                    ],
                )?;
            }
        }

        for (id, name, patterns) in GROUPS {
            tx.exec(
                "INSERT INTO permission_groups (id, name, description) VALUES (?1, ?2, ?3)",
                &[
                    Value::from(id),
                    Value::from(name),
                    Value::Text(format!("{} permission group", name)),
                ],
            )?;
            for perm in expand(patterns) {
                tx.exec(
                    "INSERT OR IGNORE INTO permission_group_permissions (group_id, permission) VALUES (?1, ?2)",
                    &[Value::from(id), Value::Text(perm)],
                )?;
            }
            tx.exec(
                "INSERT INTO roles (id, description) VALUES (?1, ?2)",
                &[Value::from(id), Value::Text(format!("{} role", name))],
            )?;
            tx.exec(
                "INSERT INTO role_permission_groups (role_id, group_id) VALUES (?1, ?1)",
                &[Value::from(id)],
            )?;
        }
        tx.commit()?;

        tracing::info!(
            permissions = RESOURCES.len() * ACTIONS.len(),
            roles = GROUPS.len(),
            "seeded role catalogue"
        );
        Ok(true)
    }
}
