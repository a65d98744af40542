use devplaza_sql::{SQLError, SQLTransaction, Value};

use crate::model::{CreateRole, Permission, PermissionGroup, Role};
use crate::service::permission::column;
use crate::service::{AuthError, AuthService};

/// Link rows point at permissions/groups that must already exist.
fn unknown_reference(e: SQLError) -> AuthError {
    match e {
        SQLError::ForeignKey(_) => {
            AuthError::Validation("unknown permission or permission group".into())
        }
        other => other.into(),
    }
}

fn link_all(
    tx: &dyn SQLTransaction,
    sql: &str,
    owner: &str,
    items: &[String],
) -> Result<(), AuthError> {
    for item in items {
        tx.exec(sql, &[Value::from(owner), Value::from(item.as_str())])
            .map_err(unknown_reference)?;
    }
    Ok(())
}

impl AuthService {
    /// Register a permission name. Registering an existing name is a no-op.
    pub fn create_permission(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Permission, AuthError> {
        if name.is_empty() {
            return Err(AuthError::Validation("permission name cannot be empty".into()));
        }
        self.sql.exec(
            "INSERT OR IGNORE INTO permissions (name, description) VALUES (?1, ?2)",
            &[Value::from(name), Value::from(description)],
        )?;
        Ok(Permission {
            name: name.to_string(),
            description: description.map(str::to_string),
        })
    }

    /// All registered permissions, by name.
    pub fn list_permissions(&self) -> Result<Vec<Permission>, AuthError> {
        let rows = self
            .sql
            .query("SELECT name, description FROM permissions ORDER BY name", &[])?;
        Ok(rows
            .iter()
            .filter_map(|r| {
                Some(Permission {
                    name: r.get_str("name")?.to_string(),
                    description: r.get_str("description").map(str::to_string),
                })
            })
            .collect())
    }

    /// Create a permission group holding the given permissions.
    pub fn create_group(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
        permissions: &[String],
    ) -> Result<PermissionGroup, AuthError> {
        if id.is_empty() {
            return Err(AuthError::Validation("group id cannot be empty".into()));
        }
        let tx = self.sql.begin()?;
        tx.exec(
            "INSERT INTO permission_groups (id, name, description) VALUES (?1, ?2, ?3)",
            &[Value::from(id), Value::from(name), Value::from(description)],
        )
        .map_err(|e| match e {
            SQLError::Constraint(_) => AuthError::Conflict(format!("group '{}' already exists", id)),
            other => other.into(),
        })?;
        link_all(
            &*tx,
            "INSERT OR IGNORE INTO permission_group_permissions (group_id, permission) VALUES (?1, ?2)",
            id,
            permissions,
        )?;
        tx.commit()?;
        self.get_group(id)
    }

    /// Get a permission group by id.
    pub fn get_group(&self, id: &str) -> Result<PermissionGroup, AuthError> {
        let rows = self.sql.query(
            "SELECT id, name, description FROM permission_groups WHERE id = ?1",
            &[Value::from(id)],
        )?;
        let row = rows
            .first()
            .ok_or_else(|| AuthError::NotFound(format!("permission group '{}'", id)))?;
        let permissions = column(
            &self.sql.query(
                "SELECT permission FROM permission_group_permissions WHERE group_id = ?1 ORDER BY permission",
                &[Value::from(id)],
            )?,
            "permission",
        );
        Ok(PermissionGroup {
            id: id.to_string(),
            name: row.get_str("name").unwrap_or_default().to_string(),
            description: row.get_str("description").map(str::to_string),
            permissions,
        })
    }

    /// Replace the permissions of a group.
    pub fn set_group_permissions(&self, id: &str, permissions: &[String]) -> Result<(), AuthError> {
        self.get_group(id)?;
        let tx = self.sql.begin()?;
        tx.exec(
            "DELETE FROM permission_group_permissions WHERE group_id = ?1",
            &[Value::from(id)],
        )?;
        link_all(
            &*tx,
            "INSERT OR IGNORE INTO permission_group_permissions (group_id, permission) VALUES (?1, ?2)",
            id,
            permissions,
        )?;
        tx.commit()?;
        tracing::info!(group = id, "permission group updated");
        Ok(())
    }

    /// Create a role with direct permissions and attached groups.
    pub fn create_role(&self, input: CreateRole) -> Result<Role, AuthError> {
        if input.id.is_empty() {
            return Err(AuthError::Validation("role id cannot be empty".into()));
        }
        let tx = self.sql.begin()?;
        tx.exec(
            "INSERT INTO roles (id, description) VALUES (?1, ?2)",
            &[Value::from(input.id.as_str()), Value::from(input.description.clone())],
        )
        .map_err(|e| match e {
            SQLError::Constraint(_) => {
                AuthError::Conflict(format!("role '{}' already exists", input.id))
            }
            other => other.into(),
        })?;
        link_all(
            &*tx,
            "INSERT OR IGNORE INTO role_permissions (role_id, permission) VALUES (?1, ?2)",
            &input.id,
            &input.permissions,
        )?;
        link_all(
            &*tx,
            "INSERT OR IGNORE INTO role_permission_groups (role_id, group_id) VALUES (?1, ?2)",
            &input.id,
            &input.groups,
        )?;
        tx.commit()?;
        self.get_role(&input.id)
    }

    /// Get a role by id.
    pub fn get_role(&self, id: &str) -> Result<Role, AuthError> {
        let rows = self
            .sql
            .query("SELECT id, description FROM roles WHERE id = ?1", &[Value::from(id)])?;
        let row = rows
            .first()
            .ok_or_else(|| AuthError::NotFound(format!("role '{}'", id)))?;
        let permissions = column(
            &self.sql.query(
                "SELECT permission FROM role_permissions WHERE role_id = ?1 ORDER BY permission",
                &[Value::from(id)],
            )?,
            "permission",
        );
        let groups = column(
            &self.sql.query(
                "SELECT group_id FROM role_permission_groups WHERE role_id = ?1 ORDER BY group_id",
                &[Value::from(id)],
            )?,
            "group_id",
        );
        Ok(Role {
            id: id.to_string(),
            description: row.get_str("description").map(str::to_string),
            permissions,
            groups,
        })
    }

    /// List all roles.
    pub fn list_roles(&self) -> Result<Vec<Role>, AuthError> {
        let ids = column(&self.sql.query("SELECT id FROM roles ORDER BY id", &[])?, "id");
        ids.iter().map(|id| self.get_role(id)).collect()
    }

    /// Replace the direct permissions of a role.
    ///
    /// Tokens issued to holders of this role stop working on their next
    /// request if their effective set changes.
    pub fn set_role_permissions(&self, id: &str, permissions: &[String]) -> Result<(), AuthError> {
        self.get_role(id)?;
        let tx = self.sql.begin()?;
        tx.exec("DELETE FROM role_permissions WHERE role_id = ?1", &[Value::from(id)])?;
        link_all(
            &*tx,
            "INSERT OR IGNORE INTO role_permissions (role_id, permission) VALUES (?1, ?2)",
            id,
            permissions,
        )?;
        tx.commit()?;
        tracing::info!(role = id, "role permissions updated");
        Ok(())
    }

    /// Replace the permission groups attached to a role.
    pub fn set_role_groups(&self, id: &str, groups: &[String]) -> Result<(), AuthError> {
        self.get_role(id)?;
        let tx = self.sql.begin()?;
        tx.exec(
            "DELETE FROM role_permission_groups WHERE role_id = ?1",
            &[Value::from(id)],
        )?;
        link_all(
            &*tx,
            "INSERT OR IGNORE INTO role_permission_groups (role_id, group_id) VALUES (?1, ?2)",
            id,
            groups,
        )?;
        tx.commit()?;
        tracing::info!(role = id, "role groups updated");
        Ok(())
    }
}
