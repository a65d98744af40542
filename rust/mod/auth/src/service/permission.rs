//! Permission Resolver.
//!
//! A user's effective permissions are the union of their role's direct
//! permissions and the permissions of every group attached to that role.

use std::collections::{BTreeSet, HashMap};

use devplaza_sql::{SQLStore, Value, placeholders};

use crate::service::{AuthError, AuthService};

/// Flatten a role's permissions into one deduplicated set.
///
/// - `direct`: permissions granted to the role itself
/// - `groups`: ids of the groups attached to the role
/// - `group_permissions`: permissions of each group, keyed by group id
///
/// Groups missing from `group_permissions` contribute nothing.
pub fn resolve_permissions(
    direct: &[String],
    groups: &[String],
    group_permissions: &HashMap<String, Vec<String>>,
) -> BTreeSet<String> {
    let mut set: BTreeSet<String> = direct.iter().cloned().collect();
    for group in groups {
        if let Some(perms) = group_permissions.get(group) {
            set.extend(perms.iter().cloned());
        }
    }
    set
}

impl AuthService {
    /// Compute the live effective permission set of a user.
    pub fn effective_permissions(&self, user_id: &str) -> Result<BTreeSet<String>, AuthError> {
        let rows = self
            .sql
            .query("SELECT role_id FROM users WHERE id = ?1", &[Value::from(user_id)])?;
        let row = rows
            .first()
            .ok_or_else(|| AuthError::NotFound(format!("user '{}'", user_id)))?;
        let Some(role_id) = row.get_str("role_id") else {
            return Ok(BTreeSet::new());
        };
        role_permissions(self.sql.as_ref(), role_id)
    }

    /// Sorted permission list, the form embedded in tokens.
    pub fn permission_list(&self, user_id: &str) -> Result<Vec<String>, AuthError> {
        Ok(self.effective_permissions(user_id)?.into_iter().collect())
    }
}

/// Effective permissions granted by a role.
pub(crate) fn role_permissions(
    sql: &dyn SQLStore,
    role_id: &str,
) -> Result<BTreeSet<String>, AuthError> {
    let role = sql.query("SELECT id FROM roles WHERE id = ?1", &[Value::from(role_id)])?;
    if role.is_empty() {
        return Err(AuthError::NotFound(format!("role '{}'", role_id)));
    }

    let direct = column(
        &sql.query(
            "SELECT permission FROM role_permissions WHERE role_id = ?1",
            &[Value::from(role_id)],
        )?,
        "permission",
    );
    let groups = column(
        &sql.query(
            "SELECT group_id FROM role_permission_groups WHERE role_id = ?1",
            &[Value::from(role_id)],
        )?,
        "group_id",
    );

    let mut group_permissions: HashMap<String, Vec<String>> = HashMap::new();
    if !groups.is_empty() {
        let query = format!(
            "SELECT group_id, permission FROM permission_group_permissions WHERE group_id IN ({})",
            placeholders(1, groups.len())
        );
        let params: Vec<Value> = groups.iter().map(|g| Value::from(g.as_str())).collect();
        for row in sql.query(&query, &params)? {
            if let (Some(group), Some(perm)) = (row.get_str("group_id"), row.get_str("permission")) {
                group_permissions
                    .entry(group.to_string())
                    .or_default()
                    .push(perm.to_string());
            }
        }
    }

    Ok(resolve_permissions(&direct, &groups, &group_permissions))
}

pub(crate) fn column(rows: &[devplaza_sql::Row], name: &str) -> Vec<String> {
    rows.iter()
        .filter_map(|r| r.get_str(name).map(str::to_string))
        .collect()
}
