use devplaza_sql::SQLStore;

use crate::service::AuthError;

/// Initialize the SQLite schema for users, roles and permissions.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), AuthError> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS permissions (
            name TEXT PRIMARY KEY,
            description TEXT
        )",

        "CREATE TABLE IF NOT EXISTS permission_groups (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT
        )",

        "CREATE TABLE IF NOT EXISTS permission_group_permissions (
            group_id TEXT NOT NULL,
            permission TEXT NOT NULL,
            PRIMARY KEY (group_id, permission),
            FOREIGN KEY (group_id) REFERENCES permission_groups(id) ON DELETE CASCADE,
            FOREIGN KEY (permission) REFERENCES permissions(name) ON DELETE CASCADE
        )",

        "CREATE TABLE IF NOT EXISTS roles (
            id TEXT PRIMARY KEY,
            description TEXT
        )",

        // Direct permissions of a role
        "CREATE TABLE IF NOT EXISTS role_permissions (
            role_id TEXT NOT NULL,
            permission TEXT NOT NULL,
            PRIMARY KEY (role_id, permission),
            FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE CASCADE,
            FOREIGN KEY (permission) REFERENCES permissions(name) ON DELETE CASCADE
        )",

        "CREATE TABLE IF NOT EXISTS role_permission_groups (
            role_id TEXT NOT NULL,
            group_id TEXT NOT NULL,
            PRIMARY KEY (role_id, group_id),
            FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE CASCADE,
            FOREIGN KEY (group_id) REFERENCES permission_groups(id) ON DELETE CASCADE
        )",

        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            uid TEXT NOT NULL UNIQUE,
            username TEXT NOT NULL,
            email TEXT,
            avatar TEXT,
            github TEXT,
            twitter TEXT,
            role_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE SET NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role_id)",
        "CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)",
    ];

    for stmt in &statements {
        sql.exec(stmt, &[])
            .map_err(|e| AuthError::Storage(e.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use devplaza_sql::SqliteStore;

    #[test]
    fn test_init_schema_is_idempotent() {
        let sql = SqliteStore::open_in_memory().unwrap();
        init_schema(&sql).unwrap();
        init_schema(&sql).unwrap();

        let rows = sql
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                &[],
            )
            .unwrap();
        let names: Vec<&str> = rows.iter().filter_map(|r| r.get_str("name")).collect();
        assert_eq!(
            names,
            vec![
                "permission_group_permissions",
                "permission_groups",
                "permissions",
                "role_permission_groups",
                "role_permissions",
                "roles",
                "users",
            ]
        );
    }
}
