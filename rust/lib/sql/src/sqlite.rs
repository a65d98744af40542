use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, ErrorCode};

use crate::error::SQLError;
use crate::traits::{Row, SQLStore, SQLTransaction, Value};

/// SqliteStore is a SQLStore implementation backed by rusqlite (bundled SQLite).
///
/// A single connection sits behind a mutex. An open [`SqliteTransaction`]
/// holds the lock, so everything inside a transaction must go through the
/// transaction handle, never back through the store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        let conn = Connection::open(path).map_err(|e| SQLError::Connection(e.to_string()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SQLError::Connection(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SQLError> {
        self.conn
            .lock()
            .map_err(|e| SQLError::Connection(format!("connection poisoned: {}", e)))
    }
}

impl SQLStore for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        let conn = self.lock()?;
        run_query(&conn, sql, params)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        let conn = self.lock()?;
        run_exec(&conn, sql, params)
    }

    fn begin(&self) -> Result<Box<dyn SQLTransaction + '_>, SQLError> {
        let conn = self.lock()?;
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| SQLError::Transaction(e.to_string()))?;
        Ok(Box::new(SqliteTransaction {
            conn,
            finished: false,
        }))
    }
}

/// A write transaction holding the store's connection lock.
pub struct SqliteTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl SQLTransaction for SqliteTransaction<'_> {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        run_query(&self.conn, sql, params)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        run_exec(&self.conn, sql, params)
    }

    fn commit(mut self: Box<Self>) -> Result<(), SQLError> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| SQLError::Transaction(e.to_string()))?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            tracing::warn!("rollback failed: {}", e);
        }
    }
}

/// Convert our Value enum to rusqlite's ToSql.
fn bind_params(params: &[Value]) -> Vec<Box<dyn rusqlite::types::ToSql + '_>> {
    params
        .iter()
        .map(|v| -> Box<dyn rusqlite::types::ToSql + '_> {
            match v {
                Value::Null => Box::new(rusqlite::types::Null),
                Value::Integer(i) => Box::new(*i),
                Value::Real(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.as_str()),
                Value::Blob(b) => Box::new(b.as_slice()),
            }
        })
        .collect()
}

/// FOREIGN KEY failures surface as `ForeignKey`, every other constraint
/// failure as `Constraint`, so callers can tell a missing referent from a
/// duplicate.
fn classify(e: rusqlite::Error, fallback: fn(String) -> SQLError) -> SQLError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            SQLError::ForeignKey(e.to_string())
        }
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            SQLError::Constraint(e.to_string())
        }
        _ => fallback(e.to_string()),
    }
}

fn run_query(conn: &Connection, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
    let bound = bind_params(params);
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = bound.iter().map(|b| b.as_ref()).collect();

    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| SQLError::Query(e.to_string()))?;

    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            let mut columns = Vec::with_capacity(column_names.len());
            for (i, name) in column_names.iter().enumerate() {
                columns.push((name.clone(), row_value_at(row, i)?));
            }
            Ok(Row { columns })
        })
        .map_err(|e| classify(e, SQLError::Query))?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(|e| classify(e, SQLError::Query))?);
    }
    Ok(result)
}

fn run_exec(conn: &Connection, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
    let bound = bind_params(params);
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = bound.iter().map(|b| b.as_ref()).collect();

    let affected = conn
        .execute(sql, param_refs.as_slice())
        .map_err(|e| classify(e, SQLError::Execution))?;

    Ok(affected as u64)
}

/// Extract a Value from a rusqlite row at a given column index.
fn row_value_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Value> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .exec(
                "CREATE TABLE counters (name TEXT PRIMARY KEY, n INTEGER NOT NULL CHECK (n >= 0))",
                &[],
            )
            .unwrap();
        store
            .exec("INSERT INTO counters (name, n) VALUES ('likes', 0)", &[])
            .unwrap();
        store
    }

    fn count(store: &SqliteStore) -> i64 {
        let rows = store
            .query("SELECT n FROM counters WHERE name = 'likes'", &[])
            .unwrap();
        rows[0].get_i64("n").unwrap()
    }

    #[test]
    fn test_query_value_types() {
        let store = SqliteStore::open_in_memory().unwrap();
        let rows = store
            .query("SELECT 1 AS i, 2.5 AS r, 'x' AS t, NULL AS z", &[])
            .unwrap();
        assert_eq!(rows[0].get_i64("i"), Some(1));
        assert_eq!(rows[0].get_f64("r"), Some(2.5));
        assert_eq!(rows[0].get_str("t"), Some("x"));
        assert_eq!(rows[0].get("z"), Some(&Value::Null));
        assert_eq!(rows[0].get_str("z"), None);
    }

    #[test]
    fn test_commit_persists() {
        let store = store();
        let tx = store.begin().unwrap();
        tx.exec("UPDATE counters SET n = n + 1 WHERE name = 'likes'", &[])
            .unwrap();
        let rows = tx
            .query("SELECT n FROM counters WHERE name = 'likes'", &[])
            .unwrap();
        assert_eq!(rows[0].get_i64("n"), Some(1));
        tx.commit().unwrap();
        assert_eq!(count(&store), 1);
    }

    #[test]
    fn test_drop_rolls_back() {
        let store = store();
        {
            let tx = store.begin().unwrap();
            tx.exec("UPDATE counters SET n = n + 5 WHERE name = 'likes'", &[])
                .unwrap();
        }
        assert_eq!(count(&store), 0);

        // The connection is usable again after the rollback.
        let tx = store.begin().unwrap();
        tx.exec("UPDATE counters SET n = 2 WHERE name = 'likes'", &[])
            .unwrap();
        tx.commit().unwrap();
        assert_eq!(count(&store), 2);
    }

    #[test]
    fn test_constraint_violation() {
        let store = store();
        let err = store
            .exec("INSERT INTO counters (name, n) VALUES ('likes', 1)", &[])
            .unwrap_err();
        assert!(matches!(err, SQLError::Constraint(_)), "got {:?}", err);

        let err = store
            .exec("UPDATE counters SET n = -1 WHERE name = 'likes'", &[])
            .unwrap_err();
        assert!(matches!(err, SQLError::Constraint(_)), "got {:?}", err);
    }

    #[test]
    fn test_foreign_key_violation() {
        let store = store();
        store
            .exec(
                "CREATE TABLE votes (counter TEXT NOT NULL REFERENCES counters(name))",
                &[],
            )
            .unwrap();
        store
            .exec("INSERT INTO votes (counter) VALUES ('likes')", &[])
            .unwrap();

        let err = store
            .exec("INSERT INTO votes (counter) VALUES ('missing')", &[])
            .unwrap_err();
        assert!(matches!(err, SQLError::ForeignKey(_)), "got {:?}", err);

        // Inside a transaction too.
        let tx = store.begin().unwrap();
        let err = tx
            .exec("INSERT INTO votes (counter) VALUES ('missing')", &[])
            .unwrap_err();
        assert!(matches!(err, SQLError::ForeignKey(_)), "got {:?}", err);
    }

    #[test]
    fn test_bad_sql_is_query_error() {
        let store = store();
        let err = store.query("SELECT nope FROM counters", &[]).unwrap_err();
        assert!(matches!(err, SQLError::Query(_)));
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.sqlite");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.exec("CREATE TABLE t (v TEXT)", &[]).unwrap();
            store
                .exec("INSERT INTO t (v) VALUES (?1)", &[Value::from("kept")])
                .unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let rows = store.query("SELECT v FROM t", &[]).unwrap();
        assert_eq!(rows[0].get_str("v"), Some("kept"));
    }
}
