use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use regex::Regex;

use crate::errors::{FeederError, FeederResult};

/// Same naming rules as the hosted key-value stores we mirror
const TABLE_NAME_PATTERN: &str = r"^[A-Za-z0-9_.-]{3,255}$";

fn table_schema(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS "{table}" (
    link TEXT PRIMARY KEY NOT NULL,
    category TEXT,
    published_datetime INTEGER,
    ttl INTEGER,
    attributes TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS "{table}_published_datetime"
    ON "{table}"(category, published_datetime, link);

CREATE INDEX IF NOT EXISTS "{table}_ttl" ON "{table}"(ttl);
"#
    )
}

/// Reject anything that could not be a table name before it reaches SQL
pub fn validate_table_name(table: &str) -> FeederResult<()> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(TABLE_NAME_PATTERN).expect("table name pattern is a valid regex")
    });

    if pattern.is_match(table) {
        Ok(())
    } else {
        Err(FeederError::Query(format!("Invalid table name: {:?}", table)))
    }
}

#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> FeederResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            FeederError::StoreUnavailable(format!("{}: {}", path.display(), e))
        })?;
        conn.busy_timeout(Duration::from_secs(5))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> FeederResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| FeederError::StoreUnavailable(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, FeederError> {
        self.conn
            .lock()
            .map_err(|_| FeederError::StoreUnavailable("connection lock poisoned".to_string()))
    }

    /// Create the table and its index on first use
    pub fn ensure_table(conn: &Connection, table: &str) -> FeederResult<()> {
        validate_table_name(table)?;
        conn.execute_batch(&table_schema(table))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_table_creates_table_and_index() {
        let storage = SqliteStorage::in_memory().unwrap();
        let conn = storage.connection().unwrap();

        SqliteStorage::ensure_table(&conn, "ai_news").unwrap();
        // Second call is a no-op
        SqliteStorage::ensure_table(&conn, "ai_news").unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE tbl_name = 'ai_news'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        // table plus two indexes plus the primary key autoindex
        assert_eq!(count, 4);
    }

    #[test]
    fn test_table_name_validation() {
        assert!(validate_table_name("ai_news").is_ok());
        assert!(validate_table_name("test-project").is_ok());
        assert!(validate_table_name("news.v2").is_ok());

        assert!(validate_table_name("ab").is_err());
        assert!(validate_table_name("news\"; DROP TABLE x; --").is_err());
        assert!(validate_table_name("with space").is_err());
    }

    #[test]
    fn test_unopenable_path_is_store_unavailable() {
        let result = SqliteStorage::new("/nonexistent/dir/that/does/not/exist/news.db");
        assert!(matches!(result, Err(FeederError::StoreUnavailable(_))));
    }

    #[test]
    fn test_file_backed_storage_opens() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::new(dir.path().join("news.db")).unwrap();
        let conn = storage.connection().unwrap();
        SqliteStorage::ensure_table(&conn, "ai_news").unwrap();
    }
}
