use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

use super::StoreError;
use crate::constants::DATABASE_FILE;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS notifications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        package_name TEXT NOT NULL,
        app_name TEXT NOT NULL,
        title TEXT,
        content TEXT,
        category TEXT,
        conversation_key TEXT,
        timestamp INTEGER NOT NULL,
        is_read INTEGER NOT NULL DEFAULT 0,
        attachment_data BLOB,
        attachment_mime_type TEXT,
        attachment_file_name TEXT,
        icon_data BLOB,
        dedup_hash TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_notifications_timestamp ON notifications(timestamp DESC);
    CREATE INDEX IF NOT EXISTS idx_notifications_package ON notifications(package_name);
    CREATE INDEX IF NOT EXISTS idx_notifications_dedup ON notifications(dedup_hash);
"#;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) `notikeep.db` inside `db_dir`.
    pub fn open<P: AsRef<Path>>(db_dir: P) -> Result<Self, StoreError> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir)?;

        let conn = Connection::open(db_dir.join(DATABASE_FILE))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::init(conn)
    }

    /// Used in tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("notification schema ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_database_creation() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        assert!(dir.path().join(DATABASE_FILE).exists());

        let conn = db.connection();
        let conn = conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM notifications", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_reopen_keeps_schema() {
        let dir = tempdir().unwrap();
        drop(Database::open(dir.path()).unwrap());
        let db = Database::open(dir.path()).unwrap();

        let conn = db.connection();
        let conn = conn.lock();
        conn.execute(
            "INSERT INTO notifications (package_name, app_name, timestamp, dedup_hash)
             VALUES ('p', 'a', 1, 'h')",
            [],
        )
        .unwrap();
    }
}
