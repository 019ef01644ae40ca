use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};

use super::{Database, NotificationSink, StoreError};
use crate::classifier::dedup_key;
use crate::constants::FALLBACK_MIME_TYPE;
use crate::models::{Attachment, NotificationRecord};

const SELECT_COLUMNS: &str = "SELECT id, package_name, app_name, title, content, category, \
     conversation_key, timestamp, is_read, attachment_data, attachment_mime_type, \
     attachment_file_name, icon_data FROM notifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted { id: i64 },
    /// A row with the same dedup key already exists; nothing was written.
    Duplicate { existing_id: i64 },
}

impl SaveOutcome {
    pub fn id(&self) -> i64 {
        match self {
            SaveOutcome::Inserted { id } => *id,
            SaveOutcome::Duplicate { existing_id } => *existing_id,
        }
    }

    pub fn is_inserted(&self) -> bool {
        matches!(self, SaveOutcome::Inserted { .. })
    }
}

/// SHA-256 hex digest of a dedup key, stored in the indexed `dedup_hash` column.
pub fn dedup_hash(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Notification history backed by the `notifications` table.
#[derive(Clone)]
pub struct NotificationStore {
    conn: Arc<Mutex<Connection>>,
    dedup_window_ms: Option<i64>,
}

impl NotificationStore {
    pub fn new(db: &Database) -> Self {
        Self {
            conn: db.connection(),
            dedup_window_ms: None,
        }
    }

    /// Limit duplicate detection to rows whose timestamps lie within `window`
    /// of the incoming record. `None` matches regardless of age.
    pub fn with_dedup_window(mut self, window: Option<Duration>) -> Self {
        self.dedup_window_ms =
            window.map(|w| i64::try_from(w.as_millis()).unwrap_or(i64::MAX));
        self
    }

    // ===== Writes =====

    /// Insert `record` unless a duplicate already exists in the same thread.
    ///
    /// The record's own `id` is ignored; the row id is assigned here.
    pub fn save(&self, record: &NotificationRecord) -> Result<SaveOutcome, StoreError> {
        let hash = dedup_hash(&dedup_key(record));

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM notifications
                 WHERE dedup_hash = ?1 AND (?2 IS NULL OR ABS(timestamp - ?3) <= ?2)
                 ORDER BY timestamp DESC, id DESC
                 LIMIT 1",
                params![hash, self.dedup_window_ms, record.timestamp],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(existing_id) = existing {
            tracing::debug!(
                package = %record.package_name,
                existing_id,
                "duplicate notification skipped"
            );
            return Ok(SaveOutcome::Duplicate { existing_id });
        }

        let id = insert_row(&tx, record, &hash)?;
        tx.commit()?;

        tracing::debug!(package = %record.package_name, id, "notification saved");
        Ok(SaveOutcome::Inserted { id })
    }

    /// Insert without the duplicate check.
    pub(crate) fn insert_unchecked(&self, record: &NotificationRecord) -> Result<i64, StoreError> {
        let hash = dedup_hash(&dedup_key(record));
        let conn = self.conn.lock();
        insert_row(&conn, record, &hash)
    }

    /// Flip the given rows to read. Returns how many were unread before.
    pub fn mark_read(&self, ids: &[i64]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE notifications SET is_read = 1 WHERE is_read = 0 AND id IN ({})",
            placeholders
        );
        let conn = self.conn.lock();
        Ok(conn.execute(&sql, params_from_iter(ids.iter()))?)
    }

    pub fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM notifications WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn delete_all(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        Ok(conn.execute("DELETE FROM notifications", [])?)
    }

    // ===== Reads =====

    /// Every record, newest first.
    pub fn get_all(&self) -> Result<Vec<NotificationRecord>, StoreError> {
        self.query(
            &format!("{} ORDER BY timestamp DESC, id DESC", SELECT_COLUMNS),
            params![],
        )
    }

    pub fn get_by_id(&self, id: i64) -> Result<Option<NotificationRecord>, StoreError> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Records posted by one package, newest first.
    pub fn get_by_package(
        &self,
        package_name: &str,
    ) -> Result<Vec<NotificationRecord>, StoreError> {
        self.query(
            &format!(
                "{} WHERE package_name = ?1 ORDER BY timestamp DESC, id DESC",
                SELECT_COLUMNS
            ),
            params![package_name],
        )
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM notifications", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    fn query(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<NotificationRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl NotificationSink for NotificationStore {
    fn save(&self, record: &NotificationRecord) -> Result<SaveOutcome, StoreError> {
        NotificationStore::save(self, record)
    }
}

fn insert_row(
    conn: &Connection,
    record: &NotificationRecord,
    hash: &str,
) -> Result<i64, StoreError> {
    let attachment = record.attachment.as_ref();
    conn.execute(
        "INSERT INTO notifications (
            package_name, app_name, title, content, category, conversation_key,
            timestamp, is_read, attachment_data, attachment_mime_type,
            attachment_file_name, icon_data, dedup_hash
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            record.package_name,
            record.app_name,
            record.title,
            record.content,
            record.category,
            record.conversation_key,
            record.timestamp,
            record.is_read,
            attachment.map(|a| &a.data),
            attachment.map(|a| &a.mime_type),
            attachment.map(|a| &a.file_name),
            record.icon_data,
            hash,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<NotificationRecord> {
    let attachment_data: Option<Vec<u8>> = row.get(9)?;
    let attachment_mime_type: Option<String> = row.get(10)?;
    let attachment_file_name: Option<String> = row.get(11)?;

    let attachment = attachment_data.map(|data| Attachment {
        data,
        mime_type: attachment_mime_type.unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string()),
        file_name: attachment_file_name.unwrap_or_else(|| "attachment".to_string()),
    });

    Ok(NotificationRecord {
        id: row.get(0)?,
        package_name: row.get(1)?,
        app_name: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        category: row.get(5)?,
        conversation_key: row.get(6)?,
        timestamp: row.get(7)?,
        is_read: row.get(8)?,
        attachment,
        icon_data: row.get(12)?,
    })
}
