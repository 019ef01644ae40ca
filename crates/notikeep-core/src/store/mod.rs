pub mod db;
pub mod notification_store;
pub mod samples;

pub use db::Database;
pub use notification_store::{dedup_hash, NotificationStore, SaveOutcome};
pub use samples::seed_samples_if_empty;

use crate::models::NotificationRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination of captured records. The ingest runtime only sees this trait,
/// so the insert-or-skip decision stays with the storage side.
pub trait NotificationSink: Send + Sync {
    fn save(&self, record: &NotificationRecord) -> Result<SaveOutcome, StoreError>;
}
