//! Application-wide constants
//!
//! Sentinels and limits shared by the capture, classification and storage layers.

/// Category value that marks a message-style notification.
pub const MESSAGE_CATEGORY: &str = "msg";

/// Separator between the package token and the conversation token of a message thread key.
pub const MESSAGE_THREAD_SEPARATOR: &str = "::msg::";

/// Separator between the thread key and the content token of a dedup key.
pub const DEDUP_SEPARATOR: &str = "::";

/// Upper bound for a captured attachment payload (8 MiB).
pub const MAX_ATTACHMENT_BYTES: usize = 8 * 1024 * 1024;

/// MIME type used when neither the sender nor the payload source names one.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Default display pattern for notification timestamps.
pub const DEFAULT_TIMESTAMP_PATTERN: &str = "%Y.%m.%d %H:%M";

/// Pattern for the date header shown where a thread crosses into a new day.
pub const DAY_HEADER_PATTERN: &str = "%Y.%m.%d %A";

/// Default capacity of the ingest queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// SQLite file name inside the data directory.
pub const DATABASE_FILE: &str = "notikeep.db";

// Conversation key prefixes
pub mod conversation {
    pub const GROUP_PREFIX: &str = "group:";
    pub const DIRECT_PREFIX: &str = "dm:";
    pub const SMS_PREFIX: &str = "sms:";
}

// Normalizer placeholder tokens
pub mod tokens {
    pub const PERCENT: &str = "{percent}";
    pub const TIME: &str = "{time}";
    pub const NUMBER: &str = "{num}";
}
