use serde::{Deserialize, Serialize};

use super::hex_bytes;

/// One row of the thread list: a thread summarized by its latest record.
///
/// Rebuilt from the record set on every read, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationGroup {
    pub thread_key: String,
    pub package_name: String,
    pub app_name: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub latest_timestamp: i64,
    #[serde(default, with = "hex_bytes::option", skip_serializing_if = "Option::is_none")]
    pub icon_data: Option<Vec<u8>>,
    pub total_count: usize,
    pub has_unread: bool,
}
