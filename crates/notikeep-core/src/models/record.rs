use serde::{Deserialize, Serialize};

use super::hex_bytes;
use super::ConversationKey;

/// Binary payload captured alongside a notification (big picture, shared file, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

/// A captured notification as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Row id assigned on insert; 0 until persisted
    #[serde(default)]
    pub id: i64,
    pub package_name: String,
    pub app_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// `"msg"` marks a message-style notification, anything else is general
    #[serde(default)]
    pub category: Option<String>,
    /// `group:<room>`, `dm:<peer>` or `sms:<peer>`; only meaningful for message-style records
    #[serde(default)]
    pub conversation_key: Option<String>,
    /// Milliseconds since the Unix epoch, as posted by the OS
    pub timestamp: i64,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    #[serde(default, with = "hex_bytes::option", skip_serializing_if = "Option::is_none")]
    pub icon_data: Option<Vec<u8>>,
}

impl NotificationRecord {
    pub fn new(
        package_name: impl Into<String>,
        app_name: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: 0,
            package_name: package_name.into(),
            app_name: app_name.into(),
            title: None,
            content: None,
            category: None,
            conversation_key: None,
            timestamp,
            is_read: false,
            attachment: None,
            icon_data: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_conversation_key(mut self, key: impl Into<String>) -> Self {
        self.conversation_key = Some(key.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn read(mut self) -> Self {
        self.is_read = true;
        self
    }

    pub fn parsed_conversation_key(&self) -> Option<ConversationKey> {
        self.conversation_key.as_deref().and_then(ConversationKey::parse)
    }
}

pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}
