//! Turning raw platform notifications into storable records.
//!
//! The host listener pulls the relevant extras out of the OS notification and
//! hands them over as a [`RawNotification`]. Everything from there on (conversation
//! inference, title rewriting, attachment selection) happens here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::conversation::{DIRECT_PREFIX, GROUP_PREFIX};
use crate::constants::{FALLBACK_MIME_TYPE, MAX_ATTACHMENT_BYTES};
use crate::models::hex_bytes;
use crate::models::record::is_blank;
use crate::models::{Attachment, NotificationRecord};

/// Metadata fields used to infer which conversation a notification belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationHints {
    pub is_group_conversation: bool,
    pub title: Option<String>,
    pub conversation_title: Option<String>,
    pub sub_text: Option<String>,
    pub summary_text: Option<String>,
    pub big_title: Option<String>,
    pub group_key: Option<String>,
    pub tag: Option<String>,
    pub notification_key: Option<String>,
}

/// One entry of a messaging-style payload that may carry a shared file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessagePayload {
    #[serde(with = "hex_bytes::option", skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    pub mime_type: Option<String>,
}

/// Content reachable through the notification's stream URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamPayload {
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
    pub uri: Option<String>,
}

/// A posted notification as delivered by the platform listener.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawNotification {
    pub package_name: String,
    /// Milliseconds since the Unix epoch
    pub post_time: i64,
    pub text: Option<String>,
    pub category: Option<String>,
    #[serde(flatten)]
    pub hints: ConversationHints,
    #[serde(with = "hex_bytes::option", skip_serializing_if = "Option::is_none")]
    pub icon_png: Option<Vec<u8>>,
    /// Big-picture style image, already PNG encoded
    #[serde(with = "hex_bytes::option", skip_serializing_if = "Option::is_none")]
    pub picture_png: Option<Vec<u8>>,
    pub messages: Vec<MessagePayload>,
    pub stream: Option<StreamPayload>,
}

/// Maps a package name to its user-visible label.
pub trait AppNameResolver: Send + Sync {
    fn app_name(&self, package_name: &str) -> Option<String>;

    /// Label for `package_name`, or the package name itself when unknown.
    fn resolve(&self, package_name: &str) -> String {
        self.app_name(package_name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| package_name.to_string())
    }
}

/// Resolver that knows no labels; every app is shown by its package name.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageNameResolver;

impl AppNameResolver for PackageNameResolver {
    fn app_name(&self, _package_name: &str) -> Option<String> {
        None
    }
}

/// Fixed package -> label table.
#[derive(Debug, Clone, Default)]
pub struct StaticAppNames {
    names: HashMap<String, String>,
}

impl StaticAppNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package_name: impl Into<String>, app_name: impl Into<String>) {
        self.names.insert(package_name.into(), app_name.into());
    }
}

impl FromIterator<(String, String)> for StaticAppNames {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

impl AppNameResolver for StaticAppNames {
    fn app_name(&self, package_name: &str) -> Option<String> {
        self.names.get(package_name).cloned()
    }
}

/// Best-effort conversation key for a notification.
///
/// Group conversations are keyed by room name (`group:<room>`), falling back to the
/// platform grouping identifiers when no room name differs from the plain title.
/// Everything else is treated as a direct chat keyed by peer (`dm:<peer>`).
pub fn infer_conversation_key(hints: &ConversationHints) -> Option<String> {
    if hints.is_group_conversation {
        let room_name = first_non_blank([
            hints.conversation_title.as_deref(),
            hints.summary_text.as_deref(),
            hints.big_title.as_deref(),
            hints.sub_text.as_deref(),
        ]);
        if let Some(room) = room_name {
            if Some(room) != hints.title.as_deref() {
                return Some(format!("{}{}", GROUP_PREFIX, room));
            }
        }

        let fallback = first_non_blank([
            hints.group_key.as_deref(),
            hints.tag.as_deref(),
            hints.notification_key.as_deref(),
        ]);
        return fallback.map(|id| format!("{}{}", GROUP_PREFIX, id));
    }

    first_non_blank([
        hints.conversation_title.as_deref(),
        hints.title.as_deref(),
        hints.sub_text.as_deref(),
    ])
    .map(|peer| format!("{}{}", DIRECT_PREFIX, peer))
}

fn first_non_blank<'a, const N: usize>(values: [Option<&'a str>; N]) -> Option<&'a str> {
    values
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

/// Title shown for the record: the room name for group conversations, else the raw title.
pub fn display_title(conversation_key: Option<&str>, title: Option<&str>) -> Option<String> {
    conversation_key
        .and_then(|key| key.strip_prefix(GROUP_PREFIX))
        .filter(|room| !room.trim().is_empty())
        .or(title)
        .map(str::to_string)
}

/// Pick the attachment to keep, in priority order: big picture, the latest
/// messaging-style entry with data, then the stream payload.
pub fn extract_attachment(raw: &RawNotification) -> Option<Attachment> {
    if let Some(picture) = raw.picture_png.as_deref() {
        return capped(
            picture,
            "image/png".to_string(),
            format!("notification_image_{}.png", raw.post_time),
        );
    }

    let latest_with_data = raw.messages.iter().rev().find_map(|message| {
        let data = message.data.as_deref()?;
        Some((data, &message.mime_type))
    });
    if let Some((data, mime_type)) = latest_with_data {
        let mime_type = mime_type
            .clone()
            .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string());
        let file_name = format!("attachment_{}", raw.post_time);
        // An empty message payload falls through to the stream.
        if let Some(attachment) = capped(data, mime_type, file_name) {
            return Some(attachment);
        }
    }

    let stream = raw.stream.as_ref()?;
    let mime_type = stream
        .mime_type
        .clone()
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string());
    let file_name = stream
        .uri
        .as_deref()
        .and_then(last_path_segment)
        .map(str::to_string)
        .unwrap_or_else(|| format!("attachment_{}", raw.post_time));
    capped(&stream.data, mime_type, file_name)
}

fn capped(data: &[u8], mime_type: String, file_name: String) -> Option<Attachment> {
    if data.is_empty() {
        return None;
    }
    let len = data.len().min(MAX_ATTACHMENT_BYTES);
    Some(Attachment {
        data: data[..len].to_vec(),
        mime_type,
        file_name,
    })
}

fn last_path_segment(uri: &str) -> Option<&str> {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .filter(|segment| !segment.ends_with(':'))
}

/// Build the record to persist, or `None` when there is nothing to show.
pub fn capture_record(
    raw: &RawNotification,
    app_names: &dyn AppNameResolver,
) -> Option<NotificationRecord> {
    let conversation_key = infer_conversation_key(&raw.hints);
    let title = display_title(conversation_key.as_deref(), raw.hints.title.as_deref());

    tracing::debug!(
        package = %raw.package_name,
        key = ?raw.hints.notification_key,
        group_key = ?raw.hints.group_key,
        category = ?raw.category,
        is_group = raw.hints.is_group_conversation,
        conversation_key = ?conversation_key,
        "notification posted"
    );

    if is_blank(raw.hints.title.as_deref()) && is_blank(raw.text.as_deref()) {
        tracing::debug!(
            package = %raw.package_name,
            key = ?raw.hints.notification_key,
            "skip empty payload"
        );
        return None;
    }

    Some(NotificationRecord {
        id: 0,
        package_name: raw.package_name.clone(),
        app_name: app_names.resolve(&raw.package_name),
        title,
        content: raw.text.clone(),
        category: raw.category.clone(),
        conversation_key,
        timestamp: raw.post_time,
        is_read: false,
        attachment: extract_attachment(raw),
        icon_data: raw.icon_png.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> ConversationHints {
        ConversationHints::default()
    }

    #[test]
    fn test_group_uses_conversation_title() {
        let hints = ConversationHints {
            is_group_conversation: true,
            title: Some("Alice".to_string()),
            conversation_title: Some("Team Chat".to_string()),
            ..hints()
        };
        assert_eq!(infer_conversation_key(&hints).as_deref(), Some("group:Team Chat"));
    }

    #[test]
    fn test_group_skips_blank_candidates_in_order() {
        let hints = ConversationHints {
            is_group_conversation: true,
            conversation_title: Some(" ".to_string()),
            summary_text: None,
            big_title: Some("Family".to_string()),
            sub_text: Some("Other".to_string()),
            ..hints()
        };
        assert_eq!(infer_conversation_key(&hints).as_deref(), Some("group:Family"));
    }

    #[test]
    fn test_group_room_equal_to_title_falls_back_to_group_key() {
        let hints = ConversationHints {
            is_group_conversation: true,
            title: Some("Team".to_string()),
            conversation_title: Some("Team".to_string()),
            tag: Some("tag-1".to_string()),
            notification_key: Some("0|com.x|1".to_string()),
            ..hints()
        };
        assert_eq!(infer_conversation_key(&hints).as_deref(), Some("group:tag-1"));
    }

    #[test]
    fn test_group_fallback_prefers_group_key_over_tag() {
        let hints = ConversationHints {
            is_group_conversation: true,
            title: Some("Team".to_string()),
            conversation_title: Some("Team".to_string()),
            group_key: Some("gk-1".to_string()),
            tag: Some("tag-1".to_string()),
            notification_key: Some("0|com.x|1".to_string()),
            ..hints()
        };
        assert_eq!(infer_conversation_key(&hints).as_deref(), Some("group:gk-1"));
    }

    #[test]
    fn test_group_fallback_skips_blank_identifiers() {
        let hints = ConversationHints {
            is_group_conversation: true,
            group_key: Some("  ".to_string()),
            tag: None,
            notification_key: Some("0|com.x|1".to_string()),
            ..hints()
        };
        assert_eq!(infer_conversation_key(&hints).as_deref(), Some("group:0|com.x|1"));
    }

    #[test]
    fn test_group_summary_text_after_blank_conversation_title() {
        let hints = ConversationHints {
            is_group_conversation: true,
            title: Some("Alice".to_string()),
            conversation_title: Some("".to_string()),
            summary_text: Some("Hiking Club".to_string()),
            big_title: Some("Other".to_string()),
            ..hints()
        };
        assert_eq!(infer_conversation_key(&hints).as_deref(), Some("group:Hiking Club"));
    }

    #[test]
    fn test_direct_falls_back_to_sub_text() {
        let hints = ConversationHints {
            title: Some(" ".to_string()),
            sub_text: Some("Carol".to_string()),
            ..hints()
        };
        assert_eq!(infer_conversation_key(&hints).as_deref(), Some("dm:Carol"));
    }

    #[test]
    fn test_group_without_any_identifier() {
        let hints = ConversationHints {
            is_group_conversation: true,
            ..hints()
        };
        assert_eq!(infer_conversation_key(&hints), None);
    }

    #[test]
    fn test_direct_uses_title() {
        let hints = ConversationHints {
            title: Some("Bob".to_string()),
            ..hints()
        };
        assert_eq!(infer_conversation_key(&hints).as_deref(), Some("dm:Bob"));
    }

    #[test]
    fn test_direct_prefers_conversation_title() {
        let hints = ConversationHints {
            title: Some("Bob".to_string()),
            conversation_title: Some("Robert".to_string()),
            ..hints()
        };
        assert_eq!(infer_conversation_key(&hints).as_deref(), Some("dm:Robert"));
    }

    #[test]
    fn test_direct_without_candidates() {
        assert_eq!(infer_conversation_key(&hints()), None);
    }

    #[test]
    fn test_display_title_uses_room_for_groups() {
        assert_eq!(
            display_title(Some("group:Team Chat"), Some("Alice")).as_deref(),
            Some("Team Chat")
        );
        assert_eq!(display_title(Some("group:"), Some("Alice")).as_deref(), Some("Alice"));
        assert_eq!(display_title(Some("dm:Bob"), Some("Bob")).as_deref(), Some("Bob"));
        assert_eq!(display_title(None, None), None);
    }

    #[test]
    fn test_capture_skips_empty_payload() {
        let raw = RawNotification {
            package_name: "com.x".to_string(),
            post_time: 1,
            text: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(capture_record(&raw, &PackageNameResolver).is_none());
    }

    #[test]
    fn test_capture_group_message() {
        let mut names = StaticAppNames::new();
        names.insert("com.chat", "Chat");
        let raw = RawNotification {
            package_name: "com.chat".to_string(),
            post_time: 1_700_000_000_000,
            text: Some("Lunch?".to_string()),
            category: Some("msg".to_string()),
            hints: ConversationHints {
                is_group_conversation: true,
                title: Some("Alice".to_string()),
                conversation_title: Some("Team Chat".to_string()),
                ..hints()
            },
            ..Default::default()
        };

        let record = capture_record(&raw, &names).unwrap();
        assert_eq!(record.id, 0);
        assert_eq!(record.app_name, "Chat");
        assert_eq!(record.title.as_deref(), Some("Team Chat"));
        assert_eq!(record.conversation_key.as_deref(), Some("group:Team Chat"));
        assert_eq!(record.timestamp, 1_700_000_000_000);
        assert!(!record.is_read);
        assert!(record.attachment.is_none());
    }

    #[test]
    fn test_unknown_app_resolves_to_package() {
        let raw = RawNotification {
            package_name: "com.unknown".to_string(),
            text: Some("hello".to_string()),
            ..Default::default()
        };
        let record = capture_record(&raw, &PackageNameResolver).unwrap();
        assert_eq!(record.app_name, "com.unknown");
    }

    #[test]
    fn test_attachment_priority_prefers_picture() {
        let raw = RawNotification {
            post_time: 7,
            picture_png: Some(vec![1, 2, 3]),
            messages: vec![MessagePayload {
                data: Some(vec![9]),
                mime_type: Some("image/jpeg".to_string()),
            }],
            ..Default::default()
        };
        let attachment = extract_attachment(&raw).unwrap();
        assert_eq!(attachment.mime_type, "image/png");
        assert_eq!(attachment.file_name, "notification_image_7.png");
        assert_eq!(attachment.data, vec![1, 2, 3]);
    }

    #[test]
    fn test_attachment_uses_latest_message_with_data() {
        let raw = RawNotification {
            post_time: 7,
            messages: vec![
                MessagePayload {
                    data: Some(vec![1]),
                    mime_type: Some("image/jpeg".to_string()),
                },
                MessagePayload {
                    data: Some(vec![2]),
                    mime_type: None,
                },
                MessagePayload::default(),
            ],
            ..Default::default()
        };
        let attachment = extract_attachment(&raw).unwrap();
        assert_eq!(attachment.data, vec![2]);
        assert_eq!(attachment.mime_type, FALLBACK_MIME_TYPE);
    }

    #[test]
    fn test_empty_message_payload_falls_through_to_stream() {
        let raw = RawNotification {
            post_time: 7,
            messages: vec![MessagePayload {
                data: Some(vec![]),
                mime_type: Some("image/jpeg".to_string()),
            }],
            stream: Some(StreamPayload {
                data: vec![1, 2],
                mime_type: None,
                uri: Some("content://x/report.pdf".to_string()),
            }),
            ..Default::default()
        };
        let attachment = extract_attachment(&raw).unwrap();
        assert_eq!(attachment.data, vec![1, 2]);
        assert_eq!(attachment.file_name, "report.pdf");
        assert_eq!(attachment.mime_type, FALLBACK_MIME_TYPE);
    }

    #[test]
    fn test_capture_keeps_title_only_notification() {
        let raw = RawNotification {
            package_name: "com.x".to_string(),
            text: None,
            hints: ConversationHints {
                title: Some("Update ready".to_string()),
                ..hints()
            },
            ..Default::default()
        };
        let record = capture_record(&raw, &PackageNameResolver).unwrap();
        assert_eq!(record.title.as_deref(), Some("Update ready"));
        assert!(record.content.is_none());
    }

    #[test]
    fn test_stream_attachment_name_from_uri() {
        let raw = RawNotification {
            post_time: 7,
            stream: Some(StreamPayload {
                data: vec![5, 5],
                mime_type: Some("application/pdf".to_string()),
                uri: Some("content://files/shared/report.pdf?x=1".to_string()),
            }),
            ..Default::default()
        };
        let attachment = extract_attachment(&raw).unwrap();
        assert_eq!(attachment.file_name, "report.pdf");
        assert_eq!(attachment.mime_type, "application/pdf");
    }

    #[test]
    fn test_empty_stream_yields_no_attachment() {
        let raw = RawNotification {
            stream: Some(StreamPayload::default()),
            ..Default::default()
        };
        assert!(extract_attachment(&raw).is_none());
    }

    #[test]
    fn test_attachment_truncated_to_cap() {
        let raw = RawNotification {
            picture_png: Some(vec![0u8; MAX_ATTACHMENT_BYTES + 10]),
            ..Default::default()
        };
        let attachment = extract_attachment(&raw).unwrap();
        assert_eq!(attachment.data.len(), MAX_ATTACHMENT_BYTES);
    }

    #[test]
    fn test_raw_notification_from_json() {
        let json = r#"{
            "packageName": "com.chat",
            "postTime": 10,
            "title": "Bob",
            "text": "yo",
            "category": "msg",
            "isGroupConversation": false
        }"#;
        let raw: RawNotification = serde_json::from_str(json).unwrap();
        assert_eq!(raw.hints.title.as_deref(), Some("Bob"));
        let record = capture_record(&raw, &PackageNameResolver).unwrap();
        assert_eq!(record.conversation_key.as_deref(), Some("dm:Bob"));
    }
}
