//! Read-side helpers for a single thread.

use crate::classifier::{is_message_notification, thread_key};
use crate::models::{ConversationKey, NotificationRecord};
use crate::store::{NotificationStore, StoreError};

/// Members of one thread, oldest first.
pub fn thread_history<'a>(
    records: &'a [NotificationRecord],
    thread: &str,
) -> Vec<&'a NotificationRecord> {
    let mut history: Vec<_> = records
        .iter()
        .filter(|record| thread_key(record) == thread)
        .collect();
    history.sort_by_key(|record| record.timestamp);
    history
}

/// Heading for a thread view.
///
/// Message threads are named after their room or peer; app-level threads after the app.
pub fn thread_title(
    history: &[&NotificationRecord],
    fallback_package: &str,
    fallback_title: Option<&str>,
) -> String {
    let Some(latest) = history
        .iter()
        .copied()
        .reduce(|best, next| if next.timestamp >= best.timestamp { next } else { best })
    else {
        return fallback_title.unwrap_or(fallback_package).to_string();
    };

    if !is_message_notification(latest) {
        return latest.app_name.clone();
    }

    match latest.parsed_conversation_key() {
        Some(
            ConversationKey::Group(label)
            | ConversationKey::Direct(label)
            | ConversationKey::Sms(label),
        ) if !label.trim().is_empty() => label,
        _ => latest.title.clone().unwrap_or_else(|| latest.app_name.clone()),
    }
}

/// Longest sender prefix, in characters, recognised by [`split_sender`].
const MAX_SENDER_CHARS: usize = 20;

/// Split `"Alice: see you"` into its sender and message parts.
///
/// The first colon counts only when it sits within the first
/// [`MAX_SENDER_CHARS`] characters and both sides are non-blank. Both parts
/// come back trimmed.
pub fn split_sender(content: &str) -> Option<(&str, &str)> {
    let raw = content.trim();
    let colon = raw.find(':')?;
    let sender_chars = raw[..colon].chars().count();
    if !(1..=MAX_SENDER_CHARS).contains(&sender_chars) {
        return None;
    }

    let sender = raw[..colon].trim();
    let message = raw[colon + 1..].trim();
    if sender.is_empty() || message.is_empty() {
        return None;
    }
    Some((sender, message))
}

/// Mark every unread member of `thread` as read. Returns how many changed.
pub fn mark_thread_read(store: &NotificationStore, thread: &str) -> Result<usize, StoreError> {
    let records = store.get_all()?;
    let unread: Vec<i64> = records
        .iter()
        .filter(|record| !record.is_read && thread_key(record) == thread)
        .map(|record| record.id)
        .collect();
    store.mark_read(&unread)
}
