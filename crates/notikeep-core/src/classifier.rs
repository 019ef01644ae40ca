//! Thread and dedup key derivation.
//!
//! Every function here is pure and total. Keys are compared against values
//! computed by earlier versions, so changing the normalization rules invalidates
//! the dedup hashes already stored on disk.

use std::sync::OnceLock;

use regex::{NoExpand, Regex};

use crate::constants::tokens::{NUMBER, PERCENT, TIME};
use crate::constants::{DEDUP_SEPARATOR, MESSAGE_CATEGORY, MESSAGE_THREAD_SEPARATOR};
use crate::models::NotificationRecord;

/// Grouping key for the thread list.
///
/// Message-style notifications group by conversation (or title when the
/// conversation is unknown) within their package; everything else groups by app.
pub fn thread_key(record: &NotificationRecord) -> String {
    if is_message_notification(record) {
        let conversation_token = normalize_text(record.conversation_key.as_deref());
        if !conversation_token.is_empty() {
            return message_thread_key(&record.package_name, &conversation_token);
        }
        let title_token = normalize_text(record.title.as_deref());
        if !title_token.is_empty() {
            return message_thread_key(&record.package_name, &title_token);
        }
    }

    let app_name_token = normalize_text(Some(&record.app_name));
    if !app_name_token.is_empty() {
        app_name_token
    } else {
        normalize_text(Some(&record.package_name))
    }
}

fn message_thread_key(package_name: &str, token: &str) -> String {
    format!(
        "{}{}{}",
        normalize_text(Some(package_name)),
        MESSAGE_THREAD_SEPARATOR,
        token
    )
}

/// Key that identifies a content-identical repeat inside one thread.
pub fn dedup_key(record: &NotificationRecord) -> String {
    let content_token = normalize_text(record.content.as_deref());
    format!("{}{}{}", thread_key(record), DEDUP_SEPARATOR, content_token)
}

pub fn is_message_notification(record: &NotificationRecord) -> bool {
    normalize_text(record.category.as_deref()) == MESSAGE_CATEGORY
}

/// Canonical comparison form of free text.
///
/// Lowercases, replaces volatile tokens (`40%`, `9:30`, `123`) with placeholders
/// and collapses whitespace. Percent and clock tokens are rewritten before bare
/// digit runs so they are not split up by the generic rule.
pub fn normalize_text(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };
    if text.trim().is_empty() {
        return String::new();
    }

    let lowered = text.to_lowercase();
    let replaced = percent_re().replace_all(&lowered, NoExpand(PERCENT));
    let replaced = time_re().replace_all(&replaced, NoExpand(TIME));
    let replaced = number_re().replace_all(&replaced, NoExpand(NUMBER));
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Digit classes are spelled `[0-9]` because `\d` matches every Unicode digit.

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+%").expect("percent regex must compile"))
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]{1,2}:[0-9]{2}").expect("time regex must compile"))
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+").expect("number regex must compile"))
}
