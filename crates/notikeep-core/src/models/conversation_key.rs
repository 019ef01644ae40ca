use std::fmt;

use crate::constants::conversation::{DIRECT_PREFIX, GROUP_PREFIX, SMS_PREFIX};

/// Parsed form of a record's `conversation_key` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationKey {
    /// Multi-party room, `group:<room>`
    Group(String),
    /// One-to-one chat, `dm:<peer>`
    Direct(String),
    /// Carrier message thread, `sms:<peer>`
    Sms(String),
    /// Anything without a known prefix
    Other(String),
}

impl ConversationKey {
    /// Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        let key = if let Some(room) = raw.strip_prefix(GROUP_PREFIX) {
            ConversationKey::Group(room.to_string())
        } else if let Some(peer) = raw.strip_prefix(DIRECT_PREFIX) {
            ConversationKey::Direct(peer.to_string())
        } else if let Some(peer) = raw.strip_prefix(SMS_PREFIX) {
            ConversationKey::Sms(peer.to_string())
        } else {
            ConversationKey::Other(raw.to_string())
        };
        Some(key)
    }

    /// Room or peer name without the prefix.
    pub fn label(&self) -> &str {
        match self {
            ConversationKey::Group(name)
            | ConversationKey::Direct(name)
            | ConversationKey::Sms(name)
            | ConversationKey::Other(name) => name,
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationKey::Group(room) => write!(f, "{}{}", GROUP_PREFIX, room),
            ConversationKey::Direct(peer) => write!(f, "{}{}", DIRECT_PREFIX, peer),
            ConversationKey::Sms(peer) => write!(f, "{}{}", SMS_PREFIX, peer),
            ConversationKey::Other(raw) => f.write_str(raw),
        }
    }
}
