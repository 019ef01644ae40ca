pub mod capture;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod format;
pub mod grouping;
pub mod models;
pub mod runtime;
pub mod store;
pub mod tracing_setup;
pub mod views;

pub use classifier::{dedup_key, is_message_notification, normalize_text, thread_key};
pub use grouping::group_for_display;
pub use models::{Attachment, ConversationKey, NotificationGroup, NotificationRecord};
