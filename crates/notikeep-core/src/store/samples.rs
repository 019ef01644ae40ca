//! Demo rows for a freshly created database.

use super::{NotificationStore, StoreError};
use crate::models::{Attachment, NotificationRecord};

const ONE_DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// 1x1 transparent PNG used as the sample attachment.
const SAMPLE_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

fn sample_records(now_ms: i64) -> Vec<NotificationRecord> {
    let yesterday = now_ms - ONE_DAY_MS;
    vec![
        NotificationRecord::new("com.notikeep.sample.general", "Sample data", now_ms - 120_000)
            .with_title("General notification sample")
            .with_attachment(Attachment {
                data: SAMPLE_PNG.to_vec(),
                mime_type: "image/png".to_string(),
                file_name: "sample_general_image.png".to_string(),
            }),
        NotificationRecord::new(
            "com.notikeep.sample.sms",
            "Sample data",
            yesterday - 10 * 60 * 1000,
        )
        .with_title("SMS sample")
        .with_content("Gildong: message sent yesterday")
        .with_category("msg")
        .with_conversation_key("sms:Minsu"),
        NotificationRecord::new("com.notikeep.sample.sms", "Sample data", now_ms - 60_000)
            .with_title("SMS sample")
            .with_content("Gildong: message sent today")
            .with_category("msg")
            .with_conversation_key("sms:Minsu"),
    ]
}

/// Insert the sample rows when the store is empty. Returns how many were written.
pub fn seed_samples_if_empty(store: &NotificationStore, now_ms: i64) -> Result<usize, StoreError> {
    if store.count()? > 0 {
        return Ok(0);
    }

    let samples = sample_records(now_ms);
    for record in &samples {
        store.insert_unchecked(record)?;
    }
    tracing::info!(count = samples.len(), "inserted sample notifications");
    Ok(samples.len())
}
