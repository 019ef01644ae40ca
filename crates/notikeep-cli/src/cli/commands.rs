use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde_json::{json, Value};

use notikeep_core::capture::RawNotification;
use notikeep_core::format::{format_day_header, format_timestamp, is_same_day};
use notikeep_core::grouping::group_for_display;
use notikeep_core::runtime::IngestRuntime;
use notikeep_core::store::{seed_samples_if_empty, Database, NotificationStore};
use notikeep_core::views::{mark_thread_read, split_sender, thread_history, thread_title};

use super::config::CliConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// JSON lines of raw notifications; stdin when `None`
    Ingest { input: Option<PathBuf> },
    Groups,
    Thread { thread_key: String },
    MarkRead { thread_key: String },
    Delete { id: i64 },
    Clear,
    Seed,
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn open_store(config: &CliConfig, data_dir: Option<&Path>) -> Result<NotificationStore> {
    let core = config.core_config(data_dir);
    let db = Database::open(&core.data_dir)
        .with_context(|| format!("Failed to open database in {}", core.data_dir.display()))?;
    Ok(NotificationStore::new(&db).with_dedup_window(core.dedup_window))
}

/// Execute one command and return its JSON result.
pub fn run(command: CliCommand, config: &CliConfig, data_dir: Option<&Path>) -> Result<Value> {
    let store = open_store(config, data_dir)?;

    match command {
        CliCommand::Ingest { input } => {
            let reader: Box<dyn BufRead> = match &input {
                Some(path) => Box::new(BufReader::new(
                    std::fs::File::open(path)
                        .with_context(|| format!("Failed to open {}", path.display()))?,
                )),
                None => Box::new(BufReader::new(std::io::stdin())),
            };
            ingest(reader, store, config, data_dir)
        }
        CliCommand::Groups => {
            let groups = group_for_display(&store.get_all()?);
            Ok(serde_json::to_value(groups)?)
        }
        CliCommand::Thread { thread_key } => {
            let records = store.get_all()?;
            let history = thread_history(&records, &thread_key);
            let fallback_package = history
                .first()
                .map(|r| r.package_name.clone())
                .unwrap_or_default();
            let title = thread_title(&history, &fallback_package, None);

            let mut previous: Option<i64> = None;
            let mut items = Vec::with_capacity(history.len());
            for record in &history {
                let mut item = serde_json::to_value(record)?;
                let content = record.content.as_deref().unwrap_or_default();
                let (sender, message) = match split_sender(content) {
                    Some((sender, message)) => (sender.to_string(), message),
                    None => (
                        record.title.clone().unwrap_or_else(|| record.app_name.clone()),
                        content.trim(),
                    ),
                };
                let starts_new_day =
                    previous.map_or(true, |prev| !is_same_day(prev, record.timestamp));

                item["postedAt"] = json!(format_timestamp(record.timestamp));
                item["sender"] = json!(sender);
                item["message"] = json!(message);
                item["startsNewDay"] = json!(starts_new_day);
                if starts_new_day {
                    item["dayHeader"] = json!(format_day_header(record.timestamp));
                }
                items.push(item);
                previous = Some(record.timestamp);
            }

            Ok(json!({
                "threadKey": thread_key,
                "title": title,
                "items": items,
            }))
        }
        CliCommand::MarkRead { thread_key } => {
            let changed = mark_thread_read(&store, &thread_key)?;
            Ok(json!({ "threadKey": thread_key, "marked": changed }))
        }
        CliCommand::Delete { id } => {
            let deleted = store.delete(id)?;
            Ok(json!({ "id": id, "deleted": deleted }))
        }
        CliCommand::Clear => {
            let deleted = store.delete_all()?;
            Ok(json!({ "deleted": deleted }))
        }
        CliCommand::Seed => {
            let inserted = seed_samples_if_empty(&store, now_millis())?;
            Ok(json!({ "inserted": inserted }))
        }
    }
}

#[tokio::main]
async fn ingest(
    reader: Box<dyn BufRead>,
    store: NotificationStore,
    config: &CliConfig,
    data_dir: Option<&Path>,
) -> Result<Value> {
    let core = config.core_config(data_dir);
    let runtime = IngestRuntime::start(
        &core,
        Arc::new(store),
        Arc::new(config.app_name_table()),
    );
    let handle = runtime.handle();

    let mut invalid = 0u64;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RawNotification>(&line) {
            Ok(raw) => handle.submit(raw).await?,
            Err(e) => {
                invalid += 1;
                tracing::warn!(line = line_no + 1, error = %e, "skipping malformed notification");
            }
        }
    }
    drop(handle);

    let stats = runtime.finish().await;
    Ok(json!({
        "inserted": stats.inserted,
        "duplicates": stats.duplicates,
        "skipped": stats.skipped,
        "failed": stats.failed,
        "invalid": invalid,
    }))
}
