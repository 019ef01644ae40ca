//! Ingestion runtime: a bounded queue between the platform listener and storage.
//!
//! The listener callback pushes [`RawNotification`]s through an [`IngestHandle`];
//! a single consumer task captures, classifies and saves them one at a time.
//! Observers watch a revision counter and regroup whenever it moves.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::capture::{capture_record, AppNameResolver, RawNotification};
use crate::config::CoreConfig;
use crate::store::{NotificationSink, SaveOutcome};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("Ingest queue is full")]
    QueueFull,
    #[error("Ingest runtime has shut down")]
    Closed,
}

/// Per-runtime counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub inserted: u64,
    pub duplicates: u64,
    /// Empty payloads filtered by capture
    pub skipped: u64,
    /// Events whose save failed
    pub failed: u64,
}

#[derive(Clone)]
pub struct IngestHandle {
    tx: mpsc::Sender<RawNotification>,
}

impl IngestHandle {
    /// Enqueue without waiting. Meant for host callbacks that must not block.
    pub fn try_submit(&self, raw: RawNotification) -> Result<(), IngestError> {
        self.tx.try_send(raw).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => IngestError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => IngestError::Closed,
        })
    }

    /// Enqueue, waiting for queue capacity.
    pub async fn submit(&self, raw: RawNotification) -> Result<(), IngestError> {
        self.tx.send(raw).await.map_err(|_| IngestError::Closed)
    }
}

pub struct IngestRuntime {
    handle: IngestHandle,
    changes: watch::Receiver<u64>,
    shutdown_tx: watch::Sender<bool>,
    stats: Arc<Mutex<IngestStats>>,
    task: JoinHandle<()>,
}

impl IngestRuntime {
    /// Spawn the consumer task on the current tokio runtime.
    pub fn start(
        config: &CoreConfig,
        sink: Arc<dyn NotificationSink>,
        app_names: Arc<dyn AppNameResolver>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (changes_tx, changes) = watch::channel(0u64);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(Mutex::new(IngestStats::default()));

        let consumer = Consumer {
            sink,
            app_names,
            changes_tx,
            stats: stats.clone(),
        };
        let task = tokio::spawn(consumer.run(rx, shutdown_rx));

        tracing::info!(capacity = config.queue_capacity, "ingest runtime started");

        Self {
            handle: IngestHandle { tx },
            changes,
            shutdown_tx,
            stats,
            task,
        }
    }

    pub fn handle(&self) -> IngestHandle {
        self.handle.clone()
    }

    /// Receiver of the change revision, bumped after every inserted record.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.clone()
    }

    pub fn stats(&self) -> IngestStats {
        *self.stats.lock()
    }

    /// Process everything already queued, then stop.
    ///
    /// Waits until every outstanding [`IngestHandle`] clone has been dropped.
    pub async fn finish(self) -> IngestStats {
        let Self {
            handle,
            shutdown_tx,
            stats,
            task,
            ..
        } = self;
        drop(handle);

        if let Err(e) = task.await {
            tracing::warn!(error = %e, "ingest task ended abnormally");
        }
        drop(shutdown_tx);

        let stats = *stats.lock();
        tracing::info!(?stats, "ingest runtime finished");
        stats
    }

    /// Stop now. Events still waiting in the queue are dropped; an event
    /// already being processed completes.
    pub async fn shutdown(self) -> IngestStats {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "ingest task ended abnormally");
        }

        let stats = *self.stats.lock();
        tracing::info!(?stats, "ingest runtime shut down");
        stats
    }
}

struct Consumer {
    sink: Arc<dyn NotificationSink>,
    app_names: Arc<dyn AppNameResolver>,
    changes_tx: watch::Sender<u64>,
    stats: Arc<Mutex<IngestStats>>,
}

impl Consumer {
    async fn run(
        self,
        mut rx: mpsc::Receiver<RawNotification>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                next = rx.recv() => match next {
                    Some(raw) => self.process(raw).await,
                    None => break,
                },
            }
        }
        tracing::debug!("ingest consumer stopped");
    }

    async fn process(&self, raw: RawNotification) {
        let Some(record) = capture_record(&raw, self.app_names.as_ref()) else {
            self.stats.lock().skipped += 1;
            return;
        };

        let sink = self.sink.clone();
        let result = tokio::task::spawn_blocking(move || sink.save(&record)).await;

        match result {
            Ok(Ok(SaveOutcome::Inserted { .. })) => {
                self.stats.lock().inserted += 1;
                self.changes_tx.send_modify(|revision| *revision += 1);
            }
            Ok(Ok(SaveOutcome::Duplicate { .. })) => {
                self.stats.lock().duplicates += 1;
            }
            Ok(Err(e)) => {
                self.stats.lock().failed += 1;
                tracing::warn!(
                    package = %raw.package_name,
                    error = %e,
                    "failed to save notification"
                );
            }
            Err(e) => {
                self.stats.lock().failed += 1;
                tracing::warn!(package = %raw.package_name, error = %e, "save task panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{ConversationHints, PackageNameResolver};
    use crate::models::NotificationRecord;
    use crate::store::{Database, NotificationStore, StoreError};

    fn raw(title: &str, text: &str, post_time: i64) -> RawNotification {
        RawNotification {
            package_name: "com.chat".to_string(),
            post_time,
            text: Some(text.to_string()),
            category: Some("msg".to_string()),
            hints: ConversationHints {
                title: Some(title.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn start(store: &NotificationStore, capacity: usize) -> IngestRuntime {
        let config = CoreConfig::new("/unused").with_queue_capacity(capacity);
        IngestRuntime::start(&config, Arc::new(store.clone()), Arc::new(PackageNameResolver))
    }

    #[tokio::test]
    async fn test_events_are_persisted_and_deduplicated() {
        let store = NotificationStore::new(&Database::open_in_memory().unwrap());
        let runtime = start(&store, 16);
        let handle = runtime.handle();

        handle.submit(raw("Alice", "hi", 1)).await.unwrap();
        handle.submit(raw("Alice", "hi", 2)).await.unwrap();
        handle.submit(raw("Bob", "yo", 3)).await.unwrap();
        handle.submit(raw(" ", "", 4)).await.unwrap();
        drop(handle);

        let stats = runtime.finish().await;
        assert_eq!(
            stats,
            IngestStats {
                inserted: 2,
                duplicates: 1,
                skipped: 1,
                failed: 0
            }
        );

        let records = store.get_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].conversation_key.as_deref(), Some("dm:Bob"));
        assert_eq!(records[0].app_name, "com.chat");
    }

    #[tokio::test]
    async fn test_revision_bumps_on_insert() {
        let store = NotificationStore::new(&Database::open_in_memory().unwrap());
        let runtime = start(&store, 4);
        let mut changes = runtime.subscribe();

        runtime.handle().submit(raw("Alice", "hi", 1)).await.unwrap();
        changes.changed().await.unwrap();
        assert_eq!(*changes.borrow_and_update(), 1);

        runtime.finish().await;
    }

    #[tokio::test]
    async fn test_try_submit_reports_full_queue() {
        let store = NotificationStore::new(&Database::open_in_memory().unwrap());
        let runtime = start(&store, 1);
        let handle = runtime.handle();

        // The consumer has not been polled yet on this single-threaded runtime.
        assert_eq!(handle.try_submit(raw("Alice", "one", 1)), Ok(()));
        assert_eq!(
            handle.try_submit(raw("Alice", "two", 2)),
            Err(IngestError::QueueFull)
        );
        drop(handle);

        let stats = runtime.finish().await;
        assert_eq!(stats.inserted, 1);
    }

    #[tokio::test]
    async fn test_shutdown_drops_queued_events() {
        let store = NotificationStore::new(&Database::open_in_memory().unwrap());
        let runtime = start(&store, 8);
        let handle = runtime.handle();

        for i in 0..3 {
            handle.try_submit(raw("Alice", &format!("msg {}", i), i)).unwrap();
        }

        let stats = runtime.shutdown().await;
        assert_eq!(stats, IngestStats::default());
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(handle.try_submit(raw("Alice", "late", 9)), Err(IngestError::Closed));
    }

    struct FailingSink;

    impl NotificationSink for FailingSink {
        fn save(&self, _record: &NotificationRecord) -> Result<SaveOutcome, StoreError> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }
    }

    #[tokio::test]
    async fn test_save_failures_are_counted_and_swallowed() {
        let config = CoreConfig::new("/unused");
        let runtime =
            IngestRuntime::start(&config, Arc::new(FailingSink), Arc::new(PackageNameResolver));

        runtime.handle().submit(raw("Alice", "hi", 1)).await.unwrap();
        runtime.handle().submit(raw("Bob", "hi", 2)).await.unwrap();

        let stats = runtime.finish().await;
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.inserted, 0);
    }
}
