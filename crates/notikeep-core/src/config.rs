use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::DEFAULT_QUEUE_CAPACITY;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    /// Capacity of the bounded ingest queue
    pub queue_capacity: usize,
    /// Only rows this close in time to an incoming record count as duplicates.
    /// `None` suppresses a repeat regardless of age.
    pub dedup_window: Option<Duration>,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            dedup_window: None,
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_dedup_window(mut self, window: Option<Duration>) -> Self {
        self.dedup_window = window;
        self
    }

    /// `$XDG_DATA_HOME/notikeep` or the platform equivalent, falling back to `./notikeep_data`.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("notikeep"))
            .unwrap_or_else(|| PathBuf::from("notikeep_data"))
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new(Self::default_data_dir())
    }
}
