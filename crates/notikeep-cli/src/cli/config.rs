use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use notikeep_core::capture::StaticAppNames;
use notikeep_core::config::CoreConfig;
use serde::{Deserialize, Serialize};

/// CLI configuration that can be loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Directory holding notikeep.db
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Capacity of the ingest queue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,

    /// Repeats older than this many seconds are stored again
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedup_window_secs: Option<u64>,

    /// Display labels keyed by package name
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub app_names: HashMap<String, String>,
}

impl CliConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Core settings, with `data_dir_override` taking precedence over the file.
    pub fn core_config(&self, data_dir_override: Option<&Path>) -> CoreConfig {
        let data_dir = data_dir_override
            .map(Path::to_path_buf)
            .or_else(|| self.data_dir.clone())
            .unwrap_or_else(CoreConfig::default_data_dir);

        let mut config = CoreConfig::new(data_dir)
            .with_dedup_window(self.dedup_window_secs.map(Duration::from_secs));
        if let Some(capacity) = self.queue_capacity {
            config = config.with_queue_capacity(capacity);
        }
        config
    }

    pub fn app_name_table(&self) -> StaticAppNames {
        self.app_names
            .iter()
            .map(|(package, name)| (package.clone(), name.clone()))
            .collect()
    }
}
