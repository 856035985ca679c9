//! JSON file backed settings store

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::state::settings::SettingsStore;

/// Settings kept in memory and flushed to a flat JSON object file.
///
/// `set` never touches the disk; a background writer persists the latest
/// contents, coalescing bursts of updates into one write.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, Value>,
    writer: watch::Sender<BTreeMap<String, Value>>,
}

impl JsonFileStore {
    /// Load `path` (missing or unreadable files start empty) and spawn the writer.
    /// Must be called from within a tokio runtime.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, String> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory {}: {}", parent.display(), e))?;
        }

        let values = read_file(&path);
        info!("Loaded {} setting(s) from {}", values.len(), path.display());

        let (writer, rx) = watch::channel(values.clone());
        tokio::spawn(write_loop(path.clone(), rx));

        Ok(Self { path, values, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        if self.values.get(key) == Some(&value) {
            return;
        }
        self.values.insert(key.to_string(), value);
        if self.writer.send(self.values.clone()).is_err() {
            warn!("Settings writer stopped, {} will not be persisted", key);
        }
    }
}

fn read_file(path: &Path) -> BTreeMap<String, Value> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!("No settings read from {}: {}", path.display(), e);
            return BTreeMap::new();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(values) => values,
        Err(e) => {
            warn!("Settings file {} is not valid JSON, starting fresh: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

async fn write_loop(path: PathBuf, mut rx: watch::Receiver<BTreeMap<String, Value>>) {
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        let json = match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode settings: {}", e);
                continue;
            }
        };

        // Write then rename so a crash never leaves a half-written file
        let tmp = path.with_extension("json.tmp");
        let result = async {
            tokio::fs::write(&tmp, json).await?;
            tokio::fs::rename(&tmp, &path).await
        }
        .await;

        match result {
            Ok(()) => debug!("Settings saved to {}", path.display()),
            Err(e) => warn!("Failed to save settings to {}: {}", path.display(), e),
        }
    }
}

/// Default location: `<config dir>/break-reminder/settings.json`
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("break-reminder")
        .join("settings.json")
}
