use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::history_store::HistoryStore;
use crate::errors::IoError;
use crate::models::history::{HistoryEntry, HistoryFile, HistoryRecord};

pub static HISTORY_FILE_NAME: &str = "download_history.yml";

/// History persisted as a YAML document in the data directory.
pub struct YamlHistoryStore {
    path: PathBuf,
    entries: Mutex<Vec<HistoryEntry>>,
}

impl YamlHistoryStore {
    /// Opens the history in `data_dir`, creating an empty file when there is
    /// none. Unreadable or malformed content yields an empty log.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(HISTORY_FILE_NAME);
        if std::fs::metadata(&path).is_err() {
            let created = std::fs::create_dir_all(data_dir).and_then(|_| std::fs::write(&path, ""));
            if let Err(e) = created {
                tracing::error!("Could not create {}: {}", path.display(), e);
            }
        }
        let entries = read_entries(&path);
        tracing::debug!(
            entries = entries.len(),
            path = %path.display(),
            "loaded download history"
        );
        YamlHistoryStore {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Vec<HistoryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, entries: &[HistoryEntry]) -> Result<(), IoError> {
        let persist_failed = |reason: String| IoError::PersistFailed {
            path: self.path.clone(),
            reason,
        };
        let document = HistoryFile {
            downloaded_files: entries.to_vec(),
        };
        let yaml = serde_yaml::to_string(&document).map_err(|e| persist_failed(e.to_string()))?;
        std::fs::write(&self.path, yaml).map_err(|e| persist_failed(e.to_string()))
    }
}

impl HistoryStore for YamlHistoryStore {
    fn list(&self) -> Vec<HistoryEntry> {
        self.lock().clone()
    }

    fn append(&self, record: &HistoryRecord) -> Result<(), IoError> {
        // held across the write so concurrent appends cannot drop each other
        let mut entries = self.lock();
        entries.push(HistoryEntry::from(record));
        self.persist(&entries)
    }

    fn flush(&self) -> Result<(), IoError> {
        let entries = self.lock();
        self.persist(&entries)
    }
}

fn read_entries(path: &Path) -> Vec<HistoryEntry> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            let error = IoError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            };
            tracing::warn!("{}; starting with an empty history", error);
            return Vec::new();
        }
    };
    if content.trim().is_empty() {
        return Vec::new();
    }
    match serde_yaml::from_str::<HistoryFile>(&content) {
        Ok(document) => document.downloaded_files,
        Err(e) => {
            tracing::warn!(
                "Malformed history {}: {}; starting with an empty history",
                path.display(),
                e
            );
            Vec::new()
        }
    }
}
