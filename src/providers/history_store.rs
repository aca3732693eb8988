use crate::errors::IoError;
use crate::models::history::{HistoryEntry, HistoryRecord};

/// Append-only log of completed downloads.
pub trait HistoryStore: Send + Sync {
    /// All entries, oldest first. Served from memory.
    fn list(&self) -> Vec<HistoryEntry>;

    /// Appends `record` and persists the whole log. The in-memory entry is
    /// kept even when persisting fails.
    fn append(&self, record: &HistoryRecord) -> Result<(), IoError>;

    fn flush(&self) -> Result<(), IoError>;
}
