use std::fmt;

/// One completed download: where it was written and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub path: String,
    pub url: String,
}

impl fmt::Display for HistoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path: {}, URL: {}", self.path, self.url)
    }
}

/// A history line as persisted and displayed. Entries are never parsed back
/// into records.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct HistoryEntry(pub String);

impl From<&HistoryRecord> for HistoryEntry {
    fn from(record: &HistoryRecord) -> Self {
        HistoryEntry(record.to_string())
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct HistoryFile {
    #[serde(rename = "downloaded-files", default)]
    pub downloaded_files: Vec<HistoryEntry>,
}
