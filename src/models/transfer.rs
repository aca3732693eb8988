use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub relative_path: String,
    pub source_url: String,
}

/// A validated download destination inside the sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub absolute_path: PathBuf,
    pub sandbox_root: PathBuf,
    /// Whether a file already sits at `absolute_path` and will be overwritten.
    pub exists: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub bytes_read: u64,
    /// `None` when the server did not advertise a usable length.
    pub total_bytes: Option<u64>,
}

impl TransferProgress {
    pub fn percent(&self) -> Option<u64> {
        self.total_bytes
            .filter(|total| *total > 0)
            .map(|total| self.bytes_read.saturating_mul(100) / total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub record: super::history::HistoryRecord,
    pub bytes_written: u64,
}
