//! Progress throttling and human-readable sizes.

use crate::models::transfer::TransferProgress;

/// Minimum advance, in percentage points, before another report is emitted.
const REPORT_STEP: u64 = 9;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Suppresses progress reports until the transfer has advanced by more than
/// [`REPORT_STEP`] points, or has just reached 100%.
#[derive(Debug, Default)]
pub struct ProgressThrottle {
    last_reported: u64,
}

impl ProgressThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the percentage to report, if any.
    pub fn should_report(&mut self, progress: &TransferProgress) -> Option<u64> {
        let percent = progress.percent()?;
        let finished = percent == 100 && self.last_reported != 100;
        if percent > self.last_reported + REPORT_STEP || finished {
            self.last_reported = percent;
            return Some(percent);
        }
        None
    }
}

/// Formats a byte count with one decimal and 1024-based units, e.g. `2.0 KB`.
pub fn format_file_size(size: u64) -> String {
    if size == 0 {
        return "0 B".to_string();
    }
    let mut group = 0;
    let mut scaled = size;
    while scaled >= 1024 && group < SIZE_UNITS.len() - 1 {
        scaled /= 1024;
        group += 1;
    }
    let value = size as f64 / 1024f64.powi(group as i32);
    format!("{:.1} {}", value, SIZE_UNITS[group])
}
