use std::path::PathBuf;

use thiserror::Error;

/// Rejections of a download destination. All of them happen before any
/// network traffic.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Path traversal attempt detected: {0} is outside the sandbox root")]
    Traversal(PathBuf),

    #[error("Error validating path {path}: {source}")]
    ResolutionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not create directory {path}: {source}")]
    DirCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is a directory, not a file")]
    NotAFile(PathBuf),
}

#[derive(Debug, Error)]
pub enum IoError {
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not save {path}: {reason}")]
    PersistFailed { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Server responded with code: {code}{}", reason_suffix(.reason))]
    BadStatus {
        code: u16,
        reason: Option<&'static str>,
    },

    #[error("{0}")]
    NetworkIo(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] IoError),
}

/// Reasons a download request is refused before anything is dispatched.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

fn reason_suffix(reason: &Option<&'static str>) -> String {
    reason.map(|r| format!(" {r}")).unwrap_or_default()
}
