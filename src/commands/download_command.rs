use std::path::Path;
use std::sync::Arc;

use reqwest::Url;

use super::notifier::{NoticeLevel, Notifier};
use super::router::{CommandHandler, CommandRouter};
use crate::errors::{FetchError, RequestError};
use crate::models::history::HistoryRecord;
use crate::models::transfer::{DownloadRequest, FetchOutcome, TransferProgress};
use crate::progress::format_file_size;
use crate::providers::executor::{Executor, TaskHandle};
use crate::providers::fetcher::{Fetcher, TransferListener, spawn_fetch};
use crate::providers::history_store::HistoryStore;
use crate::providers::path_guard::PathGuard;

pub static NAME: &str = "download";
pub static DESCRIPTION: &str = "Downloads a file or lists downloaded files.";
pub static USAGE: &str = "/download <check|at <path> <url>>";
pub static ALIASES: [&str; 2] = ["dl", "filedownload"];

const SUBCOMMANDS: [&str; 2] = ["check", "at"];

/// `check` lists the download history, `at <path> <url>` starts a download
/// into the sandbox.
pub struct DownloadCommand<F, H, E> {
    guard: PathGuard,
    fetcher: Arc<F>,
    history: Arc<H>,
    executor: E,
}

impl<F, H, E> DownloadCommand<F, H, E>
where
    F: Fetcher + 'static,
    H: HistoryStore + 'static,
    E: Executor,
{
    pub fn new(guard: PathGuard, fetcher: Arc<F>, history: Arc<H>, executor: E) -> Self {
        DownloadCommand {
            guard,
            fetcher,
            history,
            executor,
        }
    }

    pub fn check(&self, notifier: &dyn Notifier) {
        let entries = self.history.list();
        if entries.is_empty() {
            notifier.notify(NoticeLevel::Warning, "No files have been downloaded yet.");
            return;
        }
        notifier.notify(NoticeLevel::Success, "--- Downloaded Files ---");
        for entry in entries {
            notifier.notify(NoticeLevel::Info, &format!("- {}", entry));
        }
    }

    /// Validates the request and dispatches the transfer. Nothing touches
    /// the network unless the URL parses and the destination is inside the
    /// sandbox.
    pub fn at(
        &self,
        request: &DownloadRequest,
        notifier: Arc<dyn Notifier>,
    ) -> Result<TaskHandle, RequestError> {
        let url = parse_url(&request.source_url)?;
        let target = self.guard.validate(&request.relative_path)?;
        let destination = target.absolute_path;
        tracing::debug!(
            root = %target.sandbox_root.display(),
            destination = %destination.display(),
            "destination validated"
        );

        if target.exists {
            notifier.notify(
                NoticeLevel::Warning,
                &format!(
                    "Warning: File already exists at {}. It will be overwritten.",
                    destination.display()
                ),
            );
        }
        notifier.notify(
            NoticeLevel::Info,
            &format!(
                "Starting download of {} to {}...",
                request.source_url,
                destination.display()
            ),
        );

        let reporter = Arc::new(DownloadReporter {
            source_url: request.source_url.clone(),
            history: self.history.clone(),
            notifier,
        });
        Ok(spawn_fetch(
            &self.executor,
            self.fetcher.clone(),
            url,
            destination,
            reporter,
        ))
    }

    fn usage(&self, notifier: &dyn Notifier) {
        notifier.notify(NoticeLevel::Warning, "--- Download Command Usage ---");
        notifier.notify(NoticeLevel::Info, "/download check - Lists downloaded files.");
        notifier.notify(NoticeLevel::Info, "/download at <path> <url> - Downloads a file.");
        notifier.notify(NoticeLevel::Info, &format!("Aliases: {}", ALIASES.join(", ")));
    }
}

impl<F, H, E> CommandHandler for DownloadCommand<F, H, E>
where
    F: Fetcher + 'static,
    H: HistoryStore + 'static,
    E: Executor,
{
    fn execute(
        &self,
        _label: &str,
        args: &[&str],
        notifier: Arc<dyn Notifier>,
    ) -> Option<TaskHandle> {
        let Some(subcommand) = args.first() else {
            self.usage(notifier.as_ref());
            return None;
        };

        match subcommand.to_lowercase().as_str() {
            "check" => {
                self.check(notifier.as_ref());
                None
            }
            "at" => {
                let [_, path, url, ..] = args else {
                    notifier.notify(NoticeLevel::Error, "Usage: /download at <path> <url>");
                    return None;
                };
                let request = DownloadRequest {
                    relative_path: path.to_string(),
                    source_url: url.to_string(),
                };
                match self.at(&request, notifier.clone()) {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        tracing::warn!(
                            path = %request.relative_path,
                            url = %request.source_url,
                            "download request rejected: {}",
                            e
                        );
                        notifier.notify(NoticeLevel::Error, &format!("Error: {}", e));
                        None
                    }
                }
            }
            _ => {
                self.usage(notifier.as_ref());
                None
            }
        }
    }

    fn complete(&self, args: &[&str]) -> Vec<String> {
        let Some(current) = args.last() else {
            return Vec::new();
        };
        let candidates: Vec<&str> = match args {
            [_] => SUBCOMMANDS.to_vec(),
            [subcommand, _] if subcommand.eq_ignore_ascii_case("at") => vec!["<path>"],
            [subcommand, _, _] if subcommand.eq_ignore_ascii_case("at") => vec!["<url>"],
            _ => Vec::new(),
        };
        let current = current.to_lowercase();
        candidates
            .into_iter()
            .filter(|candidate| candidate.starts_with(&current))
            .map(str::to_string)
            .collect()
    }
}

pub fn register<F, H, E>(router: &mut CommandRouter, command: DownloadCommand<F, H, E>)
where
    F: Fetcher + 'static,
    H: HistoryStore + 'static,
    E: Executor + 'static,
{
    router.register(NAME, DESCRIPTION, USAGE, &ALIASES, Box::new(command));
}

fn parse_url(source: &str) -> Result<Url, FetchError> {
    let url = Url::parse(source)
        .map_err(|e| FetchError::InvalidUrl(format!("{} ({})", source, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(FetchError::InvalidUrl(format!(
            "{} (unsupported scheme {})",
            source, scheme
        ))),
    }
}

/// Turns transfer events into log lines, operator notices and history
/// entries. History keeps the URL as the operator typed it.
struct DownloadReporter<H> {
    source_url: String,
    history: Arc<H>,
    notifier: Arc<dyn Notifier>,
}

impl<H: HistoryStore> TransferListener for DownloadReporter<H> {
    fn on_progress(&self, destination: &Path, progress: TransferProgress) {
        if let Some(percent) = progress.percent() {
            tracing::info!("Downloading {}: {}%", file_name(destination), percent);
        }
    }

    fn on_complete(&self, outcome: FetchOutcome) {
        let record = HistoryRecord {
            url: self.source_url.clone(),
            ..outcome.record
        };
        self.notifier.notify(
            NoticeLevel::Success,
            &format!(
                "Successfully downloaded {} ({}) to {}",
                file_name(Path::new(&record.path)),
                format_file_size(outcome.bytes_written),
                record.path
            ),
        );
        tracing::info!(
            path = %record.path,
            url = %record.url,
            bytes = outcome.bytes_written,
            "download finished"
        );
        if let Err(e) = self.history.append(&record) {
            tracing::error!("{}", e);
        }
    }

    fn on_error(&self, url: &Url, destination: &Path, error: FetchError) {
        tracing::error!(
            %url,
            destination = %destination.display(),
            "Error downloading file: {:?}",
            error
        );
        let message = match error {
            FetchError::BadStatus { .. } => format!("Download failed. {}", error),
            _ => format!("Download failed: {}", error),
        };
        self.notifier.notify(NoticeLevel::Error, &message);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
