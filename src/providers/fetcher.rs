use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Url;

use crate::errors::FetchError;
use crate::models::transfer::{FetchOutcome, TransferProgress};
use crate::providers::executor::{Executor, TaskHandle};

pub trait Fetcher: Send + Sync {
    /// Retrieves `url` into `destination`, overwriting whatever is there.
    ///
    /// `on_progress` only sees throttled reports and is never called when the
    /// server does not advertise a length.
    fn fetch<P>(
        &self,
        url: &Url,
        destination: &Path,
        on_progress: P,
    ) -> impl std::future::Future<Output = Result<FetchOutcome, FetchError>> + Send
    where
        P: FnMut(TransferProgress) + Send;
}

/// Receives the outcome of a background transfer.
pub trait TransferListener: Send + Sync {
    fn on_progress(&self, destination: &Path, progress: TransferProgress);

    fn on_complete(&self, outcome: FetchOutcome);

    fn on_error(&self, url: &Url, destination: &Path, error: FetchError);
}

/// Runs one transfer on `executor` and reports its result to `listener`.
/// Exactly one of `on_complete` or `on_error` is called. `on_complete` runs
/// on the blocking pool and the handle resolves only after it returns.
pub fn spawn_fetch<E, F, L>(
    executor: &E,
    fetcher: Arc<F>,
    url: Url,
    destination: PathBuf,
    listener: Arc<L>,
) -> TaskHandle
where
    E: Executor,
    F: Fetcher + 'static,
    L: TransferListener + 'static,
{
    executor.submit(async move {
        let result = fetcher
            .fetch(&url, &destination, |progress| {
                listener.on_progress(&destination, progress)
            })
            .await;
        match result {
            Ok(outcome) => {
                let completion = tokio::task::spawn_blocking(move || listener.on_complete(outcome));
                if let Err(e) = completion.await {
                    tracing::error!(%url, "completion listener failed: {}", e);
                }
            }
            Err(e) => listener.on_error(&url, &destination, e),
        }
    })
}
