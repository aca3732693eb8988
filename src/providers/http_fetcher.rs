use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{StatusCode, Url};
use tokio::io::AsyncWriteExt;

use crate::errors::{FetchError, IoError};
use crate::models::configuration::Configuration;
use crate::models::history::HistoryRecord;
use crate::models::transfer::{FetchOutcome, TransferProgress};
use crate::progress::ProgressThrottle;

const CHUNK_SIZE: usize = 1024;
const MAX_REDIRECTS: usize = 20;

/// Single-attempt HTTP GET downloader.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(configuration: &Configuration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .connect_timeout(Duration::from_secs(configuration.connect_timeout_secs))
            .read_timeout(Duration::from_secs(configuration.read_timeout_secs))
            .user_agent(configuration.user_agent.clone())
            .build()?;
        Ok(HttpFetcher { client })
    }
}

impl crate::providers::fetcher::Fetcher for HttpFetcher {
    async fn fetch<P>(
        &self,
        url: &Url,
        destination: &Path,
        mut on_progress: P,
    ) -> Result<FetchOutcome, FetchError>
    where
        P: FnMut(TransferProgress) + Send,
    {
        tracing::debug!(%url, destination = %destination.display(), "starting transfer");
        let mut response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::BadStatus {
                code: status.as_u16(),
                reason: status.canonical_reason(),
            });
        }

        let total_bytes = response.content_length().filter(|length| *length > 0);
        let write_failed = |e: std::io::Error| IoError::WriteFailed {
            path: destination.to_path_buf(),
            source: e,
        };

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(write_failed)?;
        let mut throttle = ProgressThrottle::new();
        let mut bytes_read: u64 = 0;

        while let Some(mut chunk) = response.chunk().await? {
            while !chunk.is_empty() {
                let piece: Bytes = chunk.split_to(CHUNK_SIZE.min(chunk.len()));
                file.write_all(&piece).await.map_err(write_failed)?;
                bytes_read += piece.len() as u64;

                let progress = TransferProgress {
                    bytes_read,
                    total_bytes,
                };
                if throttle.should_report(&progress).is_some() {
                    on_progress(progress);
                }
            }
        }
        file.flush().await.map_err(write_failed)?;

        Ok(FetchOutcome {
            record: HistoryRecord {
                path: destination.display().to_string(),
                url: url.to_string(),
            },
            bytes_written: bytes_read,
        })
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::test_support::raw_http_server;
    use super::*;
    use crate::providers::fetcher::test_support::{Event, RecordingListener};
    use crate::providers::fetcher::{Fetcher, spawn_fetch};
    use crate::providers::tokio_executor::TokioExecutor;
    use iron::{Iron, IronResult, Listening, Request, Response, headers, status};
    use tempfile::tempdir;

    fn mock_server(content: Vec<u8>) -> (Listening, String) {
        let handler = move |req: &mut Request| -> IronResult<Response> {
            match req.url.path().join("/").as_str() {
                "file.zip" => Ok(Response::with((status::Ok, content.clone()))),
                "moved" => {
                    let mut response = Response::with(status::Found);
                    response
                        .headers
                        .set(headers::Location("/file.zip".to_string()));
                    Ok(response)
                }
                _ => Ok(Response::with((status::NotFound, "missing"))),
            }
        };

        match Iron::new(handler).http("127.0.0.1:0") {
            Ok(listener) => {
                let base = format!("http://127.0.0.1:{}", listener.socket.port());
                (listener, base)
            }
            Err(e) => panic!("Failed to start server: {}", e),
        }
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&Configuration::default()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_writes_body_and_returns_record() {
        // Arrange
        let content = vec![7u8; 2048];
        let (mut server, base) = mock_server(content.clone());
        let url = Url::parse(&format!("{}/file.zip", base)).unwrap();
        let temp_dir = tempdir().unwrap();
        let destination = temp_dir.path().join("file.zip");
        let mut reports = Vec::new();

        // Act
        let outcome = fetcher()
            .fetch(&url, &destination, |progress| reports.push(progress))
            .await
            .unwrap();

        // Assert
        assert_eq!(std::fs::read(&destination).unwrap(), content);
        assert_eq!(outcome.bytes_written, 2048);
        assert_eq!(outcome.record.path, destination.display().to_string());
        assert_eq!(outcome.record.url, url.to_string());
        let percents: Vec<u64> = reports.iter().filter_map(|p| p.percent()).collect();
        assert_eq!(percents, vec![50, 100]);

        // Clean up
        server.close().unwrap();
    }

    #[tokio::test]
    async fn test_fetch_bad_status_creates_no_file() {
        // Arrange
        let (mut server, base) = mock_server(b"unused".to_vec());
        let url = Url::parse(&format!("{}/nothing-here", base)).unwrap();
        let temp_dir = tempdir().unwrap();
        let destination = temp_dir.path().join("file.zip");

        // Act
        let result = fetcher().fetch(&url, &destination, |_| {}).await;

        // Assert
        assert!(matches!(
            result,
            Err(FetchError::BadStatus { code: 404, .. })
        ));
        assert!(!destination.exists());

        // Clean up
        server.close().unwrap();
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let content = b"redirected content".to_vec();
        let (mut server, base) = mock_server(content.clone());
        let url = Url::parse(&format!("{}/moved", base)).unwrap();
        let temp_dir = tempdir().unwrap();
        let destination = temp_dir.path().join("moved.bin");

        let outcome = fetcher().fetch(&url, &destination, |_| {}).await.unwrap();

        assert_eq!(std::fs::read(&destination).unwrap(), content);
        assert_eq!(outcome.record.url, url.to_string());
        server.close().unwrap();
    }

    #[tokio::test]
    async fn test_fetch_overwrites_existing_file() {
        // Arrange
        let content = b"new".to_vec();
        let (mut server, base) = mock_server(content.clone());
        let url = Url::parse(&format!("{}/file.zip", base)).unwrap();
        let temp_dir = tempdir().unwrap();
        let destination = temp_dir.path().join("file.zip");
        std::fs::write(&destination, b"a much longer previous content").unwrap();

        // Act
        fetcher().fetch(&url, &destination, |_| {}).await.unwrap();

        // Assert
        assert_eq!(std::fs::read(&destination).unwrap(), content);
        server.close().unwrap();
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Arrange
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = Url::parse(&format!("http://127.0.0.1:{}/file.zip", port)).unwrap();
        let temp_dir = tempdir().unwrap();
        let destination = temp_dir.path().join("file.zip");

        // Act
        let result = fetcher().fetch(&url, &destination, |_| {}).await;

        // Assert
        assert!(matches!(result, Err(FetchError::NetworkIo(_))));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_fetch_unwritable_destination() {
        let (mut server, base) = mock_server(b"content".to_vec());
        let url = Url::parse(&format!("{}/file.zip", base)).unwrap();
        let temp_dir = tempdir().unwrap();
        let destination = temp_dir.path().join("missing-dir").join("file.zip");

        let result = fetcher().fetch(&url, &destination, |_| {}).await;

        assert!(matches!(
            result,
            Err(FetchError::Io(IoError::WriteFailed { .. }))
        ));
        server.close().unwrap();
    }

    #[tokio::test]
    async fn test_spawn_fetch_completes_once() {
        // Arrange
        let content = vec![1u8; 2048];
        let (mut server, base) = mock_server(content);
        let url = Url::parse(&format!("{}/file.zip", base)).unwrap();
        let temp_dir = tempdir().unwrap();
        let destination = temp_dir.path().join("file.zip");
        let listener = Arc::new(RecordingListener::default());

        // Act
        spawn_fetch(
            &TokioExecutor::current(),
            Arc::new(fetcher()),
            url.clone(),
            destination.clone(),
            listener.clone(),
        )
        .wait()
        .await;

        // Assert
        let events = listener.events.lock().unwrap();
        let completions: Vec<&FetchOutcome> = events
            .iter()
            .filter_map(|event| match event {
                Event::Complete(outcome) => Some(outcome),
                _ => None,
            })
            .collect();
        assert_eq!(completions.len(), 1);
        assert_eq!(
            completions[0].record,
            HistoryRecord {
                path: destination.display().to_string(),
                url: url.to_string(),
            }
        );
        assert!(!events.iter().any(|event| matches!(event, Event::Error(_))));
        let percents: Vec<u64> = events
            .iter()
            .filter_map(|event| match event {
                Event::Progress(progress) => progress.percent(),
                _ => None,
            })
            .collect();
        assert_eq!(percents, vec![50, 100]);
        server.close().unwrap();
    }

    #[tokio::test]
    async fn test_spawn_fetch_reports_bad_status() {
        let (mut server, base) = mock_server(Vec::new());
        let url = Url::parse(&format!("{}/gone", base)).unwrap();
        let temp_dir = tempdir().unwrap();
        let listener = Arc::new(RecordingListener::default());

        spawn_fetch(
            &TokioExecutor::current(),
            Arc::new(fetcher()),
            url,
            temp_dir.path().join("gone.bin"),
            listener.clone(),
        )
        .wait()
        .await;

        let events = listener.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::Error(message) if message.contains("404")));
        server.close().unwrap();
    }

    #[tokio::test]
    async fn test_fetch_truncated_body_leaves_partial_file() {
        // Arrange
        let mut response = b"HTTP/1.1 200 OK\r\nContent-Length: 5000\r\n\r\n".to_vec();
        response.extend_from_slice(b"partial bytes");
        let base = raw_http_server(response);
        let url = Url::parse(&format!("{}/big.bin", base)).unwrap();
        let temp_dir = tempdir().unwrap();
        let destination = temp_dir.path().join("big.bin");

        // Act
        let result = fetcher().fetch(&url, &destination, |_| {}).await;

        // Assert
        assert!(matches!(result, Err(FetchError::NetworkIo(_))));
        assert_eq!(std::fs::read(&destination).unwrap(), b"partial bytes");
    }

    #[tokio::test]
    async fn test_fetch_without_length_reports_no_progress() {
        // Arrange
        let response = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
            5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n"
            .to_vec();
        let base = raw_http_server(response);
        let url = Url::parse(&format!("{}/stream", base)).unwrap();
        let temp_dir = tempdir().unwrap();
        let destination = temp_dir.path().join("stream.txt");
        let mut reports = Vec::new();

        // Act
        let outcome = fetcher()
            .fetch(&url, &destination, |progress| reports.push(progress))
            .await
            .unwrap();

        // Assert
        assert_eq!(std::fs::read(&destination).unwrap(), b"hello world");
        assert_eq!(outcome.bytes_written, 11);
        assert!(reports.is_empty());
    }
}
