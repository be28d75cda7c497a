//! Feed retrieval.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use rates_types::{FeedSource, FetchError};

/// Central Bank of Russia daily rates, quoted in roubles.
pub const DEFAULT_FEED_URL: &str = "https://www.cbr.ru/scripts/XML_daily.asp";

const USER_AGENT: &str = concat!("rates-cache/", env!("CARGO_PKG_VERSION"));

fn transport(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Transport(format!("request timed out: {}", err))
    } else {
        FetchError::Transport(err.to_string())
    }
}

/// Fetches the feed document over HTTP.
///
/// Every request is bounded by the configured timeout so a hung upstream
/// cannot stall the scheduler.
#[derive(Debug, Clone)]
pub struct HttpFeedClient {
    url: String,
    http: Client,
}

impl HttpFeedClient {
    /// Creates a client for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(transport)?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedSource for HttpFeedClient {
    #[instrument(name = "fetch_feed", skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let resp = self.http.get(&self.url).send().await.map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!("HTTP {}", status)));
        }

        let body = resp.bytes().await.map_err(transport)?;
        debug!(bytes = body.len(), "feed downloaded");
        Ok(body.to_vec())
    }
}

/// Reads the feed document from a local file.
///
/// Useful for seeding a store from a saved copy of the feed.
#[derive(Debug, Clone)]
pub struct FileFeed {
    path: PathBuf,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FeedSource for FileFeed {
    #[instrument(name = "read_feed_file", skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| FetchError::Transport(format!("{}: {}", self.path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{Router, http::StatusCode, routing::get};
    use tokio::net::TcpListener;

    /// Serves `app` on an ephemeral port and returns its base URL.
    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_returns_body_bytes() {
        let app = Router::new().route("/daily", get(|| async { "<ValCurs/>" }));
        let base = serve(app).await;

        let client = HttpFeedClient::new(format!("{}/daily", base), Duration::from_secs(5)).unwrap();
        let body = client.fetch().await.unwrap();

        assert_eq!(body, b"<ValCurs/>");
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let app = Router::new().route(
            "/daily",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let base = serve(app).await;

        let client = HttpFeedClient::new(format!("{}/daily", base), Duration::from_secs(5)).unwrap();
        let err = client.fetch().await.unwrap_err();

        assert!(matches!(&err, FetchError::Transport(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let app = Router::new().route(
            "/daily",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let base = serve(app).await;

        let client =
            HttpFeedClient::new(format!("{}/daily", base), Duration::from_millis(100)).unwrap();
        let err = client.fetch().await.unwrap_err();

        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            HttpFeedClient::new(format!("http://{}/daily", addr), Duration::from_secs(2)).unwrap();

        assert!(matches!(client.fetch().await, Err(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn test_file_feed_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.xml");
        tokio::fs::write(&path, b"<ValCurs/>").await.unwrap();

        let feed = FileFeed::new(&path);
        assert_eq!(feed.fetch().await.unwrap(), b"<ValCurs/>");

        let missing = FileFeed::new(dir.path().join("missing.xml"));
        assert!(matches!(missing.fetch().await, Err(FetchError::Transport(_))));
    }
}
