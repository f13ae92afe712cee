//! Single-attempt HTTP retrieval with a fixed browser-like header set.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderValue};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use kbharvest_shared::{HarvestError, Result};

/// User-Agent string for every outbound request.
const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; kbharvest/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

const ACCEPT_PAGE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_BINARY: &str = "application/pdf,application/octet-stream,*/*";

/// Result of streaming a binary body to disk.
#[derive(Debug, Clone)]
pub struct SavedBody {
    /// Bytes written.
    pub size: u64,
    /// `Content-Type` response header, lower-cased.
    pub content_type: Option<String>,
}

/// Thin wrapper over a configured `reqwest` client. No retries.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Fetcher for HTML pages.
    pub fn for_pages(timeout: Duration) -> Result<Self> {
        Self::build(ACCEPT_PAGE, timeout)
    }

    /// Fetcher for binary downloads.
    pub fn for_downloads(timeout: Duration) -> Result<Self> {
        Self::build(ACCEPT_BINARY, timeout)
    }

    fn build(accept: &'static str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| HarvestError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch a page body as text.
    #[instrument(skip(self))]
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.send(url).await?;
        let body = response
            .text()
            .await
            .map_err(|e| HarvestError::Network(format!("{url}: body read failed: {e}")))?;

        debug!(bytes = body.len(), "page fetched");
        Ok(body)
    }

    /// Stream a body into a file at `target`, replacing any existing file.
    ///
    /// A transfer that fails midway leaves whatever was already written.
    #[instrument(skip(self, target), fields(target = %target.display()))]
    pub async fn fetch_to_file(&self, url: &str, target: &Path) -> Result<SavedBody> {
        let mut response = self.send(url).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_lowercase);

        let mut file = File::create(target)
            .await
            .map_err(|e| HarvestError::io(target, e))?;

        let mut size = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| HarvestError::Network(format!("{url}: body read failed: {e}")))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| HarvestError::io(target, e))?;
            size += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| HarvestError::io(target, e))?;

        debug!(bytes = size, content_type = ?content_type, "body saved");
        Ok(SavedBody { size, content_type })
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                HarvestError::Network(format!("{url}: timed out"))
            } else {
                HarvestError::Network(format!("{url}: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Network(format!("{url}: HTTP {status}")));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_fixed_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header_exists("accept-language"))
            .and(header_exists("accept-encoding"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>ok</h1>"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::for_pages(Duration::from_secs(5)).unwrap();
        let body = fetcher
            .fetch_text(&format!("{}/page", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<h1>ok</h1>");

        let requests = server.received_requests().await.expect("recording enabled");
        let headers = &requests[0].headers;
        assert_eq!(headers.get("accept").unwrap().to_str().unwrap(), ACCEPT_PAGE);
        assert_eq!(
            headers.get("accept-language").unwrap().to_str().unwrap(),
            "en-US,en;q=0.5"
        );
    }

    #[tokio::test]
    async fn non_success_status_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::for_pages(Duration::from_secs(5)).unwrap();
        let err = fetcher
            .fetch_text(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::Network(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::for_pages(Duration::from_millis(300)).unwrap();
        let err = fetcher
            .fetch_text(&format!("{}/slow", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::Network(_)));
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        let fetcher = Fetcher::for_pages(Duration::from_secs(2)).unwrap();
        let err = fetcher.fetch_text("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, HarvestError::Network(_)));
    }

    #[tokio::test]
    async fn binary_body_is_streamed_to_file() {
        let server = MockServer::start().await;
        let body: Vec<u8> = b"%PDF-1.7 "
            .iter()
            .copied()
            .chain(std::iter::repeat_n(b'x', 200_000))
            .collect();
        Mock::given(path("/doc.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(body.clone())
                    .insert_header("content-type", "Application/PDF"),
            )
            .mount(&server)
            .await;

        let dir = std::env::temp_dir().join(format!("kbh-fetch-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("doc.pdf");

        let fetcher = Fetcher::for_downloads(Duration::from_secs(5)).unwrap();
        let saved = fetcher
            .fetch_to_file(&format!("{}/doc.pdf", server.uri()), &target)
            .await
            .unwrap();

        assert_eq!(saved.size, body.len() as u64);
        assert_eq!(saved.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(std::fs::read(&target).unwrap(), body);

        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(
            requests[0].headers.get("accept").unwrap().to_str().unwrap(),
            ACCEPT_BINARY
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn failed_status_creates_no_file() {
        let server = MockServer::start().await;
        Mock::given(path("/gone.pdf"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;

        let dir = std::env::temp_dir().join(format!("kbh-fetch-gone-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("gone.pdf");

        let fetcher = Fetcher::for_downloads(Duration::from_secs(5)).unwrap();
        let err = fetcher
            .fetch_to_file(&format!("{}/gone.pdf", server.uri()), &target)
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::Network(_)));
        assert!(!target.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
