/// HTTP client for the option chain analytics backend
///
/// Issues `GET {base}/api/data/{symbol}` and decodes the body into a
/// [`ChainUpdate`]. No retries: a failed fetch is reported and the caller
/// keeps whatever it displayed before.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::shared::error::FetchError;
use crate::shared::types::{ApiErrorBody, ChainPayload, ChainUpdate};

/// Source of option chain snapshots, keyed by symbol
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<ChainUpdate, FetchError>;
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `http://127.0.0.1:5000`
    pub base_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with custom base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// [`ChainSource`] backed by the analytics REST API
#[derive(Debug, Clone)]
pub struct HttpChainClient {
    client: Client,
    base: Url,
    request_timeout: Duration,
}

impl HttpChainClient {
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let base = Url::parse(&config.base_url).map_err(|e| FetchError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl {
                url: config.base_url,
                reason: "cannot be a base".to_string(),
            });
        }

        Ok(Self {
            client: Client::new(),
            base,
            request_timeout: config.request_timeout,
        })
    }

    /// Per-symbol endpoint; the symbol is percent-encoded as one path segment
    pub fn endpoint_url(&self, symbol: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "data", symbol]);
        }
        url
    }
}

#[async_trait]
impl ChainSource for HttpChainClient {
    async fn fetch(&self, symbol: &str) -> Result<ChainUpdate, FetchError> {
        let url = self.endpoint_url(symbol);
        debug!(%url, "fetching option chain");

        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|body| body.error)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let payload = serde_json::from_str::<ChainPayload>(&body)?;
        Ok(payload.into_update())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the request line
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (format!("http://{addr}"), handle)
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("http://10.0.0.5:8080")
            .with_request_timeout(Duration::from_secs(3));

        assert_eq!(config.base_url, "http://10.0.0.5:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_endpoint_url() {
        let client = HttpChainClient::new(ClientConfig::new("http://127.0.0.1:5000")).unwrap();
        assert_eq!(
            client.endpoint_url("NIFTY").as_str(),
            "http://127.0.0.1:5000/api/data/NIFTY"
        );
        assert_eq!(
            client.endpoint_url("BANK NIFTY").as_str(),
            "http://127.0.0.1:5000/api/data/BANK%20NIFTY"
        );

        let prefixed = HttpChainClient::new(ClientConfig::new("http://host/dash/")).unwrap();
        assert_eq!(
            prefixed.endpoint_url("NIFTY").as_str(),
            "http://host/dash/api/data/NIFTY"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let error = HttpChainClient::new(ClientConfig::new("not a url")).unwrap_err();
        assert!(matches!(error, FetchError::InvalidUrl { .. }));

        let error = HttpChainClient::new(ClientConfig::new("mailto:ops@example.com")).unwrap_err();
        assert!(matches!(error, FetchError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_fetch_envelope() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"analysis":{"spot_price":100.0,"pcr":{"pcr_oi":1.0,"total_ce_oi":1.0,"total_pe_oi":1.0},"max_pain":100,"skew_patterns":{"bullish_skew":false,"bearish_skew":false},"strike_data":[]},"timestamp":"2024-01-05T10:15:00"}"#,
        )
        .await;

        let client = HttpChainClient::new(ClientConfig::new(base)).unwrap();
        let update = client.fetch("NIFTY").await.unwrap();

        assert_eq!(update.snapshot.spot_price, 100.0);
        assert_eq!(update.as_of.as_deref(), Some("2024-01-05T10:15:00"));
        assert_eq!(server.await.unwrap(), "GET /api/data/NIFTY HTTP/1.1");
    }

    #[tokio::test]
    async fn test_fetch_status_error_uses_backend_message() {
        let (base, _server) = serve_once("404 Not Found", r#"{"error":"Data not available"}"#).await;

        let client = HttpChainClient::new(ClientConfig::new(base)).unwrap();
        let error = client.fetch("UNKNOWN").await.unwrap_err();

        assert_eq!(
            error,
            FetchError::Status {
                status: 404,
                message: "Data not available".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let (base, _server) = serve_once("200 OK", r#"{"spot_price":1.0}"#).await;

        let client = HttpChainClient::new(ClientConfig::new(base)).unwrap();
        let error = client.fetch("NIFTY").await.unwrap_err();

        assert!(matches!(error, FetchError::Decode(_)));
    }
}
