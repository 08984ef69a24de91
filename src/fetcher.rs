//! HTTP fetching seam
//!
//! The engine only needs `fetch(url) -> body`; everything else about HTTP
//! (timeouts, redirects, TLS) belongs to the implementation behind the
//! trait. The default client identifies itself with the `Web Scrapper`
//! user agent for compatibility with deployments that filter on it.

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};

/// Exact user agent the default fetcher sends.
pub const USER_AGENT: &str = "Web Scrapper";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("bad response: {0}")]
    BadResponse(reqwest::StatusCode),
    /// The request never produced a usable response.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Plain `reqwest`-backed fetcher.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadResponse(status));
        }
        Ok(response.text().await?)
    }
}
