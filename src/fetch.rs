//! Rate-limited HTTP fetching.
//!
//! The [`Fetch`] trait is the seam between the crawler and the network:
//! production uses [`HttpFetcher`] (a shared `reqwest::Client` behind a
//! politeness delay), tests inject a scripted fake.
//!
//! The politeness delay is applied *before* each request, not after, so
//! back-to-back failures do not erode the pause between outbound calls.

use crate::error::FetchError;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; Vuurwerkwacht/0.1; +https://github.com/vuurwerkwacht)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Retrieve the raw HTML text behind a URL.
pub trait Fetch {
    /// Fetch one page.
    ///
    /// # Errors
    ///
    /// Fails with [`FetchError`] on transport errors, timeouts, or non-2xx
    /// responses. No retry is attempted; the caller decides what a dropped
    /// task means.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Production fetcher: one reqwest client, fixed politeness delay per call.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    delay: Duration,
}

impl HttpFetcher {
    /// Build a fetcher with the given politeness delay.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed; this is a
    /// run-level failure.
    pub fn new(delay: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, delay })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        sleep(self.delay).await;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16(), url.to_string()));
        }
        let body = response.text().await?;
        debug!(%url, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}
