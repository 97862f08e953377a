//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Resolving directory locators and appending the `page` parameter
//! - Error classification
//!
//! The fetcher never retries and never paces itself; pacing belongs to the
//! [`Scheduler`](crate::crawler::Scheduler) that decides when fetches run.

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors produced while fetching a directory page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid locator '{locator}': {message}")]
    InvalidUrl { locator: String, message: String },

    #[error("HTTP error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

/// Source of raw directory pages
///
/// Implementations return the markup of one page of a listing. Parsing happens
/// in the extraction step so the returned value can cross task boundaries.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches page `page` of the listing at `locator`
    ///
    /// `locator` is a directory-relative path, optionally carrying a query
    /// string, or an absolute URL.
    async fn fetch(&self, locator: &str, page: u32) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL)
    let user_agent = match &config.contact_url {
        Some(contact) => format!(
            "{}/{} (+{})",
            config.crawler_name, config.crawler_version, contact
        ),
        None => format!("{}/{}", config.crawler_name, config.crawler_version),
    };

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Resolves `locator` against `base` and appends the `page` parameter
///
/// The parameter is joined with `?` when the locator carries no query yet and
/// with `&` otherwise.
///
/// # Example
///
/// ```
/// use linkshell_harvest::crawler::page_url;
/// use url::Url;
///
/// let base = Url::parse("https://na.finalfantasyxiv.com").unwrap();
/// let url = page_url(&base, "/lodestone/linkshell/abc/", 2).unwrap();
/// assert_eq!(url.as_str(), "https://na.finalfantasyxiv.com/lodestone/linkshell/abc/?page=2");
/// ```
pub fn page_url(base: &Url, locator: &str, page: u32) -> Result<Url, FetchError> {
    let mut url = base.join(locator).map_err(|e| FetchError::InvalidUrl {
        locator: locator.to_string(),
        message: e.to_string(),
    })?;

    url.query_pairs_mut()
        .append_pair("page", &page.to_string());

    Ok(url)
}

/// [`PageFetcher`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
}

impl HttpFetcher {
    /// Creates a fetcher resolving every locator against `base_url`
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, locator: &str, page: u32) -> Result<String, FetchError> {
        let url = page_url(&self.base_url, locator, page)?;
        tracing::debug!("Request URL: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 429 {
                tracing::warn!("Rate limited by directory at {}", url);
            }
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
    }
}
