//! HTTP client for the marketplace search page.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA,
    UPGRADE_INSECURE_REQUESTS,
};
use reqwest::{redirect, Client};
use shelfscan_core::{validate_all, AppConfig, Listing};
use url::Url;

use crate::error::{Outcome, ScrapeError};
use crate::page::parse_listings;
use crate::retry::{retry_with_jitter, RetryPolicy};

/// Characters left unescaped in a keyword: what `encodeURIComponent` leaves
/// alone, minus `'`, which the query serializer of http(s) URLs escapes anyway.
const KEYWORD_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'(')
    .remove(b')');

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const CLIENT_HINT_HEADERS: &[(&str, &str)] = &[
    (
        "sec-ch-ua",
        "\"Google Chrome\";v=\"119\", \"Chromium\";v=\"119\", \"Not?A_Brand\";v=\"24\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
];

/// Fetches search result pages and turns them into [`Listing`]s.
///
/// Every request carries the header set of an ordinary desktop Chrome
/// navigation. Pages that parse to zero listings are reported as
/// [`ScrapeError::NoListings`] rather than an empty success, so the retry
/// controller treats them like a transport failure.
pub struct SearchClient {
    client: Client,
    site: Url,
    retry: RetryPolicy,
}

impl SearchClient {
    /// Creates a client for the marketplace at `site_url`.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::InvalidSiteUrl`] if `site_url` is not an absolute URL with a host.
    /// - [`ScrapeError::Http`] if the underlying `reqwest::Client` cannot be built.
    pub fn new(
        site_url: &str,
        timeout: Duration,
        user_agent: &str,
        max_redirects: usize,
        retry: RetryPolicy,
    ) -> Result<Self, ScrapeError> {
        let site = Url::parse(site_url).map_err(|e| ScrapeError::InvalidSiteUrl {
            site_url: site_url.to_owned(),
            reason: e.to_string(),
        })?;
        if site.host_str().is_none() {
            return Err(ScrapeError::InvalidSiteUrl {
                site_url: site_url.to_owned(),
                reason: "URL has no host".to_owned(),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .user_agent(user_agent)
            .default_headers(browser_headers())
            .redirect(redirect::Policy::limited(max_redirects))
            .build()?;

        Ok(Self {
            client,
            site,
            retry,
        })
    }

    /// Builds a client from the scraper settings in [`AppConfig`].
    ///
    /// # Errors
    ///
    /// Same as [`SearchClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ScrapeError> {
        Self::new(
            &config.site_url,
            Duration::from_secs(config.scraper_request_timeout_secs),
            &config.scraper_user_agent,
            config.scraper_max_redirects,
            RetryPolicy::from_config(config),
        )
    }

    /// Replaces the retry policy, e.g. for a one-off CLI override.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn site(&self) -> &Url {
        &self.site
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Searches for `keyword`, retrying transport failures and empty pages
    /// with jittered delays.
    ///
    /// The keyword is checked before anything is sent; a blank keyword fails
    /// without consuming an attempt.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::InvalidKeyword`] for a blank keyword (no request made).
    /// - [`ScrapeError::InvalidListing`] if an extracted listing fails validation.
    /// - [`ScrapeError::Exhausted`] once every attempt failed with a transport
    ///   error or an empty page.
    pub async fn search_with_retries(&self, keyword: &str) -> Outcome<Vec<Listing>> {
        let url = self.search_url(keyword)?;
        tracing::info!(keyword, url = %url, max_attempts = self.retry.max_attempts, "searching");

        let listings =
            retry_with_jitter(&self.retry, tokio::time::sleep, || self.attempt(&url)).await?;

        tracing::info!(keyword, count = listings.len(), "search succeeded");
        Ok(listings)
    }

    /// A single fetch-and-parse pass with no retries.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::InvalidKeyword`] for a blank keyword.
    /// - [`ScrapeError::Http`] on network failure or timeout.
    /// - [`ScrapeError::UnexpectedStatus`] on any non-2xx response.
    /// - [`ScrapeError::NoListings`] when the page holds no extractable listing.
    /// - [`ScrapeError::InvalidListing`] if an extracted listing fails validation.
    pub async fn search_once(&self, keyword: &str) -> Outcome<Vec<Listing>> {
        let url = self.search_url(keyword)?;
        self.attempt(&url).await
    }

    /// Builds `{site}/s?k=<keyword>` with the keyword percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidKeyword`] if the keyword is blank.
    pub fn search_url(&self, keyword: &str) -> Result<Url, ScrapeError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ScrapeError::InvalidKeyword {
                reason: "keyword must not be empty".to_owned(),
            });
        }

        let mut url = self.site.clone();
        url.set_path("/s");
        url.set_fragment(None);
        let encoded = utf8_percent_encode(keyword, KEYWORD_ENCODE_SET);
        url.set_query(Some(&format!("k={encoded}")));
        Ok(url)
    }

    async fn attempt(&self, url: &Url) -> Outcome<Vec<Listing>> {
        let html = self.fetch_page(url).await?;
        let listings = parse_listings(&html, &self.site);

        if listings.is_empty() {
            return Err(ScrapeError::NoListings {
                url: url.to_string(),
            });
        }

        validate_all(&listings)?;
        Ok(listings)
    }

    async fn fetch_page(&self, url: &Url) -> Result<String, ScrapeError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        tracing::debug!(status = status.as_u16(), url = %url, "search page response");

        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        tracing::debug!(bytes = body.len(), "search page body received");
        Ok(body)
    }
}

/// Headers a desktop Chrome sends on a top-level navigation. The user agent
/// is set separately on the client builder.
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    for &(name, value) in CLIENT_HINT_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    headers
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
