use shelfscan_core::ValidationError;
use thiserror::Error;

/// Result of any scraping operation that crosses a layer boundary.
pub type Outcome<T> = Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Caller input rejected before any request was made.
    #[error("invalid keyword: {reason}")]
    InvalidKeyword { reason: String },

    #[error("invalid site URL \"{site_url}\": {reason}")]
    InvalidSiteUrl { site_url: String, reason: String },

    #[error("extracted listing failed validation: {0}")]
    InvalidListing(#[from] ValidationError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The page came back but held no usable listings. Usually a soft block
    /// or markup drift rather than a genuinely empty search.
    #[error("no products found on {url}; the site may be blocking the request")]
    NoListings { url: String },

    #[error("{} after {} attempts: {}", exhaustion_summary(.last), .attempts, .last)]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<ScrapeError>,
    },
}

fn exhaustion_summary(last: &ScrapeError) -> &'static str {
    match last {
        ScrapeError::NoListings { .. } => "no products found",
        _ => "transport error",
    }
}

impl ScrapeError {
    /// Whether the retry controller may try again after this error.
    ///
    /// Transport failures (network, timeout, non-2xx) and empty pages are
    /// retriable. Validation errors and an already-exhausted chain are not.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ScrapeError::Http(_) | ScrapeError::UnexpectedStatus { .. } | ScrapeError::NoListings { .. }
        )
    }

    /// Stable machine-readable code exposed to API callers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ScrapeError::InvalidKeyword { .. } => "invalid_keyword",
            ScrapeError::InvalidSiteUrl { .. } => "invalid_site_url",
            ScrapeError::InvalidListing(_) => "invalid_listing",
            ScrapeError::Http(e) if e.is_timeout() => "timeout",
            ScrapeError::Http(e) if e.is_connect() => "connect",
            ScrapeError::Http(_) => "transport",
            ScrapeError::UnexpectedStatus { .. } => "upstream_status",
            ScrapeError::NoListings { .. } => "likely_blocked",
            ScrapeError::Exhausted { last, .. } => last.code(),
        }
    }

    /// HTTP status captured from the upstream site, if the failure carried one.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ScrapeError::UnexpectedStatus { status, .. } => Some(*status),
            ScrapeError::Http(e) => e.status().map(|s| s.as_u16()),
            ScrapeError::Exhausted { last, .. } => last.upstream_status(),
            _ => None,
        }
    }

    /// `true` for errors caused by bad caller input or bad extracted data.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ScrapeError::InvalidKeyword { .. } | ScrapeError::InvalidListing(_)
        )
    }
}
