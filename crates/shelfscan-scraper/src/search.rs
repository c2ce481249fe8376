//! Seam between the delivery adapters and the scraping pipeline.

use std::future::Future;
use std::pin::Pin;

use shelfscan_core::Listing;

use crate::client::SearchClient;
use crate::error::Outcome;

pub type SearchFuture<'a> = Pin<Box<dyn Future<Output = Outcome<Vec<Listing>>> + Send + 'a>>;

/// Anything that can turn a keyword into listings, retries included.
///
/// The HTTP server holds one behind an `Arc<dyn ListingSearch>` so routes can
/// be exercised with a canned implementation.
pub trait ListingSearch: Send + Sync {
    fn search<'a>(&'a self, keyword: &'a str) -> SearchFuture<'a>;
}

impl ListingSearch for SearchClient {
    fn search<'a>(&'a self, keyword: &'a str) -> SearchFuture<'a> {
        Box::pin(self.search_with_retries(keyword))
    }
}
