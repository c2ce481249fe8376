pub mod client;
pub mod error;
pub mod extract;
pub mod page;
pub mod retry;
pub mod search;

pub use client::SearchClient;
pub use error::{Outcome, ScrapeError};
pub use extract::extract_listing;
pub use page::parse_listings;
pub use retry::{retry_with_jitter, JitterWindow, RetryPolicy};
pub use search::{ListingSearch, SearchFuture};
