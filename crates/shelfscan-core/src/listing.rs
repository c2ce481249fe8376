//! The typed shape of one product listing extracted from a search page.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ValidationError;

/// Highest star rating the marketplace displays.
pub const MAX_RATING: f64 = 5.0;

/// One product listing from a search results page.
///
/// Built once per extraction pass and never mutated afterwards. The JSON shape
/// uses camelCase keys and serializes `identifier` as `asin`, which is what
/// the results page script expects. Absent optional fields are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
    pub image_url: String,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    /// Detail page, always derived from `identifier`.
    pub url: String,
    #[serde(rename = "asin")]
    pub identifier: String,
}

impl Listing {
    /// Checks field shapes before the listing leaves the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found: empty identifier or title,
    /// a non-absolute `http(s)` URL in `image_url` or `url`, a rating outside
    /// `[0, 5]`, or a negative price.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.identifier.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle {
                identifier: self.identifier.clone(),
            });
        }

        check_absolute_url(&self.identifier, "imageUrl", &self.image_url)?;
        check_absolute_url(&self.identifier, "url", &self.url)?;

        if let Some(rating) = self.rating {
            if !rating.is_finite() || !(0.0..=MAX_RATING).contains(&rating) {
                return Err(ValidationError::RatingOutOfRange {
                    identifier: self.identifier.clone(),
                    rating,
                });
            }
        }

        if let Some(price) = self.price {
            if price.is_sign_negative() && !price.is_zero() {
                return Err(ValidationError::NegativePrice {
                    identifier: self.identifier.clone(),
                    price: price.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Validates every listing in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the [`ValidationError`] of the first invalid listing.
pub fn validate_all(listings: &[Listing]) -> Result<(), ValidationError> {
    listings.iter().try_for_each(Listing::validate)
}

fn check_absolute_url(
    identifier: &str,
    field: &'static str,
    raw: &str,
) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidUrl {
        identifier: identifier.to_owned(),
        field,
        reason,
    };

    let parsed = Url::parse(raw).map_err(|e| invalid(format!("\"{raw}\": {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "\"{raw}\": unsupported scheme {}",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none() {
        return Err(invalid(format!("\"{raw}\": missing host")));
    }
    Ok(())
}
