//! Field extraction for a single search-result node.
//!
//! The marketplace renders listings in several layout variants, so every
//! field is resolved by an ordered chain of known selectors where the first
//! strategy that yields a usable value wins. Missing optional fields are
//! omitted; a node missing a required field is skipped. Nothing here errors.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Selector};
use shelfscan_core::listing::MAX_RATING;
use shelfscan_core::Listing;
use url::Url;

/// Attribute carrying the marketplace's listing identifier (ASIN).
pub const IDENTIFIER_ATTR: &str = "data-asin";

const TITLE_SELECTORS: &[&str] = &[
    "h2 a.a-link-normal",
    "h2 span.a-text-normal",
    ".a-size-base-plus.a-color-base",
];

const RATING_SELECTORS: &[&str] = &["i.a-icon-star-small", "i.a-icon-star", ".a-icon-alt"];

const REVIEW_COUNT_SELECTORS: &[&str] = &[
    ".a-size-small.a-link-normal[href*=\"reviews\"]",
    "span.a-size-base",
];

const PRICE_SELECTORS: &[&str] = &["span.a-price span.a-offscreen", "span.a-price-whole"];

/// Where an image strategy reads its URL from.
#[derive(Debug, Clone, Copy)]
enum ImageSource {
    /// First URL token of a responsive `srcset`.
    SrcsetFirst,
    Src,
}

const IMAGE_STRATEGIES: &[(&str, ImageSource)] = &[
    ("img.s-image[srcset]", ImageSource::SrcsetFirst),
    ("img.s-image", ImageSource::Src),
];

struct FieldSelectors {
    title: Vec<Selector>,
    rating: Vec<Selector>,
    review_count: Vec<Selector>,
    price: Vec<Selector>,
    image: Vec<(Selector, ImageSource)>,
}

static SELECTORS: LazyLock<FieldSelectors> = LazyLock::new(|| FieldSelectors {
    title: compile(TITLE_SELECTORS),
    rating: compile(RATING_SELECTORS),
    review_count: compile(REVIEW_COUNT_SELECTORS),
    price: compile(PRICE_SELECTORS),
    image: IMAGE_STRATEGIES
        .iter()
        .map(|(css, source)| (compile_one(css), *source))
        .collect(),
});

static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("valid decimal regex"));

fn compile(selectors: &[&str]) -> Vec<Selector> {
    selectors.iter().map(|css| compile_one(css)).collect()
}

fn compile_one(css: &str) -> Selector {
    Selector::parse(css).expect("valid listing selector")
}

/// Maps one listing node to a [`Listing`], or `None` when a required field
/// (identifier, title, image) cannot be resolved.
///
/// `site` is the marketplace origin; relative image sources are resolved
/// against it and the detail URL is built from it and the identifier alone.
#[must_use]
pub fn extract_listing(node: ElementRef<'_>, site: &Url) -> Option<Listing> {
    let identifier = extract_identifier(node)?;

    let Some(title) = extract_title(node) else {
        tracing::debug!(asin = %identifier, "skipping listing without title");
        return None;
    };

    let Some(image_url) = extract_image_url(node, site) else {
        tracing::debug!(asin = %identifier, "skipping listing without image");
        return None;
    };

    let url = detail_url(site, &identifier)?;

    Some(Listing {
        title,
        rating: extract_rating(node),
        review_count: extract_review_count(node),
        image_url,
        price: extract_price(node),
        url,
        identifier,
    })
}

/// Builds the canonical detail page URL, `{site origin}/dp/{identifier}`.
///
/// Returns `None` only if `site` cannot carry a path (e.g. a `data:` URL).
#[must_use]
pub fn detail_url(site: &Url, identifier: &str) -> Option<String> {
    let mut url = site.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .ok()?
        .clear()
        .push("dp")
        .push(identifier);
    Some(url.to_string())
}

fn extract_identifier(node: ElementRef<'_>) -> Option<String> {
    node.value()
        .attr(IDENTIFIER_ATTR)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}

fn extract_title(node: ElementRef<'_>) -> Option<String> {
    SELECTORS.title.iter().find_map(|sel| {
        node.select(sel)
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

fn extract_rating(node: ElementRef<'_>) -> Option<f64> {
    SELECTORS.rating.iter().find_map(|sel| {
        let el = node.select(sel).next()?;
        el.value()
            .attr("aria-label")
            .and_then(parse_rating)
            .or_else(|| parse_rating(&element_text(el)))
    })
}

fn extract_review_count(node: ElementRef<'_>) -> Option<u32> {
    SELECTORS.review_count.iter().find_map(|sel| {
        let el = node.select(sel).next()?;
        parse_review_count(&element_text(el))
            .or_else(|| el.value().attr("aria-label").and_then(parse_review_count))
    })
}

fn extract_image_url(node: ElementRef<'_>, site: &Url) -> Option<String> {
    SELECTORS.image.iter().find_map(|(sel, source)| {
        let el = node.select(sel).next()?;
        let raw = match source {
            ImageSource::SrcsetFirst => el.value().attr("srcset")?.split_whitespace().next()?,
            ImageSource::Src => el.value().attr("src")?.trim(),
        };
        resolve_http_url(site, raw)
    })
}

fn extract_price(node: ElementRef<'_>) -> Option<Decimal> {
    SELECTORS.price.iter().find_map(|sel| {
        let el = node.select(sel).next()?;
        parse_price(&element_text(el))
    })
}

/// Whitespace-collapsed text content of an element.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve_http_url(site: &Url, raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    let resolved = site.join(raw).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// First decimal-looking substring, comma accepted as the decimal separator.
/// Values outside `[0, 5]` are discarded.
pub(crate) fn parse_rating(text: &str) -> Option<f64> {
    let raw = DECIMAL_RE.find(text)?.as_str().replace(',', ".");
    let rating = raw.parse::<f64>().ok()?;
    (0.0..=MAX_RATING).contains(&rating).then_some(rating)
}

/// Digits of `text` read as an integer; `None` when there are no digits.
pub(crate) fn parse_review_count(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Locale price text (`R$ 1.234,56`) to a decimal. Everything except digits
/// and commas is dropped, then the comma becomes the decimal point.
pub(crate) fn parse_price(text: &str) -> Option<Decimal> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let normalized = kept.replace(',', ".");
    Decimal::from_str(normalized.trim_end_matches('.')).ok()
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
