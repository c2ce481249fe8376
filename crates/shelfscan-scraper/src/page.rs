//! Locating listing containers on a full search results page.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use shelfscan_core::Listing;
use url::Url;

use crate::extract::extract_listing;

/// Container strategies, tried in order. The first one that matches any
/// node on the page decides the container set.
const CONTAINER_SELECTORS: &[&str] = &[
    "[data-component-type=\"s-search-result\"]",
    "[data-asin]:not([data-asin=\"\"])",
];

static CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CONTAINER_SELECTORS
        .iter()
        .map(|css| Selector::parse(css).expect("valid container selector"))
        .collect()
});

/// Parses a search results page and extracts every resolvable listing in
/// document order.
///
/// Nodes that fail extraction are dropped. When the same identifier shows up
/// more than once (nested containers, sponsored duplicates) only the first
/// occurrence is kept. Pure and deterministic for a given input.
#[must_use]
pub fn parse_listings(html: &str, site: &Url) -> Vec<Listing> {
    let document = Html::parse_document(html);

    let Some(containers) = CONTAINERS.iter().find_map(|sel| {
        let nodes: Vec<_> = document.select(sel).collect();
        (!nodes.is_empty()).then_some(nodes)
    }) else {
        tracing::debug!(html_len = html.len(), "no listing containers on page");
        return Vec::new();
    };

    let container_count = containers.len();
    let mut seen = HashSet::new();
    let listings: Vec<Listing> = containers
        .into_iter()
        .filter_map(|node| extract_listing(node, site))
        .filter(|listing| seen.insert(listing.identifier.clone()))
        .collect();

    tracing::debug!(
        containers = container_count,
        listings = listings.len(),
        "extracted listings from page"
    );
    listings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Url {
        Url::parse("https://www.amazon.com.br").unwrap()
    }

    fn result_node(asin: Option<&str>, title: &str) -> String {
        let asin_attr = asin.map_or_else(String::new, |a| format!(r#" data-asin="{a}""#));
        format!(
            r#"<div data-component-type="s-search-result"{asin_attr}>
                 <img class="s-image" src="https://m.media-amazon.com/images/I/{title}.jpg">
                 <h2><span class="a-text-normal">{title}</span></h2>
               </div>"#
        )
    }

    fn page(nodes: &[String]) -> String {
        format!(
            "<html><body><div class=\"s-main-slot\">{}</div></body></html>",
            nodes.concat()
        )
    }

    #[test]
    fn five_nodes_two_without_identifier_yield_three_in_order() {
        let html = page(&[
            result_node(Some("A1"), "primeiro"),
            result_node(None, "sem-id-1"),
            result_node(Some("A2"), "segundo"),
            result_node(None, "sem-id-2"),
            result_node(Some("A3"), "terceiro"),
        ]);
        let listings = parse_listings(&html, &site());
        let ids: Vec<_> = listings.iter().map(|l| l.identifier.as_str()).collect();
        assert_eq!(ids, ["A1", "A2", "A3"]);
        assert_eq!(listings[1].title, "segundo");
    }

    #[test]
    fn falls_back_to_identifier_attribute_containers() {
        let html = r#"<html><body>
            <div data-asin="">ad slot</div>
            <div data-asin="B1">
              <img class="s-image" src="https://m.media-amazon.com/images/I/x.jpg">
              <h2><span class="a-text-normal">Sem marcador</span></h2>
            </div>
        </body></html>"#;
        let listings = parse_listings(html, &site());
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].identifier, "B1");
    }

    #[test]
    fn duplicate_identifiers_keep_first_occurrence() {
        let html = page(&[
            result_node(Some("D1"), "original"),
            result_node(Some("D1"), "repetido"),
            result_node(Some("D2"), "outro"),
        ]);
        let listings = parse_listings(&html, &site());
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].title, "original");
    }

    #[test]
    fn captcha_page_yields_nothing() {
        let html = r#"<html><body><form action="/errors/validateCaptcha">
            <p>Digite os caracteres que você vê abaixo</p></form></body></html>"#;
        assert!(parse_listings(html, &site()).is_empty());
    }

    #[test]
    fn parsing_twice_yields_identical_sequences() {
        let html = page(&[
            result_node(Some("I1"), "um"),
            result_node(Some("I2"), "dois"),
        ]);
        assert_eq!(parse_listings(&html, &site()), parse_listings(&html, &site()));
    }
}
