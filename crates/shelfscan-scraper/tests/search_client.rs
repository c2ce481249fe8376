//! Integration tests for `SearchClient`.
//!
//! Uses `wiremock` to stand in for the marketplace so no real network traffic
//! is made. Jitter windows are shrunk to a few milliseconds to keep the retry
//! scenarios fast while still exercising the real sleep path.

use std::time::{Duration, Instant};

use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shelfscan_scraper::{JitterWindow, ListingSearch, RetryPolicy, ScrapeError, SearchClient};

const JITTER_MIN_MS: u64 = 5;
const JITTER_MAX_MS: u64 = 15;

fn test_client(site: &str, max_attempts: u32, timeout: Duration) -> SearchClient {
    SearchClient::new(
        site,
        timeout,
        "shelfscan-test/0.1",
        5,
        RetryPolicy::new(
            max_attempts,
            JitterWindow::from_millis(JITTER_MIN_MS, JITTER_MAX_MS),
        ),
    )
    .expect("failed to build test SearchClient")
}

fn result_node(asin: Option<&str>, title: &str, price: &str) -> String {
    let asin_attr = asin.map_or_else(String::new, |a| format!(r#" data-asin="{a}""#));
    format!(
        r#"<div data-component-type="s-search-result"{asin_attr}>
             <img class="s-image" src="https://m.media-amazon.com/images/I/{title}.jpg"
                  srcset="https://m.media-amazon.com/images/I/{title}-2x.jpg 2x">
             <h2><a class="a-link-normal" href="/{title}/dp/IGNORED"><span>{title}</span></a></h2>
             <i class="a-icon-star-small" aria-label="4,5 de 5 estrelas"></i>
             <span class="a-price"><span class="a-offscreen">R$ {price}</span></span>
           </div>"#
    )
}

/// Five listing nodes; the second and fourth carry no identifier.
fn five_node_page() -> String {
    let nodes = [
        result_node(Some("B0AAAAAAA1"), "caneca", "29,90"),
        result_node(None, "patrocinado", "10,00"),
        result_node(Some("B0AAAAAAA2"), "garrafa", "1.049,00"),
        result_node(None, "banner", "5,00"),
        result_node(Some("B0AAAAAAA3"), "copo", "sem preço"),
    ];
    format!(
        "<!doctype html><html><body><div class=\"s-main-slot\">{}</div></body></html>",
        nodes.concat()
    )
}

const CAPTCHA_PAGE: &str = r#"<!doctype html><html><body>
<form method="get" action="/errors/validateCaptcha">
  <h4>Digite os caracteres que você vê abaixo</h4>
</form></body></html>"#;

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn returns_listings_in_document_order_skipping_nodes_without_identifier() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "caneca térmica"))
        .respond_with(ResponseTemplate::new(200).set_body_string(five_node_page()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3, Duration::from_secs(5));
    let listings = client
        .search_with_retries("caneca térmica")
        .await
        .expect("search should succeed");

    let ids: Vec<_> = listings.iter().map(|l| l.identifier.as_str()).collect();
    assert_eq!(ids, ["B0AAAAAAA1", "B0AAAAAAA2", "B0AAAAAAA3"]);

    let garrafa = &listings[1];
    assert_eq!(garrafa.title, "garrafa");
    assert_eq!(garrafa.rating, Some(4.5));
    assert_eq!(garrafa.price.map(|p| p.to_string()), Some("1049.00".to_owned()));
    assert_eq!(
        garrafa.image_url,
        "https://m.media-amazon.com/images/I/garrafa-2x.jpg"
    );
    assert_eq!(garrafa.url, format!("{}/dp/B0AAAAAAA2", server.uri()));

    // unparsable price is omitted, the rest of the record survives
    assert_eq!(listings[2].price, None);
    assert_eq!(listings[2].rating, Some(4.5));
}

#[tokio::test]
async fn sends_browser_like_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(header("user-agent", "shelfscan-test/0.1"))
        .and(header("sec-fetch-mode", "navigate"))
        .and(header("upgrade-insecure-requests", "1"))
        .and(header_exists("accept-language"))
        .and(header_exists("sec-ch-ua"))
        .respond_with(ResponseTemplate::new(200).set_body_string(five_node_page()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1, Duration::from_secs(5));
    let listings = client.search_once("caneca").await.expect("search");
    assert_eq!(listings.len(), 3);
}

#[tokio::test]
async fn recovers_when_soft_block_clears() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CAPTCHA_PAGE))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(200).set_body_string(five_node_page()))
        .with_priority(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3, Duration::from_secs(5));
    let listings = client.search_with_retries("caneca").await.expect("search");
    assert_eq!(listings.len(), 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn same_page_twice_yields_identical_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(200).set_body_string(five_node_page()))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1, Duration::from_secs(5));
    let first = client.search_once("caneca").await.unwrap();
    let second = client.search_once("caneca").await.unwrap();
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_page_is_retried_then_reported_as_no_products() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CAPTCHA_PAGE))
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3, Duration::from_secs(5));
    let err = client.search_with_retries("caneca").await.unwrap_err();

    assert!(
        matches!(err, ScrapeError::Exhausted { attempts: 3, ref last } if matches!(**last, ScrapeError::NoListings { .. })),
        "expected Exhausted(NoListings), got: {err:?}"
    );
    assert_eq!(err.code(), "likely_blocked");
    assert!(err.to_string().starts_with("no products found after 3 attempts"));
}

#[tokio::test]
async fn upstream_error_status_is_captured_after_exhaustion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3, Duration::from_secs(5));
    let err = client.search_with_retries("caneca").await.unwrap_err();

    assert!(matches!(err, ScrapeError::Exhausted { attempts: 3, .. }));
    assert_eq!(err.upstream_status(), Some(503));
    assert_eq!(err.code(), "upstream_status");
    assert!(err.to_string().starts_with("transport error after 3 attempts"));
}

#[tokio::test]
async fn timeouts_are_retried_until_attempts_run_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(five_node_page())
                .set_delay(Duration::from_secs(2)),
        )
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3, Duration::from_millis(100));
    let started = Instant::now();
    let err = client.search_with_retries("caneca").await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, ScrapeError::Exhausted { attempts: 3, .. }));
    assert_eq!(err.code(), "timeout");
    // three timed-out calls plus two jittered waits
    assert!(
        elapsed >= Duration::from_millis(300 + 2 * JITTER_MIN_MS),
        "finished too quickly: {elapsed:?}"
    );
}

#[tokio::test]
async fn blank_keyword_fails_without_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(five_node_page()))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3, Duration::from_secs(5));
    let err = client.search_with_retries("   ").await.unwrap_err();
    assert!(matches!(err, ScrapeError::InvalidKeyword { .. }));
    assert!(err.is_validation());
}

#[tokio::test]
async fn trait_object_delegates_to_retrying_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CAPTCHA_PAGE))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2, Duration::from_secs(5));
    let search: &dyn ListingSearch = &client;
    let err = search.search("caneca").await.unwrap_err();
    assert!(matches!(err, ScrapeError::Exhausted { attempts: 2, .. }));
}
