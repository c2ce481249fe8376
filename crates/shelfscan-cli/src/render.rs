//! Static pt-BR results page written by the CLI.

use chrono::{DateTime, TimeZone};
use rust_decimal::{Decimal, RoundingStrategy};
use shelfscan_core::Listing;

const STYLESHEET: &str = include_str!("../assets/results.css");

const SEARCH_SCRIPT: &str = r"
document.getElementById('search-form').addEventListener('submit', (event) => {
  event.preventDefault();
  const value = event.target.querySelector('input').value.trim();
  if (value) {
    window.location.href = event.target.dataset.site + '/s?k=' + encodeURIComponent(value);
  }
});
";

/// Renders a self-contained page for `listings`. All listing text is escaped.
///
/// The search box re-runs the query on the marketplace at `site`.
pub fn results_page<Tz>(
    keyword: &str,
    site: &str,
    listings: &[Listing],
    generated_at: DateTime<Tz>,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let keyword = escape_html(keyword);
    let site = escape_html(site.trim_end_matches('/'));
    let mut cards = String::new();
    for listing in listings {
        cards.push_str(&card(listing));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{keyword} - Resultados da Busca</title>
  <style>{STYLESHEET}</style>
</head>
<body>
  <div class="container">
    <header class="search-header">
      <h1 class="search-term">{keyword}</h1>
      <form class="search-form" id="search-form" data-site="{site}">
        <input type="search" class="search-input" placeholder="Buscar produtos..." value="{keyword}" aria-label="Buscar produtos">
      </form>
      <p>{count} resultados encontrados</p>
    </header>
    <div class="products-grid">{cards}
    </div>
    <footer class="generated-at">Gerado em {generated}</footer>
  </div>
  <script>{SEARCH_SCRIPT}</script>
</body>
</html>
"#,
        count = listings.len(),
        generated = generated_at.format("%d/%m/%Y %H:%M"),
    )
}

fn card(listing: &Listing) -> String {
    let price = listing
        .price
        .map_or_else(|| "Indisponível".to_owned(), format_brl);
    let rating = listing.rating.map(format_rating).unwrap_or_default();
    let reviews = listing
        .review_count
        .map(|n| format!("{} avaliações", group_thousands(&n.to_string())))
        .unwrap_or_default();

    format!(
        r#"
      <a href="{url}" target="_blank" rel="noopener" class="product-card">
        <div class="product-image-container">
          <img class="product-image" src="{image}" alt="{title}" loading="lazy">
        </div>
        <div class="product-info">
          <h3 class="product-title">{title}</h3>
          <div class="product-price">{price}</div>
          <div class="product-rating">{rating} {reviews}</div>
        </div>
      </a>"#,
        url = escape_html(&listing.url),
        image = escape_html(&listing.image_url),
        title = escape_html(&listing.title),
    )
}

/// `1234.5` becomes `R$ 1.234,50`.
pub(crate) fn format_brl(price: Decimal) -> String {
    let rounded = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("R$ {sign}{},{cents}", group_thousands(whole))
}

/// `4.5` becomes `4,5 ★`.
pub(crate) fn format_rating(rating: f64) -> String {
    format!("{} ★", rating.to_string().replace('.', ","))
}

/// Inserts `.` between groups of three digits.
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
