//! HTML parsing helpers shared by the crawl and sniff stages
//!
//! This module handles:
//! - Re-serializing fetched pages into a normalized document
//! - Extracting product links from listing pages

use crate::url::strip_query;
use scraper::{Html, Selector};
use url::Url;

/// Parses a fetched body and serializes it back to HTML
///
/// The stored document is what the HTML parser saw, so extraction later runs
/// against well-formed markup regardless of what the server sent.
pub fn normalize_html(body: &str) -> String {
    Html::parse_document(body).html()
}

/// Extracts product links from a listing page
///
/// Every element matched by `selector` contributes its `href`, resolved
/// against `base_url` with query and fragment removed. Duplicates on the same
/// page are collapsed, keeping first-seen order.
///
/// # Arguments
///
/// * `document` - The parsed listing page
/// * `selector` - Matches the anchor elements that point at product pages
/// * `base_url` - The base URL for resolving relative links
///
/// # Example
///
/// ```
/// use cedi_search::crawler::extract_listing_links;
/// use scraper::{Html, Selector};
/// use url::Url;
///
/// let html = r#"<a class="ad" href="/cars/kia-1.html?page=2&pos=1">Kia</a>"#;
/// let document = Html::parse_document(html);
/// let selector = Selector::parse("a.ad").unwrap();
/// let base_url = Url::parse("https://jiji.test/cars?page=2").unwrap();
///
/// let links = extract_listing_links(&document, &selector, &base_url);
/// assert_eq!(links, vec!["https://jiji.test/cars/kia-1.html"]);
/// ```
pub fn extract_listing_links(document: &Html, selector: &Selector, base_url: &Url) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();

    for element in document.select(selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(absolute_url) = resolve_link(href, base_url) else {
            continue;
        };

        match strip_query(&absolute_url) {
            Ok(link) if !links.contains(&link) => links.push(link),
            Ok(_) => {}
            Err(e) => tracing::debug!("Skipping listing link {}: {}", absolute_url, e),
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url.to_string())
    } else {
        None
    }
}
