//! Shared extraction helpers for source adapters
//!
//! Adapters describe where fields live; these helpers do the querying and the
//! text cleanup so every adapter fails the same way on the same kind of page.

use scraper::{Html, Selector};
use thiserror::Error;

/// Why a document could not be turned into a product record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    /// A required field is absent from the page
    #[error("required field `{field}` not found")]
    MissingField { field: &'static str },

    /// A field was located but its text could not be parsed
    ///
    /// On a page the adapter recognized this usually means a selector has
    /// drifted from the site's markup.
    #[error("field `{field}` is malformed: {value:?}")]
    MalformedField { field: &'static str, value: String },

    /// An adapter selector does not parse
    #[error("invalid selector `{selector}`")]
    InvalidSelector { selector: String },
}

impl ExtractionError {
    /// True for failures that point at an adapter regression
    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            ExtractionError::MalformedField { .. } | ExtractionError::InvalidSelector { .. }
        )
    }
}

fn parse_selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|_| ExtractionError::InvalidSelector {
        selector: css.to_string(),
    })
}

/// Text of the first element matching `css`, whitespace collapsed
///
/// Returns `Ok(None)` when nothing matches. A matching element with no text
/// yields an empty string.
pub fn select_text(document: &Html, css: &str) -> Result<Option<String>, ExtractionError> {
    let selector = parse_selector(css)?;

    let text = document
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()));
    Ok(text)
}

/// Attribute value of the first element matching `css`
pub fn select_attr(
    document: &Html,
    css: &str,
    attr: &str,
) -> Result<Option<String>, ExtractionError> {
    let selector = parse_selector(css)?;

    let value = document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string());
    Ok(value)
}

/// Collects one attribute per matching element, in document order
///
/// For each element the first non-empty attribute out of `attrs` is taken,
/// so lazily-loaded images can list `data-src` before `src`.
pub fn select_all_attrs(
    document: &Html,
    css: &str,
    attrs: &[&str],
) -> Result<Vec<String>, ExtractionError> {
    let selector = parse_selector(css)?;

    let values = document
        .select(&selector)
        .filter_map(|element| {
            attrs
                .iter()
                .filter_map(|attr| element.value().attr(attr))
                .map(str::trim)
                .find(|value| !value.is_empty())
                .map(str::to_string)
        })
        .collect();
    Ok(values)
}

/// Requires a located, non-empty field
pub fn require(value: Option<String>, field: &'static str) -> Result<String, ExtractionError> {
    value
        .filter(|text| !text.is_empty())
        .ok_or(ExtractionError::MissingField { field })
}

/// Parses a displayed price such as `GHS 1,250.00`
///
/// Currency labels and thousands separators are dropped; the first token that
/// contains a digit is the amount.
///
/// # Examples
///
/// ```
/// use cedi_search::sources::parse_price;
///
/// assert_eq!(parse_price("GHS 1,250.00"), Some(1250.0));
/// assert_eq!(parse_price("₵ 80"), Some(80.0));
/// assert_eq!(parse_price("Contact seller"), None);
/// ```
pub fn parse_price(text: &str) -> Option<f64> {
    let token = text
        .split_whitespace()
        .find(|token| token.chars().any(|c| c.is_ascii_digit()))?;

    let amount: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    amount.parse::<f64>().ok().filter(|price| price.is_finite())
}

/// Parses a required price field
pub fn price_field(text: &str) -> Result<f64, ExtractionError> {
    parse_price(text).ok_or_else(|| ExtractionError::MalformedField {
        field: "price",
        value: text.to_string(),
    })
}

/// Parses a rating such as `4.5 out of 5`, degrading to zero
pub fn parse_rating(text: Option<&str>) -> f64 {
    text.and_then(|text| text.split_whitespace().next())
        .and_then(|token| token.parse::<f64>().ok())
        .filter(|rating| rating.is_finite() && *rating >= 0.0)
        .unwrap_or(0.0)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
