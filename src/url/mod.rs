//! URL handling module
//!
//! Frontier ids, slugs and listing-link cleanup are all derived here so that
//! every stage agrees on what identifies a product page.

mod normalize;

pub use normalize::{derive_slug, frontier_id, parse_listing_url, strip_query};
