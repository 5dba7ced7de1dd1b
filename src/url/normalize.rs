use crate::UrlError;
use url::Url;

/// Parses an absolute listing URL
///
/// Only http and https URLs with a host are accepted.
pub fn parse_listing_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Derives the frontier dedup key for a URL: its normalized path
///
/// # Examples
///
/// ```
/// use cedi_search::url::frontier_id;
///
/// assert_eq!(frontier_id("https://a.test/x/123").unwrap(), "/x/123");
/// assert_eq!(frontier_id("https://a.test//x/./123/?page=2").unwrap(), "/x/123");
/// ```
pub fn frontier_id(url_str: &str) -> Result<String, UrlError> {
    let url = parse_listing_url(url_str)?;
    Ok(normalize_path(url.path()))
}

/// Removes the query string and fragment from a listing link
///
/// Listing pages decorate product links with pagination and tracking
/// parameters; the product itself is identified by the path alone.
pub fn strip_query(url_str: &str) -> Result<String, UrlError> {
    let mut url = parse_listing_url(url_str)?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}

/// Derives the search index slug: the second element of the path split on `/`
///
/// # Examples
///
/// ```
/// use cedi_search::url::derive_slug;
///
/// assert_eq!(derive_slug("https://site.test/cars/listing-991").unwrap(), "cars");
/// ```
pub fn derive_slug(url_str: &str) -> Result<String, UrlError> {
    let url = parse_listing_url(url_str)?;

    url.path()
        .split('/')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| UrlError::MissingSlug(url_str.to_string()))
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Skip empty segments (from multiple slashes) and current directory markers
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    format!("/{}", normalized_segments.join("/"))
}
