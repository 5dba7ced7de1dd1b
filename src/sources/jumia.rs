//! Jumia retail adapter

use crate::config::SourceEntry;
use crate::crawler::extract_listing_links;
use crate::sources::{
    parse_rating, price_field, require, select_all_attrs, select_text, ExtractionError, SiteLayout,
    SourceAdapter,
};
use crate::storage::{CrawledDocument, ProductRecord};
use crate::{ConfigError, UrlError};
use scraper::{Html, Selector};
use url::Url;

const BASE_URL: &str = "https://www.jumia.com.gh";

const CATEGORIES: &[&str] = &[
    "phones-tablets",
    "computing",
    "electronics",
    "home-office",
    "health-beauty",
    "category-fashion-by-jumia",
    "groceries",
    "baby-products",
    "sporting-goods",
    "toys-games",
    "automobile",
];

// Product cards on catalog pages
const LISTING_LINK: &str = "article.prd a.core";

pub struct JumiaAdapter {
    name: String,
    layout: SiteLayout,
}

impl JumiaAdapter {
    pub fn new(entry: &SourceEntry) -> Result<Self, ConfigError> {
        Ok(Self {
            name: entry.name.clone(),
            layout: SiteLayout::resolve(entry, BASE_URL, CATEGORIES)?,
        })
    }
}

impl SourceAdapter for JumiaAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn categories(&self) -> &[String] {
        &self.layout.categories
    }

    fn page_url(&self, category: &str, page: u32) -> Result<Url, UrlError> {
        self.layout.category_page(category, page)
    }

    fn listing_links(&self, document: &Html, page_url: &Url) -> Vec<String> {
        match Selector::parse(LISTING_LINK) {
            Ok(selector) => extract_listing_links(document, &selector, page_url),
            Err(_) => {
                tracing::error!("Listing selector {} does not parse", LISTING_LINK);
                Vec::new()
            }
        }
    }

    fn extract(&self, document: &CrawledDocument) -> Result<ProductRecord, ExtractionError> {
        let page = Html::parse_document(&document.html);

        let name = require(select_text(&page, "h1")?, "name")?;

        let price_text = require(select_text(&page, "span.-prxs")?, "price")?;
        let price = price_field(&price_text)?;

        let rating = parse_rating(select_text(&page, "div.stars")?.as_deref());
        let description = select_text(&page, "div.-mhm")?.unwrap_or_default();

        // "SKU: GE779EA0XYZNAFAMZ"
        let product_id = select_text(&page, "li.-pvxs")?
            .and_then(|text| text.split_whitespace().nth(1).map(str::to_string))
            .unwrap_or_default();

        let images = select_all_attrs(&page, "img.-fw", &["data-src", "src"])?;

        Ok(ProductRecord {
            name,
            price,
            rating,
            description,
            url: document.url.clone(),
            source: document.source.clone(),
            product_id,
            images,
            slug: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> JumiaAdapter {
        JumiaAdapter::new(&SourceEntry {
            name: "Jumia".to_string(),
            base_url: None,
            categories: None,
        })
        .unwrap()
    }

    fn document(url: &str, html: &str) -> CrawledDocument {
        CrawledDocument {
            id: 7,
            url: url.to_string(),
            html: html.to_string(),
            source: "Jumia".to_string(),
            fetched_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_extract_product() {
        let html = r#"
            <html><body>
                <h1>Widget</h1>
                <span class="-prxs">GHS 1,250.00</span>
                <div class="stars">4.5 out of 5</div>
                <div class="-mhm"><p>Sturdy</p> <p>garden widget</p></div>
                <ul><li class="-pvxs">SKU: WI779EA0XYZ</li></ul>
                <img class="-fw" data-src="https://gh.jumia.test/1.jpg" src="data:image/gif;base64,">
                <img class="-fw" data-src="https://gh.jumia.test/2.jpg">
            </body></html>
        "#;

        let record = adapter()
            .extract(&document("https://www.jumia.com.gh/home-garden/widget-77", html))
            .unwrap();

        assert_eq!(record.name, "Widget");
        assert_eq!(record.price, 1250.00);
        assert_eq!(record.rating, 4.5);
        assert_eq!(record.description, "Sturdy garden widget");
        assert_eq!(record.product_id, "WI779EA0XYZ");
        assert_eq!(
            record.images,
            vec!["https://gh.jumia.test/1.jpg", "https://gh.jumia.test/2.jpg"]
        );
        assert_eq!(record.source, "Jumia");
        assert!(record.slug.is_empty());
    }

    #[test]
    fn test_optional_fields_degrade() {
        let html = r#"<html><body><h1>Widget</h1><span class="-prxs">GHS 80</span></body></html>"#;
        let record = adapter()
            .extract(&document("https://www.jumia.com.gh/home-garden/widget-77", html))
            .unwrap();

        assert_eq!(record.rating, 0.0);
        assert_eq!(record.description, "");
        assert_eq!(record.product_id, "");
        assert!(record.images.is_empty());
    }

    #[test]
    fn test_extract_missing_price() {
        let html = r#"<html><body><h1>Widget</h1></body></html>"#;
        let result = adapter().extract(&document("https://www.jumia.com.gh/x/widget-77", html));
        assert_eq!(
            result,
            Err(ExtractionError::MissingField { field: "price" })
        );
    }

    #[test]
    fn test_extract_missing_name() {
        let html = r#"<html><body><span class="-prxs">GHS 80</span></body></html>"#;
        let result = adapter().extract(&document("https://www.jumia.com.gh/x/widget-77", html));
        assert_eq!(result, Err(ExtractionError::MissingField { field: "name" }));
    }

    #[test]
    fn test_listing_links() {
        let html = r#"
            <article class="prd"><a class="core" href="/tecno-spark-10-123.html?shop=1">Tecno</a></article>
            <article class="prd"><a class="core" href="/itel-a70-456.html">Itel</a></article>
            <a class="core" href="/not-in-a-card.html">Stray</a>
        "#;
        let adapter = adapter();
        let page_url = adapter.page_url("phones-tablets", 4).unwrap();
        let links = adapter.listing_links(&Html::parse_document(html), &page_url);

        assert_eq!(
            links,
            vec![
                "https://www.jumia.com.gh/tecno-spark-10-123.html",
                "https://www.jumia.com.gh/itel-a70-456.html",
            ]
        );
    }
}
