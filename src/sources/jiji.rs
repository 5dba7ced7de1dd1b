//! Jiji classifieds adapter
//!
//! Listing pages link adverts through `a.b-list-advert-base`. Advert pages put
//! the title in `<title>` ("Kia Sorento 2003 in Akuapim South - Cars | Jiji")
//! and the machine-readable price in `span[itemprop=price]`'s `content`.

use crate::config::SourceEntry;
use crate::crawler::extract_listing_links;
use crate::sources::{
    price_field, require, select_all_attrs, select_attr, select_text, ExtractionError, SiteLayout,
    SourceAdapter,
};
use crate::storage::{CrawledDocument, ProductRecord};
use crate::{ConfigError, UrlError};
use scraper::{Html, Selector};
use url::Url;

const BASE_URL: &str = "https://jiji.com.gh";

const CATEGORIES: &[&str] = &[
    "vehicles",
    "real-estate",
    "mobile-phones-tablets",
    "electronics",
    "home-garden",
    "health-and-beauty",
    "fashion-and-beauty",
    "hobbies-art-sport",
    "seeking-work-cvs",
    "services",
    "jobs",
    "babies-and-kids",
    "animals-and-pets",
    "agriculture-and-foodstuff",
    "office-and-commercial-equipment-tools",
    "repair-and-construction",
];

const LISTING_LINK: &str = "a.b-list-advert-base";

pub struct JijiAdapter {
    name: String,
    layout: SiteLayout,
}

impl JijiAdapter {
    pub fn new(entry: &SourceEntry) -> Result<Self, ConfigError> {
        Ok(Self {
            name: entry.name.clone(),
            layout: SiteLayout::resolve(entry, BASE_URL, CATEGORIES)?,
        })
    }
}

impl SourceAdapter for JijiAdapter {
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

        // The location and seller follow " in " in the page title
        let title = require(select_text(&page, "title")?, "name")?;
        let name = title
            .split(" in ")
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        if name.is_empty() {
            return Err(ExtractionError::MissingField { field: "name" });
        }

        let price_text = require(
            select_attr(&page, "span[itemprop=price]", "content")?,
            "price",
        )?;
        let price = price_field(&price_text)?;

        let description = select_text(&page, "span.qa-description-text")?.unwrap_or_default();

        let mut images = select_all_attrs(&page, "img.qa-carousel-thumbnail__image", &["src"])?;
        if images.is_empty() {
            images = select_all_attrs(&page, "img.b-slider-image", &["src"])?;
            images.truncate(1);
        }

        Ok(ProductRecord {
            name,
            price,
            rating: 0.0,
            description,
            url: document.url.clone(),
            source: document.source.clone(),
            product_id: advert_id(&document.url),
            images,
            slug: String::new(),
        })
    }
}

/// Advert id: the last `-`-separated piece of the URL, without `.html`
fn advert_id(url: &str) -> String {
    url.rsplit('-')
        .next()
        .unwrap_or_default()
        .trim_end_matches(".html")
        .to_string()
}
