use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::Config;

/// Kind of a media item found on a product page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// An image or video referenced by a product page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    /// Alt text for images, title for videos
    #[serde(default)]
    pub label: String,
}

/// What a catalog overview card tells us before we open the product page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSummary {
    pub index: usize,
    pub name: String,
    pub image_url: Option<String>,
    pub link: Option<String>,
}

/// A single scraped catalog product.
/// Created once by extraction, then only read by export and upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Stable identifier: `{country_code}_{category_slug}_{position}`
    pub id: String,

    pub name: String,

    pub category: String,

    pub subcategory: String,

    /// Display name of the country the catalog was browsed for
    pub country: String,

    /// ISO 3166 code, e.g. "DE"
    pub country_code: String,

    /// Where the record came from ("catalog")
    pub source: String,

    #[serde(default)]
    pub card_image_url: Option<String>,

    #[serde(default)]
    pub product_images: Vec<String>,

    #[serde(default)]
    pub product_videos: Vec<String>,

    #[serde(default)]
    pub media: Vec<MediaItem>,

    #[serde(default)]
    pub short_description: String,

    #[serde(default)]
    pub advantages: Vec<String>,

    #[serde(default)]
    pub long_description: String,

    /// HTML body assembled from the description parts
    #[serde(default)]
    pub full_description: String,

    #[serde(default)]
    pub specifications: BTreeMap<String, String>,

    pub price: String,

    pub currency: String,

    #[serde(default)]
    pub product_url: Option<String>,

    pub extracted_at: DateTime<Utc>,

    #[serde(default)]
    pub status: String,
}

impl Product {
    /// Create a product with the required fields; everything else is empty.
    pub fn new(id: String, name: String, category: String, subcategory: String) -> Self {
        Self {
            id,
            name,
            category,
            subcategory,
            country: String::new(),
            country_code: String::new(),
            source: "catalog".to_string(),
            card_image_url: None,
            product_images: Vec::new(),
            product_videos: Vec::new(),
            media: Vec::new(),
            short_description: String::new(),
            advantages: Vec::new(),
            long_description: String::new(),
            full_description: String::new(),
            specifications: BTreeMap::new(),
            price: Config::PRICE_ON_REQUEST.to_string(),
            currency: "EUR".to_string(),
            product_url: None,
            extracted_at: Utc::now(),
            status: String::new(),
        }
    }

    /// Plain-text description used for CSV export
    pub fn description(&self) -> &str {
        if !self.short_description.is_empty() {
            &self.short_description
        } else {
            &self.long_description
        }
    }

    /// Card image first, then page images, without duplicates
    pub fn all_image_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        for url in self.card_image_url.iter().chain(self.product_images.iter()) {
            if !urls.contains(url) {
                urls.push(url.clone());
            }
        }
        urls
    }

    pub fn has_image(&self) -> bool {
        self.card_image_url.is_some() || !self.product_images.is_empty()
    }
}
