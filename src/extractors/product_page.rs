//! Detail extraction for a single product page.

use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

use super::{clean_text, image_source, selector, selectors};
use crate::config::Config;
use crate::models::{MediaItem, MediaKind};
use crate::url_utils::absolutize;

const IMAGE_SELECTORS: &[&str] = &[
    "div[class*=carousel] img",
    "div[class*=gallery] img",
    "div[class*=cl-gutters] img",
    "img[src*=wilo]",
];

const VIDEO_SELECTORS: &[&str] = &[
    "video source",
    "iframe[src*=video]",
    "div[class*=video] iframe",
];

const SHORT_DESCRIPTION_SELECTORS: &[&str] = &[
    "div[class*=product-info] p",
    "div[class*=description] p",
    "div.pl-md-8 p",
];

const ADVANTAGES_SELECTORS: &[&str] = &["[class*=cl-your-advantages] ul li"];

const LONG_DESCRIPTION_SELECTORS: &[&str] = &[
    "div[class*=description]",
    "div[class*=content] div[class*=text]",
    "div[class*=product-details]",
    "div[class*=two-cols-section] div[class*=text-module]",
];

const TITLE_SELECTORS: &[&str] = &["h1", "h2", ".product-title"];

const PRICE_SELECTORS: &[&str] = &["[class*=price]"];

/// Images and videos found on a page, de-duplicated, in page order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Media {
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub items: Vec<MediaItem>,
}

impl Media {
    fn push(&mut self, kind: MediaKind, url: String, label: String) {
        let list = match kind {
            MediaKind::Image => &mut self.images,
            MediaKind::Video => &mut self.videos,
        };
        if list.contains(&url) {
            return;
        }
        list.push(url.clone());
        self.items.push(MediaItem { kind, url, label });
    }
}

/// Everything a product page yields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDetails {
    pub title: Option<String>,
    pub media: Media,
    pub short_description: String,
    pub advantages: Vec<String>,
    pub long_description: String,
    pub specifications: BTreeMap<String, String>,
    pub price: Option<String>,
}

/// Options controlling what gets collected
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions<'a> {
    pub include_images: bool,
    /// Localized heading above the advantages list, e.g. "Ihre Vorteile"
    pub advantages_heading: &'a str,
}

/// Parse a product page and run every field extractor over it.
pub fn extract_product_details(html: &str, base_url: &str, options: ExtractOptions<'_>) -> ProductDetails {
    let document = Html::parse_document(html);

    let details = ProductDetails {
        title: extract_title(&document),
        media: extract_media(&document, base_url, options.include_images),
        short_description: extract_short_description(&document),
        advantages: extract_advantages(&document, options.advantages_heading),
        long_description: extract_long_description(&document),
        specifications: extract_specifications(&document),
        price: extract_price(&document),
    };

    tracing::debug!(
        images = details.media.images.len(),
        videos = details.media.videos.len(),
        advantages = details.advantages.len(),
        specs = details.specifications.len(),
        short_len = details.short_description.len(),
        long_len = details.long_description.len(),
        "Extracted product page"
    );

    details
}

pub fn extract_media(document: &Html, base_url: &str, include_images: bool) -> Media {
    let mut media = Media::default();

    if include_images {
        for sel in selectors(IMAGE_SELECTORS) {
            for img in document.select(&sel) {
                if let Some(url) = image_source(&img).and_then(|src| absolutize(src, base_url)) {
                    let alt = img.value().attr("alt").unwrap_or_default().trim().to_string();
                    media.push(MediaKind::Image, url, alt);
                }
            }
        }
    }

    for sel in selectors(VIDEO_SELECTORS) {
        for video in document.select(&sel) {
            if let Some(url) = video
                .value()
                .attr("src")
                .and_then(|src| absolutize(src, base_url))
            {
                let title = video.value().attr("title").unwrap_or_default().trim().to_string();
                media.push(MediaKind::Video, url, title);
            }
        }
    }

    media
}

/// Intro paragraphs: the first selector with meaningful paragraphs wins.
pub fn extract_short_description(document: &Html) -> String {
    for sel in selectors(SHORT_DESCRIPTION_SELECTORS) {
        let paragraphs: Vec<String> = document
            .select(&sel)
            .map(|p| clean_text(&p))
            .filter(|t| t.chars().count() > Config::MIN_PARAGRAPH_CHARS)
            .collect();

        if !paragraphs.is_empty() {
            return paragraphs.join(" ");
        }
    }
    String::new()
}

/// Benefit bullet points. Falls back to the list following the
/// localized advantages heading.
pub fn extract_advantages(document: &Html, heading: &str) -> Vec<String> {
    for sel in selectors(ADVANTAGES_SELECTORS) {
        let items = list_items(document.select(&sel));
        if !items.is_empty() {
            return items;
        }
    }

    let (Some(h3), Some(li)) = (selector("h3"), selector("li")) else {
        return Vec::new();
    };

    let heading = heading.to_lowercase();
    for title in document.select(&h3) {
        let text = clean_text(&title).to_lowercase();
        let matches = (!heading.is_empty() && text.contains(&heading)) || text.contains("vorteile");
        if !matches {
            continue;
        }

        for sibling in title.next_siblings().filter_map(ElementRef::wrap) {
            let items = list_items(sibling.select(&li));
            if !items.is_empty() {
                return items;
            }
        }
    }

    Vec::new()
}

fn list_items<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    elements
        .map(|li| clean_text(&li))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Substantial text blocks, de-duplicated, separated by blank lines.
pub fn extract_long_description(document: &Html) -> String {
    let mut parts: Vec<String> = Vec::new();

    for sel in selectors(LONG_DESCRIPTION_SELECTORS) {
        for block in document.select(&sel) {
            let text = clean_text(&block);
            if text.chars().count() > Config::MIN_LONG_BLOCK_CHARS && !parts.contains(&text) {
                parts.push(text);
            }
        }
    }

    parts.join("\n\n")
}

/// Two-column table rows become key/value pairs.
pub fn extract_specifications(document: &Html) -> BTreeMap<String, String> {
    let mut specs = BTreeMap::new();

    let (Some(row_sel), Some(cell_sel)) = (selector("table tr"), selector("td")) else {
        return specs;
    };

    for row in document.select(&row_sel) {
        let cells: Vec<String> = row.select(&cell_sel).map(|c| clean_text(&c)).collect();
        if cells.len() >= 2 && !cells[0].is_empty() && !cells[1].is_empty() {
            specs.insert(cells[0].clone(), cells[1].clone());
        }
    }

    specs
}

pub fn extract_title(document: &Html) -> Option<String> {
    first_text(document, &selectors(TITLE_SELECTORS))
}

pub fn extract_price(document: &Html) -> Option<String> {
    first_text(document, &selectors(PRICE_SELECTORS))
}

fn first_text(document: &Html, sels: &[Selector]) -> Option<String> {
    sels.iter()
        .flat_map(|sel| document.select(sel))
        .map(|e| clean_text(&e))
        .find(|t| !t.is_empty())
}
