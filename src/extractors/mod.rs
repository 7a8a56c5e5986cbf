//! Extraction of product data from Wilo catalog HTML.
//!
//! Pages are parsed with `scraper` and queried with CSS selectors. Each
//! field has an ordered list of selectors; the first one that yields
//! meaningful content wins, mirroring how the catalog templates differ
//! between product families.
//!
//! - **catalog_cards**: overview cards on a category listing page
//! - **product_page**: media, descriptions, advantages, specs on a product page
//! - **description**: assembles the HTML body used for exports and Shopify

pub mod catalog_cards;
pub mod description;
pub mod product_page;

use scraper::{ElementRef, Selector};

/// Parse a selector list, skipping (and logging) any that fail to parse.
pub(crate) fn selectors(sources: &[&str]) -> Vec<Selector> {
    sources
        .iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(sel) => Some(sel),
            Err(e) => {
                tracing::warn!("Invalid CSS selector {:?}: {:?}", s, e);
                None
            }
        })
        .collect()
}

pub(crate) fn selector(source: &str) -> Option<Selector> {
    selectors(&[source]).into_iter().next()
}

/// Element text with whitespace runs collapsed to single spaces.
pub(crate) fn clean_text(element: &ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `src`, falling back to lazy-load attributes.
pub(crate) fn image_source<'a>(element: &ElementRef<'a>) -> Option<&'a str> {
    let value = element.value();
    ["src", "data-src", "data-lazy-src"]
        .iter()
        .filter_map(|attr| value.attr(attr))
        .map(str::trim)
        .find(|s| !s.is_empty() && !s.starts_with("data:"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_invalid_selectors_are_skipped() {
        let parsed = selectors(&["div.card", "div[[", "img"]);
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn test_image_source_prefers_real_src() {
        let doc = Html::parse_fragment(
            r#"<img src="data:image/gif;base64,R0lG" data-src="/media/pump.jpg">"#,
        );
        let sel = selector("img").unwrap();
        let img = doc.select(&sel).next().unwrap();
        assert_eq!(image_source(&img), Some("/media/pump.jpg"));
    }
}
