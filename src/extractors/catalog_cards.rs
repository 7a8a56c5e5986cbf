//! Product cards on a catalog listing page.
//!
//! ```html
//! <div class="card cl-overview h-100 rebrush">
//!   <img src="/media/stratos-maxo.jpg">
//!   <a class="stretched-link" href="/de/de/Katalog/de/produkte/stratos-maxo"></a>
//!   <div class="card-footer"><h3>Wilo-Stratos MAXO</h3></div>
//! </div>
//! ```

use scraper::Html;

use super::{clean_text, image_source, selector};
use crate::models::CardSummary;
use crate::url_utils::absolutize;

const CARD: &str = "div.card.cl-overview";
const CARD_NAME: &str = ".card-footer h3";
const CARD_IMAGE: &str = "img";
const CARD_LINK: &str = "a.stretched-link";

/// Extract all product cards, in page order. Cards without a name are skipped.
pub fn extract_cards(html: &str, base_url: &str) -> Vec<CardSummary> {
    let document = Html::parse_document(html);

    let (Some(card_sel), Some(name_sel), Some(img_sel), Some(link_sel)) = (
        selector(CARD),
        selector(CARD_NAME),
        selector(CARD_IMAGE),
        selector(CARD_LINK),
    ) else {
        return Vec::new();
    };

    let mut cards = Vec::new();

    for (position, card) in document.select(&card_sel).enumerate() {
        let name = match card.select(&name_sel).map(|e| clean_text(&e)).find(|t| !t.is_empty()) {
            Some(name) => name,
            None => {
                tracing::warn!("Could not find product name in card {}", position + 1);
                continue;
            }
        };

        let image_url = card
            .select(&img_sel)
            .find_map(|img| image_source(&img))
            .and_then(|src| absolutize(src, base_url));

        let link = card
            .select(&link_sel)
            .find_map(|a| a.value().attr("href"))
            .and_then(|href| absolutize(href, base_url));

        if link.is_none() {
            tracing::warn!("Could not find product link in card {}", position + 1);
        }

        cards.push(CardSummary {
            index: cards.len(),
            name,
            image_url,
            link,
        });
    }

    tracing::debug!("Found {} product cards", cards.len());
    cards
}
