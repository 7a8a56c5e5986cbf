#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use wilo_scraper::navigation::{Navigator, Page, PageSource};
use wilo_scraper::network::FetchError;

pub const BASE: &str = "https://wilo.test";

/// Serves canned HTML by URL and records every request.
pub struct FixtureSource {
    pages: HashMap<String, String>,
    pub requests: Mutex<Vec<String>>,
}

impl FixtureSource {
    pub fn new(pages: Vec<(String, String)>) -> Arc<Self> {
        Arc::new(Self {
            pages: pages.into_iter().collect(),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PageSource for FixtureSource {
    async fn load(&self, url: &str) -> Result<Page, FetchError> {
        self.requests.lock().push(url.to_string());
        match self.pages.get(url) {
            Some(html) => Ok(Page {
                requested_url: url.to_string(),
                url: url.to_string(),
                status_code: 200,
                html: html.clone(),
            }),
            None => Err(FetchError::HttpStatus(404)),
        }
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

pub fn navigator(source: Arc<FixtureSource>) -> Navigator {
    Navigator::new(source, BASE, Duration::ZERO)
}

pub fn catalog_url(url_country: &str, lang: &str) -> String {
    format!(
        "{}/{}/{}/Katalog/{}/anwendung/industrie/heizung/heizung",
        BASE, url_country, lang, lang
    )
}

pub fn card(name: &str, href: Option<&str>) -> String {
    let link = href
        .map(|h| format!(r#"<a class="stretched-link" href="{}"></a>"#, h))
        .unwrap_or_default();
    format!(
        r#"<div class="card cl-overview h-100 rebrush"><img data-src="/media/{f}.jpg">{l}<div class="card-footer"><h3>{n}</h3></div></div>"#,
        f = name.replace(' ', "-"),
        n = name,
        l = link
    )
}

pub fn catalog_page(cards: &[String]) -> String {
    format!("<html><body><main>{}</main></body></html>", cards.concat())
}

pub const STRATOS_PAGE: &str = r#"
<html><body>
<h1>Stratos MAXO</h1>
<div class="carousel"><img src="/media/stratos-front.jpg"><img src="/media/stratos-side.png"></div>
<div class="product-info">
  <p>Smart-Nassläufer-Premiumpumpe für Heizung, Klima und Kälte.</p>
</div>
<div class="cl-your-advantages">
  <h3>Ihre Vorteile</h3>
  <ul><li>Hohe Energieeffizienz</li><li>Einfache Bedienung</li></ul>
</div>
<table>
  <tr><td>Max. Förderhöhe</td><td>12 m</td></tr>
</table>
</body></html>
"#;
