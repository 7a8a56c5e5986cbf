//! Navigation driver: loads catalog and product pages in order, pausing
//! between page loads.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::countries::Country;
use crate::network::{FetchError, HttpClient};
use crate::settings::CatalogCategory;
use crate::snapshots::SnapshotStore;

/// A loaded page
#[derive(Debug, Clone)]
pub struct Page {
    /// URL that was requested
    pub requested_url: String,
    /// URL after redirects
    pub url: String,
    pub status_code: u16,
    pub html: String,
}

/// Anything that can turn a URL into page HTML.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn load(&self, url: &str) -> Result<Page, FetchError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Loads pages over HTTP
pub struct HttpPageSource {
    http: HttpClient,
}

impl HttpPageSource {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn load(&self, url: &str) -> Result<Page, FetchError> {
        let result = self.http.fetch(url).await?;
        Ok(Page {
            requested_url: url.to_string(),
            url: result.final_url,
            status_code: result.status_code,
            html: result.content,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[derive(Clone)]
pub struct Navigator {
    source: Arc<dyn PageSource>,
    base_url: String,
    delay: Duration,
    snapshots: Option<SnapshotStore>,
}

impl Navigator {
    pub fn new(source: Arc<dyn PageSource>, base_url: impl Into<String>, delay: Duration) -> Self {
        Self {
            source,
            base_url: base_url.into(),
            delay,
            snapshots: None,
        }
    }

    /// Save every loaded page into `store` (debug mode)
    pub fn with_snapshots(mut self, store: SnapshotStore) -> Self {
        self.snapshots = Some(store);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn catalog_url(&self, country: &Country, category: &CatalogCategory) -> String {
        country.catalog_url(&self.base_url, &category.path)
    }

    pub async fn open_catalog(
        &self,
        country: &Country,
        category: &CatalogCategory,
    ) -> Result<Page, FetchError> {
        let url = self.catalog_url(country, category);
        tracing::info!("Navigating to catalog page {}", url);
        self.visit(&url, &format!("catalog_{}_{}", country.key, category.name)).await
    }

    pub async fn open_product(&self, url: &str, label: &str) -> Result<Page, FetchError> {
        tracing::debug!("Opening product page {}", url);
        self.visit(url, &format!("product_{}", label)).await
    }

    async fn visit(&self, url: &str, label: &str) -> Result<Page, FetchError> {
        let result = self.source.load(url).await;

        if let (Some(store), Ok(page)) = (&self.snapshots, &result) {
            if let Err(e) = store.save(label, &page.html) {
                tracing::warn!("Failed to save snapshot for {}: {}", url, e);
            }
        }

        // Pause after every load, successful or not
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        result
    }
}
