use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

use crate::config::Config;
use crate::countries::{self, Country};
use crate::extractors::catalog_cards::extract_cards;
use crate::extractors::description::build_full_description;
use crate::extractors::product_page::{extract_product_details, ExtractOptions};
use crate::models::{CardSummary, Product};
use crate::navigation::Navigator;
use crate::network::FetchError;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::settings::{AppSettings, CatalogCategory};
use crate::url_utils::{self, slugify};

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("Unknown country: {0}")]
    UnknownCountry(String),

    #[error("No catalog categories configured")]
    NoCategories,

    #[error("Failed to load catalog page {url}: {source}")]
    Catalog {
        url: String,
        #[source]
        source: FetchError,
    },
}

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub max_products_per_category: usize,
    pub include_images: bool,
    pub categories: Vec<CatalogCategory>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_products_per_category: 100,
            include_images: true,
            categories: vec![CatalogCategory::default()],
        }
    }
}

impl ScrapeConfig {
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            max_products_per_category: settings.scraping.max_products_per_category,
            include_images: settings.scraping.download_images,
            categories: settings.categories.clone(),
        }
    }
}

/// A card that could not be turned into a product
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeFailure {
    pub category: String,
    pub name: String,
    pub url: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub country: String,
    pub products: Vec<Product>,
    pub failures: Vec<ScrapeFailure>,
    /// Categories whose listing page could not be loaded
    pub failed_categories: Vec<String>,
    pub stopped: bool,
    pub duration_secs: u64,
}

/// Outcome of the navigation self-test
#[derive(Debug, Clone, Serialize)]
pub struct NavigationReport {
    pub url: String,
    pub final_url: Option<String>,
    pub status_code: Option<u16>,
    pub card_count: usize,
    pub ok: bool,
    pub error: Option<String>,
}

impl fmt::Display for NavigationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.ok { "successful" } else { "failed" };
        write!(f, "Catalog navigation test {}: {}", verdict, self.url)?;
        if let Some(final_url) = self.final_url.as_ref().filter(|u| *u != &self.url) {
            write!(f, " -> {}", final_url)?;
        }
        if let Some(status) = self.status_code {
            write!(f, " (HTTP {}, {} product cards)", status, self.card_count)?;
        }
        if let Some(error) = &self.error {
            write!(f, " - {}", error)?;
        }
        Ok(())
    }
}

/// Walks the catalog of one country: listing page, then each product page,
/// strictly one page at a time.
#[derive(Clone)]
pub struct CatalogScraper {
    config: ScrapeConfig,
    navigator: Navigator,
    progress: ProgressReporter,
    running: Arc<Mutex<bool>>,
    stop_requested: Arc<AtomicBool>,
}

impl CatalogScraper {
    pub fn new(config: ScrapeConfig, navigator: Navigator, progress: ProgressReporter) -> Self {
        Self {
            config,
            navigator,
            progress,
            running: Arc::new(Mutex::new(false)),
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Ask a running scrape to finish after the current page. A stop that
    /// arrives before `run` makes that run return without loading anything.
    pub fn stop(&self) {
        tracing::info!("Stopping catalog scraper...");
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        *self.running.lock()
    }

    fn should_continue(&self) -> bool {
        !self.stop_requested.load(Ordering::SeqCst)
    }

    pub async fn run(&self, country_key: &str) -> Result<ScrapeResult, ScrapeError> {
        let country = countries::get(country_key)
            .ok_or_else(|| ScrapeError::UnknownCountry(country_key.to_string()))?;
        if self.config.categories.is_empty() {
            return Err(ScrapeError::NoCategories);
        }

        *self.running.lock() = true;
        let start = Instant::now();
        tracing::info!(
            "Starting catalog scraping for {} (max {} products per category)",
            country.name,
            self.config.max_products_per_category
        );
        self.progress.send(ProgressEvent::Started {
            country: country.name.to_string(),
        });

        let mut products = Vec::new();
        let mut failures = Vec::new();
        let mut failed_categories = Vec::new();
        let mut first_error = None;
        let total = self.config.categories.len();

        for (i, category) in self.config.categories.iter().enumerate() {
            if !self.should_continue() {
                break;
            }

            self.progress.send(ProgressEvent::CategoryStarted {
                name: category.name.clone(),
                position: i + 1,
                total,
            });

            match self
                .scrape_category(country, category, &mut products, &mut failures)
                .await
            {
                Ok(count) => {
                    tracing::info!("Extracted {} products from {}", count, category.name);
                    self.progress.send(ProgressEvent::CategoryFinished {
                        name: category.name.clone(),
                        products: count,
                    });
                }
                Err(e) => {
                    tracing::error!("Category {} failed: {}", category.name, e);
                    self.progress.status(format!("Category {} failed: {}", category.name, e));
                    failed_categories.push(category.name.clone());
                    first_error.get_or_insert(e);
                }
            }
        }

        let stopped = !self.should_continue();
        *self.running.lock() = false;

        if failed_categories.len() == total {
            if let Some(e) = first_error {
                self.progress.send(ProgressEvent::Failed(e.to_string()));
                return Err(e);
            }
        }

        if stopped {
            self.progress.send(ProgressEvent::Stopped {
                products: products.len(),
            });
        } else {
            self.progress.send(ProgressEvent::Finished {
                products: products.len(),
            });
        }
        tracing::info!(
            "Catalog scraping completed. Found {} products ({} failed cards)",
            products.len(),
            failures.len()
        );

        Ok(ScrapeResult {
            country: country.key.to_string(),
            products,
            failures,
            failed_categories,
            stopped,
            duration_secs: start.elapsed().as_secs(),
        })
    }

    async fn scrape_category(
        &self,
        country: &Country,
        category: &CatalogCategory,
        products: &mut Vec<Product>,
        failures: &mut Vec<ScrapeFailure>,
    ) -> Result<usize, ScrapeError> {
        let page = self
            .navigator
            .open_catalog(country, category)
            .await
            .map_err(|source| ScrapeError::Catalog {
                url: self.navigator.catalog_url(country, category),
                source,
            })?;

        let cards = extract_cards(&page.html, &page.url);
        if cards.is_empty() {
            tracing::warn!("No product cards found on {}", page.url);
            return Ok(0);
        }

        let limit = cards.len().min(self.config.max_products_per_category);
        tracing::info!(
            "Processing {} of {} cards (max_products={})",
            limit,
            cards.len(),
            self.config.max_products_per_category
        );

        let mut extracted = 0;
        for (i, card) in cards.into_iter().take(limit).enumerate() {
            if !self.should_continue() {
                break;
            }

            self.progress.send(ProgressEvent::CardProcessed {
                position: i + 1,
                total: limit,
                name: card.name.clone(),
            });

            match self.build_product(country, category, &card).await {
                Ok(product) => {
                    tracing::info!("Successfully extracted product: {}", product.name);
                    self.progress.send(ProgressEvent::ProductExtracted {
                        name: product.name.clone(),
                    });
                    products.push(product);
                    extracted += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to get details for card {} ({}): {}", i + 1, card.name, e);
                    self.progress.send(ProgressEvent::ProductFailed {
                        name: card.name.clone(),
                        error: e.to_string(),
                    });
                    failures.push(ScrapeFailure {
                        category: category.name.clone(),
                        name: card.name.clone(),
                        url: card.link.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(extracted)
    }

    async fn build_product(
        &self,
        country: &Country,
        category: &CatalogCategory,
        card: &CardSummary,
    ) -> Result<Product, FetchError> {
        let mut product = Product::new(
            format!(
                "{}_{}_{}",
                country.code.to_lowercase(),
                slugify(&category.name),
                card.index + 1
            ),
            card.name.clone(),
            category.name.clone(),
            category.product_type.clone(),
        );
        product.country = country.name.to_string();
        product.country_code = country.code.to_string();
        product.currency = country.currency.to_string();
        product.card_image_url = card.image_url.clone();
        product.status = "card only".to_string();

        if let Some(link) = &card.link {
            let page = self.navigator.open_product(link, &card.name).await?;
            let details = extract_product_details(
                &page.html,
                &page.url,
                ExtractOptions {
                    include_images: self.config.include_images,
                    advantages_heading: country.advantages_heading,
                },
            );

            product.product_images = details.media.images;
            product.product_videos = details.media.videos;
            product.media = details.media.items;
            product.full_description = build_full_description(
                &details.short_description,
                &details.advantages,
                &details.long_description,
                country,
            );
            product.short_description = details.short_description;
            product.advantages = details.advantages;
            product.long_description = details.long_description;
            product.specifications = details.specifications;
            if let Some(price) = details.price {
                product.price = price;
            }
            product.product_url = Some(page.url);
            product.status = "extracted".to_string();
        } else {
            product.full_description = build_full_description("", &[], "", country);
        }

        if !self.config.include_images {
            product.card_image_url = None;
        }

        fill_default_specs(&mut product.specifications, &product.name, category);
        Ok(product)
    }

    /// Load the first category's listing page and check we landed on the catalog.
    pub async fn test_navigation(&self, country_key: &str) -> Result<NavigationReport, ScrapeError> {
        let country = countries::get(country_key)
            .ok_or_else(|| ScrapeError::UnknownCountry(country_key.to_string()))?;
        let category = self.config.categories.first().ok_or(ScrapeError::NoCategories)?;
        let url = self.navigator.catalog_url(country, category);

        self.progress.status("Testing catalog navigation...");

        let report = match self.navigator.open_catalog(country, category).await {
            Ok(page) => {
                let on_catalog = url_utils::is_same_host(&page.url, self.navigator.base_url())
                    && is_catalog_path(&page.url);
                let status_ok = (200..300).contains(&page.status_code);
                let card_count = extract_cards(&page.html, &page.url).len();
                let error = if !on_catalog {
                    Some("unexpected page".to_string())
                } else if !status_ok {
                    Some(format!("HTTP {}", page.status_code))
                } else {
                    None
                };
                NavigationReport {
                    url,
                    final_url: Some(page.url),
                    status_code: Some(page.status_code),
                    card_count,
                    ok: error.is_none(),
                    error,
                }
            }
            Err(e) => NavigationReport {
                url,
                final_url: None,
                status_code: None,
                card_count: 0,
                ok: false,
                error: Some(e.to_string()),
            },
        };

        if report.ok {
            tracing::info!("{}", report);
        } else {
            tracing::error!("{}", report);
        }
        self.progress.status(report.to_string());
        Ok(report)
    }
}

fn is_catalog_path(url: &str) -> bool {
    Url::parse(url)
        .map(|u| u.path().to_lowercase().contains("katalog"))
        .unwrap_or(false)
}

fn fill_default_specs(specs: &mut BTreeMap<String, String>, name: &str, category: &CatalogCategory) {
    let defaults = [
        ("brand", Config::SHOPIFY_VENDOR),
        ("series", name),
        ("application", category.name.as_str()),
        ("type", category.product_type.as_str()),
    ];
    for (key, value) in defaults {
        specs
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }
}
