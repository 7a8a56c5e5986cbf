pub mod backoff;
pub mod catalog_scraper;
pub mod cli;
pub mod config;
pub mod countries;
pub mod export;
pub mod extractors;
pub mod images;
pub mod logging;
pub mod models;
pub mod navigation;
pub mod network;
pub mod progress;
pub mod settings;
pub mod shopify;
pub mod snapshots;
pub mod url_utils;

// Re-export main types for library usage
pub use catalog_scraper::{CatalogScraper, NavigationReport, ScrapeConfig, ScrapeError, ScrapeResult};
pub use countries::Country;
pub use models::{CardSummary, MediaItem, MediaKind, Product};
pub use navigation::{HttpPageSource, Navigator, Page, PageSource};
pub use network::{FetchError, FetchResult, HttpClient};
pub use settings::{AppPaths, AppSettings, SettingsError};
pub use shopify::{ShopifyClient, ShopifyError, ShopifyProduct, UploadPolicy, UploadReport};
