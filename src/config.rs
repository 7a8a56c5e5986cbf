// Global configuration constants - single source of truth

pub struct Config;

impl Config {
    // Catalog site
    pub const CATALOG_BASE_URL: &'static str = "https://wilo.com";
    pub const DEFAULT_CATEGORY_PATH: &'static str = "anwendung/industrie/heizung/heizung";
    pub const DEFAULT_CATEGORY_NAME: &'static str = "Industrie Heizung";
    pub const DEFAULT_PRODUCT_TYPE: &'static str = "Heizungspumpen";
    pub const DEFAULT_USER_AGENT: &'static str =
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
    pub const PRICE_ON_REQUEST: &'static str = "Price on request";

    // HTTP/Network config
    pub const MAX_CONTENT_SIZE: usize = 10 * 1024 * 1024; // 10MB
    pub const MAX_RETRIES: u32 = 2;
    pub const RETRY_BACKOFF_MS: u64 = 500;
    pub const RETRY_BACKOFF_MAX_MS: u64 = 5_000;
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const POOL_IDLE_PER_HOST: usize = 4;

    // Extraction thresholds
    pub const MIN_PARAGRAPH_CHARS: usize = 20;
    pub const MIN_LONG_BLOCK_CHARS: usize = 50;

    // Shopify
    pub const SHOPIFY_API_VERSION: &'static str = "2024-01";
    pub const SHOPIFY_MIN_REQUEST_INTERVAL_MS: u64 = 500;
    pub const SHOPIFY_MAX_RATE_LIMIT_RETRIES: u32 = 5;
    pub const SHOPIFY_DEFAULT_RETRY_AFTER_SECS: u64 = 2;
    pub const SHOPIFY_MAX_RETRY_AFTER_SECS: u64 = 60;
    pub const SHOPIFY_REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const SHOPIFY_CALL_LIMIT_THRESHOLD: f64 = 0.8;
    pub const SHOPIFY_VENDOR: &'static str = "Wilo";
    pub const MAX_SKU_LEN: usize = 50;
    pub const MAX_UPLOAD_IMAGES: usize = 10;

    // Files
    pub const DEFAULT_CONFIG_PATH: &'static str = "config/config.json";
    pub const SNAPSHOT_RETENTION_DAYS: u64 = 7;
}
