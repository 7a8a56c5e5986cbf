use lazy_static::lazy_static;
use parking_lot::Mutex;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use super::payload::ShopifyProduct;
use crate::config::Config;
use crate::models::Product;
use crate::progress::ProgressReporter;
use crate::settings::{RateLimitStrategy, ShopifyConfig};

lazy_static! {
    /// `X-Shopify-Shop-Api-Call-Limit: 32/40`
    static ref CALL_LIMIT_PATTERN: Regex =
        Regex::new(r"^\s*(\d+)\s*/\s*(\d+)\s*$").expect("Invalid call limit regex");
}

const CALL_LIMIT_HEADER: &str = "X-Shopify-Shop-Api-Call-Limit";
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

#[derive(Debug, thiserror::Error)]
pub enum ShopifyError {
    #[error("Shopify is not configured: {0}")]
    InvalidConfig(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Subset of `shop.json` shown after a connection test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopInfo {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// A product as returned by the Admin API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
}

/// What to do when a product with the same title already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadPolicy {
    #[default]
    Skip,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadAction {
    Created,
    Updated,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadSuccess {
    pub name: String,
    pub shopify_id: u64,
    pub action: UploadAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadFailure {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    pub successful: Vec<UploadSuccess>,
    pub failed: Vec<UploadFailure>,
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
}

impl UploadReport {
    pub fn count(&self, action: UploadAction) -> usize {
        self.successful.iter().filter(|s| s.action == action).count()
    }
}

/// `mystore` -> `https://mystore.myshopify.com`, `shop.example.com` ->
/// `https://shop.example.com`. URLs with a scheme are kept.
pub fn normalize_shop_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else if trimmed.contains('.') {
        format!("https://{}", trimmed)
    } else {
        format!("https://{}.myshopify.com", trimmed)
    }
}

/// Fraction of the leaky bucket in use, from the call-limit header.
pub fn parse_call_limit(value: &str) -> Option<f64> {
    let caps = CALL_LIMIT_PATTERN.captures(value)?;
    let used: f64 = caps.get(1)?.as_str().parse().ok()?;
    let max: f64 = caps.get(2)?.as_str().parse().ok()?;
    (max > 0.0).then(|| used / max)
}

pub struct ShopifyClient {
    http: reqwest::Client,
    base_url: String,
    strategy: RateLimitStrategy,
    min_interval: Duration,
    timeout: Duration,
    max_rate_limit_retries: u32,
    next_slot: Mutex<Option<Instant>>,
    throttled: AtomicBool,
}

impl ShopifyClient {
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        if !config.is_configured() {
            return Err(ShopifyError::InvalidConfig(
                "shop URL and access token are required".to_string(),
            ));
        }

        let mut token = HeaderValue::from_str(config.access_token.trim())
            .map_err(|_| ShopifyError::InvalidConfig("access token is not a valid header".into()))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_TOKEN_HEADER, token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let version = if config.api_version.trim().is_empty() {
            Config::SHOPIFY_API_VERSION
        } else {
            config.api_version.trim()
        };

        Ok(Self {
            http,
            base_url: format!("{}/admin/api/{}", normalize_shop_url(&config.shop_url), version),
            strategy: config.rate_limit_strategy,
            min_interval: Duration::from_millis(Config::SHOPIFY_MIN_REQUEST_INTERVAL_MS),
            timeout: Duration::from_secs(Config::SHOPIFY_REQUEST_TIMEOUT_SECS),
            max_rate_limit_retries: Config::SHOPIFY_MAX_RATE_LIMIT_RETRIES,
            next_slot: Mutex::new(None),
            throttled: AtomicBool::new(false),
        })
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Per-request timeout. Zero keeps the current value.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = timeout;
        }
        self
    }

    pub fn with_max_rate_limit_retries(mut self, retries: u32) -> Self {
        self.max_rate_limit_retries = retries;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn test_connection(&self) -> Result<ShopInfo, ShopifyError> {
        let response = self.request(Method::GET, "shop.json", None).await?;
        let shop: ShopInfo = take_field(response, "shop")?;
        tracing::info!("Connected to Shopify store: {} (ID: {})", shop.name, shop.id);
        Ok(shop)
    }

    pub async fn create_product(&self, product: &ShopifyProduct) -> Result<ProductRecord, ShopifyError> {
        let body = json!({ "product": product });
        let response = self.request(Method::POST, "products.json", Some(&body)).await?;
        let created: ProductRecord = take_field(response, "product")?;
        tracing::info!("Created product: {} (ID: {})", created.title, created.id);
        Ok(created)
    }

    pub async fn update_product(
        &self,
        id: u64,
        product: &ShopifyProduct,
    ) -> Result<ProductRecord, ShopifyError> {
        let body = json!({ "product": product });
        let endpoint = format!("products/{}.json", id);
        let response = self.request(Method::PUT, &endpoint, Some(&body)).await?;
        let updated: ProductRecord = take_field(response, "product")?;
        tracing::info!("Updated product: {} (ID: {})", updated.title, updated.id);
        Ok(updated)
    }

    /// First product Shopify returns for `title`, if any.
    pub async fn find_existing_product(&self, title: &str) -> Result<Option<ProductRecord>, ShopifyError> {
        if title.trim().is_empty() {
            return Ok(None);
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("title", title)
            .append_pair("limit", "1")
            .finish();

        let response = self
            .request(Method::GET, &format!("products.json?{}", query), None)
            .await?;
        let products: Vec<ProductRecord> = take_field(response, "products")?;
        Ok(products.into_iter().next())
    }

    pub async fn get_products(&self, limit: usize) -> Result<Vec<ProductRecord>, ShopifyError> {
        let limit = limit.clamp(1, 250);
        let response = self
            .request(Method::GET, &format!("products.json?limit={}", limit), None)
            .await?;
        take_field(response, "products")
    }

    pub async fn delete_product(&self, id: u64) -> Result<(), ShopifyError> {
        self.request(Method::DELETE, &format!("products/{}.json", id), None)
            .await?;
        tracing::info!("Deleted product {}", id);
        Ok(())
    }

    /// Upload products one by one; a failed product is recorded and the
    /// batch continues.
    pub async fn bulk_upload(
        &self,
        products: &[Product],
        policy: UploadPolicy,
        progress: &ProgressReporter,
    ) -> UploadReport {
        let mut report = UploadReport {
            total: products.len(),
            ..Default::default()
        };
        tracing::info!("Starting bulk upload of {} products", products.len());

        for (i, product) in products.iter().enumerate() {
            progress.status(format!(
                "Uploading product {}/{}: {}",
                i + 1,
                products.len(),
                product.name
            ));

            match self.upload_one(product, policy).await {
                Ok((shopify_id, action)) => {
                    report.successful.push(UploadSuccess {
                        name: product.name.clone(),
                        shopify_id,
                        action,
                    });
                    report.success_count += 1;
                }
                Err(e) => {
                    tracing::error!("Error uploading {}: {}", product.name, e);
                    report.failed.push(UploadFailure {
                        name: product.name.clone(),
                        error: e.to_string(),
                    });
                    report.error_count += 1;
                }
            }
        }

        tracing::info!(
            "Bulk upload completed: {} successful, {} failed, {} total",
            report.success_count,
            report.error_count,
            report.total
        );
        report
    }

    async fn upload_one(
        &self,
        product: &Product,
        policy: UploadPolicy,
    ) -> Result<(u64, UploadAction), ShopifyError> {
        let payload = ShopifyProduct::from_product(product);

        match (self.find_existing_product(&product.name).await?, policy) {
            (Some(existing), UploadPolicy::Skip) => {
                tracing::info!("Product already exists: {}", product.name);
                Ok((existing.id, UploadAction::Skipped))
            }
            (Some(existing), UploadPolicy::Update) => {
                let updated = self.update_product(existing.id, &payload).await?;
                Ok((updated.id, UploadAction::Updated))
            }
            (None, _) => {
                let created = self.create_product(&payload).await?;
                Ok((created.id, UploadAction::Created))
            }
        }
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value, ShopifyError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut attempts = 0u32;

        loop {
            self.pace().await;
            attempts += 1;

            let mut request = self.http.request(method.clone(), &url).timeout(self.timeout);
            if let Some(body) = body {
                request = request.json(body);
            }
            let response = request.send().await?;
            self.observe_call_limit(response.headers());

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempts > self.max_rate_limit_retries {
                    return Err(ShopifyError::RateLimited { attempts });
                }
                let wait = retry_after(response.headers());
                tracing::warn!("Rate limited, waiting {:?} before retrying {}", wait, endpoint);
                tokio::time::sleep(wait).await;
                continue;
            }

            let text = response.text().await?;
            if status.as_u16() >= 400 {
                tracing::error!("API error {}: {}", status.as_u16(), text);
                return Err(ShopifyError::Api {
                    status: status.as_u16(),
                    body: text,
                });
            }

            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text)?);
        }
    }

    /// Reserve the next request slot and wait for it.
    async fn pace(&self) {
        let interval = if self.throttled.load(Ordering::Relaxed) {
            self.min_interval * 2
        } else {
            self.min_interval
        };

        let wait = {
            let mut next_slot = self.next_slot.lock();
            let now = Instant::now();
            let slot = (*next_slot).filter(|s| *s > now).unwrap_or(now);
            *next_slot = Some(slot + interval);
            slot - now
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    fn observe_call_limit(&self, headers: &HeaderMap) {
        if self.strategy != RateLimitStrategy::Adaptive {
            return;
        }
        let Some(usage) = headers
            .get(CALL_LIMIT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_call_limit)
        else {
            return;
        };

        let throttle = usage > Config::SHOPIFY_CALL_LIMIT_THRESHOLD;
        if self.throttled.swap(throttle, Ordering::Relaxed) != throttle {
            tracing::debug!("API bucket at {:.0}%, throttled: {}", usage * 100.0, throttle);
        }
    }

    pub fn is_throttled(&self) -> bool {
        self.throttled.load(Ordering::Relaxed)
    }
}

fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .map(|wait| wait.min(Duration::from_secs(Config::SHOPIFY_MAX_RETRY_AFTER_SECS)))
        .unwrap_or(Duration::from_secs(Config::SHOPIFY_DEFAULT_RETRY_AFTER_SECS))
}

fn take_field<T: serde::de::DeserializeOwned>(mut response: Value, field: &str) -> Result<T, ShopifyError> {
    let value = response
        .get_mut(field)
        .map(Value::take)
        .ok_or_else(|| ShopifyError::UnexpectedResponse(format!("missing '{}' in response", field)))?;
    Ok(serde_json::from_value(value)?)
}
