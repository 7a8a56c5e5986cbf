//! Application settings: a JSON file layered with environment overrides.
//!
//! The file is optional. Unknown keys are ignored and missing keys take their
//! defaults, so older config files keep loading after new fields appear.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid value {value:?} for environment variable {name}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Shopify credentials missing: set shop_url and access_token in the config file or SHOPIFY_SHOP_URL / SHOPIFY_ACCESS_TOKEN")]
    MissingShopifyCredentials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitStrategy {
    /// Honour Retry-After and slow down when the call-limit bucket fills up
    #[default]
    Adaptive,
    /// Fixed minimum interval between requests only
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopifyConfig {
    pub shop_url: String,
    pub access_token: String,
    pub api_version: String,
    pub webhook_url: String,
    pub rate_limit_strategy: RateLimitStrategy,
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            shop_url: String::new(),
            access_token: String::new(),
            api_version: Config::SHOPIFY_API_VERSION.to_string(),
            webhook_url: String::new(),
            rate_limit_strategy: RateLimitStrategy::Adaptive,
        }
    }
}

impl ShopifyConfig {
    pub fn is_configured(&self) -> bool {
        !self.shop_url.trim().is_empty() && !self.access_token.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    pub max_products_per_category: usize,
    /// Seconds to wait after every page load
    pub delay_between_actions: u64,
    /// Kept for config compatibility; pages are always fetched without a window
    pub headless_mode: bool,
    /// Collect product image URLs from product pages
    pub download_images: bool,
    /// Parallel image downloads
    pub concurrent_requests: usize,
    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            max_products_per_category: 100,
            delay_between_actions: 2,
            headless_mode: false,
            download_images: true,
            concurrent_requests: 3,
            timeout: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    /// Text log path; the JSON log sits next to it
    pub file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

const DEFAULT_LOG_FILE: &str = "logs/wilo_scraper.log";

impl LogConfig {
    /// Directory and file-name prefix of the text log. Relative paths are
    /// resolved under `base_dir`.
    pub fn location(&self, base_dir: &Path) -> (PathBuf, String) {
        let file = match self.file.trim() {
            "" => DEFAULT_LOG_FILE,
            f => f,
        };
        let path = base_dir.join(file);
        let prefix = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("wilo_scraper.log")
            .to_string();
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| base_dir.to_path_buf());
        (dir, prefix)
    }
}

/// A catalog listing page to scrape, relative to the country/language prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCategory {
    pub path: String,
    pub name: String,
    pub product_type: String,
}

impl Default for CatalogCategory {
    fn default() -> Self {
        Self {
            path: Config::DEFAULT_CATEGORY_PATH.to_string(),
            name: Config::DEFAULT_CATEGORY_NAME.to_string(),
            product_type: Config::DEFAULT_PRODUCT_TYPE.to_string(),
        }
    }
}

fn default_categories() -> Vec<CatalogCategory> {
    vec![CatalogCategory::default()]
}

fn default_catalog_base() -> String {
    Config::CATALOG_BASE_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub shopify: ShopifyConfig,
    #[serde(default)]
    pub scraping: ScrapingConfig,
    #[serde(default)]
    pub log_config: LogConfig,
    #[serde(default = "default_catalog_base")]
    pub catalog_base_url: String,
    #[serde(default = "default_categories")]
    pub categories: Vec<CatalogCategory>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            shopify: ShopifyConfig::default(),
            scraping: ScrapingConfig::default(),
            log_config: LogConfig::default(),
            catalog_base_url: default_catalog_base(),
            categories: default_categories(),
        }
    }
}

/// Partial update for the scraping section
#[derive(Debug, Clone, Default)]
pub struct ScrapingPatch {
    pub max_products_per_category: Option<usize>,
    pub delay_between_actions: Option<u64>,
    pub headless_mode: Option<bool>,
    pub download_images: Option<bool>,
    pub concurrent_requests: Option<usize>,
    pub timeout: Option<u64>,
}

impl AppSettings {
    /// Load the settings file (if present) and apply environment overrides.
    /// A broken file is logged and replaced by defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let mut settings = Self::load_file(path.as_ref());
        settings.apply_env_overrides()?;
        Ok(settings)
    }

    /// The file contents alone, without environment overrides. Used when
    /// editing the file so env values are not written back.
    pub fn load_file(path: &Path) -> Self {
        let (settings, problem) = Self::read_file(path);
        if let Some(problem) = problem {
            tracing::warn!("{}", problem);
        }
        settings
    }

    /// Like `load_file`, but hands a parse failure back instead of logging
    /// it, for callers that read settings before logging is installed.
    pub fn read_file(path: &Path) -> (Self, Option<String>) {
        if !path.exists() {
            return (Self::default(), None);
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<Self>(&raw).map_err(|e| e.to_string()));

        match parsed {
            Ok(mut settings) => {
                if settings.categories.is_empty() {
                    settings.categories = default_categories();
                }
                (settings, None)
            }
            Err(e) => (
                Self::default(),
                Some(format!(
                    "Failed to load config from {}: {}; using defaults",
                    path.display(),
                    e
                )),
            ),
        }
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), SettingsError> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source; empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SHOPIFY_SHOP_URL") {
            self.shopify.shop_url = v;
        }
        if let Some(v) = get("SHOPIFY_ACCESS_TOKEN") {
            self.shopify.access_token = v;
        }
        if let Some(v) = get("HEADLESS_MODE") {
            self.scraping.headless_mode = parse_flag(&v);
        }
        if let Some(v) = get("BROWSER_TIMEOUT") {
            self.scraping.timeout = parse_number("BROWSER_TIMEOUT", &v)?;
        }
        if let Some(v) = get("PAGE_LOAD_DELAY") {
            self.scraping.delay_between_actions = parse_number("PAGE_LOAD_DELAY", &v)?;
        }
        if let Some(v) = get("MAX_PRODUCTS_PER_CATEGORY") {
            self.scraping.max_products_per_category = parse_number("MAX_PRODUCTS_PER_CATEGORY", &v)?;
        }
        if let Some(v) = get("DOWNLOAD_IMAGES") {
            self.scraping.download_images = parse_flag(&v);
        }
        if let Some(v) = get("MAX_CONCURRENT_DOWNLOADS") {
            self.scraping.concurrent_requests = parse_number("MAX_CONCURRENT_DOWNLOADS", &v)?;
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Settings saved to {}", path.display());
        Ok(())
    }

    pub fn update_shopify(&mut self, shop_url: String, access_token: String) {
        self.shopify.shop_url = shop_url;
        self.shopify.access_token = access_token;
    }

    pub fn update_scraping(&mut self, patch: ScrapingPatch) {
        let s = &mut self.scraping;
        if let Some(v) = patch.max_products_per_category {
            s.max_products_per_category = v;
        }
        if let Some(v) = patch.delay_between_actions {
            s.delay_between_actions = v;
        }
        if let Some(v) = patch.headless_mode {
            s.headless_mode = v;
        }
        if let Some(v) = patch.download_images {
            s.download_images = v;
        }
        if let Some(v) = patch.concurrent_requests {
            s.concurrent_requests = v;
        }
        if let Some(v) = patch.timeout {
            s.timeout = v;
        }
    }

    pub fn require_shopify(&self) -> Result<&ShopifyConfig, SettingsError> {
        if self.shopify.is_configured() {
            Ok(&self.shopify)
        } else {
            Err(SettingsError::MissingShopifyCredentials)
        }
    }

    /// Copy safe to print: the access token is masked
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.shopify.access_token = mask_secret(&copy.shopify.access_token);
        copy
    }
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, SettingsError> {
    value.trim().parse().map_err(|_| SettingsError::InvalidEnv {
        name,
        value: value.to_string(),
    })
}

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let count = secret.chars().count();
    if count <= 8 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{}", tail)
}

/// Working directories, all relative to one base directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub base_dir: PathBuf,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub images_dir: PathBuf,
    pub exports_dir: PathBuf,
    pub snapshots_dir: PathBuf,
}

impl AppPaths {
    pub fn under<P: AsRef<Path>>(base: P) -> Self {
        let base = base.as_ref().to_path_buf();
        Self {
            data_dir: base.join("data"),
            logs_dir: base.join("logs"),
            images_dir: base.join("images"),
            exports_dir: base.join("exports"),
            snapshots_dir: base.join("logs").join("snapshots"),
            base_dir: base,
        }
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            &self.data_dir,
            &self.logs_dir,
            &self.images_dir,
            &self.exports_dir,
            &self.snapshots_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let s = AppSettings::default();
        assert_eq!(s.scraping.max_products_per_category, 100);
        assert_eq!(s.scraping.delay_between_actions, 2);
        assert!(!s.scraping.headless_mode);
        assert_eq!(s.shopify.api_version, "2024-01");
        assert_eq!(s.categories.len(), 1);
        assert_eq!(s.categories[0].name, "Industrie Heizung");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let s = AppSettings::load_file(&dir.path().join("absent.json"));
        assert_eq!(s, AppSettings::default());
    }

    #[test]
    fn test_partial_file_with_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "shopify": {"shop_url": "demo-shop", "legacy_flag": true},
                "scraping": {"max_products_per_category": 5},
                "database": {"type": "sqlite"}
            }"#,
        )
        .unwrap();

        let s = AppSettings::load_file(&path);
        assert_eq!(s.shopify.shop_url, "demo-shop");
        assert_eq!(s.shopify.api_version, "2024-01");
        assert_eq!(s.scraping.max_products_per_category, 5);
        assert_eq!(s.scraping.timeout, 30);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppSettings::load_file(&path), AppSettings::default());
    }

    #[test]
    fn test_read_file_reports_parse_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"shopify": "#).unwrap();

        let (settings, problem) = AppSettings::read_file(&path);
        assert_eq!(settings, AppSettings::default());
        let problem = problem.unwrap();
        assert!(problem.contains("config.json"));
        assert!(problem.contains("using defaults"));

        let (_, problem) = AppSettings::read_file(&dir.path().join("absent.json"));
        assert!(problem.is_none());
    }

    #[test]
    fn test_log_file_location() {
        let base = Path::new("/srv/wilo");
        let (dir, prefix) = LogConfig::default().location(base);
        assert_eq!(dir, base.join("logs"));
        assert_eq!(prefix, "wilo_scraper.log");

        let custom = LogConfig {
            file: "/var/log/pumps/scrape.log".into(),
            ..LogConfig::default()
        };
        let (dir, prefix) = custom.location(base);
        assert_eq!(dir, Path::new("/var/log/pumps"));
        assert_eq!(prefix, "scrape.log");

        let bare = LogConfig {
            file: "run.log".into(),
            ..LogConfig::default()
        };
        assert_eq!(bare.location(base), (base.to_path_buf(), "run.log".to_string()));

        let empty = LogConfig {
            file: " ".into(),
            ..LogConfig::default()
        };
        assert_eq!(empty.location(base).1, "wilo_scraper.log");
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("SHOPIFY_SHOP_URL", "env-shop"),
            ("SHOPIFY_ACCESS_TOKEN", "shpat_123"),
            ("HEADLESS_MODE", "TRUE"),
            ("PAGE_LOAD_DELAY", "0"),
            ("MAX_PRODUCTS_PER_CATEGORY", "7"),
            ("DOWNLOAD_IMAGES", "no"),
        ]);
        let mut s = AppSettings::default();
        s.apply_overrides_from(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(s.shopify.shop_url, "env-shop");
        assert_eq!(s.shopify.access_token, "shpat_123");
        assert!(s.scraping.headless_mode);
        assert_eq!(s.scraping.delay_between_actions, 0);
        assert_eq!(s.scraping.max_products_per_category, 7);
        assert!(!s.scraping.download_images);
    }

    #[test]
    fn test_invalid_numeric_env_is_rejected() {
        let vars = env(&[("BROWSER_TIMEOUT", "soon")]);
        let mut s = AppSettings::default();
        let err = s.apply_overrides_from(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidEnv { name: "BROWSER_TIMEOUT", .. }));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut s = AppSettings::default();
        s.update_shopify("shop".into(), "token".into());
        s.update_scraping(ScrapingPatch {
            delay_between_actions: Some(5),
            ..Default::default()
        });
        s.save(&path).unwrap();

        let loaded = AppSettings::load_file(&path);
        assert_eq!(loaded.shopify.shop_url, "shop");
        assert_eq!(loaded.scraping.delay_between_actions, 5);
        assert_eq!(loaded.scraping.max_products_per_category, 100);
    }

    #[test]
    fn test_require_shopify() {
        let mut s = AppSettings::default();
        assert!(matches!(
            s.require_shopify(),
            Err(SettingsError::MissingShopifyCredentials)
        ));
        s.update_shopify("shop".into(), "token".into());
        assert!(s.require_shopify().is_ok());
    }

    #[test]
    fn test_redacted_masks_token() {
        let mut s = AppSettings::default();
        s.update_shopify("shop".into(), "shpat_abcdef123456".into());
        assert_eq!(s.redacted().shopify.access_token, "****3456");
        s.update_shopify("shop".into(), "short".into());
        assert_eq!(s.redacted().shopify.access_token, "****");
    }

    #[test]
    fn test_paths_under_base() {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::under(dir.path());
        paths.ensure_dirs().unwrap();
        assert!(paths.exports_dir.is_dir());
        assert!(paths.snapshots_dir.starts_with(&paths.logs_dir));
    }
}
