use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

use wilo_scraper::catalog_scraper::{CatalogScraper, ScrapeConfig, ScrapeError};
use wilo_scraper::cli::{Cli, Commands, ConfigAction, ExportFormat};
use wilo_scraper::config::Config;
use wilo_scraper::countries::{self, Country};
use wilo_scraper::export::{self, ExportError};
use wilo_scraper::images::ImageDownloader;
use wilo_scraper::logging::init_logging;
use wilo_scraper::models::Product;
use wilo_scraper::navigation::{HttpPageSource, Navigator};
use wilo_scraper::network::{FetchError, HttpClient};
use wilo_scraper::progress::{self, ProgressReceiver, ProgressReporter, ProgressTracker};
use wilo_scraper::settings::{AppPaths, AppSettings, ScrapingPatch, SettingsError};
use wilo_scraper::shopify::{ShopifyClient, ShopifyError, UploadAction, UploadPolicy, UploadReport};
use wilo_scraper::snapshots::SnapshotStore;

#[derive(Error, Debug)]
pub enum MainError {
    #[error("{0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Settings(#[from] SettingsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Scraping error: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("Network error: {0}")]
    Network(#[from] FetchError),

    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    #[error("{0}")]
    Remote(String),
}

impl MainError {
    /// 2 usage, 3 configuration or I/O, 4 network or remote API
    fn exit_code(&self) -> i32 {
        match self {
            MainError::Usage(_) => 2,
            MainError::Scrape(ScrapeError::UnknownCountry(_)) => 2,
            MainError::Settings(_)
            | MainError::Io(_)
            | MainError::Logging(_)
            | MainError::Export(_)
            | MainError::Scrape(ScrapeError::NoCategories)
            | MainError::Shopify(ShopifyError::InvalidConfig(_)) => 3,
            MainError::Scrape(_) | MainError::Network(_) | MainError::Shopify(_) | MainError::Remote(_) => 4,
        }
    }
}

struct ScrapeOptions {
    country: String,
    max_products: Option<usize>,
    no_images: bool,
    delay: Option<u64>,
    format: ExportFormat,
    download_images: bool,
    upload: bool,
    update_existing: bool,
    debug_snapshots: bool,
}

fn build_http(settings: &AppSettings) -> Result<HttpClient, MainError> {
    Ok(HttpClient::new(
        Config::DEFAULT_USER_AGENT.to_string(),
        settings.scraping.timeout,
    )?)
}

fn find_country(key: &str) -> Result<&'static Country, MainError> {
    countries::get(key).ok_or_else(|| {
        MainError::Usage(format!(
            "Unknown country '{}'. Available: {}",
            key,
            countries::keys().join(", ")
        ))
    })
}

fn shopify_client(settings: &AppSettings) -> Result<ShopifyClient, MainError> {
    Ok(ShopifyClient::new(settings.require_shopify()?)?
        .with_timeout(Duration::from_secs(settings.scraping.timeout)))
}

/// Print progress events until every sender is dropped.
fn spawn_progress_printer(mut rx: ProgressReceiver) -> JoinHandle<ProgressTracker> {
    tokio::spawn(async move {
        let tracker = ProgressTracker::new();
        while let Some(event) = rx.recv().await {
            tracker.observe(&event);
            println!("{}", event);
        }
        tracker
    })
}

async fn run_scrape_command(
    settings: &AppSettings,
    paths: &AppPaths,
    opts: ScrapeOptions,
) -> Result<(), MainError> {
    let country = find_country(&opts.country)?;

    let mut config = ScrapeConfig::from_settings(settings);
    if let Some(max) = opts.max_products {
        config.max_products_per_category = max;
    }
    if opts.no_images {
        config.include_images = false;
    }
    let delay = Duration::from_secs(opts.delay.unwrap_or(settings.scraping.delay_between_actions));

    let http = build_http(settings)?;
    let mut navigator = Navigator::new(
        Arc::new(HttpPageSource::new(http.clone())),
        settings.catalog_base_url.clone(),
        delay,
    );
    if opts.debug_snapshots {
        navigator = navigator.with_snapshots(SnapshotStore::new(&paths.snapshots_dir)?);
    }

    println!(
        "Scraping {} ({} products per category, {}s between pages)",
        country.name,
        config.max_products_per_category,
        delay.as_secs()
    );

    let (tx, rx) = progress::channel();
    let printer = spawn_progress_printer(rx);
    let scraper = CatalogScraper::new(config, navigator, ProgressReporter::new(tx));

    let stopper = scraper.clone();
    let signal_handler = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nReceived Ctrl+C, stopping after the current product...");
            stopper.stop();
        }
    });

    let result = scraper.run(country.key).await;

    // Drop every progress sender so the printer drains and exits
    signal_handler.abort();
    let _ = signal_handler.await;
    drop(scraper);
    let tracker = printer.await.unwrap_or_default();

    let result = result?;
    println!(
        "Scraped {} products from {} in {}s ({})",
        result.products.len(),
        country.name,
        result.duration_secs,
        tracker
    );
    for failure in &result.failures {
        println!("  failed: {} [{}]: {}", failure.name, failure.category, failure.error);
    }

    if result.products.is_empty() {
        println!("No products found, nothing to export");
        return Ok(());
    }

    export_products(&result.products, paths, country.key, opts.format, None)?;

    if (opts.download_images || settings.scraping.download_images) && !opts.no_images {
        let report = ImageDownloader::new(http, settings.scraping.concurrent_requests)
            .download_all(&result.products, &paths.images_dir)
            .await?;
        println!(
            "Downloaded {} images ({} failed) to {}",
            report.downloaded,
            report.failed,
            paths.images_dir.display()
        );
    }

    if opts.upload {
        upload_products(settings, &result.products, policy(opts.update_existing)).await?;
    }

    Ok(())
}

fn policy(update_existing: bool) -> UploadPolicy {
    if update_existing {
        UploadPolicy::Update
    } else {
        UploadPolicy::Skip
    }
}

/// Write the requested formats. With `Both`, an explicit output path is
/// used as the stem for both files.
fn export_products(
    products: &[Product],
    paths: &AppPaths,
    country: &str,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<(), MainError> {
    let now = Utc::now();
    let target = |ext: &str| -> PathBuf {
        match output {
            Some(path) if format == ExportFormat::Both => path.with_extension(ext),
            Some(path) => path.to_path_buf(),
            None => paths.exports_dir.join(export::export_file_name(country, ext, now)),
        }
    };

    if format.includes_json() {
        let path = target("json");
        export::export_to_json(products, &path)?;
        println!("Exported JSON to: {}", path.display());
    }
    if format.includes_csv() {
        let path = target("csv");
        export::export_to_csv(products, &path)?;
        println!("Exported CSV to: {}", path.display());
    }
    Ok(())
}

async fn upload_products(
    settings: &AppSettings,
    products: &[Product],
    policy: UploadPolicy,
) -> Result<UploadReport, MainError> {
    let client = shopify_client(settings)?;

    let (tx, rx) = progress::channel();
    let printer = spawn_progress_printer(rx);
    let reporter = ProgressReporter::new(tx);
    let report = client.bulk_upload(products, policy, &reporter).await;
    drop(reporter);
    let _ = printer.await;

    println!(
        "Upload finished: {} created, {} updated, {} skipped, {} failed (of {})",
        report.count(UploadAction::Created),
        report.count(UploadAction::Updated),
        report.count(UploadAction::Skipped),
        report.error_count,
        report.total
    );
    for failure in &report.failed {
        println!("  failed: {}: {}", failure.name, failure.error);
    }

    if report.total > 0 && report.success_count == 0 {
        return Err(MainError::Remote(format!(
            "All {} uploads failed",
            report.total
        )));
    }
    Ok(report)
}

async fn run_test_navigation_command(settings: &AppSettings, country: &str) -> Result<(), MainError> {
    let country = find_country(country)?;
    let navigator = Navigator::new(
        Arc::new(HttpPageSource::new(build_http(settings)?)),
        settings.catalog_base_url.clone(),
        Duration::ZERO,
    );
    let scraper = CatalogScraper::new(
        ScrapeConfig::from_settings(settings),
        navigator,
        ProgressReporter::silent(),
    );

    let report = scraper.test_navigation(country.key).await?;
    println!("{}", report);
    if report.ok {
        Ok(())
    } else {
        Err(MainError::Remote(format!("Navigation test failed for {}", country.name)))
    }
}

fn run_config_command(
    action: ConfigAction,
    settings: &AppSettings,
    config_path: &Path,
) -> Result<(), MainError> {
    match action {
        ConfigAction::Show => {
            let json = serde_json::to_string_pretty(&settings.redacted()).map_err(SettingsError::from)?;
            println!("{}", json);
        }
        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                return Err(MainError::Usage(format!(
                    "{} already exists, use --force to overwrite",
                    config_path.display()
                )));
            }
            AppSettings::default().save(config_path)?;
            println!("Wrote default settings to {}", config_path.display());
        }
        ConfigAction::SetShopify {
            shop_url,
            access_token,
            api_version,
        } => {
            let mut file_settings = AppSettings::load_file(config_path);
            file_settings.update_shopify(shop_url, access_token);
            if let Some(version) = api_version {
                file_settings.shopify.api_version = version;
            }
            file_settings.save(config_path)?;
            println!("Shopify settings saved to {}", config_path.display());
        }
        ConfigAction::SetScraping {
            max_products,
            delay,
            headless,
            download_images,
            concurrent_requests,
            timeout,
        } => {
            let mut file_settings = AppSettings::load_file(config_path);
            file_settings.update_scraping(ScrapingPatch {
                max_products_per_category: max_products,
                delay_between_actions: delay,
                headless_mode: headless,
                download_images,
                concurrent_requests,
                timeout,
            });
            file_settings.save(config_path)?;
            println!("Scraping settings saved to {}", config_path.display());
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), MainError> {
    let paths = AppPaths::under(&cli.base_dir);
    let config_path = paths.base_dir.join(&cli.config);
    let (mut settings, settings_problem) = AppSettings::read_file(&config_path);
    settings.apply_env_overrides()?;

    paths.ensure_dirs()?;
    let (log_dir, log_prefix) = settings.log_config.location(&paths.base_dir);
    let _log_guards = init_logging(&log_dir, &log_prefix, &settings.log_config.level)
        .map_err(|e| MainError::Logging(e.to_string()))?;
    if let Some(problem) = settings_problem {
        tracing::warn!("{}", problem);
    }

    match cli.command {
        Commands::Scrape {
            country,
            max_products,
            no_images,
            delay,
            format,
            download_images,
            upload,
            update_existing,
            debug_snapshots,
        } => {
            run_scrape_command(
                &settings,
                &paths,
                ScrapeOptions {
                    country,
                    max_products,
                    no_images,
                    delay,
                    format,
                    download_images,
                    upload,
                    update_existing,
                    debug_snapshots,
                },
            )
            .await?;
        }

        Commands::TestNavigation { country } => {
            run_test_navigation_command(&settings, &country).await?;
        }

        Commands::Upload {
            input,
            update_existing,
            limit,
        } => {
            let mut products = export::load_from_json(Path::new(&input))?;
            if let Some(limit) = limit {
                products.truncate(limit);
            }
            println!("Uploading {} products from {}", products.len(), input);
            upload_products(&settings, &products, policy(update_existing)).await?;
        }

        Commands::Export {
            input,
            output,
            format,
        } => {
            let products = export::load_from_json(Path::new(&input))?;
            let country = products
                .first()
                .map(|p| p.country.clone())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "all".to_string());
            export_products(
                &products,
                &paths,
                &country,
                format,
                output.as_deref().map(Path::new),
            )?;
        }

        Commands::TestConnection => {
            let shop = shopify_client(&settings)?.test_connection().await?;
            println!(
                "Connected to {} ({}), store id {}",
                shop.name,
                shop.domain.as_deref().unwrap_or("unknown domain"),
                shop.id
            );
        }

        Commands::ListProducts { limit } => {
            let products = shopify_client(&settings)?.get_products(limit).await?;
            println!("{} products:", products.len());
            for product in products {
                println!(
                    "  {:>14}  {}  [{}]",
                    product.id,
                    product.title,
                    product.status.as_deref().unwrap_or("-")
                );
            }
        }

        Commands::DeleteProduct { id } => {
            shopify_client(&settings)?.delete_product(id).await?;
            println!("Deleted product {}", id);
        }

        Commands::Countries => {
            for country in countries::all() {
                println!(
                    "  {:<16} {:<16} {}  {}  {}",
                    country.key, country.name, country.code, country.language, country.currency
                );
            }
        }

        Commands::Config { action } => {
            run_config_command(action, &settings, &config_path)?;
        }

        Commands::CleanupSnapshots { days } => {
            let removed = SnapshotStore::new(&paths.snapshots_dir)?.cleanup_older_than(days)?;
            println!("Removed {} snapshots older than {} days", removed, days);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
