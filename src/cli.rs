use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;

/// Command-line interface for scraping the Wilo catalog and syncing to Shopify.
/// Exit codes: 0=success, 2=invalid arguments, 3=config or I/O error, 4=network or API error
#[derive(Parser, Debug)]
#[command(name = "wilo_scraper")]
#[command(about = "Scrape the Wilo product catalog and upload products to Shopify")]
#[command(version)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = Config::DEFAULT_CONFIG_PATH,
        help = "Settings file, relative to the base directory"
    )]
    pub config: String,

    #[arg(
        long,
        global = true,
        default_value = ".",
        help = "Base directory for data, logs and exports"
    )]
    pub base_dir: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scrape the catalog for one country and export the products.
    Scrape {
        #[arg(short, long, default_value = "germany", help = "Country key or code (see `countries`)")]
        country: String,

        #[arg(short, long, help = "Products per category (overrides settings)")]
        max_products: Option<usize>,

        #[arg(long, help = "Skip image URLs")]
        no_images: bool,

        #[arg(long, help = "Seconds to wait after each page load (overrides settings)")]
        delay: Option<u64>,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Both, help = "Export format")]
        format: ExportFormat,

        #[arg(long, help = "Download product images after scraping")]
        download_images: bool,

        #[arg(long, help = "Upload the scraped products to Shopify")]
        upload: bool,

        #[arg(long, help = "Update products that already exist in Shopify instead of skipping them")]
        update_existing: bool,

        #[arg(long, help = "Save every fetched page under logs/snapshots")]
        debug_snapshots: bool,
    },

    /// Open the first catalog page for a country and report what was found.
    TestNavigation {
        #[arg(short, long, default_value = "germany")]
        country: String,
    },

    /// Upload products from a JSON export to Shopify.
    Upload {
        #[arg(short, long, help = "JSON file written by `scrape` or `export`")]
        input: String,

        #[arg(long, help = "Update products that already exist instead of skipping them")]
        update_existing: bool,

        #[arg(short, long, help = "Upload at most this many products")]
        limit: Option<usize>,
    },

    /// Convert a JSON export to CSV or JSON.
    Export {
        #[arg(short, long, help = "JSON file written by `scrape`")]
        input: String,

        #[arg(short, long, help = "Output file (defaults to a timestamped name in the exports directory)")]
        output: Option<String>,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },

    /// Check the Shopify credentials.
    TestConnection,

    /// List products in the Shopify store.
    ListProducts {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Delete a product from the Shopify store.
    DeleteProduct {
        #[arg(help = "Shopify product id")]
        id: u64,
    },

    /// List the supported countries.
    Countries,

    /// Show or change the settings file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Delete old debug snapshots.
    CleanupSnapshots {
        #[arg(long, default_value_t = Config::SNAPSHOT_RETENTION_DAYS)]
        days: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective settings with secrets masked.
    Show,

    /// Write a settings file with default values.
    Init {
        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },

    /// Store Shopify credentials.
    SetShopify {
        #[arg(long)]
        shop_url: String,

        #[arg(long)]
        access_token: String,

        #[arg(long, help = "Admin API version, e.g. 2024-01")]
        api_version: Option<String>,
    },

    /// Change scraping options; omitted options keep their value.
    SetScraping {
        #[arg(long)]
        max_products: Option<usize>,

        #[arg(long)]
        delay: Option<u64>,

        #[arg(long)]
        headless: Option<bool>,

        #[arg(long)]
        download_images: Option<bool>,

        #[arg(long)]
        concurrent_requests: Option<usize>,

        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Both,
}

impl ExportFormat {
    pub fn includes_json(self) -> bool {
        matches!(self, ExportFormat::Json | ExportFormat::Both)
    }

    pub fn includes_csv(self) -> bool {
        matches!(self, ExportFormat::Csv | ExportFormat::Both)
    }
}

impl Cli {
    /// On error, clap prints help and exits with code 2 (usage error).
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_command_defaults() {
        let cli = Cli::try_parse_from(["wilo_scraper", "scrape"]).unwrap();
        assert_eq!(cli.config, "config/config.json");
        assert_eq!(cli.base_dir, ".");
        match cli.command {
            Commands::Scrape {
                country,
                max_products,
                format,
                upload,
                no_images,
                ..
            } => {
                assert_eq!(country, "germany");
                assert_eq!(max_products, None);
                assert_eq!(format, ExportFormat::Both);
                assert!(!upload);
                assert!(!no_images);
            }
            _ => panic!("Expected Scrape command"),
        }
    }

    #[test]
    fn test_scrape_command_with_options() {
        let cli = Cli::try_parse_from([
            "wilo_scraper",
            "scrape",
            "--country",
            "france",
            "--max-products",
            "5",
            "--format",
            "csv",
            "--upload",
            "--update-existing",
            "--base-dir",
            "/tmp/wilo",
        ])
        .unwrap();
        assert_eq!(cli.base_dir, "/tmp/wilo");
        match cli.command {
            Commands::Scrape {
                country,
                max_products,
                format,
                upload,
                update_existing,
                ..
            } => {
                assert_eq!(country, "france");
                assert_eq!(max_products, Some(5));
                assert!(format.includes_csv());
                assert!(!format.includes_json());
                assert!(upload);
                assert!(update_existing);
            }
            _ => panic!("Expected Scrape command"),
        }
    }

    #[test]
    fn test_config_set_scraping() {
        let cli = Cli::try_parse_from([
            "wilo_scraper",
            "config",
            "set-scraping",
            "--max-products",
            "20",
            "--headless",
            "true",
        ])
        .unwrap();
        match cli.command {
            Commands::Config {
                action:
                    ConfigAction::SetScraping {
                        max_products,
                        headless,
                        delay,
                        ..
                    },
            } => {
                assert_eq!(max_products, Some(20));
                assert_eq!(headless, Some(true));
                assert_eq!(delay, None);
            }
            _ => panic!("Expected Config SetScraping command"),
        }
    }

    #[test]
    fn test_delete_product_requires_id() {
        let err = Cli::try_parse_from(["wilo_scraper", "delete-product"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from(["wilo_scraper", "delete-product", "123"]).unwrap();
        assert!(matches!(cli.command, Commands::DeleteProduct { id: 123 }));
    }

    #[test]
    fn test_upload_requires_input() {
        let err = Cli::try_parse_from(["wilo_scraper", "upload"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_invalid_format_rejected() {
        let err = Cli::try_parse_from(["wilo_scraper", "scrape", "--format", "xml"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_help_does_not_panic() {
        let err = Cli::try_parse_from(["wilo_scraper", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
