use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::Product;

const CSV_HEADER: [&str; 8] = [
    "name",
    "category",
    "subcategory",
    "price",
    "currency",
    "country",
    "product_url",
    "description",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No products to export")]
    Empty,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// `products_{country}_{YYYYmmdd_HHMMSS}.{ext}`
pub fn export_file_name(country: &str, ext: &str, now: DateTime<Utc>) -> String {
    format!(
        "products_{}_{}.{}",
        country.to_lowercase().replace(' ', "_"),
        now.format("%Y%m%d_%H%M%S"),
        ext
    )
}

/// Write products as a pretty-printed JSON array.
pub fn export_to_json(products: &[Product], path: &Path) -> Result<(), ExportError> {
    create_parent(path)?;
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, products)?;
    writer.flush().map_err(io_error(path))?;
    tracing::info!("Exported {} products to {}", products.len(), path.display());
    Ok(())
}

/// Write the flat CSV summary of `products`.
pub fn export_to_csv(products: &[Product], path: &Path) -> Result<(), ExportError> {
    if products.is_empty() {
        return Err(ExportError::Empty);
    }
    create_parent(path)?;
    let file = File::create(path).map_err(io_error(path))?;
    write_csv(products, BufWriter::new(file))?;
    tracing::info!("Exported {} products to {}", products.len(), path.display());
    Ok(())
}

/// CSV rows for `products`, written to any writer.
pub fn write_csv<W: Write>(products: &[Product], writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;
    for product in products {
        csv.write_record([
            product.name.as_str(),
            product.category.as_str(),
            product.subcategory.as_str(),
            product.price.as_str(),
            product.currency.as_str(),
            product.country.as_str(),
            product.product_url.as_deref().unwrap_or(""),
            product.description(),
        ])?;
    }
    csv.flush().map_err(|e| ExportError::Csv(e.into()))?;
    Ok(())
}

/// Read products back from a JSON export.
pub fn load_from_json(path: &Path) -> Result<Vec<Product>, ExportError> {
    let file = File::open(path).map_err(io_error(path))?;
    let products: Vec<Product> = serde_json::from_reader(BufReader::new(file))?;
    tracing::debug!("Loaded {} products from {}", products.len(), path.display());
    Ok(products)
}

fn create_parent(path: &Path) -> Result<(), ExportError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(io_error(parent))
        }
        _ => Ok(()),
    }
}
