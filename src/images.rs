//! Local copies of product images.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::models::Product;
use crate::network::HttpClient;
use crate::url_utils::slugify;

const KNOWN_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];

#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadReport {
    pub downloaded: usize,
    pub failed: usize,
    pub files: Vec<PathBuf>,
}

/// Downloads product images with a bounded number of requests in flight.
pub struct ImageDownloader {
    http: HttpClient,
    concurrency: usize,
}

impl ImageDownloader {
    pub fn new(http: HttpClient, concurrency: usize) -> Self {
        Self {
            http,
            concurrency: concurrency.max(1),
        }
    }

    /// Save every image of every product under `dir/{product_id}/{n}.{ext}`.
    /// Individual failures are counted, not returned.
    pub async fn download_all(&self, products: &[Product], dir: &Path) -> std::io::Result<DownloadReport> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for product in products {
            let product_dir = dir.join(slugify(&product.id));
            let urls = product.all_image_urls();
            if urls.is_empty() {
                continue;
            }
            tokio::fs::create_dir_all(&product_dir).await?;

            for (n, url) in urls.into_iter().enumerate() {
                let http = self.http.clone();
                let semaphore = Arc::clone(&semaphore);
                let product_dir = product_dir.clone();

                tasks.spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| e.to_string())?;
                    let (bytes, content_type) = http.fetch_bytes(&url).await.map_err(|e| {
                        tracing::warn!("Image download failed for {}: {}", url, e);
                        e.to_string()
                    })?;
                    let ext = image_extension(&url, content_type.as_deref());
                    let path = product_dir.join(format!("{}.{}", n + 1, ext));
                    tokio::fs::write(&path, bytes).await.map_err(|e| e.to_string())?;
                    Ok::<PathBuf, String>(path)
                });
            }
        }

        let mut report = DownloadReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(path)) => {
                    report.downloaded += 1;
                    report.files.push(path);
                }
                Ok(Err(_)) => report.failed += 1,
                Err(e) => {
                    tracing::error!("Image download task panicked: {}", e);
                    report.failed += 1;
                }
            }
        }

        report.files.sort();
        tracing::info!(
            "Downloaded {} images ({} failed) into {}",
            report.downloaded,
            report.failed,
            dir.display()
        );
        Ok(report)
    }
}

/// File extension from the URL path, else from the content type, else jpg.
pub fn image_extension(url: &str, content_type: Option<&str>) -> String {
    let from_path = url::Url::parse(url).ok().and_then(|u| {
        u.path()
            .rsplit('.')
            .next()
            .map(|ext| ext.to_ascii_lowercase())
            .filter(|ext| KNOWN_EXTENSIONS.contains(&ext.as_str()))
    });
    if let Some(ext) = from_path {
        return ext;
    }

    match content_type.map(|ct| ct.split(';').next().unwrap_or("").trim()) {
        Some("image/png") => "png",
        Some("image/gif") => "gif",
        Some("image/webp") => "webp",
        Some("image/svg+xml") => "svg",
        _ => "jpg",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::ExponentialBackoff;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("https://wilo.com/a/pump.PNG", None), "png");
        assert_eq!(image_extension("https://wilo.com/img?id=4", Some("image/webp")), "webp");
        assert_eq!(image_extension("https://wilo.com/render", None), "jpg");
        assert_eq!(image_extension("not a url", Some("image/gif; q=1")), "gif");
    }

    #[tokio::test]
    async fn test_download_all_counts_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/front.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![137u8, 80, 78, 71]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/media/gone.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut product = Product::new("de_heizung_1".into(), "Stratos".into(), "c".into(), "s".into());
        product.card_image_url = Some(format!("{}/media/front.png", server.uri()));
        product.product_images = vec![
            format!("{}/media/front.png", server.uri()),
            format!("{}/media/gone.jpg", server.uri()),
        ];
        let without_images = Product::new("x".into(), "Empty".into(), "c".into(), "s".into());

        let http = HttpClient::new("TestBot/1.0".into(), 5)
            .unwrap()
            .with_retries(0, ExponentialBackoff::new(1, 1));
        let dir = TempDir::new().unwrap();
        let report = ImageDownloader::new(http, 2)
            .download_all(&[product, without_images], dir.path())
            .await
            .unwrap();

        assert_eq!(report.downloaded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.files, vec![dir.path().join("de_heizung_1").join("1.png")]);
        assert!(!dir.path().join("x").exists());
    }
}
