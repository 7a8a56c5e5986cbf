use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wilo_scraper::models::Product;
use wilo_scraper::progress::ProgressReporter;
use wilo_scraper::settings::{RateLimitStrategy, ShopifyConfig};
use wilo_scraper::shopify::{ShopifyClient, ShopifyError, UploadAction, UploadPolicy};

const API: &str = "/admin/api/2024-01";

fn client(server: &MockServer) -> ShopifyClient {
    let config = ShopifyConfig {
        shop_url: server.uri(),
        access_token: "shpat_test".into(),
        ..Default::default()
    };
    ShopifyClient::new(&config)
        .unwrap()
        .with_min_interval(Duration::ZERO)
}

fn product(name: &str) -> Product {
    let mut p = Product::new(
        format!("de_test_{}", name.len()),
        name.into(),
        "Industrie Heizung".into(),
        "Heizungspumpen".into(),
    );
    p.country = "Deutschland".into();
    p.country_code = "DE".into();
    p
}

async fn mount_search(server: &MockServer, title: &str, found: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("{}/products.json", API)))
        .and(query_param("title", title))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "products": found })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_connection_sends_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/shop.json", API)))
        .and(header("X-Shopify-Access-Token", "shpat_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "shop": { "id": 42, "name": "Pump Store", "domain": "pumps.example.com" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let shop = client(&server).test_connection().await.unwrap();
    assert_eq!(shop.id, 42);
    assert_eq!(shop.name, "Pump Store");
    assert_eq!(shop.domain.as_deref(), Some("pumps.example.com"));
}

#[tokio::test]
async fn test_api_error_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/shop.json", API)))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&server)
        .await;

    match client(&server).test_connection().await {
        Err(ShopifyError::Api { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "Invalid API key");
        }
        other => panic!("Expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/products.json", API)))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/products.json", API)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{ "id": 1, "title": "Stratos", "status": "draft" }]
        })))
        .mount(&server)
        .await;

    let products = client(&server).get_products(5).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].status.as_deref(), Some("draft"));
}

#[tokio::test]
async fn test_rate_limit_gives_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/products.json", API)))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(3)
        .mount(&server)
        .await;

    let result = client(&server)
        .with_max_rate_limit_retries(2)
        .get_products(5)
        .await;
    assert!(matches!(result, Err(ShopifyError::RateLimited { attempts: 3 })));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/shop.json", API)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(json!({ "shop": { "id": 1, "name": "Slow" } })),
        )
        .mount(&server)
        .await;

    let result = client(&server)
        .with_timeout(Duration::from_millis(50))
        .test_connection()
        .await;
    assert!(matches!(result, Err(ShopifyError::Http(_))));
}

#[tokio::test]
async fn test_bulk_upload_creates_skips_and_records_failures() {
    let server = MockServer::start().await;
    mount_search(&server, "Stratos", json!([])).await;
    mount_search(&server, "Yonos", json!([{ "id": 7, "title": "Yonos" }])).await;
    mount_search(&server, "Atmos", json!([])).await;

    Mock::given(method("POST"))
        .and(path(format!("{}/products.json", API)))
        .and(body_partial_json(json!({ "product": { "title": "Stratos", "status": "draft", "vendor": "Wilo" } })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "product": { "id": 100, "title": "Stratos" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/products.json", API)))
        .and(body_partial_json(json!({ "product": { "title": "Atmos" } })))
        .respond_with(ResponseTemplate::new(422).set_body_string(r#"{"errors":{"title":["is invalid"]}}"#))
        .mount(&server)
        .await;

    let products = vec![product("Stratos"), product("Yonos"), product("Atmos")];
    let report = client(&server)
        .bulk_upload(&products, UploadPolicy::Skip, &ProgressReporter::silent())
        .await;

    assert_eq!(report.total, 3);
    assert_eq!(report.success_count, 2);
    assert_eq!(report.error_count, 1);
    assert_eq!(report.successful[0].shopify_id, 100);
    assert_eq!(report.successful[0].action, UploadAction::Created);
    assert_eq!(report.successful[1].shopify_id, 7);
    assert_eq!(report.successful[1].action, UploadAction::Skipped);
    assert_eq!(report.failed[0].name, "Atmos");
    assert!(report.failed[0].error.contains("422"));
}

#[tokio::test]
async fn test_bulk_upload_updates_existing() {
    let server = MockServer::start().await;
    mount_search(&server, "Yonos", json!([{ "id": 7, "title": "Yonos" }])).await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/products/7.json", API)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "product": { "id": 7, "title": "Yonos" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = client(&server)
        .bulk_upload(&[product("Yonos")], UploadPolicy::Update, &ProgressReporter::silent())
        .await;
    assert_eq!(report.count(UploadAction::Updated), 1);
}

#[tokio::test]
async fn test_delete_product() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/products/55.json", API)))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete_product(55).await.unwrap();
}

#[tokio::test]
async fn test_adaptive_throttle_follows_call_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/shop.json", API)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Shopify-Shop-Api-Call-Limit", "36/40")
                .set_body_json(json!({ "shop": { "id": 1, "name": "Busy" } })),
        )
        .mount(&server)
        .await;

    let adaptive = client(&server);
    adaptive.test_connection().await.unwrap();
    assert!(adaptive.is_throttled());

    let fixed = ShopifyClient::new(&ShopifyConfig {
        shop_url: server.uri(),
        access_token: "shpat_test".into(),
        rate_limit_strategy: RateLimitStrategy::Fixed,
        ..Default::default()
    })
    .unwrap()
    .with_min_interval(Duration::ZERO);
    fixed.test_connection().await.unwrap();
    assert!(!fixed.is_throttled());
}
