//! Shopify Admin API integration.
//!
//! `payload` turns scraped [`Product`](crate::models::Product)s into Shopify
//! product documents; `client` talks to the REST Admin API with rate
//! limiting and drives bulk uploads.

pub mod client;
pub mod payload;

pub use client::{
    normalize_shop_url, ProductRecord, ShopInfo, ShopifyClient, ShopifyError, UploadAction, UploadFailure,
    UploadPolicy, UploadReport, UploadSuccess,
};
pub use payload::{generate_sku, generate_tags, ShopifyProduct};
