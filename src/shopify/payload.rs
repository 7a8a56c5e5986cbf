use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::extractors::description::escape_html;
use crate::models::Product;

const METAFIELD_NAMESPACE: &str = "wilo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopifyProduct {
    pub title: String,
    pub body_html: String,
    pub vendor: String,
    pub product_type: String,
    /// Comma separated
    pub tags: String,
    pub status: String,
    pub variants: Vec<Variant>,
    pub options: Vec<ProductOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ProductImage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metafields: Vec<Metafield>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub title: String,
    pub price: String,
    pub sku: String,
    pub inventory_management: String,
    pub inventory_quantity: i64,
    pub requires_shipping: bool,
    pub taxable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductOption {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metafield {
    pub namespace: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Metafield {
    fn new(key: &str, value: impl Into<String>, kind: &str) -> Self {
        Self {
            namespace: METAFIELD_NAMESPACE.to_string(),
            key: key.to_string(),
            value: value.into(),
            kind: kind.to_string(),
        }
    }
}

impl ShopifyProduct {
    /// Build the draft product document uploaded for a scraped product.
    pub fn from_product(product: &Product) -> Self {
        let images = product
            .all_image_urls()
            .into_iter()
            .take(Config::MAX_UPLOAD_IMAGES)
            .map(|src| ProductImage {
                src,
                alt: product.name.clone(),
            })
            .collect();

        Self {
            title: product.name.clone(),
            body_html: body_html(product),
            vendor: Config::SHOPIFY_VENDOR.to_string(),
            product_type: product.subcategory.clone(),
            tags: generate_tags(product),
            status: "draft".to_string(),
            variants: vec![Variant {
                title: "Default".to_string(),
                price: "0.00".to_string(),
                sku: generate_sku(product),
                inventory_management: "shopify".to_string(),
                inventory_quantity: 0,
                requires_shipping: true,
                taxable: true,
            }],
            options: vec![ProductOption {
                name: "Title".to_string(),
                values: vec!["Default".to_string()],
            }],
            images,
            metafields: metafields(product),
        }
    }
}

/// `WILO-{prefix}-{NAME}` where prefix is the leading category number
/// ("01. Heizung" -> "01") or, failing that, the country code.
pub fn generate_sku(product: &Product) -> String {
    let prefix = category_number(&product.category).unwrap_or(product.country_code.as_str());
    let name = product.name.to_uppercase().replace(' ', "-");

    format!("WILO-{}-{}", prefix.to_uppercase(), name)
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(Config::MAX_SKU_LEN)
        .collect()
}

fn category_number(category: &str) -> Option<&str> {
    let (head, _) = category.split_once('.')?;
    let head = head.trim();
    (!head.is_empty() && head.chars().all(|c| c.is_ascii_digit())).then_some(head)
}

pub fn generate_tags(product: &Product) -> String {
    let mut tags: Vec<String> = vec!["Wilo".into(), "Pump".into(), "German Engineering".into()];
    tags.push(product.category.replace('.', "").trim().to_string());
    tags.push(product.subcategory.trim().to_string());
    if let Some(application) = product.specifications.get("application") {
        tags.push(application.trim().to_string());
    }
    tags.push(product.country.trim().to_string());

    let mut unique: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !tag.is_empty() && !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique.join(", ")
}

fn body_html(product: &Product) -> String {
    if !product.full_description.trim().is_empty() {
        return product.full_description.clone();
    }

    let mut parts = vec![format!("<h2>{}</h2>", escape_html(&product.name))];
    let description = product.description();
    if !description.is_empty() {
        parts.push(format!("<p>{}</p>", escape_html(description)));
    }
    parts.push(format!(
        "<p><strong>Application:</strong> {}</p>",
        escape_html(&product.category)
    ));
    parts.push(format!(
        "<p><strong>Type:</strong> {}</p>",
        escape_html(&product.subcategory)
    ));

    let specs: Vec<String> = product
        .specifications
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| {
            format!(
                "<li><strong>{}:</strong> {}</li>",
                escape_html(&spec_label(key)),
                escape_html(value)
            )
        })
        .collect();
    if !specs.is_empty() {
        parts.push("<h3>Specifications</h3>".to_string());
        parts.push("<ul>".to_string());
        parts.extend(specs);
        parts.push("</ul>".to_string());
    }

    parts.push("<h3>Features</h3>".to_string());
    parts.push("<ul>".to_string());
    for feature in [
        "High-quality German engineering",
        "Energy-efficient operation",
        "Reliable performance",
        "Professional grade components",
    ] {
        parts.push(format!("<li>{}</li>", feature));
    }
    parts.push("</ul>".to_string());
    parts.push("<h3>About Wilo</h3>".to_string());
    parts.push(
        "<p>Wilo is a leading global manufacturer of pumps and pump systems for heating, \
         cooling, air conditioning, water supply, and wastewater treatment.</p>"
            .to_string(),
    );

    parts.join("\n")
}

/// "max_flow_rate" -> "Max Flow Rate"
fn spec_label(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn metafields(product: &Product) -> Vec<Metafield> {
    let mut fields = Vec::new();
    for (key, value) in [
        ("category", &product.category),
        ("subcategory", &product.subcategory),
        ("country", &product.country),
    ] {
        if !value.is_empty() {
            fields.push(Metafield::new(key, value.as_str(), "single_line_text_field"));
        }
    }
    fields.push(Metafield::new(
        "extracted_at",
        product.extracted_at.to_rfc3339(),
        "date_time",
    ));
    if let Some(url) = product.product_url.as_deref().filter(|u| !u.is_empty()) {
        fields.push(Metafield::new("source_url", url, "url"));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        let mut p = Product::new(
            "de_industrie_heizung_1".into(),
            "Stratos MAXO 25/0,5-6".into(),
            "Industrie Heizung".into(),
            "Heizungspumpen".into(),
        );
        p.country = "Germany".into();
        p.country_code = "DE".into();
        p
    }

    #[test]
    fn test_sku_uses_country_code_without_category_number() {
        assert_eq!(generate_sku(&product()), "WILO-DE-STRATOS-MAXO-2505-6");
    }

    #[test]
    fn test_sku_uses_category_number_and_is_capped() {
        let mut p = product();
        p.category = "01. Heizung".into();
        p.name = "Very long product name ".repeat(5);
        let sku = generate_sku(&p);
        assert!(sku.starts_with("WILO-01-VERY-LONG"));
        assert_eq!(sku.chars().count(), 50);
    }

    #[test]
    fn test_tags_deduplicated() {
        let mut p = product();
        p.specifications.insert("application".into(), "Heizungspumpen".into());
        assert_eq!(
            generate_tags(&p),
            "Wilo, Pump, German Engineering, Industrie Heizung, Heizungspumpen, Germany"
        );
    }

    #[test]
    fn test_payload_shape() {
        let mut p = product();
        p.card_image_url = Some("https://wilo.com/card.jpg".into());
        p.product_images = (0..12).map(|i| format!("https://wilo.com/{}.jpg", i)).collect();
        p.product_url = Some("https://wilo.com/p/stratos".into());

        let payload = ShopifyProduct::from_product(&p);
        assert_eq!(payload.vendor, "Wilo");
        assert_eq!(payload.status, "draft");
        assert_eq!(payload.images.len(), 10);
        assert_eq!(payload.images[0].src, "https://wilo.com/card.jpg");
        assert_eq!(payload.variants[0].price, "0.00");
        assert_eq!(payload.options[0].values, vec!["Default".to_string()]);

        let keys: Vec<&str> = payload.metafields.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["category", "subcategory", "country", "extracted_at", "source_url"]);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["metafields"][3]["type"], "date_time");
    }

    #[test]
    fn test_body_prefers_full_description() {
        let mut p = product();
        p.full_description = "<p>Ready made</p>".into();
        assert_eq!(ShopifyProduct::from_product(&p).body_html, "<p>Ready made</p>");
    }

    #[test]
    fn test_generated_body_escapes_and_lists_specs() {
        let mut p = product();
        p.name = "Pump <X>".into();
        p.specifications.insert("max_flow".into(), "10 m³/h".into());
        p.specifications.insert("empty".into(), " ".into());

        let body = ShopifyProduct::from_product(&p).body_html;
        assert!(body.starts_with("<h2>Pump &lt;X&gt;</h2>"));
        assert!(body.contains("<li><strong>Max Flow:</strong> 10 m³/h</li>"));
        assert!(!body.contains("Empty"));
        assert!(body.contains("<h3>About Wilo</h3>"));
    }
}
