//! URL helpers shared by the extractors, navigator and Shopify client.

use url::Url;

pub fn extract_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
}

/// `scheme://host[:port]` of a URL, without trailing slash.
pub fn origin(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}

/// Resolve an attribute value from the page into an absolute URL.
/// Protocol-relative links get https, root-relative links get the base origin.
pub fn absolutize(raw: &str, base_url: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.starts_with("data:")
        || trimmed.starts_with("javascript:")
        || trimmed.starts_with('#')
    {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Some(trimmed.to_string());
    }

    let base = Url::parse(base_url).ok()?;
    base.join(trimmed).ok().map(|u| u.to_string())
}

pub fn is_same_host(url: &str, other: &str) -> bool {
    match (extract_host(url), extract_host(other)) {
        (Some(a), Some(b)) => {
            a == b || a.ends_with(&format!(".{}", b)) || b.ends_with(&format!(".{}", a))
        }
        _ => false,
    }
}

/// Lowercase ASCII slug: runs of non-alphanumerics collapse into `_`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_sep = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            slug.push(c.to_ascii_lowercase());
            pending_sep = false;
        } else {
            pending_sep = true;
        }
    }
    slug
}
