//! Countries the Wilo catalog can be browsed for.
//!
//! Each entry carries the URL parameters used to build catalog URLs and the
//! localized strings the extractors and description builder look for.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Country {
    /// Lookup key, e.g. "germany"
    pub key: &'static str,
    /// Display name as the site shows it
    pub name: &'static str,
    /// ISO 3166-1 alpha-2
    pub code: &'static str,
    pub language: &'static str,
    /// Country segment in catalog URLs
    pub url_country: &'static str,
    /// Language segment in catalog URLs
    pub url_lang: &'static str,
    pub hydraulic_pump_text: &'static str,
    /// Heading of the benefits list on product pages
    pub advantages_heading: &'static str,
    pub currency: &'static str,
}

pub const COUNTRIES: &[Country] = &[
    Country {
        key: "germany",
        name: "Deutschland",
        code: "DE",
        language: "German",
        url_country: "de",
        url_lang: "de",
        hydraulic_pump_text: "Hydraulische Pumpenauswahl",
        advantages_heading: "Ihre Vorteile",
        currency: "EUR",
    },
    Country {
        key: "austria",
        name: "Österreich",
        code: "AT",
        language: "German",
        url_country: "at",
        url_lang: "de",
        hydraulic_pump_text: "Hydraulische Pumpenauswahl",
        advantages_heading: "Ihre Vorteile",
        currency: "EUR",
    },
    Country {
        key: "france",
        name: "France",
        code: "FR",
        language: "French",
        url_country: "fr",
        url_lang: "fr",
        hydraulic_pump_text: "Sélection de pompes hydrauliques",
        advantages_heading: "Vos avantages",
        currency: "EUR",
    },
    Country {
        key: "italy",
        name: "Italia",
        code: "IT",
        language: "Italian",
        url_country: "it",
        url_lang: "it",
        hydraulic_pump_text: "Selezione pompe idrauliche",
        advantages_heading: "I vostri vantaggi",
        currency: "EUR",
    },
    Country {
        key: "spain",
        name: "España",
        code: "ES",
        language: "Spanish",
        url_country: "es",
        url_lang: "es",
        hydraulic_pump_text: "Selección de bombas hidráulicas",
        advantages_heading: "Sus ventajas",
        currency: "EUR",
    },
    Country {
        key: "netherlands",
        name: "Nederland",
        code: "NL",
        language: "Dutch",
        url_country: "nl",
        url_lang: "nl",
        hydraulic_pump_text: "Hydraulische pompselectie",
        advantages_heading: "Uw voordelen",
        currency: "EUR",
    },
    Country {
        key: "poland",
        name: "Polska",
        code: "PL",
        language: "Polish",
        url_country: "pl",
        url_lang: "pl",
        hydraulic_pump_text: "Wybór pomp hydraulicznych",
        advantages_heading: "Twoje korzyści",
        currency: "PLN",
    },
    Country {
        key: "united_kingdom",
        name: "United Kingdom",
        code: "GB",
        language: "English",
        url_country: "gb",
        url_lang: "en",
        hydraulic_pump_text: "Hydraulic pump selection",
        advantages_heading: "Your advantages",
        currency: "GBP",
    },
];

/// Find a country by key or ISO code, ignoring case.
pub fn get(key: &str) -> Option<&'static Country> {
    let key = key.trim();
    COUNTRIES
        .iter()
        .find(|c| c.key.eq_ignore_ascii_case(key) || c.code.eq_ignore_ascii_case(key))
}

/// Find a country by its display name.
pub fn by_name(name: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.name == name.trim())
}

pub fn all() -> &'static [Country] {
    COUNTRIES
}

pub fn keys() -> Vec<&'static str> {
    COUNTRIES.iter().map(|c| c.key).collect()
}

impl Country {
    /// `{base}/{country}/{lang}/Katalog/{lang}/{category_path}`
    pub fn catalog_url(&self, base_url: &str, category_path: &str) -> String {
        format!(
            "{}/{}/{}/Katalog/{}/{}",
            base_url.trim_end_matches('/'),
            self.url_country,
            self.url_lang,
            self.url_lang,
            category_path.trim_matches('/')
        )
    }

    pub fn is_german_speaking(&self) -> bool {
        self.language == "German"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_key_and_code() {
        assert_eq!(get("germany").map(|c| c.code), Some("DE"));
        assert_eq!(get("GERMANY").map(|c| c.code), Some("DE"));
        assert_eq!(get("gb").map(|c| c.key), Some("united_kingdom"));
        assert!(get("atlantis").is_none());
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(by_name("Österreich").map(|c| c.key), Some("austria"));
        assert!(by_name("Austria").is_none());
    }

    #[test]
    fn test_all_countries_listed() {
        assert_eq!(all().len(), 8);
        assert!(keys().contains(&"poland"));
    }

    #[test]
    fn test_catalog_url_for_germany_matches_site_layout() {
        let de = get("germany").unwrap();
        assert_eq!(
            de.catalog_url("https://wilo.com/", "anwendung/industrie/heizung/heizung"),
            "https://wilo.com/de/de/Katalog/de/anwendung/industrie/heizung/heizung"
        );
    }

    #[test]
    fn test_catalog_url_uses_language_segment() {
        let uk = get("united_kingdom").unwrap();
        assert_eq!(
            uk.catalog_url("https://wilo.com", "/application/building/heating/"),
            "https://wilo.com/gb/en/Katalog/en/application/building/heating"
        );
    }

    #[test]
    fn test_currencies() {
        assert_eq!(get("poland").unwrap().currency, "PLN");
        assert_eq!(get("gb").unwrap().currency, "GBP");
        assert_eq!(get("france").unwrap().currency, "EUR");
    }
}
