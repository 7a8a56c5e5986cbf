//! HTML product body assembled from the extracted description parts.

use crate::countries::Country;

const ABOUT_HEADING_DE: &str = "Über Wilo";
const ABOUT_TEXT_DE: &str = "Wilo ist ein führender Hersteller von Pumpen und Pumpensystemen für Heizung, Kühlung, Klimatechnik, Wasserversorgung und Abwasserbehandlung.";
const ABOUT_HEADING_EN: &str = "About Wilo";
const ABOUT_TEXT_EN: &str = "Wilo is a leading global manufacturer of pumps and pump systems for heating, cooling, air conditioning, water supply, and wastewater treatment.";

/// Escape text for inclusion in an HTML body.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Intro, advantages list, long-text paragraphs and a brand section,
/// one element per line.
pub fn build_full_description(
    short_description: &str,
    advantages: &[String],
    long_description: &str,
    country: &Country,
) -> String {
    let mut html: Vec<String> = Vec::new();

    if !short_description.is_empty() {
        html.push(format!(
            "<div class='product-intro'>{}</div>",
            escape_html(short_description)
        ));
    }

    if !advantages.is_empty() {
        html.push(format!("<h3>{}</h3>", escape_html(country.advantages_heading)));
        html.push("<ul>".to_string());
        for advantage in advantages {
            html.push(format!("<li>{}</li>", escape_html(advantage)));
        }
        html.push("</ul>".to_string());
    }

    for paragraph in long_description.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        html.push(format!("<p>{}</p>", escape_html(paragraph)));
    }

    let (heading, text) = if country.is_german_speaking() {
        (ABOUT_HEADING_DE, ABOUT_TEXT_DE)
    } else {
        (ABOUT_HEADING_EN, ABOUT_TEXT_EN)
    };
    html.push(format!("<h3>{}</h3>", heading));
    html.push(format!("<p>{}</p>", text));

    html.join("\n")
}
