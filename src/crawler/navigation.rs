//! Two-tiered navigation link discovery: header/footer/menu links first,
//! full-body links as a fallback when no sitemap was found.
//!
//! Grounded on `market_research_agent/crawlers/navigation_discovery.py`
//! (`NavigationDiscovery`).

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::info;
use url::Url;

use crate::model::{PageType, SourceTag};
use crate::url_utils;

const MAX_SECONDARY_LINKS: usize = 50;
const MAX_MENU_ELEMENTS: usize = 5;

#[derive(Debug, Clone)]
pub struct DiscoveredLink {
    pub url: String,
    pub normalized_url: String,
    pub text: String,
    pub source: SourceTag,
    pub page_type: PageType,
    pub confidence: f64,
}

/// Links from `<nav>`, `<header>`, `<footer>`, and menu-ish containers —
/// the pages a real visitor would reach in one click from the homepage.
pub fn extract_primary(html: &str, base_url: &str) -> Vec<DiscoveredLink> {
    let document = Html::parse_document(html);
    let base_domain = url_utils::get_domain(base_url);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for selector_str in ["nav", "header", "footer"] {
        if let Ok(selector) = Selector::parse(selector_str) {
            for element in document.select(&selector) {
                links.extend(extract_links_from_element(element, base_url, &base_domain, SourceTag::NavPrimary, &mut seen));
            }
        }
    }

    for selector_str in [r#"[class*="menu"]"#, r#"[class*="nav"]"#, r#"[id*="menu"]"#, r#"[id*="nav"]"#] {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in document.select(&selector).take(MAX_MENU_ELEMENTS) {
            let tag = element.value().name();
            if matches!(tag, "nav" | "header" | "footer") {
                continue;
            }
            links.extend(extract_links_from_element(element, base_url, &base_domain, SourceTag::Menu, &mut seen));
        }
    }

    links.sort_by(|a, b| b.page_type.priority_score().cmp(&a.page_type.priority_score()));
    info!(count = links.len(), "primary nav links discovered");
    links
}

/// All internal links in `<main>`/content containers and the page body,
/// used when the sitemap fell through. Capped to bound crawl queue growth.
pub fn extract_secondary(html: &str, base_url: &str, exclude: &HashSet<String>) -> Vec<DiscoveredLink> {
    let document = Html::parse_document(html);
    let base_domain = url_utils::get_domain(base_url);
    let mut seen = exclude.clone();
    let mut links = Vec::new();

    for selector_str in ["main", "#content", ".content"] {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                links.extend(extract_links_from_element(element, base_url, &base_domain, SourceTag::NavSecondary, &mut seen));
                break;
            }
        }
    }

    if let Ok(selector) = Selector::parse("body") {
        if let Some(element) = document.select(&selector).next() {
            links.extend(extract_links_from_element(element, base_url, &base_domain, SourceTag::NavSecondary, &mut seen));
        }
    }

    links.sort_by(|a, b| b.page_type.priority_score().cmp(&a.page_type.priority_score()));
    info!(count = links.len(), "secondary links discovered");
    links.truncate(MAX_SECONDARY_LINKS);
    links
}

fn extract_links_from_element(
    element: ElementRef,
    base_url: &str,
    base_domain: &str,
    source: SourceTag,
    seen: &mut HashSet<String>,
) -> Vec<DiscoveredLink> {
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for anchor in element.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if href.starts_with('#') || href.starts_with("javascript:") || href.starts_with("mailto:") || href.starts_with("tel:") {
            continue;
        }
        let Ok(full_url) = base.join(href) else {
            continue;
        };
        let full_url_str = full_url.to_string();
        let normalized = url_utils::normalize(&full_url_str);

        if seen.contains(&normalized) {
            continue;
        }
        if !url_utils::is_internal(&full_url_str, base_domain) {
            continue;
        }

        let anchor_text: String = anchor.text().collect::<String>().trim().to_string();
        let classification = url_utils::classify(&full_url_str, &anchor_text, "");
        if classification.page_type == PageType::Skip {
            continue;
        }

        seen.insert(normalized.clone());
        links.push(DiscoveredLink {
            url: full_url_str,
            normalized_url: normalized,
            text: anchor_text,
            source,
            page_type: classification.page_type,
            confidence: classification.confidence,
        });
    }
    links
}

/// Merges multiple discovery passes, keeping the highest-confidence
/// classification per normalized URL, then re-sorts by crawl priority.
pub fn merge_and_dedupe(link_lists: Vec<Vec<DiscoveredLink>>) -> Vec<DiscoveredLink> {
    let mut by_url: std::collections::HashMap<String, DiscoveredLink> = std::collections::HashMap::new();

    for links in link_lists {
        for link in links {
            match by_url.get(&link.normalized_url) {
                Some(existing) if existing.confidence >= link.confidence => {}
                _ => {
                    by_url.insert(link.normalized_url.clone(), link);
                }
            }
        }
    }

    let mut result: Vec<DiscoveredLink> = by_url.into_values().collect();
    result.sort_by(|a, b| b.page_type.priority_score().cmp(&a.page_type.priority_score()));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_classifies_header_links() {
        let html = r#"<html><body><header><a href="/privacy-policy">Privacy</a></header></body></html>"#;
        let links = extract_primary(html, "https://example.com");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].page_type, PageType::PrivacyPolicy);
    }

    #[test]
    fn skips_external_and_javascript_links() {
        let html = r#"<html><body><nav>
            <a href="javascript:void(0)">JS</a>
            <a href="https://evil.com/about">External</a>
        </nav></body></html>"#;
        let links = extract_primary(html, "https://example.com");
        assert!(links.is_empty());
    }

    #[test]
    fn merge_and_dedupe_keeps_highest_confidence() {
        let low = DiscoveredLink {
            url: "https://example.com/about".into(),
            normalized_url: "https://example.com/about".into(),
            text: "".into(),
            source: SourceTag::NavSecondary,
            page_type: PageType::Other,
            confidence: 0.2,
        };
        let high = DiscoveredLink {
            url: "https://example.com/about".into(),
            normalized_url: "https://example.com/about".into(),
            text: "About Us".into(),
            source: SourceTag::NavPrimary,
            page_type: PageType::About,
            confidence: 0.95,
        };
        let merged = merge_and_dedupe(vec![vec![low], vec![high]]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].page_type, PageType::About);
    }
}
