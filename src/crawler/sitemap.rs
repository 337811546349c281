//! Sitemap discovery and parsing, with URL prioritization.
//!
//! Grounded on `market_research_agent/crawlers/sitemap_parser.py`
//! (`SitemapParser`).

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;
use xml::reader::{EventReader, XmlEvent};

use crate::model::PageType;
use crate::url_utils;

const SITEMAP_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml", "/sitemap-index.xml", "/sitemaps.xml"];
const TIMEOUT: Duration = Duration::from_secs(5);
const MAX_URLS: usize = 100;
const MAX_CHILD_SITEMAPS: usize = 3;

pub struct SitemapResult {
    pub urls: Vec<String>,
    pub sitemap_found: bool,
}

/// Discovers a sitemap via (in order) robots.txt declarations, standard
/// well-known paths, and a `<link rel="sitemap">` tag on the homepage, then
/// returns internal URLs filtered and ranked by [`PageType::priority_score`].
pub async fn discover_and_parse(
    client: &Client,
    base_url: &str,
    homepage_html: Option<&str>,
    robots_sitemaps: &[String],
) -> SitemapResult {
    let Ok(parsed) = Url::parse(base_url) else {
        return SitemapResult {
            urls: Vec::new(),
            sitemap_found: false,
        };
    };
    let base = format!("{}://{}", parsed.scheme(), parsed.host_str().unwrap_or_default());

    let mut all_urls = Vec::new();
    let mut sitemap_found = false;

    for sitemap_url in robots_sitemaps.iter().take(MAX_CHILD_SITEMAPS) {
        let urls = fetch_sitemap(client, sitemap_url, 0).await;
        if !urls.is_empty() {
            info!(sitemap_url, count = urls.len(), "sitemap from robots.txt");
            all_urls.extend(urls);
            sitemap_found = true;
        }
    }

    if !sitemap_found {
        for path in SITEMAP_PATHS {
            let Ok(sitemap_url) = Url::parse(&base).and_then(|b| b.join(path)) else {
                continue;
            };
            let urls = fetch_sitemap(client, sitemap_url.as_str(), 0).await;
            if !urls.is_empty() {
                info!(path, count = urls.len(), "sitemap found at standard path");
                all_urls.extend(urls);
                sitemap_found = true;
                break;
            }
        }
    }

    if !sitemap_found {
        if let Some(html) = homepage_html {
            if let Some(link) = find_sitemap_link(html, &base) {
                let urls = fetch_sitemap(client, &link, 0).await;
                if !urls.is_empty() {
                    info!(sitemap_url = %link, count = urls.len(), "sitemap from homepage link");
                    all_urls.extend(urls);
                    sitemap_found = true;
                }
            }
        }
    }

    let filtered = filter_and_prioritize(all_urls, &base);
    SitemapResult {
        urls: filtered,
        sitemap_found,
    }
}

async fn fetch_sitemap(client: &Client, sitemap_url: &str, depth: u32) -> Vec<String> {
    let Ok(Ok(response)) = tokio::time::timeout(TIMEOUT, client.get(sitemap_url).send()).await else {
        debug!(sitemap_url, "sitemap timeout");
        return Vec::new();
    };
    if !response.status().is_success() {
        return Vec::new();
    }
    let Ok(content) = response.text().await else {
        return Vec::new();
    };

    let urls = if content.to_lowercase().contains("<sitemapindex") && depth == 0 {
        let child_sitemaps = extract_loc_values(&content);
        let mut all = Vec::new();
        for child in child_sitemaps.iter().take(MAX_CHILD_SITEMAPS) {
            let child_urls = Box::pin(fetch_sitemap(client, child, depth + 1)).await;
            all.extend(child_urls);
            if all.len() >= MAX_URLS {
                break;
            }
        }
        all
    } else {
        extract_loc_values(&content)
    };

    urls.into_iter().take(MAX_URLS).collect()
}

/// Extracts every `<loc>` text node from sitemap XML, namespace-agnostic.
fn extract_loc_values(content: &str) -> Vec<String> {
    let reader = EventReader::new(content.as_bytes());
    let mut urls = Vec::new();
    let mut in_loc = false;

    for event in reader {
        match event {
            Ok(XmlEvent::StartElement { name, .. }) => {
                if name.local_name.eq_ignore_ascii_case("loc") {
                    in_loc = true;
                }
            }
            Ok(XmlEvent::Characters(text)) if in_loc => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    urls.push(trimmed.to_string());
                }
            }
            Ok(XmlEvent::EndElement { name }) => {
                if name.local_name.eq_ignore_ascii_case("loc") {
                    in_loc = false;
                }
            }
            Err(_) => break,
            _ => {}
        }
    }

    urls
}

fn find_sitemap_link(html: &str, base_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"link[rel="sitemap"]"#).ok()?;
    let href = document.select(&selector).next()?.value().attr("href")?;
    Url::parse(base_url).ok()?.join(href).ok().map(|u| u.to_string())
}

fn filter_and_prioritize(urls: Vec<String>, base_url: &str) -> Vec<String> {
    let base_domain = url_utils::get_domain(base_url);
    let mut seen = HashSet::new();
    let mut scored: Vec<(String, i32)> = Vec::new();

    for url in urls {
        let url = url.trim().to_string();
        if url.is_empty() || !seen.insert(url.clone()) {
            continue;
        }
        if url_utils::get_domain(&url) != base_domain {
            continue;
        }

        let classification = url_utils::classify(&url, "", "");
        if classification.page_type == PageType::Skip {
            continue;
        }

        scored.push((url, classification.page_type.priority_score()));
    }

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().take(MAX_URLS).map(|(url, _)| url).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_loc_values_from_urlset() {
        let xml = r#"<?xml version="1.0"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <url><loc>https://example.com/privacy</loc></url>
                <url><loc>https://example.com/terms</loc></url>
            </urlset>"#;
        let urls = extract_loc_values(xml);
        assert_eq!(urls, vec!["https://example.com/privacy", "https://example.com/terms"]);
    }

    #[test]
    fn filter_and_prioritize_drops_external_and_ranks_by_priority() {
        let urls = vec![
            "https://example.com/blog/post-1".to_string(),
            "https://example.com/privacy-policy".to_string(),
            "https://evil.com/privacy-policy".to_string(),
        ];
        let filtered = filter_and_prioritize(urls, "https://example.com");
        assert_eq!(filtered, vec!["https://example.com/privacy-policy", "https://example.com/blog/post-1"]);
    }
}
