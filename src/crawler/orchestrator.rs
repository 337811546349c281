//! Parallel crawl orchestration: robots, sitemap and nav discovery, bounded
//! concurrent fetch, and early-exit policy.
//!
//! Grounded on `market_research_agent/crawlers/crawl_orchestrator.py`
//! (`CrawlOrchestrator`), the teacher's `route_quality::prober` concurrency
//! idiom, and `scrapers::dome`'s HTTP client construction style.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use tokio::sync::Semaphore;
use tracing::{info, warn};
use url::Url;

use super::cache::PageCache;
use super::{navigation, robots, sitemap};
use crate::model::{
    CrawlError, CrawlErrorKind, ExtractedLink, NormalizedPageGraph, PageArtifact, PageType,
    RenderType, RobotsRules, SourceTag,
};
use crate::url_utils;

const MAX_PAGES: usize = 20;
const PAGE_TIMEOUT: Duration = Duration::from_secs(3);
const TOTAL_TIMEOUT: Duration = Duration::from_secs(10);
const CONCURRENCY: usize = 10;
const USER_AGENT: &str = crate::model::robots::USER_AGENT;
const MAX_VISIBLE_TEXT_CHARS: usize = 50_000;

pub struct CrawlOrchestrator {
    client: Client,
    cache: Arc<dyn PageCache>,
}

impl CrawlOrchestrator {
    pub fn new(cache: Arc<dyn PageCache>) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, cache }
    }

    #[tracing::instrument(skip(self), fields(scan_id = %scan_id))]
    pub async fn crawl(&self, url: &str, scan_id: &str) -> NormalizedPageGraph {
        let started = Instant::now();
        let cleaned = clean_url(url);
        let mut graph = NormalizedPageGraph::new(cleaned.clone());

        if tokio::time::timeout(TOTAL_TIMEOUT, self.crawl_inner(&cleaned, &mut graph))
            .await
            .is_err()
        {
            warn!(timeout_secs = TOTAL_TIMEOUT.as_secs(), "crawl total timeout exceeded");
            graph.metadata.timed_out = true;
        }

        graph.metadata.crawl_time_ms = started.elapsed().as_millis() as u64;
        info!(
            pages_fetched = graph.metadata.pages_fetched,
            crawl_time_ms = graph.metadata.crawl_time_ms,
            "crawl completed"
        );
        graph
    }

    async fn crawl_inner(&self, url: &str, graph: &mut NormalizedPageGraph) {
        let Ok(parsed) = Url::parse(url) else {
            return;
        };
        let base_url = format!("{}://{}", parsed.scheme(), parsed.host_str().unwrap_or_default());

        let robots_rules = robots::fetch_and_parse(&self.client, &base_url).await;
        graph.metadata.robots_checked = true;

        info!("fetching homepage");
        let mut home_page = self.fetch_page(url, SourceTag::Root, 0, &robots_rules).await;
        home_page.page_type = PageType::Home;
        home_page.classification_confidence = 1.0;

        if let Some(err) = home_page.error.clone() {
            warn!(error = %err.message, "homepage fetch failed");
            graph.metadata.add_error(url.to_string(), err);
            graph.add_page(home_page);
            return;
        }

        let home_html = home_page.html.clone();
        graph.metadata.pages_fetched = 1;
        graph.add_page(home_page);

        let sitemap_result =
            sitemap::discover_and_parse(&self.client, &base_url, Some(&home_html), &robots_rules.sitemaps).await;
        graph.metadata.sitemap_found = sitemap_result.sitemap_found;
        graph.metadata.sitemap_urls_count = sitemap_result.urls.len();

        let mut nav_links = navigation::extract_primary(&home_html, url);
        if !sitemap_result.sitemap_found {
            info!("no sitemap, using secondary navigation");
            let seen: std::collections::HashSet<String> =
                nav_links.iter().map(|l| l.normalized_url.clone()).collect();
            let secondary = navigation::extract_secondary(&home_html, url, &seen);
            nav_links = navigation::merge_and_dedupe(vec![nav_links, secondary]);
        }

        let mut urls_to_fetch: Vec<(String, SourceTag, u32)> = Vec::new();
        let mut seen_normalized: std::collections::HashSet<String> = std::collections::HashSet::new();
        seen_normalized.insert(url_utils::normalize(url));

        for sitemap_url in sitemap_result.urls {
            let normalized = url_utils::normalize(&sitemap_url);
            if !seen_normalized.insert(normalized) {
                continue;
            }
            let classification = url_utils::classify(&sitemap_url, "", "");
            if classification.page_type == PageType::Skip {
                continue;
            }
            urls_to_fetch.push((sitemap_url, SourceTag::Sitemap, 1));
        }

        for link in nav_links {
            if !seen_normalized.insert(link.normalized_url.clone()) {
                continue;
            }
            urls_to_fetch.push((link.url, link.source, 1));
        }

        graph.metadata.pages_discovered = urls_to_fetch.len() + 1;
        info!(queued = urls_to_fetch.len(), "urls queued for fetching");

        let pages_to_fetch = (MAX_PAGES - 1).min(urls_to_fetch.len());
        urls_to_fetch.truncate(pages_to_fetch);

        if !urls_to_fetch.is_empty() {
            self.fetch_pages_parallel(urls_to_fetch, robots_rules, graph).await;
        }

        if graph.metadata.pages_fetched >= MAX_PAGES {
            info!(limit = MAX_PAGES, "page budget reached");
        }
    }

    async fn fetch_pages_parallel(
        &self,
        urls: Vec<(String, SourceTag, u32)>,
        robots_rules: RobotsRules,
        graph: &mut NormalizedPageGraph,
    ) {
        let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
        let early_exit = Arc::new(AtomicBool::new(false));
        let robots_rules = Arc::new(robots_rules);

        let mut in_flight = FuturesUnordered::new();
        for (url, source, depth) in urls {
            let semaphore = semaphore.clone();
            let early_exit = early_exit.clone();
            let client = self.client.clone();
            let cache = self.cache.clone();
            let robots_rules = robots_rules.clone();

            in_flight.push(async move {
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                if early_exit.load(Ordering::Relaxed) {
                    return PageArtifact::failed(
                        url.clone(),
                        CrawlError {
                            kind: CrawlErrorKind::Unknown,
                            message: "early exit triggered".to_string(),
                            status_code: None,
                        },
                        depth,
                        source,
                    );
                }
                Self::fetch_page_inner(&client, &cache, &url, source, depth, &robots_rules).await
            });
        }

        while let Some(page) = in_flight.next().await {
            graph.metadata.pages_fetched += 1;
            if page.status == 200 {
                info!(url = %page.url, "page fetched");
            } else if let Some(err) = &page.error {
                graph.metadata.add_error(page.url.clone(), err.clone());
            }
            graph.add_page(page);

            if !graph.metadata.early_exit && graph.has_required_pages() && graph.has_high_value_page() {
                graph.metadata.early_exit = true;
                graph.metadata.early_exit_reason =
                    Some("All required + high-value pages found".to_string());
                early_exit.store(true, Ordering::Relaxed);
                info!("early exit: all required and high-value pages found");
            }
        }
    }

    async fn fetch_page(&self, url: &str, source: SourceTag, depth: u32, robots_rules: &RobotsRules) -> PageArtifact {
        Self::fetch_page_inner(&self.client, &self.cache, url, source, depth, robots_rules).await
    }

    async fn fetch_page_inner(
        client: &Client,
        cache: &Arc<dyn PageCache>,
        url: &str,
        source: SourceTag,
        depth: u32,
        robots_rules: &RobotsRules,
    ) -> PageArtifact {
        let path = Url::parse(url).map(|u| u.path().to_string()).unwrap_or_else(|_| url.to_string());
        if !robots_rules.is_allowed(&path, USER_AGENT) {
            return PageArtifact::failed(
                url.to_string(),
                CrawlError {
                    kind: CrawlErrorKind::Blocked,
                    message: "Blocked by robots.txt".to_string(),
                    status_code: None,
                },
                depth,
                source,
            );
        }

        if let Some(mut cached) = cache.get(url).await {
            cached.source = SourceTag::Cache;
            return cached;
        }

        let send = tokio::time::timeout(PAGE_TIMEOUT, client.get(url).send()).await;
        let response = match send {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let status = e.status().map(|s| s.as_u16());
                return PageArtifact::failed(url.to_string(), CrawlError::classify(&e.to_string(), status), depth, source);
            }
            Err(_) => {
                return PageArtifact::failed(
                    url.to_string(),
                    CrawlError {
                        kind: CrawlErrorKind::Timeout,
                        message: format!("Page timeout ({}s)", PAGE_TIMEOUT.as_secs()),
                        status_code: None,
                    },
                    depth,
                    source,
                );
            }
        };

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.to_lowercase().contains("text/html") {
            return PageArtifact {
                url: url.to_string(),
                final_url,
                status,
                content_type,
                html: String::new(),
                visible_text: String::new(),
                canonical_url: None,
                title: None,
                page_type: PageType::Other,
                classification_confidence: 0.0,
                depth,
                source,
                content_hash: PageArtifact::compute_content_hash(""),
                extracted_links: Vec::new(),
                render_type: RenderType::Http,
                error: None,
            };
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => return PageArtifact::failed(url.to_string(), CrawlError::classify(&e.to_string(), Some(status)), depth, source),
        };

        let document = Html::parse_document(&html);
        let canonical_url = extract_canonical(&document, &final_url);
        let title = extract_title(&document);
        let classification = url_utils::classify(url, "", &title);
        let visible_text = extract_visible_text(&document);
        let content_hash = PageArtifact::compute_content_hash(&visible_text);
        let extracted_links = extract_links(&document, &final_url);
        let error = if status >= 400 {
            Some(CrawlError::classify(&format!("HTTP {status}"), Some(status)))
        } else {
            None
        };

        let artifact = PageArtifact {
            url: url.to_string(),
            final_url,
            status,
            content_type,
            html,
            visible_text,
            canonical_url,
            title: Some(title),
            page_type: classification.page_type,
            classification_confidence: classification.confidence,
            depth,
            source,
            content_hash,
            extracted_links,
            render_type: RenderType::Http,
            error,
        };

        if artifact.status == 200 {
            cache.set(&artifact).await;
        }

        artifact
    }
}

/// Mirrors `_clean_url`: strips a stray `url:` prefix, takes the first of a
/// comma-separated argument list, and defaults to `https://` when no scheme
/// is present.
fn clean_url(raw: &str) -> String {
    let mut cleaned = raw.trim().to_string();

    if cleaned.to_lowercase().starts_with("url:") {
        cleaned = cleaned[4..].trim_start().to_string();
    }

    if cleaned.contains(',') && (cleaned.contains("http://") || cleaned.contains("https://")) {
        cleaned = cleaned.split(',').next().unwrap_or(&cleaned).trim().to_string();
    }

    if !cleaned.starts_with("http://") && !cleaned.starts_with("https://") {
        cleaned = format!("https://{cleaned}");
    }

    cleaned
}

fn extract_canonical(document: &Html, page_url: &str) -> Option<String> {
    let selector = Selector::parse(r#"link[rel="canonical"]"#).ok()?;
    let href = document.select(&selector).next()?.value().attr("href")?;
    Url::parse(page_url).ok()?.join(href).ok().map(|u| u.to_string())
}

fn extract_title(document: &Html) -> String {
    let selector = Selector::parse("title").ok();
    selector
        .and_then(|s| document.select(&s).next())
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn extract_links(document: &Html, base_url: &str) -> Vec<ExtractedLink> {
    let (Ok(selector), Ok(base)) = (Selector::parse("a[href]"), Url::parse(base_url)) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let resolved = base.join(href).ok()?;
            let text = a.text().collect::<String>().trim().to_string();
            let normalized = url_utils::normalize(resolved.as_str());
            Some(ExtractedLink {
                url: resolved.to_string(),
                text,
                normalized_url: Some(normalized),
            })
        })
        .collect()
}

/// Deterministic visible text: walks the DOM skipping `script`/`style`/
/// `noscript` subtrees, collapses whitespace, and caps length so the
/// content hash and downstream analyzers stay bounded.
fn extract_visible_text(document: &Html) -> String {
    let mut out = String::new();
    let body_selector = Selector::parse("body").ok();
    match body_selector.and_then(|s| document.select(&s).next()) {
        Some(body) => collect_text(body, &mut out),
        None => collect_text(document.root_element(), &mut out),
    }
    let collapsed = out.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_VISIBLE_TEXT_CHARS).collect()
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Element(el) if matches!(el.name(), "script" | "style" | "noscript") => continue,
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
            }
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_url_adds_https_scheme() {
        assert_eq!(clean_url("example.com"), "https://example.com");
    }

    #[test]
    fn clean_url_strips_url_prefix() {
        assert_eq!(clean_url("url: https://example.com"), "https://example.com");
    }

    #[test]
    fn clean_url_takes_first_of_comma_list() {
        assert_eq!(clean_url("https://example.com, https://other.com"), "https://example.com");
    }

    #[test]
    fn extract_visible_text_skips_script_and_style() {
        let html = Html::parse_document(
            "<html><body><p>Hello</p><script>evil()</script><style>.x{}</style></body></html>",
        );
        let text = extract_visible_text(&html);
        assert_eq!(text, "Hello");
    }
}
